/*! whatlang-backed identification.

Trigram-based, pure Rust, no model file to ship. Predictions below the
reliability bar are reported as [None] so that callers fall back to their
configured language instead of trusting a noisy guess.
!*/
use crate::identifiers::Identifier;
use crate::lang::Lang;

#[derive(Debug, Default, Clone, Copy)]
pub struct WhatLang;

impl WhatLang {
    pub fn new() -> Self {
        Self
    }

    fn to_lang(detected: whatlang::Lang) -> Option<Lang> {
        use whatlang::Lang as W;
        match detected {
            W::Ara => Some(Lang::Ar),
            W::Dan => Some(Lang::Da),
            W::Deu => Some(Lang::De),
            W::Ell => Some(Lang::El),
            W::Eng => Some(Lang::En),
            W::Spa => Some(Lang::Es),
            W::Fin => Some(Lang::Fi),
            W::Fra => Some(Lang::Fr),
            W::Hun => Some(Lang::Hu),
            W::Ita => Some(Lang::It),
            W::Nld => Some(Lang::Nl),
            W::Nob => Some(Lang::No),
            W::Por => Some(Lang::Pt),
            W::Ron => Some(Lang::Ro),
            W::Rus => Some(Lang::Ru),
            W::Swe => Some(Lang::Sv),
            W::Tur => Some(Lang::Tr),
            _ => None,
        }
    }
}

impl Identifier for WhatLang {
    fn identify(&self, text: &str) -> Option<Lang> {
        let info = whatlang::detect(text)?;
        if !info.is_reliable() {
            return None;
        }
        Self::to_lang(info.lang())
    }
}
