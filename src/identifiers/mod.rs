/*! Language identification

Holds an [Identifier] trait for implementing other ones.

The current identifier used is [whatlang](https://github.com/greyblake/whatlang-rs)
!*/
mod identifier;
mod whatlang_id;

pub use identifier::Identifier;
pub use whatlang_id::WhatLang;
