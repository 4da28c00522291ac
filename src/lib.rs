#![doc = include_str!("../README.md")]
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod index;
pub mod lang;
pub mod search;
