//! Core library for the stock-merge command line application.
//!
//! Two inventory exports with different shapes are normalized into canonical
//! `item → quantity` sets and merged into one sorted dataset. The modules keep
//! responsibilities narrow: the delimited text format lives in [`codec`],
//! per-source collapsing rules in [`normalize`], set combination in [`merge`],
//! file access behind the traits in [`io`], and the end-to-end run in
//! [`sync`].

pub mod codec;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod sync;

pub use error::{MergeError, Result};
