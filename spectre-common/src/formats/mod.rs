//! Spectre layout and document formats
//!
//! [`layout`] describes how one interleaved vertex record is organised;
//! [`document`] is the complete export of one merge group, ready for an
//! encoder.

pub mod document;
pub mod layout;

pub use document::*;
pub use layout::*;
