//! Utility functions

pub mod encoding;
pub mod paths;

pub use encoding::{decode_text, DecodeError, DecodedText};
pub use paths::normalize_path;
