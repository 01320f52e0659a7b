//! Decoding fetched file bytes into text.
//!
//! Strategy:
//! - BOM detection first (UTF-8, UTF-16 LE/BE)
//! - NUL bytes mark the payload as binary
//! - strict UTF-8 fast path
//! - chardetng guess for everything else

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use thiserror::Error;

const DETECTION_SAMPLE_SIZE: usize = 8192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("content looks binary")]
    Binary,
    #[error("content is not valid {encoding}")]
    Malformed { encoding: &'static str },
}

/// Text decoded from raw bytes, along with the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if bytes.is_empty() {
        return Ok(DecodedText { text: String::new(), encoding: "utf-8" });
    }

    if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        return decode_strict(UTF_8, rest, "utf-8-sig");
    }
    if let Some(rest) = bytes.strip_prefix(&[0xff, 0xfe]) {
        return decode_strict(UTF_16LE, rest, "utf-16-le");
    }
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        return decode_strict(UTF_16BE, rest, "utf-16-be");
    }

    if looks_binary(bytes) {
        return Err(DecodeError::Binary);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedText { text: text.to_string(), encoding: "utf-8" });
    }

    let mut detector = EncodingDetector::new();
    let sample = &bytes[..bytes.len().min(DETECTION_SAMPLE_SIZE)];
    detector.feed(sample, sample.len() == bytes.len());
    let guessed = detector.guess(None, true);
    let (decoded, had_errors) = guessed.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::Malformed { encoding: guessed.name() });
    }
    Ok(DecodedText { text: decoded.into_owned(), encoding: guessed.name() })
}

/// Null bytes are a strong binary indicator.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(DETECTION_SAMPLE_SIZE)].contains(&0)
}

fn decode_strict(
    encoding: &'static Encoding,
    bytes: &[u8],
    label: &'static str,
) -> Result<DecodedText, DecodeError> {
    let (decoded, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::Malformed { encoding: label });
    }
    Ok(DecodedText { text: decoded.into_owned(), encoding: label })
}
