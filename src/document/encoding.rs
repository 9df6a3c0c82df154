//! Charset correction
//!
//! Publishers frequently mislabel their documents (a `Content-Type` or XML
//! declaration claiming UTF-8 over Latin-1 bytes, or the reverse). The
//! declared charset is therefore ignored: a BOM wins when present, otherwise
//! the encoding is guessed from the content itself.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Text decoded from raw document bytes
#[derive(Debug, Clone)]
pub struct DecodedDocument {
    pub text: String,
    /// Encoding the bytes were decoded with
    pub encoding: &'static Encoding,
    /// True when malformed sequences were replaced during decoding
    pub had_errors: bool,
}

/// Decodes raw bytes using BOM sniffing, then content-based detection
pub fn decode_document(bytes: &[u8]) -> DecodedDocument {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Replacement characters introduced decoding as {}", used.name());
    }

    DecodedDocument {
        text: text.into_owned(),
        encoding: used,
        had_errors,
    }
}
