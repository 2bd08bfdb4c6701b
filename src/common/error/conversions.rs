//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::common::binary::BinaryError;

// Every binary read happens while decoding a serialized stream.
impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<std::string::FromUtf16Error> for Error {
    fn from(err: std::string::FromUtf16Error) -> Self {
        Error::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_error_becomes_codec_failure() {
        let err: Error = BinaryError::InsufficientData {
            expected: 8,
            available: 2,
        }
        .into();
        assert!(matches!(err, Error::Codec(ref msg) if msg.contains("expected 8")));
    }
}
