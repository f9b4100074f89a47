//! Symmetric encode/decode of node structures into opaque block bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FilesystemError, Result};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(|e| FilesystemError::Codec(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    postcard::from_bytes(bytes).map_err(|e| FilesystemError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn roundtrip() {
        let s = Sample {
            a: 7,
            b: "hello".into(),
        };
        let bytes = encode(&s).unwrap();
        let back: Sample = decode(&bytes).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = decode::<Sample>(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, FilesystemError::Codec(_)));
    }
}
