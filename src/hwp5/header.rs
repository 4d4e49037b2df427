//! FileHeader parsing for HWP 5.x documents.

use crate::error::{Error, Result};

/// HWP 5.x file header signature.
pub(crate) const HWP_SIGNATURE: &[u8] = b"HWP Document File";

/// FileHeader stream is always at least 256 bytes.
const FILE_HEADER_SIZE: usize = 256;

/// Property flag bits.
mod flags {
    /// Body streams are raw-deflate compressed
    pub const COMPRESSED: u32 = 1 << 0;
    /// Document is encrypted
    pub const ENCRYPTED: u32 = 1 << 1;
}

/// HWP 5.x FileHeader structure.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Document version (major.minor.build.revision)
    pub version: Version,
    /// Attribute flags word
    pub properties: u32,
}

impl FileHeader {
    /// Parses a FileHeader from the raw stream bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(Error::NotHwp(format!(
                "FileHeader too small: {} bytes, expected {}",
                data.len(),
                FILE_HEADER_SIZE
            )));
        }

        // First 17 bytes are the signature, null-padded to 32
        if &data[..HWP_SIGNATURE.len()] != HWP_SIGNATURE {
            return Err(Error::NotHwp("missing HWP signature".into()));
        }

        // Version quad at offset 32, stored revision-first
        let version = Version {
            major: data[35],
            minor: data[34],
            build: data[33],
            revision: data[32],
        };

        // Attribute flags at offset 36, little-endian
        let properties = u32::from_le_bytes([data[36], data[37], data[38], data[39]]);

        Ok(Self {
            version,
            properties,
        })
    }

    /// Returns true if body streams are compressed.
    pub fn is_compressed(&self) -> bool {
        self.properties & flags::COMPRESSED != 0
    }

    /// Returns true if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.properties & flags::ENCRYPTED != 0
    }
}

/// HWP document version quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub revision: u8,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(flags: u32) -> Vec<u8> {
        let mut data = vec![0u8; 256];
        data[..17].copy_from_slice(b"HWP Document File");
        // Version 5.1.0.1
        data[32] = 1; // revision
        data[33] = 0; // build
        data[34] = 1; // minor
        data[35] = 5; // major
        data[36..40].copy_from_slice(&flags.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_header() {
        let header = FileHeader::parse(&header_bytes(0x01)).unwrap();
        assert_eq!(header.version.to_string(), "5.1.0.1");
        assert!(header.is_compressed());
        assert!(!header.is_encrypted());
    }

    #[test]
    fn test_encrypted_flag() {
        let header = FileHeader::parse(&header_bytes(0x03)).unwrap();
        assert!(header.is_compressed());
        assert!(header.is_encrypted());
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut data = vec![0u8; 256];
        data[..17].copy_from_slice(b"Not A Hwp Documen");
        assert!(matches!(
            FileHeader::parse(&data),
            Err(Error::NotHwp(_))
        ));
    }

    #[test]
    fn test_rejects_short_header() {
        assert!(matches!(
            FileHeader::parse(&[0u8; 64]),
            Err(Error::NotHwp(_))
        ));
    }
}
