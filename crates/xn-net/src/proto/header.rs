use std::io::{Read, Write};

use crate::error::{ModelError, Result};
use super::io::{read_string, read_u32, read_u64, write_string, write_u32, write_u64};

/// The four-byte magic number identifying a model file: ASCII "XNET".
pub const XNET_MAGIC: [u8; 4] = *b"XNET";

/// Container format version written and accepted by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Model-level metadata carried in the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetMeta {
    /// Model version chosen by whoever produced the file.
    pub version: u32,
    /// Free-form description.
    pub doc: String,
}

impl Default for NetMeta {
    fn default() -> Self {
        NetMeta {
            version: 1,
            doc: String::new(),
        }
    }
}

/// Parsed model file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetHeader {
    pub meta: NetMeta,
    /// Number of node records following the header.
    pub n_nodes: u64,
}

impl NetHeader {
    /// Parse a header from the beginning of a reader.
    ///
    /// Validates the magic and the container format version, then reads the
    /// model version, doc string and node count.
    pub fn parse(reader: &mut impl Read) -> Result<NetHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != XNET_MAGIC {
            return Err(ModelError::InvalidMagic(magic));
        }

        let format = read_u32(reader)?;
        if format != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(format));
        }

        let version = read_u32(reader)?;
        let doc = read_string(reader)?;
        let n_nodes = read_u64(reader)?;

        Ok(NetHeader {
            meta: NetMeta { version, doc },
            n_nodes,
        })
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&XNET_MAGIC)?;
        write_u32(writer, FORMAT_VERSION)?;
        write_u32(writer, self.meta.version)?;
        write_string(writer, &self.meta.doc)?;
        write_u64(writer, self.n_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_round_trip() {
        let h = NetHeader {
            meta: NetMeta {
                version: 3,
                doc: "mnist mlp".to_string(),
            },
            n_nodes: 4,
        };
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"XNET");
        assert_eq!(NetHeader::parse(&mut Cursor::new(buf)).unwrap(), h);
    }

    #[test]
    fn test_bad_magic() {
        let buf = b"GGUF\x01\x00\x00\x00".to_vec();
        assert!(matches!(
            NetHeader::parse(&mut Cursor::new(buf)),
            Err(ModelError::InvalidMagic(m)) if &m == b"GGUF"
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let mut buf = XNET_MAGIC.to_vec();
        buf.extend_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            NetHeader::parse(&mut Cursor::new(buf)),
            Err(ModelError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_default_meta() {
        let m = NetMeta::default();
        assert_eq!(m.version, 1);
        assert!(m.doc.is_empty());
    }
}
