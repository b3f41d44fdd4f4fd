//! Binary model file codec.
//!
//! A file is a header (magic, format version, model version, doc string and
//! node count) followed by one record per node. All integers are
//! little-endian.

pub mod header;
pub(crate) mod io;
pub mod node;
pub mod tensor;

use std::io::{Read, Write};

pub use header::{NetHeader, NetMeta, FORMAT_VERSION, XNET_MAGIC};
pub use node::{
    FullyConnectParameter, NodeProto, NodeType, QuantizeFullyConnectParameter, QuantizedWeight,
};
pub use tensor::{DataType, TensorProto};

use crate::error::Result;

/// Serialized form of a whole network.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetProto {
    pub meta: NetMeta,
    pub nodes: Vec<NodeProto>,
}

impl NetProto {
    pub fn read(reader: &mut impl Read) -> Result<NetProto> {
        let header = NetHeader::parse(reader)?;
        let capacity = usize::try_from(header.n_nodes).unwrap_or(usize::MAX).min(1024);
        let mut nodes = Vec::with_capacity(capacity);
        for _ in 0..header.n_nodes {
            nodes.push(NodeProto::read(reader)?);
        }
        Ok(NetProto {
            meta: header.meta,
            nodes,
        })
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        let header = NetHeader {
            meta: self.meta.clone(),
            n_nodes: self.nodes.len() as u64,
        };
        header.write(writer)?;
        for node in &self.nodes {
            node.write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use std::io::Cursor;

    #[test]
    fn test_net_round_trip() {
        let mut fc = NodeProto::new(NodeType::FullyConnect);
        let mut w = TensorProto::new(vec![1, 1], DataType::Float);
        w.float_data = vec![2.0];
        fc.fully_connect_param = Some(FullyConnectParameter {
            weight: w,
            bias: None,
        });
        let net = NetProto {
            meta: NetMeta {
                version: 1,
                doc: "tiny".to_string(),
            },
            nodes: vec![fc, NodeProto::new(NodeType::Relu)],
        };

        let mut buf = Vec::new();
        net.write(&mut buf).unwrap();
        assert_eq!(NetProto::read(&mut Cursor::new(buf)).unwrap(), net);
    }

    #[test]
    fn test_missing_node_records() {
        let net = NetProto {
            meta: NetMeta::default(),
            nodes: vec![NodeProto::new(NodeType::Tanh)],
        };
        let mut buf = Vec::new();
        net.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 5);
        assert!(matches!(
            NetProto::read(&mut Cursor::new(buf)),
            Err(ModelError::Io(_))
        ));
    }

    #[test]
    fn test_huge_node_count_fails_on_read() {
        let header = NetHeader {
            meta: NetMeta::default(),
            n_nodes: u64::MAX,
        };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        NodeProto::new(NodeType::Relu).write(&mut buf).unwrap();
        assert!(matches!(
            NetProto::read(&mut Cursor::new(buf)),
            Err(ModelError::Io(_))
        ));
    }
}
