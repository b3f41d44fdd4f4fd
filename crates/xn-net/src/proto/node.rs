use std::fmt;
use std::io::{Read, Write};

use crate::error::{ModelError, Result};
use super::io::{read_bool, read_f32, read_i32, read_u32, read_u8, write_bool, write_f32, write_i32, write_u32, write_u8};
use super::tensor::TensorProto;

const HAS_FULLY_CONNECT: u8 = 1 << 0;
const HAS_QUANTIZE_FULLY_CONNECT: u8 = 1 << 1;

/// Layer kind tag stored with every node record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    FullyConnect,
    QuantizeFullyConnect,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl NodeType {
    pub fn from_id(id: u32) -> Result<NodeType> {
        match id {
            0 => Ok(NodeType::FullyConnect),
            1 => Ok(NodeType::QuantizeFullyConnect),
            2 => Ok(NodeType::Relu),
            3 => Ok(NodeType::Sigmoid),
            4 => Ok(NodeType::Tanh),
            5 => Ok(NodeType::Softmax),
            other => Err(ModelError::UnknownNodeType(other)),
        }
    }

    pub fn to_id(self) -> u32 {
        match self {
            NodeType::FullyConnect => 0,
            NodeType::QuantizeFullyConnect => 1,
            NodeType::Relu => 2,
            NodeType::Sigmoid => 3,
            NodeType::Tanh => 4,
            NodeType::Softmax => 5,
        }
    }

    /// Bracketed display name used by the network dump.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::FullyConnect => "<FullyConnect>",
            NodeType::QuantizeFullyConnect => "<QuantizeFullyConnect>",
            NodeType::Relu => "<ReLU>",
            NodeType::Sigmoid => "<Sigmoid>",
            NodeType::Tanh => "<Tanh>",
            NodeType::Softmax => "<Softmax>",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullyConnectParameter {
    pub weight: TensorProto,
    pub bias: Option<TensorProto>,
}

/// Quantized weight: the `u8` codes (stored as INT8) and their mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedWeight {
    pub tensor: TensorProto,
    pub scale: f32,
    pub zero_point: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeFullyConnectParameter {
    pub weight: QuantizedWeight,
    pub bias: Option<TensorProto>,
}

/// Serialized form of one layer.
///
/// Both parameter blocks are optional on the wire; which one a node needs is
/// decided by its type when the node is rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProto {
    pub node_type: NodeType,
    pub fully_connect_param: Option<FullyConnectParameter>,
    pub quantize_fully_connect_param: Option<QuantizeFullyConnectParameter>,
}

impl NodeProto {
    /// A node record with no parameter blocks.
    pub fn new(node_type: NodeType) -> Self {
        NodeProto {
            node_type,
            fully_connect_param: None,
            quantize_fully_connect_param: None,
        }
    }

    pub fn read(reader: &mut impl Read) -> Result<NodeProto> {
        let node_type = NodeType::from_id(read_u32(reader)?)?;
        let mask = read_u8(reader)?;
        let mut node = NodeProto::new(node_type);

        if mask & HAS_FULLY_CONNECT != 0 {
            let weight = TensorProto::read(reader)?;
            let bias = read_optional_tensor(reader)?;
            node.fully_connect_param = Some(FullyConnectParameter { weight, bias });
        }
        if mask & HAS_QUANTIZE_FULLY_CONNECT != 0 {
            let tensor = TensorProto::read(reader)?;
            let scale = read_f32(reader)?;
            let zero_point = read_i32(reader)?;
            let bias = read_optional_tensor(reader)?;
            node.quantize_fully_connect_param = Some(QuantizeFullyConnectParameter {
                weight: QuantizedWeight {
                    tensor,
                    scale,
                    zero_point,
                },
                bias,
            });
        }
        Ok(node)
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        write_u32(writer, self.node_type.to_id())?;
        let mut mask = 0u8;
        if self.fully_connect_param.is_some() {
            mask |= HAS_FULLY_CONNECT;
        }
        if self.quantize_fully_connect_param.is_some() {
            mask |= HAS_QUANTIZE_FULLY_CONNECT;
        }
        write_u8(writer, mask)?;

        if let Some(p) = &self.fully_connect_param {
            p.weight.write(writer)?;
            write_optional_tensor(writer, p.bias.as_ref())?;
        }
        if let Some(p) = &self.quantize_fully_connect_param {
            p.weight.tensor.write(writer)?;
            write_f32(writer, p.weight.scale)?;
            write_i32(writer, p.weight.zero_point)?;
            write_optional_tensor(writer, p.bias.as_ref())?;
        }
        Ok(())
    }
}

fn read_optional_tensor(reader: &mut impl Read) -> Result<Option<TensorProto>> {
    if read_bool(reader)? {
        Ok(Some(TensorProto::read(reader)?))
    } else {
        Ok(None)
    }
}

fn write_optional_tensor(writer: &mut impl Write, t: Option<&TensorProto>) -> Result<()> {
    write_bool(writer, t.is_some())?;
    if let Some(t) = t {
        t.write(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::tensor::DataType;
    use std::io::Cursor;

    fn float_tensor(shape: Vec<i64>, data: Vec<f32>) -> TensorProto {
        let mut t = TensorProto::new(shape, DataType::Float);
        t.float_data = data;
        t
    }

    #[test]
    fn test_node_type_ids_and_names() {
        for id in 0..6 {
            assert_eq!(NodeType::from_id(id).unwrap().to_id(), id);
        }
        assert!(matches!(NodeType::from_id(42), Err(ModelError::UnknownNodeType(42))));
        assert_eq!(NodeType::Relu.to_string(), "<ReLU>");
        assert_eq!(NodeType::QuantizeFullyConnect.name(), "<QuantizeFullyConnect>");
    }

    #[test]
    fn test_activation_node_is_five_bytes() {
        let mut buf = Vec::new();
        NodeProto::new(NodeType::Softmax).write(&mut buf).unwrap();
        assert_eq!(buf, vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_fully_connect_param() {
        let mut node = NodeProto::new(NodeType::FullyConnect);
        node.fully_connect_param = Some(FullyConnectParameter {
            weight: float_tensor(vec![1, 2], vec![0.5, 0.25]),
            bias: Some(float_tensor(vec![1], vec![3.0])),
        });
        let mut buf = Vec::new();
        node.write(&mut buf).unwrap();
        assert_eq!(buf[4], HAS_FULLY_CONNECT);
        assert_eq!(NodeProto::read(&mut Cursor::new(buf)).unwrap(), node);
    }

    #[test]
    fn test_quantized_param_without_bias() {
        let mut codes = TensorProto::new(vec![1, 2], DataType::Int8);
        codes.int32_data = vec![7, 200];
        let mut node = NodeProto::new(NodeType::QuantizeFullyConnect);
        node.quantize_fully_connect_param = Some(QuantizeFullyConnectParameter {
            weight: QuantizedWeight {
                tensor: codes,
                scale: 0.125,
                zero_point: 9,
            },
            bias: None,
        });
        let mut buf = Vec::new();
        node.write(&mut buf).unwrap();
        assert_eq!(buf[4], HAS_QUANTIZE_FULLY_CONNECT);
        let back = NodeProto::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, node);
        assert!(back.fully_connect_param.is_none());
    }
}
