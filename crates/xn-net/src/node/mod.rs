//! Layer variants and their dispatch.

pub mod fully_connect;
pub mod quantize_fully_connect;

use std::fmt;

use xn_tensor::{ComputeBackend, Matrix};

pub use fully_connect::FullyConnect;
pub use quantize_fully_connect::QuantizeFullyConnect;

use crate::error::{ModelError, Result};
use crate::proto::{NodeProto, NodeType};

/// One layer of a network.
#[derive(Debug, Clone)]
pub enum Node {
    Relu,
    Sigmoid,
    Tanh,
    /// Row-wise softmax over the feature axis.
    Softmax,
    FullyConnect(FullyConnect),
    QuantizeFullyConnect(QuantizeFullyConnect),
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Relu => NodeType::Relu,
            Node::Sigmoid => NodeType::Sigmoid,
            Node::Tanh => NodeType::Tanh,
            Node::Softmax => NodeType::Softmax,
            Node::FullyConnect(_) => NodeType::FullyConnect,
            Node::QuantizeFullyConnect(_) => NodeType::QuantizeFullyConnect,
        }
    }

    /// `(in_dim, out_dim)` for the affine layers.
    pub fn dims(&self) -> Option<(usize, usize)> {
        match self {
            Node::FullyConnect(fc) => Some((fc.in_dim(), fc.out_dim())),
            Node::QuantizeFullyConnect(q) => Some((q.in_dim(), q.out_dim())),
            _ => None,
        }
    }

    /// Evaluate the layer on a `[batch, features]` input.
    ///
    /// `output` is resized as needed; the activations keep the input shape.
    pub fn forward(
        &mut self,
        input: &Matrix<'_, f32>,
        output: &mut Matrix<'_, f32>,
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        match self {
            Node::FullyConnect(fc) => fc.forward(input, output, backend),
            Node::QuantizeFullyConnect(q) => q.forward(input, output, backend),
            Node::Relu => {
                output.resize(*input.shape())?;
                Ok(backend.relu(input.data(), output.data_mut()?)?)
            }
            Node::Sigmoid => {
                output.resize(*input.shape())?;
                Ok(backend.sigmoid(input.data(), output.data_mut()?)?)
            }
            Node::Tanh => {
                output.resize(*input.shape())?;
                Ok(backend.tanh(input.data(), output.data_mut()?)?)
            }
            Node::Softmax => {
                output.resize(*input.shape())?;
                Ok(backend.softmax(input.data(), output.data_mut()?, input.cols())?)
            }
        }
    }

    /// The quantized counterpart of this layer. Only `FullyConnect` changes;
    /// every other variant is copied as is.
    pub fn quantize(&self) -> Result<Node> {
        match self {
            Node::FullyConnect(fc) => Ok(Node::QuantizeFullyConnect(fc.quantize()?)),
            other => Ok(other.clone()),
        }
    }

    /// Rebuild a layer from its record.
    ///
    /// # Errors
    /// [`ModelError::MissingParameter`] if the parameter block required by
    /// the record's type is absent.
    pub fn from_proto(proto: &NodeProto) -> Result<Node> {
        match proto.node_type {
            NodeType::FullyConnect => {
                let param = proto.fully_connect_param.as_ref().ok_or(ModelError::MissingParameter {
                    node: NodeType::FullyConnect.name(),
                    param: "fully_connect_param",
                })?;
                Ok(Node::FullyConnect(FullyConnect::from_proto(param)?))
            }
            NodeType::QuantizeFullyConnect => {
                let param = proto.quantize_fully_connect_param.as_ref().ok_or(
                    ModelError::MissingParameter {
                        node: NodeType::QuantizeFullyConnect.name(),
                        param: "quantize_fully_connect_param",
                    },
                )?;
                Ok(Node::QuantizeFullyConnect(QuantizeFullyConnect::from_proto(param)?))
            }
            NodeType::Relu => Ok(Node::Relu),
            NodeType::Sigmoid => Ok(Node::Sigmoid),
            NodeType::Tanh => Ok(Node::Tanh),
            NodeType::Softmax => Ok(Node::Softmax),
        }
    }

    pub fn to_proto(&self) -> NodeProto {
        let mut proto = NodeProto::new(self.node_type());
        match self {
            Node::FullyConnect(fc) => proto.fully_connect_param = Some(fc.to_proto()),
            Node::QuantizeFullyConnect(q) => proto.quantize_fully_connect_param = Some(q.to_proto()),
            _ => {}
        }
        proto
    }
}

impl From<FullyConnect> for Node {
    fn from(fc: FullyConnect) -> Self {
        Node::FullyConnect(fc)
    }
}

impl From<QuantizeFullyConnect> for Node {
    fn from(q: QuantizeFullyConnect) -> Self {
        Node::QuantizeFullyConnect(q)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_type())?;
        if let Some((in_dim, out_dim)) = self.dims() {
            write!(f, " in_dim {} out_dim {}", in_dim, out_dim)?;
        }
        Ok(())
    }
}
