//! `xn-net` - Sequential layer executor and model codec for xnet.
//!
//! A [`Network`] owns an ordered list of [`Node`]s and evaluates them one
//! after another on a `[batch, features]` matrix. Networks are loaded from
//! and saved to the binary model format in [`proto`], and can produce an
//! 8-bit quantized copy of themselves.

pub mod convert;
pub mod error;
pub mod network;
pub mod node;
pub mod proto;

pub use error::{ModelError, Result};
pub use network::Network;
pub use node::{FullyConnect, Node, QuantizeFullyConnect};
pub use proto::{NetMeta, NetProto, NodeType};
