//! `xn-tensor` - Typed tensors and quantized arithmetic for xnet.
//!
//! This crate provides:
//! - A rank-fixed, dtype-generic `Tensor` that either owns its buffer or
//!   borrows a read-only view of someone else's
//! - `Matrix` / `Vector` specializations with GEMM, bias broadcast, transpose
//!   and row views
//! - Affine `u8` quantization (`QuantParams`, `quantize`, `dequantize`)
//! - A `ComputeBackend` trait with a reference `CpuBackend`, including the
//!   zero-point-aware integer GEMM

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod matrix;
pub mod quant;
pub mod shape;
pub mod storage;
pub mod tensor;
pub mod vector;

// Re-export primary types at the crate root for convenience.
pub use backend::{ComputeBackend, GemmShape};
pub use cpu::matmul::MAX_INTEGER_GEMM_DEPTH;
pub use cpu::CpuBackend;
pub use dtype::{DType, Element};
pub use error::{Result, TensorError};
pub use matrix::Matrix;
pub use quant::QuantParams;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;
pub use vector::Vector;
