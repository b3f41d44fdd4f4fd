pub mod matmul;
pub mod unary;

use crate::backend::{ComputeBackend, GemmShape};
use crate::error::Result;

/// Pure-Rust CPU compute backend.
///
/// Implements all operations with straightforward loops optimized for
/// correctness rather than peak performance. Intended as a reference
/// implementation and fallback.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn sgemm(
        &self,
        a: &[f32],
        b: &[f32],
        c: &mut [f32],
        shape: GemmShape,
        alpha: f32,
    ) -> Result<()> {
        matmul::gemm(a, b, c, shape, alpha)
    }

    fn igemm(
        &self,
        a: &[u8],
        b: &[u8],
        c: &mut [i32],
        shape: GemmShape,
        zero_a: u8,
        zero_b: u8,
    ) -> Result<()> {
        matmul::integer_gemm(a, b, c, shape, zero_a, zero_b)
    }

    fn relu(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        unary::relu(x, out)
    }

    fn sigmoid(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        unary::sigmoid(x, out)
    }

    fn tanh(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        unary::tanh(x, out)
    }

    fn softmax(&self, x: &[f32], out: &mut [f32], row_len: usize) -> Result<()> {
        unary::softmax(x, out, row_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> CpuBackend {
        CpuBackend::new()
    }

    #[test]
    fn test_name() {
        assert_eq!(backend().name(), "cpu");
    }

    #[test]
    fn test_sgemm_identity() {
        let b = backend();
        // 2x2 identity @ [1,2;3,4]
        let mut c = vec![0.0f32; 4];
        let shape = GemmShape {
            m: 2,
            k: 2,
            n: 2,
            transpose_b: false,
        };
        b.sgemm(&[1.0, 0.0, 0.0, 1.0], &[1.0, 2.0, 3.0, 4.0], &mut c, shape, 0.0)
            .unwrap();
        assert_eq!(c, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_igemm_through_trait_object() {
        let b: Box<dyn ComputeBackend> = Box::new(backend());
        let mut c = vec![0i32; 2];
        let shape = GemmShape {
            m: 1,
            k: 2,
            n: 2,
            transpose_b: true,
        };
        // (a - 1) = [1, 2]; rows of (b - 2): [1, 0], [0, 3]
        b.igemm(&[2, 3], &[3, 2, 2, 5], &mut c, shape, 1, 2).unwrap();
        assert_eq!(c, vec![1, 6]);
    }
}
