use std::fmt::Debug;

use crate::error::Result;

/// Dimensions of a single GEMM call.
///
/// `a` is `[m, k]`. `b` is `[k, n]`, or `[n, k]` when `transpose_b` is set.
/// The output is `[m, n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmShape {
    pub m: usize,
    pub k: usize,
    pub n: usize,
    pub transpose_b: bool,
}

/// Trait for pluggable compute backends.
///
/// Kernels write into caller-provided output slices so that the executor can
/// keep reusing the same buffers from one forward pass to the next. A BLAS
/// binding would implement the same contract for `sgemm`.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Float GEMM: `c = alpha * c + a · b` (or `a · bᵗ`).
    fn sgemm(&self, a: &[f32], b: &[f32], c: &mut [f32], shape: GemmShape, alpha: f32)
        -> Result<()>;

    /// Integer GEMM on zero-point-shifted operands:
    /// `c = (a - zero_a) · (b - zero_b)` (or `· (b - zero_b)ᵗ`).
    ///
    /// The zero points are removed here, exactly once per operand; callers
    /// pass the stored quantized buffers untouched. Accumulation is in `i32`,
    /// so `k` must not exceed [`MAX_INTEGER_GEMM_DEPTH`](crate::MAX_INTEGER_GEMM_DEPTH).
    fn igemm(
        &self,
        a: &[u8],
        b: &[u8],
        c: &mut [i32],
        shape: GemmShape,
        zero_a: u8,
        zero_b: u8,
    ) -> Result<()>;

    /// Element-wise `max(x, 0)`.
    fn relu(&self, x: &[f32], out: &mut [f32]) -> Result<()>;

    /// Element-wise logistic function `1 / (1 + exp(-x))`.
    fn sigmoid(&self, x: &[f32], out: &mut [f32]) -> Result<()>;

    /// Element-wise hyperbolic tangent.
    fn tanh(&self, x: &[f32], out: &mut [f32]) -> Result<()>;

    /// Softmax over consecutive rows of `row_len` elements.
    ///
    /// For each row: out[i] = exp(x[i] - max(x)) / sum(exp(x[j] - max(x)))
    fn softmax(&self, x: &[f32], out: &mut [f32], row_len: usize) -> Result<()>;
}
