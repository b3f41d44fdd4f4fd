//! Affine (scale + zero-point) quantization between `f32` and `u8`.
//!
//! A quantized value `q` represents the real number `scale * (q - zero_point)`.
//! Parameters are derived per tensor from that tensor's own min/max, with the
//! range widened to include 0 so that real zero is exactly representable.

use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::matrix::Matrix;

const QMIN: f64 = 0.0;
const QMAX: f64 = 255.0;

/// Parameters of one affine quantization mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: u8,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: u8) -> Self {
        QuantParams { scale, zero_point }
    }

    /// Scan `data` and choose parameters covering its range.
    pub fn from_data(data: &[f32]) -> Self {
        let (min, max) = find_min_max(data);
        choose_quantization_params(min, max)
    }

    /// Map one real value to its quantized code.
    pub fn quantize_value(&self, v: f32) -> u8 {
        if self.scale == 0.0 {
            return self.zero_point;
        }
        let q = f64::from(self.zero_point) + f64::from(v) / f64::from(self.scale);
        q.clamp(QMIN, QMAX).round() as u8
    }

    /// Map one (possibly accumulated) integer code back to a real value.
    ///
    /// The offset is removed in `i64` so any `i32` accumulator is valid.
    pub fn dequantize_value(&self, q: i32) -> f32 {
        self.scale * (i64::from(q) - i64::from(self.zero_point)) as f32
    }
}

/// Minimum and maximum of `data`; `(0.0, 0.0)` when it is empty.
pub fn find_min_max(data: &[f32]) -> (f32, f32) {
    let Some(&first) = data.first() else {
        return (0.0, 0.0);
    };
    data.iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Choose `scale` and `zero_point` for values observed in `[min, max]`.
///
/// The range is first widened to contain 0. A range that collapses to a
/// single point (only possible when all values are 0) yields `scale = 0` and
/// `zero_point = 0`; [`quantize`] and [`dequantize`] treat that case
/// explicitly instead of dividing by zero. Any other range gets a positive
/// scale, at least `f32::MIN_POSITIVE`.
pub fn choose_quantization_params(min: f32, max: f32) -> QuantParams {
    let min = min.min(0.0);
    let max = max.max(0.0);
    if max == min {
        return QuantParams::new(0.0, 0);
    }

    let scale = (((f64::from(max) - f64::from(min)) / QMAX) as f32).max(f32::MIN_POSITIVE);
    let ideal_zero_point = -f64::from(min) / f64::from(scale);
    let zero_point = ideal_zero_point.clamp(QMIN, QMAX).round() as u8;
    QuantParams::new(scale, zero_point)
}

/// `dst[i] = round(clamp(zero_point + src[i] / scale, 0, 255))`.
pub fn quantize(src: &[f32], params: QuantParams, dst: &mut [u8]) -> Result<()> {
    if src.len() != dst.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![src.len()],
            got: vec![dst.len()],
        });
    }
    for (d, &v) in dst.iter_mut().zip(src) {
        *d = params.quantize_value(v);
    }
    Ok(())
}

/// `dst[i] = scale * (src[i] - zero_point)`.
///
/// Accepts raw `u8` codes as well as `i32` GEMM accumulators.
pub fn dequantize<T: Element>(src: &[T], params: QuantParams, dst: &mut [f32]) -> Result<()> {
    if src.len() != dst.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![src.len()],
            got: vec![dst.len()],
        });
    }
    for (d, &q) in dst.iter_mut().zip(src) {
        *d = params.dequantize_value(q.to_i32());
    }
    Ok(())
}

/// Quantize a whole matrix with parameters chosen from its own range.
///
/// `dst` is resized to `src`'s shape. Returns the parameters used.
pub fn quantize_matrix(src: &Matrix<'_, f32>, dst: &mut Matrix<'_, u8>) -> Result<QuantParams> {
    let params = QuantParams::from_data(src.data());
    dst.resize(*src.shape())?;
    quantize(src.data(), params, dst.data_mut()?)?;
    Ok(params)
}

/// Dequantize a matrix of codes or accumulators into `dst`, resizing it.
pub fn dequantize_matrix<T: Element>(
    src: &Matrix<'_, T>,
    params: QuantParams,
    dst: &mut Matrix<'_, f32>,
) -> Result<()> {
    dst.resize(*src.shape())?;
    dequantize(src.data(), params, dst.data_mut()?)
}
