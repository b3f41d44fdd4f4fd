use xn_tensor::quant::{dequantize_matrix, quantize_matrix};
use xn_tensor::{ComputeBackend, Matrix, QuantParams, Vector};

use crate::convert::{tensor_from_proto, tensor_to_proto};
use crate::error::{ModelError, Result};
use crate::proto::{QuantizeFullyConnectParameter, QuantizedWeight};
use super::fully_connect::check_bias;

/// Per-call working buffers, reused across forward passes.
#[derive(Debug, Clone, Default)]
struct Scratch {
    input: Matrix<'static, u8>,
    accum: Matrix<'static, i32>,
}

/// Affine layer over an 8-bit quantized weight.
///
/// The input batch is quantized on every call with parameters taken from
/// that batch alone, multiplied in integer arithmetic, and the `i32` result
/// is mapped back to `f32` with `scale = in_scale * weight_scale` and a zero
/// point of 0.
#[derive(Debug, Clone)]
pub struct QuantizeFullyConnect {
    /// Codes of shape [out_dim, in_dim].
    weight: Matrix<'static, u8>,
    weight_params: QuantParams,
    bias: Option<Vector<'static, f32>>,
    scratch: Scratch,
}

impl QuantizeFullyConnect {
    pub fn new(
        weight: Matrix<'static, u8>,
        weight_params: QuantParams,
        bias: Option<Vector<'static, f32>>,
    ) -> Result<Self> {
        check_bias(weight.rows(), bias.as_ref())?;
        Ok(QuantizeFullyConnect {
            weight,
            weight_params,
            bias,
            scratch: Scratch::default(),
        })
    }

    pub fn in_dim(&self) -> usize {
        self.weight.cols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.rows()
    }

    pub fn weight(&self) -> &Matrix<'static, u8> {
        &self.weight
    }

    pub fn weight_params(&self) -> QuantParams {
        self.weight_params
    }

    pub fn bias(&self) -> Option<&Vector<'static, f32>> {
        self.bias.as_ref()
    }

    /// Takes `&mut self` only for the scratch buffers; the result depends on
    /// the weights and `input` alone.
    pub fn forward(
        &mut self,
        input: &Matrix<'_, f32>,
        output: &mut Matrix<'_, f32>,
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        let Scratch {
            input: codes,
            accum,
        } = &mut self.scratch;

        let in_params = quantize_matrix(input, codes)?;
        accum.integer_mul_with(
            backend,
            codes,
            &self.weight,
            in_params.zero_point,
            self.weight_params.zero_point,
            true,
        )?;

        let out_params = QuantParams::new(in_params.scale * self.weight_params.scale, 0);
        dequantize_matrix(accum, out_params, output)?;
        if let Some(bias) = &self.bias {
            output.add_vec(bias)?;
        }
        Ok(())
    }

    /// Rebuild from a record. The stored zero point must fit in `u8`.
    pub fn from_proto(param: &QuantizeFullyConnectParameter) -> Result<Self> {
        let zero_point = u8::try_from(param.weight.zero_point)
            .map_err(|_| ModelError::ZeroPointOutOfRange(param.weight.zero_point))?;
        let weight = tensor_from_proto(&param.weight.tensor)?;
        let bias = param.bias.as_ref().map(tensor_from_proto).transpose()?;
        QuantizeFullyConnect::new(weight, QuantParams::new(param.weight.scale, zero_point), bias)
    }

    pub fn to_proto(&self) -> QuantizeFullyConnectParameter {
        QuantizeFullyConnectParameter {
            weight: QuantizedWeight {
                tensor: tensor_to_proto(&self.weight),
                scale: self.weight_params.scale,
                zero_point: i32::from(self.weight_params.zero_point),
            },
            bias: self.bias.as_ref().map(tensor_to_proto),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FullyConnect;
    use approx::assert_abs_diff_eq;
    use xn_tensor::CpuBackend;

    #[test]
    fn test_matches_float_layer_within_quantization_error() {
        let w = Matrix::from_vec(vec![0.5, -0.25, 1.0, 0.75, -1.0, 0.1], [2, 3]).unwrap();
        let b = Vector::from_vec(vec![0.1, -0.2], [2]).unwrap();
        let fc = FullyConnect::new(w, Some(b)).unwrap();
        let mut qfc = fc.quantize().unwrap();

        let x = Matrix::from_vec(vec![0.3, -0.7, 0.9, 1.0, 0.0, -0.5], [2, 3]).unwrap();
        let backend = CpuBackend::new();
        let mut expected = Matrix::default();
        fc.forward(&x, &mut expected, &backend).unwrap();
        let mut got = Matrix::default();
        qfc.forward(&x, &mut got, &backend).unwrap();

        assert_eq!(got.dims(), expected.dims());
        for (&g, &e) in got.data().iter().zip(expected.data()) {
            assert_abs_diff_eq!(g, e, epsilon = 0.05);
        }
    }

    #[test]
    fn test_exact_when_values_are_representable() {
        // Codes 0..=255 with scale 1 and zero point 0 represent 0..=255 exactly.
        let w = Matrix::from_vec(vec![2u8, 3], [1, 2]).unwrap();
        let mut qfc = QuantizeFullyConnect::new(w, QuantParams::new(1.0, 0), None).unwrap();
        let x = Matrix::from_vec(vec![0.0, 255.0], [1, 2]).unwrap();
        let mut y = Matrix::default();
        qfc.forward(&x, &mut y, &CpuBackend::new()).unwrap();
        assert_abs_diff_eq!(y[(0, 0)], 765.0, epsilon = 1e-3);
    }

    #[test]
    fn test_repeated_forward_is_deterministic() {
        let w = Matrix::from_vec(vec![10u8, 200, 128, 7], [2, 2]).unwrap();
        let mut qfc = QuantizeFullyConnect::new(w, QuantParams::new(0.02, 128), None).unwrap();
        let backend = CpuBackend::new();
        let x = Matrix::from_vec(vec![0.25, -1.5, 3.0, 0.0], [2, 2]).unwrap();
        let mut a = Matrix::default();
        let mut b = Matrix::default();
        qfc.forward(&x, &mut a, &backend).unwrap();
        qfc.forward(&x, &mut b, &backend).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_zero_point_out_of_range() {
        let w = Matrix::from_vec(vec![1u8], [1, 1]).unwrap();
        let qfc = QuantizeFullyConnect::new(w, QuantParams::new(0.5, 3), None).unwrap();
        let mut param = qfc.to_proto();
        param.weight.zero_point = 256;
        assert!(matches!(
            QuantizeFullyConnect::from_proto(&param),
            Err(ModelError::ZeroPointOutOfRange(256))
        ));
    }

    #[test]
    fn test_proto_round_trip() {
        let w = Matrix::from_vec(vec![0u8, 64, 191, 255], [2, 2]).unwrap();
        let b = Vector::from_vec(vec![1.0, 2.0], [2]).unwrap();
        let qfc = QuantizeFullyConnect::new(w, QuantParams::new(0.25, 64), Some(b)).unwrap();
        let back = QuantizeFullyConnect::from_proto(&qfc.to_proto()).unwrap();
        assert_eq!(back.weight().data(), &[0, 64, 191, 255]);
        assert_eq!(back.weight_params(), QuantParams::new(0.25, 64));
        assert_eq!(back.bias().unwrap().data(), &[1.0, 2.0]);
    }
}
