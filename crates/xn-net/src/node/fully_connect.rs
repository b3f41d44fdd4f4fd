use xn_tensor::quant::quantize_matrix;
use xn_tensor::{ComputeBackend, Matrix, TensorError, Vector};

use crate::convert::{tensor_from_proto, tensor_to_proto};
use crate::error::Result;
use crate::proto::FullyConnectParameter;
use super::quantize_fully_connect::QuantizeFullyConnect;

/// Affine layer: `output = input · weightᵗ + bias`.
#[derive(Debug, Clone)]
pub struct FullyConnect {
    /// Shape [out_dim, in_dim].
    weight: Matrix<'static, f32>,
    /// Length out_dim.
    bias: Option<Vector<'static, f32>>,
}

impl FullyConnect {
    /// Create a layer from a `[out_dim, in_dim]` weight and an optional
    /// bias of length `out_dim`.
    pub fn new(weight: Matrix<'static, f32>, bias: Option<Vector<'static, f32>>) -> Result<Self> {
        check_bias(weight.rows(), bias.as_ref())?;
        Ok(FullyConnect { weight, bias })
    }

    pub fn in_dim(&self) -> usize {
        self.weight.cols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.rows()
    }

    pub fn weight(&self) -> &Matrix<'static, f32> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Vector<'static, f32>> {
        self.bias.as_ref()
    }

    /// `input` is `[batch, in_dim]`; `output` is resized to `[batch, out_dim]`.
    pub fn forward(
        &self,
        input: &Matrix<'_, f32>,
        output: &mut Matrix<'_, f32>,
        backend: &dyn ComputeBackend,
    ) -> Result<()> {
        output.mul_with(backend, input, &self.weight, true, 0.0)?;
        if let Some(bias) = &self.bias {
            output.add_vec(bias)?;
        }
        Ok(())
    }

    /// Quantize the whole weight tensor with one set of parameters.
    pub fn quantize(&self) -> Result<QuantizeFullyConnect> {
        let mut codes = Matrix::<u8>::default();
        let params = quantize_matrix(&self.weight, &mut codes)?;
        tracing::debug!(
            "quantized fully-connect weight {}: scale={} zero_point={}",
            self.weight.shape(),
            params.scale,
            params.zero_point
        );
        QuantizeFullyConnect::new(codes, params, self.bias.clone())
    }

    pub fn from_proto(param: &FullyConnectParameter) -> Result<Self> {
        let weight = tensor_from_proto(&param.weight)?;
        let bias = param.bias.as_ref().map(tensor_from_proto).transpose()?;
        FullyConnect::new(weight, bias)
    }

    pub fn to_proto(&self) -> FullyConnectParameter {
        FullyConnectParameter {
            weight: tensor_to_proto(&self.weight),
            bias: self.bias.as_ref().map(tensor_to_proto),
        }
    }
}

/// A bias, when present, must have one entry per output.
pub(crate) fn check_bias(out_dim: usize, bias: Option<&Vector<'_, f32>>) -> Result<()> {
    match bias {
        Some(b) if b.size() != out_dim => Err(TensorError::ShapeMismatch {
            expected: vec![out_dim],
            got: b.dims().to_vec(),
        }
        .into()),
        _ => Ok(()),
    }
}
