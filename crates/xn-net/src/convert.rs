//! Conversion between in-memory tensors and their serialized records.

use xn_tensor::{DType, Element, Shape, Tensor, TensorError};

use crate::error::{ModelError, Result};
use crate::proto::{DataType, TensorProto};

/// Rebuild a rank-`R` tensor from its record.
///
/// Any stored data type except UNDEFINED is accepted and cast into `T`.
/// The record's rank must equal `R` and its value count must equal the
/// product of its dimensions.
pub fn tensor_from_proto<T: Element, const R: usize>(
    proto: &TensorProto,
) -> Result<Tensor<'static, T, R>> {
    if proto.shape.len() != R {
        return Err(TensorError::RankMismatch {
            expected: R,
            got: proto.shape.len(),
        }
        .into());
    }

    let mut dims = [0usize; R];
    for (d, &s) in dims.iter_mut().zip(&proto.shape) {
        *d = usize::try_from(s)
            .map_err(|_| ModelError::Other(format!("negative dimension {} in tensor record", s)))?;
    }
    let numel = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            ModelError::Other(format!("tensor shape {:?} overflows the element count", proto.shape))
        })?;
    let shape = Shape::new(dims);

    let data: Vec<T> = match proto.data_type {
        DataType::Float => proto.float_data.iter().map(|&v| T::from_f64(f64::from(v))).collect(),
        DataType::Double => proto.double_data.iter().map(|&v| T::from_f64(v)).collect(),
        DataType::Int32 | DataType::Int16 | DataType::Int8 => {
            proto.int32_data.iter().map(|&v| T::from_i32(v)).collect()
        }
        DataType::Undefined => {
            return Err(ModelError::UnsupportedDataType(proto.data_type.to_string()))
        }
    };

    if data.len() != numel {
        return Err(ModelError::ValueCount {
            expected: numel,
            got: data.len(),
        });
    }
    Ok(Tensor::from_vec(data, shape)?)
}

/// Serialize a tensor: `f32` as FLOAT, `i32` as INT32 and `u8` as INT8.
pub fn tensor_to_proto<T: Element, const R: usize>(tensor: &Tensor<'_, T, R>) -> TensorProto {
    let shape = tensor.dims().iter().map(|&d| d as i64).collect();
    match T::DTYPE {
        DType::F32 => {
            let mut proto = TensorProto::new(shape, DataType::Float);
            proto.float_data = tensor.data().iter().map(|v| v.to_f32()).collect();
            proto
        }
        DType::I32 | DType::U8 => {
            let data_type = if T::DTYPE == DType::I32 {
                DataType::Int32
            } else {
                DataType::Int8
            };
            let mut proto = TensorProto::new(shape, data_type);
            proto.int32_data = tensor.data().iter().map(|v| v.to_i32()).collect();
            proto
        }
    }
}
