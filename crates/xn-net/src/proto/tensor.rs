use std::fmt;
use std::io::{Read, Write};

use crate::error::{ModelError, Result};
use super::io::{
    read_array, read_f32, read_f64, read_i32, read_i64, read_len, read_u32, write_f32, write_f64,
    write_i32, write_i64, write_len, write_u32,
};

/// Storage type tag of a serialized tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float,
    Double,
    Int32,
    Int16,
    Int8,
    Undefined,
}

impl DataType {
    pub fn from_id(id: u32) -> Result<DataType> {
        match id {
            0 => Ok(DataType::Float),
            1 => Ok(DataType::Double),
            2 => Ok(DataType::Int32),
            3 => Ok(DataType::Int16),
            4 => Ok(DataType::Int8),
            5 => Ok(DataType::Undefined),
            other => Err(ModelError::UnsupportedDataType(format!("id {}", other))),
        }
    }

    pub fn to_id(self) -> u32 {
        match self {
            DataType::Float => 0,
            DataType::Double => 1,
            DataType::Int32 => 2,
            DataType::Int16 => 3,
            DataType::Int8 => 4,
            DataType::Undefined => 5,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Int32 => "INT32",
            DataType::Int16 => "INT16",
            DataType::Int8 => "INT8",
            DataType::Undefined => "UNDEFINED",
        };
        f.write_str(s)
    }
}

/// Serialized form of one tensor.
///
/// Exactly one of the three value arrays is populated, selected by
/// `data_type`: `float_data` for FLOAT, `double_data` for DOUBLE and
/// `int32_data` for every integer width.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorProto {
    pub shape: Vec<i64>,
    pub data_type: DataType,
    pub float_data: Vec<f32>,
    pub double_data: Vec<f64>,
    pub int32_data: Vec<i32>,
}

impl TensorProto {
    pub fn new(shape: Vec<i64>, data_type: DataType) -> Self {
        TensorProto {
            shape,
            data_type,
            float_data: Vec::new(),
            double_data: Vec::new(),
            int32_data: Vec::new(),
        }
    }

    /// Number of values stored in the array selected by `data_type`.
    pub fn value_count(&self) -> usize {
        match self.data_type {
            DataType::Float => self.float_data.len(),
            DataType::Double => self.double_data.len(),
            DataType::Int32 | DataType::Int16 | DataType::Int8 => self.int32_data.len(),
            DataType::Undefined => 0,
        }
    }

    pub fn read(reader: &mut impl Read) -> Result<TensorProto> {
        let n_dims = read_u32(reader)? as usize;
        let mut shape = Vec::with_capacity(n_dims.min(8));
        for _ in 0..n_dims {
            shape.push(read_i64(reader)?);
        }
        let data_type = DataType::from_id(read_u32(reader)?)?;

        let mut proto = TensorProto::new(shape, data_type);
        match data_type {
            DataType::Float => proto.float_data = read_array(reader, |r| read_f32(r))?,
            DataType::Double => proto.double_data = read_array(reader, |r| read_f64(r))?,
            DataType::Int32 | DataType::Int16 | DataType::Int8 => {
                proto.int32_data = read_array(reader, |r| read_i32(r))?
            }
            DataType::Undefined => {
                let n = read_len(reader)?;
                if n != 0 {
                    return Err(ModelError::UnsupportedDataType(format!(
                        "{} tensor carrying {} values",
                        data_type, n
                    )));
                }
            }
        }
        Ok(proto)
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        write_u32(writer, self.shape.len() as u32)?;
        for &d in &self.shape {
            write_i64(writer, d)?;
        }
        write_u32(writer, self.data_type.to_id())?;
        write_len(writer, self.value_count())?;
        match self.data_type {
            DataType::Float => {
                for &v in &self.float_data {
                    write_f32(writer, v)?;
                }
            }
            DataType::Double => {
                for &v in &self.double_data {
                    write_f64(writer, v)?;
                }
            }
            DataType::Int32 | DataType::Int16 | DataType::Int8 => {
                for &v in &self.int32_data {
                    write_i32(writer, v)?;
                }
            }
            DataType::Undefined => {}
        }
        Ok(())
    }
}
