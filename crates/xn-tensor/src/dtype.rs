use std::fmt;

/// Element types a tensor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 32-bit signed integer, used for integer GEMM accumulators.
    I32,
    /// 8-bit unsigned integer, used for affine-quantized data.
    U8,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::U8 => 1,
        }
    }

    /// Returns true for the 8-bit quantized element type.
    pub fn is_quantized(&self) -> bool {
        matches!(self, DType::U8)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::I32 => write!(f, "i32"),
            DType::U8 => write!(f, "u8"),
        }
    }
}

/// A scalar type that can be stored in a [`Tensor`](crate::Tensor).
///
/// Implemented for exactly `f32`, `i32` and `u8`. The conversions mirror the
/// model file's data arrays: floats travel as `float_data`, integers of any
/// width as `int32_data`, and every stored array may be cast into any element
/// type on load.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag for this element type.
    const DTYPE: DType;

    fn from_f64(v: f64) -> Self;
    fn from_i32(v: i32) -> Self;
    fn to_f32(self) -> f32;
    fn to_i32(self) -> i32;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn from_i32(v: i32) -> Self {
        v as f32
    }

    fn to_f32(self) -> f32 {
        self
    }

    fn to_i32(self) -> i32 {
        self as i32
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;

    fn from_f64(v: f64) -> Self {
        v as i32
    }

    fn from_i32(v: i32) -> Self {
        v
    }

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_i32(self) -> i32 {
        self
    }
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;

    fn from_f64(v: f64) -> Self {
        v as u8
    }

    // Same truncating cast the integer data arrays have always used.
    fn from_i32(v: i32) -> Self {
        v as u8
    }

    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    fn to_i32(self) -> i32 {
        i32::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::U8.size_in_bytes(), 1);
    }

    #[test]
    fn test_element_tags() {
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
        assert!(u8::DTYPE.is_quantized());
        assert!(!f32::DTYPE.is_quantized());
    }

    #[test]
    fn test_casts() {
        assert_eq!(u8::from_i32(255), 255u8);
        assert_eq!(u8::from_i32(200).to_i32(), 200);
        assert_eq!(f32::from_f64(0.5), 0.5f32);
        assert_eq!(i32::from_f64(-3.0), -3);
        assert_eq!(7u8.to_f32(), 7.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::U8.to_string(), "u8");
        assert_eq!(DType::I32.to_string(), "i32");
    }
}
