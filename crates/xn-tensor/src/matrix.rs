use std::ops::{Add, Index, IndexMut, Mul};

use crate::backend::{ComputeBackend, GemmShape};
use crate::cpu::matmul;
use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::vector::Vector;

/// A rank-2, row-major tensor.
pub type Matrix<'a, T> = Tensor<'a, T, 2>;

/// Resolve `[m, k] @ [k, n]` (or `[m, k] @ [n, k]ᵗ`) into GEMM dimensions.
fn gemm_shape<T: Element>(
    a: &Matrix<'_, T>,
    b: &Matrix<'_, T>,
    transpose_b: bool,
) -> Result<GemmShape> {
    let m = a.rows();
    let k = a.cols();
    let (k2, n) = if transpose_b {
        (b.cols(), b.rows())
    } else {
        (b.rows(), b.cols())
    };
    if k != k2 {
        return Err(TensorError::MatmulMismatch { m, k, k2, n });
    }
    Ok(GemmShape {
        m,
        k,
        n,
        transpose_b,
    })
}

impl<'a, T: Element> Tensor<'a, T, 2> {
    pub fn rows(&self) -> usize {
        self.shape().dim(0)
    }

    pub fn cols(&self) -> usize {
        self.shape().dim(1)
    }

    /// Borrowed view of row `i`. No allocation.
    ///
    /// # Panics
    /// Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> Vector<'_, T> {
        assert!(i < self.rows(), "row {} out of range for {} rows", i, self.rows());
        let cols = self.cols();
        Tensor::borrowed(&self.data()[i * cols..(i + 1) * cols], Shape::new([cols]))
    }

    /// Borrowed view of `len` consecutive rows starting at `start`.
    ///
    /// # Panics
    /// Panics if the range extends past the last row.
    pub fn row_range(&self, start: usize, len: usize) -> Matrix<'_, T> {
        assert!(
            start + len <= self.rows(),
            "rows {}..{} out of range for {} rows",
            start,
            start + len,
            self.rows()
        );
        let cols = self.cols();
        Tensor::borrowed(
            &self.data()[start * cols..(start + len) * cols],
            Shape::new([len, cols]),
        )
    }

    /// Overwrite `self` with the transpose of `m`.
    pub fn transpose_from(&mut self, m: &Matrix<'_, T>) -> Result<()> {
        let (rows, cols) = (m.rows(), m.cols());
        self.resize([cols, rows])?;
        let src = m.data();
        let dst = self.data_mut()?;
        for i in 0..rows {
            for j in 0..cols {
                dst[j * rows + i] = src[i * cols + j];
            }
        }
        Ok(())
    }
}

impl<'a, T> Tensor<'a, T, 2>
where
    T: Element + Add<Output = T> + Mul<Output = T>,
{
    /// `self = alpha * self + a · b`, or `a · bᵗ` when `transpose` is set.
    ///
    /// `self` is resized to the product shape first; when the element count
    /// already matches, the existing contents are kept and scaled by `alpha`.
    pub fn mul(
        &mut self,
        a: &Matrix<'_, T>,
        b: &Matrix<'_, T>,
        transpose: bool,
        alpha: T,
    ) -> Result<()> {
        let shape = gemm_shape(a, b, transpose)?;
        self.resize([shape.m, shape.n])?;
        matmul::gemm(a.data(), b.data(), self.data_mut()?, shape, alpha)
    }

    /// Add `v` to every row.
    pub fn add_vec(&mut self, v: &Vector<'_, T>) -> Result<()> {
        let cols = self.cols();
        if v.size() != cols {
            return Err(TensorError::ShapeMismatch {
                expected: vec![cols],
                got: v.dims().to_vec(),
            });
        }
        if cols == 0 {
            return Ok(());
        }
        let bias = v.data();
        for row in self.data_mut()?.chunks_exact_mut(cols) {
            for (x, &b) in row.iter_mut().zip(bias) {
                *x = *x + b;
            }
        }
        Ok(())
    }
}

impl Tensor<'_, f32, 2> {
    /// Same contract as [`Tensor::mul`], with the multiply done by `backend`.
    pub fn mul_with(
        &mut self,
        backend: &dyn ComputeBackend,
        a: &Matrix<'_, f32>,
        b: &Matrix<'_, f32>,
        transpose: bool,
        alpha: f32,
    ) -> Result<()> {
        let shape = gemm_shape(a, b, transpose)?;
        self.resize([shape.m, shape.n])?;
        backend.sgemm(a.data(), b.data(), self.data_mut()?, shape, alpha)
    }
}

impl Tensor<'_, i32, 2> {
    /// `self = (a - zero_a) · (b - zero_b)`, or `· (b - zero_b)ᵗ` when
    /// `transpose` is set.
    ///
    /// Precondition: the inner dimension is at most
    /// [`MAX_INTEGER_GEMM_DEPTH`](crate::MAX_INTEGER_GEMM_DEPTH).
    pub fn integer_mul(
        &mut self,
        a: &Matrix<'_, u8>,
        b: &Matrix<'_, u8>,
        zero_a: u8,
        zero_b: u8,
        transpose: bool,
    ) -> Result<()> {
        let shape = gemm_shape(a, b, transpose)?;
        self.resize([shape.m, shape.n])?;
        matmul::integer_gemm(a.data(), b.data(), self.data_mut()?, shape, zero_a, zero_b)
    }

    /// Same contract as [`Tensor::integer_mul`], computed by `backend`.
    pub fn integer_mul_with(
        &mut self,
        backend: &dyn ComputeBackend,
        a: &Matrix<'_, u8>,
        b: &Matrix<'_, u8>,
        zero_a: u8,
        zero_b: u8,
        transpose: bool,
    ) -> Result<()> {
        let shape = gemm_shape(a, b, transpose)?;
        self.resize([shape.m, shape.n])?;
        backend.igemm(a.data(), b.data(), self.data_mut()?, shape, zero_a, zero_b)
    }
}

impl<T: Element> Index<(usize, usize)> for Tensor<'_, T, 2> {
    type Output = T;

    fn index(&self, (r, c): (usize, usize)) -> &T {
        &self[[r, c]]
    }
}

impl<T: Element> IndexMut<(usize, usize)> for Tensor<'_, T, 2> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        &mut self[[r, c]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuBackend;

    fn m(data: Vec<f32>, rows: usize, cols: usize) -> Matrix<'static, f32> {
        Matrix::from_vec(data, [rows, cols]).unwrap()
    }

    #[test]
    fn test_rows_cols_and_index() {
        let mut a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 3);
        assert_eq!(a[(1, 2)], 6.0);
        a[(0, 1)] = 9.0;
        assert_eq!(a.data()[1], 9.0);
    }

    #[test]
    #[should_panic]
    fn test_col_out_of_range_panics() {
        let a = m(vec![0.0; 4], 2, 2);
        let _ = a[(0, 2)];
    }

    #[test]
    fn test_row_is_borrowed_view() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let r = a.row(1);
        assert!(!r.is_owned());
        assert_eq!(r.data(), &[3.0, 4.0]);
        assert_eq!(r[1], 4.0);
    }

    #[test]
    fn test_row_range() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let r = a.row_range(1, 2);
        assert!(!r.is_owned());
        assert_eq!(r.dims(), &[2, 2]);
        assert_eq!(r[(1, 0)], 5.0);
    }

    #[test]
    #[should_panic]
    fn test_row_range_out_of_bounds() {
        let a = m(vec![0.0; 4], 2, 2);
        let _ = a.row_range(1, 2);
    }

    #[test]
    fn test_mul() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = m(vec![5.0, 6.0, 7.0, 8.0], 2, 2);
        let mut c = Matrix::default();
        c.mul(&a, &b, false, 0.0).unwrap();
        assert_eq!(c.dims(), &[2, 2]);
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_mul_transposed_resizes() {
        // a: [1x3], b: [2x3] -> a · bᵗ is [1x2]
        let a = m(vec![1.0, 2.0, 3.0], 1, 3);
        let b = m(vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0], 2, 3);
        let mut c = m(vec![0.0; 6], 3, 2);
        c.mul(&a, &b, true, 0.0).unwrap();
        assert_eq!(c.dims(), &[1, 2]);
        assert_eq!(c.data(), &[1.0, 5.0]);
    }

    #[test]
    fn test_mul_alpha_accumulates() {
        let a = m(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
        let b = m(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let mut c = m(vec![10.0, 10.0, 10.0, 10.0], 2, 2);
        c.mul(&a, &b, false, 0.5).unwrap();
        assert_eq!(c.data(), &[6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_mul_dimension_mismatch() {
        let a = m(vec![1.0, 2.0, 3.0], 1, 3);
        let b = m(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let mut c = Matrix::default();
        assert!(matches!(
            c.mul(&a, &b, false, 0.0),
            Err(TensorError::MatmulMismatch { m: 1, k: 3, k2: 2, n: 2 })
        ));
        assert!(c.mul(&a, &b, true, 0.0).is_err());
    }

    #[test]
    fn test_mul_with_backend_matches_reference() {
        let a = m(vec![0.5, -1.0, 2.0, 3.0, 0.0, 1.5], 2, 3);
        let b = m(vec![1.0, 2.0, 3.0, -4.0, 5.0, -6.0], 2, 3);
        let mut reference = Matrix::default();
        reference.mul(&a, &b, true, 0.0).unwrap();
        let mut fast = Matrix::default();
        fast.mul_with(&CpuBackend::new(), &a, &b, true, 0.0).unwrap();
        assert_eq!(reference.data(), fast.data());
    }

    #[test]
    fn test_mul_into_view_fails() {
        let a = m(vec![1.0; 4], 2, 2);
        let buf = [0.0f32; 4];
        let mut out = Matrix::view(&buf, [2, 2]).unwrap();
        assert!(matches!(
            out.mul(&a, &a, false, 0.0),
            Err(TensorError::BorrowedWrite)
        ));
    }

    #[test]
    fn test_add_vec() {
        let mut a = m(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let v = Vector::from_vec(vec![10.0, 20.0], [2]).unwrap();
        a.add_vec(&v).unwrap();
        assert_eq!(a.data(), &[11.0, 22.0, 13.0, 24.0]);
    }

    #[test]
    fn test_add_vec_length_mismatch() {
        let mut a = m(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let v = Vector::from_vec(vec![1.0, 2.0, 3.0], [3]).unwrap();
        assert!(a.add_vec(&v).is_err());
    }

    #[test]
    fn test_transpose_from() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let mut t = Matrix::default();
        t.transpose_from(&a).unwrap();
        assert_eq!(t.dims(), &[3, 2]);
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_integer_mul() {
        let a = Matrix::<u8>::from_vec(vec![1, 2, 3, 4], [2, 2]).unwrap();
        let b = Matrix::<u8>::from_vec(vec![5, 6, 7, 8], [2, 2]).unwrap();
        let mut c = Matrix::<i32>::default();
        c.integer_mul(&a, &b, 0, 0, false).unwrap();
        assert_eq!(c.data(), &[19, 22, 43, 50]);

        let mut via_backend = Matrix::<i32>::default();
        via_backend
            .integer_mul_with(&CpuBackend::new(), &a, &b, 1, 5, true)
            .unwrap();
        // (a - 1) = [0,1;2,3], (b - 5) = [0,1;2,3], product with bᵗ:
        // [0*0+1*1, 0*2+1*3; 2*0+3*1, 2*2+3*3] = [1,3;3,13]
        assert_eq!(via_backend.data(), &[1, 3, 3, 13]);
    }
}
