use std::ops::{Add, Mul};

use crate::backend::GemmShape;
use crate::dtype::Element;
use crate::error::{Result, TensorError};

/// Largest contraction length for which the integer GEMM cannot overflow its
/// `i32` accumulator: `k * 255 * 255 <= i32::MAX`.
pub const MAX_INTEGER_GEMM_DEPTH: usize = i32::MAX as usize / (255 * 255);

pub(crate) fn check_lens(
    op: &str,
    a_len: usize,
    b_len: usize,
    c_len: usize,
    shape: GemmShape,
) -> Result<()> {
    let GemmShape { m, k, n, .. } = shape;
    if a_len != m * k {
        return Err(TensorError::Other(format!(
            "{}: a.len()={} but expected m*k={}",
            op,
            a_len,
            m * k
        )));
    }
    if b_len != k * n {
        return Err(TensorError::Other(format!(
            "{}: b.len()={} but expected k*n={}",
            op,
            b_len,
            k * n
        )));
    }
    if c_len != m * n {
        return Err(TensorError::Other(format!(
            "{}: c.len()={} but expected m*n={}",
            op,
            c_len,
            m * n
        )));
    }
    Ok(())
}

/// Reference GEMM for any numeric element type.
///
/// Scales the existing contents of `c` by `alpha`, then accumulates the
/// product row by row. With `alpha == 0` the old contents of `c` are never
/// read, so stale non-finite values cannot leak into the result.
pub fn gemm<T>(a: &[T], b: &[T], c: &mut [T], shape: GemmShape, alpha: T) -> Result<()>
where
    T: Element + Add<Output = T> + Mul<Output = T>,
{
    check_lens("gemm", a.len(), b.len(), c.len(), shape)?;
    let GemmShape {
        m,
        k,
        n,
        transpose_b,
    } = shape;
    let overwrite = alpha == T::default();

    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut sum = if overwrite {
                T::default()
            } else {
                alpha * c[i * n + j]
            };
            for p in 0..k {
                let bv = if transpose_b { b[j * k + p] } else { b[p * n + j] };
                sum = sum + a_row[p] * bv;
            }
            c[i * n + j] = sum;
        }
    }
    Ok(())
}

/// Integer GEMM over zero-point-shifted `u8` operands into `i32`.
pub fn integer_gemm(
    a: &[u8],
    b: &[u8],
    c: &mut [i32],
    shape: GemmShape,
    zero_a: u8,
    zero_b: u8,
) -> Result<()> {
    check_lens("integer_gemm", a.len(), b.len(), c.len(), shape)?;
    let GemmShape {
        m,
        k,
        n,
        transpose_b,
    } = shape;
    debug_assert!(
        k <= MAX_INTEGER_GEMM_DEPTH,
        "integer_gemm: k={} may overflow the i32 accumulator",
        k
    );

    let za = i32::from(zero_a);
    let zb = i32::from(zero_b);
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = 0i32;
            for p in 0..k {
                let bv = if transpose_b { b[j * k + p] } else { b[p * n + j] };
                acc += (i32::from(a_row[p]) - za) * (i32::from(bv) - zb);
            }
            c[i * n + j] = acc;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(m: usize, k: usize, n: usize, transpose_b: bool) -> GemmShape {
        GemmShape {
            m,
            k,
            n,
            transpose_b,
        }
    }

    #[test]
    fn test_gemm_basic() {
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let mut c = vec![0.0f32; 4];
        gemm(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0], &mut c, shape(2, 2, 2, false), 0.0)
            .unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_transposed() {
        // b stored as [n, k]; [1,2;3,4] @ [5,7;6,8]^T is the same product as above.
        let mut c = vec![0.0f32; 4];
        gemm(&[1.0, 2.0, 3.0, 4.0], &[5.0, 7.0, 6.0, 8.0], &mut c, shape(2, 2, 2, true), 0.0)
            .unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_alpha_keeps_existing() {
        let mut c = vec![1i32, 1, 1, 1];
        gemm(&[1, 0, 0, 1], &[2, 3, 4, 5], &mut c, shape(2, 2, 2, false), 2).unwrap();
        assert_eq!(c, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_gemm_zero_alpha_ignores_stale_output() {
        let mut c = vec![f32::INFINITY, f32::NAN];
        gemm(&[2.0], &[3.0, 4.0], &mut c, shape(1, 1, 2, false), 0.0).unwrap();
        assert_eq!(c, vec![6.0, 8.0]);
    }

    #[test]
    fn test_gemm_length_mismatch() {
        let mut c = vec![0.0f32; 4];
        assert!(gemm(&[1.0; 3], &[1.0; 4], &mut c, shape(2, 2, 2, false), 0.0).is_err());
    }

    #[test]
    fn test_integer_gemm_no_zero_points() {
        let mut c = vec![0i32; 4];
        integer_gemm(&[1, 2, 3, 4], &[5, 6, 7, 8], &mut c, shape(2, 2, 2, false), 0, 0).unwrap();
        assert_eq!(c, vec![19, 22, 43, 50]);
    }

    #[test]
    fn test_integer_gemm_removes_zero_points() {
        // (a - 10) = [1, -2], (b - 3) = [4, -1] -> 1*4 + (-2)*(-1) = 6
        let mut c = vec![0i32; 1];
        integer_gemm(&[11, 8], &[7, 2], &mut c, shape(1, 2, 1, true), 10, 3).unwrap();
        assert_eq!(c, vec![6]);
    }

    #[test]
    fn test_integer_gemm_extremes_fit() {
        let k = 64;
        let a = vec![255u8; k];
        let b = vec![0u8; k];
        let mut c = vec![0i32; 1];
        integer_gemm(&a, &b, &mut c, shape(1, k, 1, true), 0, 255).unwrap();
        assert_eq!(c[0], -(255 * 255 * k as i32));
    }

    #[test]
    fn test_max_depth() {
        assert!(MAX_INTEGER_GEMM_DEPTH * 255 * 255 <= i32::MAX as usize);
        assert!((MAX_INTEGER_GEMM_DEPTH + 1) * 255 * 255 > i32::MAX as usize);
    }
}
