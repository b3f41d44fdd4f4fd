use std::ops::{Index, IndexMut};

use crate::dtype::{DType, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::Storage;

/// A rank-`R`, row-major tensor of `T` elements.
///
/// A tensor either owns its buffer or borrows a read-only window of a buffer
/// owned elsewhere (see [`Storage`]). Owned tensors are created with
/// [`Tensor::zeros`], [`Tensor::from_vec`] or [`Default`]; borrowed ones only
/// through [`Tensor::view`] and the row accessors on matrices.
///
/// Invariant: `storage.len() == shape.numel()`.
#[derive(Debug, Clone, Default)]
pub struct Tensor<'a, T: Element, const R: usize> {
    storage: Storage<'a, T>,
    shape: Shape<R>,
}

impl<'a, T: Element, const R: usize> Tensor<'a, T, R> {
    /// Create a zero-filled, owning tensor with the given shape.
    pub fn zeros(shape: impl Into<Shape<R>>) -> Self {
        let shape = shape.into();
        Tensor {
            storage: Storage::zeros(shape.numel()),
            shape,
        }
    }

    /// Create an owning tensor from a data vector and a shape.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape<R>>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor {
            storage: Storage::Owned(data),
            shape,
        })
    }

    /// Create a borrowed view over memory owned by someone else.
    ///
    /// The view never allocates or frees; it cannot be written through and
    /// cannot be resized to a different element count.
    pub fn view(data: &'a [T], shape: impl Into<Shape<R>>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor {
            storage: Storage::Borrowed(data),
            shape,
        })
    }

    /// View over a slice whose length is already known to match `shape`.
    pub(crate) fn borrowed(data: &'a [T], shape: Shape<R>) -> Self {
        debug_assert_eq!(data.len(), shape.numel());
        Tensor {
            storage: Storage::Borrowed(data),
            shape,
        }
    }

    pub fn shape(&self) -> &Shape<R> {
        &self.shape
    }

    pub fn dims(&self) -> &[usize; R] {
        self.shape.dims()
    }

    /// Number of elements; zero for an empty shape.
    pub fn size(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// True when this tensor allocated its buffer.
    pub fn is_owned(&self) -> bool {
        self.storage.is_owned()
    }

    pub fn storage(&self) -> &Storage<'a, T> {
        &self.storage
    }

    pub fn data(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Mutable access to the elements.
    ///
    /// # Errors
    /// Returns [`TensorError::BorrowedWrite`] for a borrowed view.
    pub fn data_mut(&mut self) -> Result<&mut [T]> {
        self.storage.as_mut_slice()
    }

    /// Change the shape.
    ///
    /// If the element count is unchanged this only updates the shape and the
    /// existing data is preserved. Otherwise the old buffer is released and a
    /// new zero-filled one is allocated.
    ///
    /// # Errors
    /// A borrowed view cannot be resized to a different element count.
    pub fn resize(&mut self, shape: impl Into<Shape<R>>) -> Result<()> {
        let shape = shape.into();
        let n = shape.numel();
        if n != self.storage.len() {
            if !self.storage.is_owned() {
                return Err(TensorError::BorrowedResize {
                    from: self.storage.len(),
                    to: n,
                });
            }
            self.storage = Storage::zeros(n);
        }
        self.shape = shape;
        Ok(())
    }

    /// Make this tensor an owning copy of `other`.
    ///
    /// An owned buffer of matching size is reused; anything else (a borrowed
    /// view, or a different size) is replaced by a fresh allocation.
    pub fn copy_from(&mut self, other: &Tensor<'_, T, R>) {
        let src = other.data();
        match &mut self.storage {
            Storage::Owned(buf) if buf.len() == src.len() => buf.copy_from_slice(src),
            _ => self.storage = Storage::Owned(src.to_vec()),
        }
        self.shape = other.shape;
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) -> Result<()> {
        self.data_mut()?.fill(value);
        Ok(())
    }

    /// An owning deep copy, detached from whatever this tensor borrows.
    pub fn to_owned_tensor(&self) -> Tensor<'static, T, R> {
        Tensor {
            storage: Storage::Owned(self.data().to_vec()),
            shape: self.shape,
        }
    }

    /// Consume the tensor and return its elements.
    pub fn into_vec(self) -> Vec<T> {
        match self.storage {
            Storage::Owned(v) => v,
            Storage::Borrowed(s) => s.to_vec(),
        }
    }

    /// Row-major offset of a multi-index.
    ///
    /// # Panics
    /// Panics if any index is out of range for its axis.
    fn offset(&self, index: [usize; R]) -> usize {
        let mut offset = 0;
        for (axis, (&i, &d)) in index.iter().zip(self.shape.dims().iter()).enumerate() {
            assert!(
                i < d,
                "index {} out of range for axis {} of shape {}",
                i,
                axis,
                self.shape
            );
            offset = offset * d + i;
        }
        offset
    }
}

impl<T: Element, const R: usize> Index<[usize; R]> for Tensor<'_, T, R> {
    type Output = T;

    fn index(&self, index: [usize; R]) -> &T {
        let offset = self.offset(index);
        &self.data()[offset]
    }
}

impl<T: Element, const R: usize> IndexMut<[usize; R]> for Tensor<'_, T, R> {
    /// # Panics
    /// Panics on an out-of-range index or when writing through a view.
    fn index_mut(&mut self, index: [usize; R]) -> &mut T {
        let offset = self.offset(index);
        match self.storage.as_mut_slice() {
            Ok(data) => &mut data[offset],
            Err(e) => panic!("{}", e),
        }
    }
}
