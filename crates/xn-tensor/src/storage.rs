use crate::dtype::Element;
use crate::error::{Result, TensorError};

/// Backing memory of a tensor.
///
/// `Owned` storage was allocated by the tensor and is freed when the tensor
/// is dropped or resized to a different element count. `Borrowed` storage is
/// a read-only window into memory owned elsewhere; the lifetime `'a` keeps it
/// from outliving its owner.
#[derive(Debug, Clone)]
pub enum Storage<'a, T: Element> {
    Owned(Vec<T>),
    Borrowed(&'a [T]),
}

impl<'a, T: Element> Storage<'a, T> {
    /// Zero-filled owned storage of `n` elements.
    pub fn zeros(n: usize) -> Self {
        Storage::Owned(vec![T::default(); n])
    }

    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            Storage::Owned(v) => v.len(),
            Storage::Borrowed(s) => s.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Storage::Owned(v) => v.as_slice(),
            Storage::Borrowed(s) => s,
        }
    }

    /// Returns the data as a mutable slice.
    ///
    /// # Errors
    /// Returns an error if the storage is borrowed.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        match self {
            Storage::Owned(v) => Ok(v.as_mut_slice()),
            Storage::Borrowed(_) => Err(TensorError::BorrowedWrite),
        }
    }
}

impl<T: Element> Default for Storage<'_, T> {
    fn default() -> Self {
        Storage::Owned(Vec::new())
    }
}
