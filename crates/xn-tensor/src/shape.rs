use std::fmt;

/// A rank-fixed tensor shape.
///
/// The rank is part of the type, so a matrix shape can never be handed to a
/// vector. Dimensions may be zero, in which case the shape holds no elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape<const R: usize> {
    dims: [usize; R],
}

impl<const R: usize> Shape<R> {
    /// Create a new shape from per-axis extents.
    pub fn new(dims: [usize; R]) -> Self {
        Shape { dims }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        R
    }

    /// Total number of elements. Zero if any extent is zero or the shape is
    /// rank 0.
    pub fn numel(&self) -> usize {
        if R == 0 {
            return 0;
        }
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= R`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize; R] {
        &self.dims
    }
}

impl<const R: usize> Default for Shape<R> {
    fn default() -> Self {
        Shape { dims: [0; R] }
    }
}

impl<const R: usize> fmt::Display for Shape<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl<const R: usize> From<[usize; R]> for Shape<R> {
    fn from(dims: [usize; R]) -> Self {
        Shape::new(dims)
    }
}
