use std::ops::{Index, IndexMut};

use crate::dtype::Element;
use crate::tensor::Tensor;

/// A rank-1 tensor.
pub type Vector<'a, T> = Tensor<'a, T, 1>;

impl<T: Element> Index<usize> for Tensor<'_, T, 1> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self[[i]]
    }
}

impl<T: Element> IndexMut<usize> for Tensor<'_, T, 1> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self[[i]]
    }
}
