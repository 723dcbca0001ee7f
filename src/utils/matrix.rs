use bytemuck::Pod;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct Matrix2<T> {
    pub data: Vec<T>,
    pub rows: usize,
    pub cols: usize,
}

impl<T: Clone> Matrix2<T> {
    pub fn new(rows: usize, cols: usize, init: T) -> Self {
        Self {
            data: vec![init; rows * cols],
            rows,
            cols,
        }
    }
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

// Implement PartialEq, Eq and Hash using a byte-wise comparison.
impl<T: Pod> PartialEq for Matrix2<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && bytemuck::cast_slice::<T, u8>(&self.data)
                == bytemuck::cast_slice::<T, u8>(&other.data)
    }
}

impl<T: Pod> Eq for Matrix2<T> {}

impl<T: Pod> Hash for Matrix2<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.cols.hash(state);
        bytemuck::cast_slice::<T, u8>(&self.data).hash(state);
    }
}

/// A simple 3D matrix that wraps a flat Vec. The innermost dimension is
/// addressable as a contiguous row slice.
#[derive(Debug, Clone)]
pub struct Matrix3<T> {
    data: Vec<T>,
    dim2: usize,
    dim3: usize,
}

impl<T: Clone> Matrix3<T> {
    pub fn new(dim1: usize, dim2: usize, dim3: usize, init: T) -> Self {
        Self {
            data: vec![init; dim1 * dim2 * dim3],
            dim2,
            dim3,
        }
    }
    pub fn get(&self, i: usize, j: usize, k: usize) -> &T {
        &self.data[i * self.dim2 * self.dim3 + j * self.dim3 + k]
    }
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        &mut self.data[i * self.dim2 * self.dim3 + j * self.dim3 + k]
    }
    pub fn row(&self, i: usize, j: usize) -> &[T] {
        let start = i * self.dim2 * self.dim3 + j * self.dim3;
        &self.data[start..start + self.dim3]
    }
    pub fn row_mut(&mut self, i: usize, j: usize) -> &mut [T] {
        let start = i * self.dim2 * self.dim3 + j * self.dim3;
        &mut self.data[start..start + self.dim3]
    }
    /// Borrows two distinct innermost rows at once, the first immutably and
    /// the second mutably. Panics if both index the same row.
    pub fn row_pair_mut(
        &mut self,
        src: (usize, usize),
        dst: (usize, usize),
    ) -> (&[T], &mut [T]) {
        let stride = self.dim3;
        let a = src.0 * self.dim2 * stride + src.1 * stride;
        let b = dst.0 * self.dim2 * stride + dst.1 * stride;
        assert!(a != b, "row_pair_mut requires distinct rows");
        if a < b {
            let (lo, hi) = self.data.split_at_mut(b);
            (&lo[a..a + stride], &mut hi[..stride])
        } else {
            let (lo, hi) = self.data.split_at_mut(a);
            (&hi[..stride], &mut lo[b..b + stride])
        }
    }
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pair_borrows_in_either_order() {
        let mut m = Matrix3::new(2, 2, 3, 0u64);
        m.row_mut(0, 1).copy_from_slice(&[1, 2, 3]);
        m.row_mut(1, 0).copy_from_slice(&[10, 0, 0]);

        let (src, dst) = m.row_pair_mut((0, 1), (1, 0));
        assert_eq!(src, &[1, 2, 3]);
        dst[1] = 2;

        let (src, dst) = m.row_pair_mut((1, 0), (0, 1));
        assert_eq!(src, &[10, 2, 0]);
        dst[0] = 5;
        assert_eq!(m.row(0, 1), &[5, 2, 3]);
        assert_eq!(m.row(1, 0), &[10, 2, 0]);
    }
}
