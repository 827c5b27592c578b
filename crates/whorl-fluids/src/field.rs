use std::ops::{Add, Mul};

use glam::{UVec2, Vec2};
use ndarray::Array2;

/// Values that can be blended by bilinear interpolation.
pub trait Lerp: Copy + Add<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Lerp for T where T: Copy + Add<Output = T> + Mul<f32, Output = T> {}

/// A grid channel with a current (read) buffer and a next (write) buffer.
///
/// Passes whose output at a cell depends on neighbouring cells read from [`DoubleField::read`]
/// and write into the other buffer through [`DoubleField::split`], then call
/// [`DoubleField::swap`]. Swapping exchanges an index, never the data.
#[derive(Debug, Clone)]
pub struct DoubleField<T> {
    buffers: [Array2<T>; 2],
    current: usize,
}

impl<T: Clone> DoubleField<T> {
    pub fn new(size: UVec2, value: T) -> Self {
        let shape = (size.x as usize, size.y as usize);

        Self {
            buffers: [
                Array2::from_elem(shape, value.clone()),
                Array2::from_elem(shape, value),
            ],
            current: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        let (nx, ny) = self.buffers[0].dim();
        UVec2::new(nx as u32, ny as u32)
    }

    /// The current buffer.
    #[inline]
    pub fn read(&self) -> &Array2<T> {
        &self.buffers[self.current]
    }

    /// Mutable access to the current buffer, for passes that only touch each cell on its own
    /// (additive splats, boundary fixes, uniform decay).
    #[inline]
    pub fn read_mut(&mut self) -> &mut Array2<T> {
        &mut self.buffers[self.current]
    }

    /// Borrows the current buffer for reading and the next buffer for writing.
    #[inline]
    pub fn split(&mut self) -> (&Array2<T>, &mut Array2<T>) {
        let [a, b] = &mut self.buffers;

        if self.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    /// Makes the next buffer current.
    #[inline]
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    pub fn fill(&mut self, value: T) {
        for buffer in self.buffers.iter_mut() {
            buffer.fill(value.clone());
        }
    }
}

/// Fetches `field[(i, j)]`, reading the nearest edge cell for indices outside the grid.
///
/// This is the single edge rule shared by curl, divergence and pressure passes.
#[inline]
pub fn clamped<T: Copy>(field: &Array2<T>, i: isize, j: isize) -> T {
    let (nx, ny) = field.dim();
    let i = i.clamp(0, nx as isize - 1) as usize;
    let j = j.clamp(0, ny as isize - 1) as usize;

    field[(i, j)]
}

/// Bilinearly samples `field` at `p`, expressed in element index space (element `(i, j)` sits
/// at `(i, j)`). Positions outside the grid are clamped onto the edge.
pub fn bilerp<T: Lerp>(field: &Array2<T>, p: Vec2) -> T {
    let (nx, ny) = field.dim();

    let x = if p.x.is_finite() { p.x.clamp(0.0, (nx - 1) as f32) } else { 0.0 };
    let y = if p.y.is_finite() { p.y.clamp(0.0, (ny - 1) as f32) } else { 0.0 };

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(nx - 1);
    let y1 = (y0 + 1).min(ny - 1);

    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let bottom = field[(x0, y0)] * (1.0 - tx) + field[(x1, y0)] * tx;
    let top = field[(x0, y1)] * (1.0 - tx) + field[(x1, y1)] * tx;

    bottom * (1.0 - ty) + top * ty
}
