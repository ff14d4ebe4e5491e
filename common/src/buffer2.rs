use std::ops::{Index, IndexMut};

/// Row-major 2D buffer. Pixel `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`, the order image shapes are usually quoted in.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn into_pixels(self) -> Vec<T> {
        self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Combine two same-sized buffers pixel by pixel.
    pub fn zip_map<U, V>(&self, other: &Buffer2<U>, mut f: impl FnMut(&T, &U) -> V) -> Buffer2<V> {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
        Buffer2 {
            pixels: self
                .pixels
                .iter()
                .zip(&other.pixels)
                .map(|(a, b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    /// Copy out the `width x height` window whose top-left corner is `(x0, y0)`.
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        assert!(
            x0 + width <= self.width && y0 + height <= self.height,
            "crop window {}x{}+{}+{} exceeds {}x{} buffer",
            width,
            height,
            x0,
            y0,
            self.width,
            self.height
        );
        let mut pixels = Vec::with_capacity(width * height);
        for y in y0..y0 + height {
            let start = y * self.width + x0;
            pixels.extend_from_slice(&self.pixels[start..start + width]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Write `tile` into this buffer with its top-left corner at `(x0, y0)`.
    pub fn paste(&mut self, tile: &Self, x0: usize, y0: usize) {
        assert!(
            x0 + tile.width <= self.width && y0 + tile.height <= self.height,
            "tile {}x{} at ({}, {}) does not fit in {}x{} buffer",
            tile.width,
            tile.height,
            x0,
            y0,
            self.width,
            self.height
        );
        for y in 0..tile.height {
            let dst = (y0 + y) * self.width + x0;
            self.pixels[dst..dst + tile.width].clone_from_slice(tile.row(y));
        }
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}
