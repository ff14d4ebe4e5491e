//! Images with an optional bad-pixel mask.

use common::{BitBuffer2, Buffer2};
use num_traits::AsPrimitive;

use crate::error::{Error, Result};

/// A floating-point image paired with an optional mask of excluded pixels
/// (`true` = excluded). An image without a mask is fully valid.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    data: Buffer2<f64>,
    mask: Option<BitBuffer2>,
}

impl MaskedImage {
    pub fn new(data: Buffer2<f64>) -> Self {
        Self { data, mask: None }
    }

    /// Attach a mask. Fails when its dimensions differ from the image.
    pub fn with_mask(data: Buffer2<f64>, mask: BitBuffer2) -> Result<Self> {
        check_mask_shape(&data, &mask)?;
        Ok(Self {
            data,
            mask: Some(mask),
        })
    }

    /// Build from a shape and row-major pixels of any primitive numeric type.
    ///
    /// `shape` is `[height, width]`; any other rank is rejected, which is where
    /// non-2D input is caught before it reaches a fit.
    pub fn from_shape_vec<T: AsPrimitive<f64>>(shape: &[usize], pixels: &[T]) -> Result<Self> {
        Ok(Self::new(buffer_from_shape(shape, pixels)?))
    }

    /// Promote any primitive numeric buffer to a floating-point image.
    pub fn from_buffer<T: AsPrimitive<f64>>(buffer: &Buffer2<T>) -> Self {
        Self::new(promote(buffer))
    }

    #[inline]
    pub fn data(&self) -> &Buffer2<f64> {
        &self.data
    }

    #[inline]
    pub fn mask(&self) -> Option<&BitBuffer2> {
        self.mask.as_ref()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// `(height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// True when a mask is attached and excludes at least one pixel.
    pub fn is_masked(&self) -> bool {
        self.mask.as_ref().is_some_and(BitBuffer2::any)
    }

    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.mask.as_ref().is_none_or(|m| !m.get_xy(x, y))
    }

    /// Pixel values that are not masked, in row-major order.
    pub fn valid_pixels(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .pixels()
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.mask.as_ref().is_none_or(|m| !m.get(*idx)))
            .map(|(_, &v)| v)
    }

    pub fn valid_count(&self) -> usize {
        self.data.len() - self.mask.as_ref().map_or(0, BitBuffer2::count_ones)
    }

    /// Euclidean norm over valid pixels.
    pub fn norm(&self) -> f64 {
        crate::math::norm(self.valid_pixels())
    }

    pub fn into_parts(self) -> (Buffer2<f64>, Option<BitBuffer2>) {
        (self.data, self.mask)
    }

    pub(crate) fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        Self {
            data: self.data.crop(x0, y0, width, height),
            mask: self.mask.as_ref().map(|m| m.crop(x0, y0, width, height)),
        }
    }
}

impl From<Buffer2<f64>> for MaskedImage {
    fn from(data: Buffer2<f64>) -> Self {
        Self::new(data)
    }
}

/// Explicit upcast of a numeric buffer to `f64`.
pub fn promote<T: AsPrimitive<f64>>(buffer: &Buffer2<T>) -> Buffer2<f64> {
    buffer.map(|&v| v.as_())
}

/// `[height, width]` + row-major pixels into a floating-point buffer.
pub fn buffer_from_shape<T: AsPrimitive<f64>>(shape: &[usize], pixels: &[T]) -> Result<Buffer2<f64>> {
    let &[height, width] = shape else {
        return Err(Error::Dimensionality {
            expected: 2,
            shape: shape.to_vec(),
        });
    };
    if height * width != pixels.len() {
        return Err(Error::ShapeLength {
            shape: shape.to_vec(),
            expected: height * width,
            actual: pixels.len(),
        });
    }
    Ok(Buffer2::new(
        width,
        height,
        pixels.iter().map(|&v| v.as_()).collect(),
    ))
}

pub(crate) fn check_mask_shape(data: &Buffer2<f64>, mask: &BitBuffer2) -> Result<()> {
    if (mask.height(), mask.width()) != data.shape() {
        return Err(Error::ShapeMismatch {
            what: "mask",
            expected: data.shape(),
            actual: (mask.height(), mask.width()),
        });
    }
    Ok(())
}
