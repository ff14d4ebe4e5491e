//! Bit-packed 2D boolean plane, used for bad-pixel masks.
//!
//! One bit per pixel in `u64` words, LSB first, row-major like [`Buffer2`](crate::Buffer2).

const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    words: Vec<u64>,
    width: usize,
    height: usize,
}

impl BitBuffer2 {
    #[inline]
    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let num_words = (width * height).div_ceil(BITS_PER_WORD);
        let mut buf = Self {
            words: vec![if value { !0u64 } else { 0 }; num_words],
            width,
            height,
        };
        buf.clear_tail();
        buf
    }

    #[inline]
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, false)
    }

    /// Pack a row-major slice of booleans. The slice length must equal `width * height`.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            width,
            height
        );
        let mut buf = Self::new_default(width, height);
        for (idx, _) in data.iter().enumerate().filter(|(_, v)| **v) {
            buf.words[idx / BITS_PER_WORD] |= 1u64 << (idx % BITS_PER_WORD);
        }
        buf
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len());
        (self.words[idx / BITS_PER_WORD] >> (idx % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len());
        let bit = 1u64 << (idx % BITS_PER_WORD);
        let word = &mut self.words[idx / BITS_PER_WORD];
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        self.get(y * self.width + x)
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.set(y * self.width + x, value);
    }

    /// Set every pixel of the `width x height` rectangle at `(x0, y0)`, clipped to the plane.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, width: usize, height: usize, value: bool) {
        for y in y0..(y0 + height).min(self.height) {
            for x in x0..(x0 + width).min(self.width) {
                self.set_xy(x, y, value);
            }
        }
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    /// `self |= other`.
    pub fn union_with(&mut self, other: &Self) {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Box dilation: a pixel becomes set when any pixel within `radius_x` columns and
    /// `radius_y` rows of it is set. Pixels outside the plane count as unset.
    pub fn dilate(&self, radius_x: usize, radius_y: usize) -> Self {
        let (w, h) = (self.width, self.height);
        let mut horizontal = vec![false; w * h];
        for y in 0..h {
            for x in 0..w {
                let lo = x.saturating_sub(radius_x);
                let hi = (x + radius_x).min(w - 1);
                horizontal[y * w + x] = (lo..=hi).any(|sx| self.get_xy(sx, y));
            }
        }

        let mut out = Self::new_default(w, h);
        for y in 0..h {
            let lo = y.saturating_sub(radius_y);
            let hi = (y + radius_y).min(h - 1);
            for x in 0..w {
                if (lo..=hi).any(|sy| horizontal[sy * w + x]) {
                    out.set_xy(x, y, true);
                }
            }
        }
        out
    }

    /// Copy out the `width x height` window whose top-left corner is `(x0, y0)`.
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        assert!(
            x0 + width <= self.width && y0 + height <= self.height,
            "crop window exceeds {}x{} mask",
            self.width,
            self.height
        );
        let mut out = Self::new_default(width, height);
        for y in 0..height {
            for x in 0..width {
                if self.get_xy(x0 + x, y0 + y) {
                    out.set_xy(x, y, true);
                }
            }
        }
        out
    }

    // Bits past `len` stay zero so `count_ones` and `any` need no masking.
    fn clear_tail(&mut self) {
        let used = self.len() % BITS_PER_WORD;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filled_true_counts_only_pixels() {
        let buf = BitBuffer2::new_filled(10, 7, true);
        assert_eq!(buf.len(), 70);
        assert_eq!(buf.count_ones(), 70);
        assert!(buf.get_xy(9, 6));
    }

    #[test]
    fn test_set_get_across_word_boundary() {
        let mut buf = BitBuffer2::new_default(64, 2);
        buf.set(63, true);
        buf.set(64, true);
        assert!(buf.get_xy(63, 0));
        assert!(buf.get_xy(0, 1));
        assert!(!buf.get(62));
        assert_eq!(buf.count_ones(), 2);

        buf.set(63, false);
        assert_eq!(buf.count_ones(), 1);
    }

    #[test]
    fn test_from_slice() {
        let buf = BitBuffer2::from_slice(3, 2, &[true, false, true, false, false, true]);
        assert!(buf.get_xy(0, 0));
        assert!(!buf.get_xy(1, 0));
        assert!(buf.get_xy(2, 1));
        assert_eq!(buf.count_ones(), 3);
    }

    #[test]
    fn test_union_with() {
        let mut a = BitBuffer2::new_default(5, 5);
        let mut b = BitBuffer2::new_default(5, 5);
        a.set_xy(1, 1, true);
        b.set_xy(3, 4, true);
        a.union_with(&b);
        assert!(a.get_xy(1, 1) && a.get_xy(3, 4));
        assert_eq!(a.count_ones(), 2);
    }

    #[test]
    fn test_dilate_single_pixel_makes_box() {
        let mut buf = BitBuffer2::new_default(9, 9);
        buf.set_xy(4, 4, true);
        let grown = buf.dilate(2, 1);
        assert_eq!(grown.count_ones(), 5 * 3);
        assert!(grown.get_xy(2, 3));
        assert!(grown.get_xy(6, 5));
        assert!(!grown.get_xy(7, 4));
        assert!(!grown.get_xy(4, 6));
    }

    #[test]
    fn test_dilate_clips_at_border() {
        let mut buf = BitBuffer2::new_default(4, 4);
        buf.set_xy(0, 0, true);
        assert_eq!(buf.dilate(1, 1).count_ones(), 4);
    }

    #[test]
    fn test_crop() {
        let mut buf = BitBuffer2::new_default(8, 6);
        buf.fill_rect(2, 2, 3, 2, true);
        let tile = buf.crop(1, 1, 4, 4);
        assert_eq!((tile.width(), tile.height()), (4, 4));
        assert_eq!(tile.count_ones(), 6);
        assert!(tile.get_xy(1, 1));
        assert!(!tile.get_xy(0, 0));
    }
}
