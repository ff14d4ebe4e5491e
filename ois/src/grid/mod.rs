//! Splitting an image into a regular grid of independently fitted tiles.
//!
//! Rows and columns are split into near-equal parts; the last row and column absorb
//! the remainder. Tiles share nothing, so they are fitted in parallel and their
//! outputs pasted back at each tile's offset.

#[cfg(test)]
mod tests;

use common::Buffer2;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Number of tile rows and columns. `(1, 1)` fits the whole image at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    rows: usize,
    cols: usize,
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "Grid shape must be at least 1x1, got {rows}x{cols}"
            )));
        }
        Ok(Self { rows, cols })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.tile_count() == 1
    }

    /// Tiles covering a `(height, width)` image, row-major.
    pub fn tiles(&self, (height, width): (usize, usize)) -> Result<Vec<Tile>> {
        if self.rows > height || self.cols > width {
            return Err(Error::InvalidConfig(format!(
                "Grid {}x{} is finer than the {}x{} image",
                self.rows, self.cols, height, width
            )));
        }
        let row_spans = split(height, self.rows);
        let col_spans = split(width, self.cols);
        Ok(row_spans
            .iter()
            .enumerate()
            .flat_map(|(row, &(y0, tile_height))| {
                col_spans
                    .iter()
                    .enumerate()
                    .map(move |(col, &(x0, tile_width))| Tile {
                        row,
                        col,
                        x0,
                        y0,
                        width: tile_width,
                        height: tile_height,
                    })
            })
            .collect())
    }
}

/// One grid cell and its position in the full image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: usize,
    pub col: usize,
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl Tile {
    /// `(height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// `(start, len)` of `parts` near-equal spans of `len`; the last span takes the remainder.
fn split(len: usize, parts: usize) -> Vec<(usize, usize)> {
    let base = len / parts;
    (0..parts)
        .map(|i| {
            let start = i * base;
            let size = if i + 1 == parts { len - start } else { base };
            (start, size)
        })
        .collect()
}

/// Run `fit` on every tile in parallel. Results keep tile order; the first error wins.
pub fn fit_tiles<R, F>(tiles: &[Tile], fit: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(&Tile) -> Result<R> + Sync + Send,
{
    tiles.par_iter().map(fit).collect()
}

/// Paste per-tile images into a `width x height` canvas.
pub fn assemble(tiles: &[Tile], parts: &[&Buffer2<f64>], width: usize, height: usize) -> Buffer2<f64> {
    assert_eq!(tiles.len(), parts.len(), "one image per tile");
    let mut out = Buffer2::new_filled(width, height, 0.0);
    for (tile, part) in tiles.iter().zip(parts) {
        debug_assert_eq!(part.shape(), tile.shape());
        out.paste(part, tile.x0, tile.y0);
    }
    out
}
