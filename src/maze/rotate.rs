//! Raw-to-display coordinate transform
//!
//! Raw matrices arrive in an orientation where increasing row index is not
//! screen "north". A fixed 90° counterclockwise relabeling fixes that:
//!
//! `rotated[r][c] = raw[c][w - 1 - r]` for `r < w`, `c < h`
//!
//! so an `h x w` raw matrix becomes a `w x h` display matrix.

/// Matrix rejected before rotation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("row {row} has length {found}, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Check that every row has the same length; returns `(height, width)`
pub fn ensure_rectangular<T>(matrix: &[Vec<T>]) -> Result<(usize, usize), MatrixError> {
    let height = matrix.len();
    let width = matrix.first().map_or(0, Vec::len);

    if let Some((row, found)) = matrix
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != width)
    {
        return Err(MatrixError::NotRectangular {
            row,
            expected: width,
            found,
        });
    }

    Ok((height, width))
}

/// Rotate a raw matrix into display orientation.
///
/// Ragged input is refused rather than producing a corrupted grid.
pub fn rotate<T: Clone>(matrix: &[Vec<T>]) -> Result<Vec<Vec<T>>, MatrixError> {
    let (height, width) = ensure_rectangular(matrix)?;

    Ok((0..width)
        .map(|r| {
            (0..height)
                .map(|c| matrix[c][width - 1 - r].clone())
                .collect()
        })
        .collect())
}

/// Map a raw cell to its rotated cell, given the raw width
pub fn raw_to_rotated(raw_row: usize, raw_col: usize, raw_width: usize) -> (usize, usize) {
    (raw_width - 1 - raw_col, raw_row)
}

/// Inverse of [`raw_to_rotated`]
pub fn rotated_to_raw(rot_row: usize, rot_col: usize, raw_width: usize) -> (usize, usize) {
    (rot_col, raw_width - 1 - rot_row)
}
