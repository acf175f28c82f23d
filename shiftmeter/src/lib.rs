//! SHIFTMETER - sub-pixel translation measurement between image pairs.
//!
//! Estimates the global 2-D translation between two grayscale images using
//! normalized cross-power spectrum phase correlation. Both images are
//! windowed with a separable Hann window before transforming so that the
//! correlation is not dominated by the frame borders.
//!
//! The returned [`Shift`] follows the content-motion convention: if the
//! scene content of `current` sits `dx` pixels to the right of where it sat
//! in `reference` (and `dy` pixels further down), the measurement reports
//! positive `dx` (positive `dy`).

use ndarray::{Array2, ArrayView2};
use rustfft::{num_complex::Complex64, FftPlanner};
use thiserror::Error;

/// Spectral bins with less energy than this are treated as empty rather
/// than normalized, which would amplify pure numerical noise.
const SPECTRUM_EPSILON: f64 = 1e-12;

/// Errors produced by shift measurement.
#[derive(Error, Debug)]
pub enum ShiftError {
    /// The two images do not have identical dimensions.
    #[error("image dimensions mismatch: {ref_rows}x{ref_cols} vs {cur_rows}x{cur_cols}")]
    DimensionMismatch {
        /// Reference image rows.
        ref_rows: usize,
        /// Reference image columns.
        ref_cols: usize,
        /// Current image rows.
        cur_rows: usize,
        /// Current image columns.
        cur_cols: usize,
    },

    /// The images are too small to correlate.
    #[error("image too small to correlate: {rows}x{cols}")]
    TooSmall {
        /// Image rows.
        rows: usize,
        /// Image columns.
        cols: usize,
    },
}

/// A measured 2-D translation between two images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shift {
    /// Horizontal content motion in pixels (positive = content moved right).
    pub dx: f64,
    /// Vertical content motion in pixels (positive = content moved down).
    pub dy: f64,
    /// Correlation peak response in [0, 1]; identical inputs give ~1.0,
    /// uncorrelated inputs give values near 0.
    pub response: f64,
}

/// One-dimensional Hann window of length `n`.
fn hann_1d(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 2.0 * std::f64::consts::PI / (n as f64 - 1.0);
    (0..n).map(|i| 0.5 * (1.0 - (scale * i as f64).cos())).collect()
}

/// Separable 2-D Hann window.
///
/// The outer product of two 1-D Hann windows; used to taper image borders
/// to zero before transforming.
pub fn hann_window(rows: usize, cols: usize) -> Array2<f64> {
    let row_win = hann_1d(rows);
    let col_win = hann_1d(cols);
    Array2::from_shape_fn((rows, cols), |(r, c)| row_win[r] * col_win[c])
}

/// In-place 2-D FFT over a row-major buffer (rows of `cols` elements each).
fn fft2(
    planner: &mut FftPlanner<f64>,
    data: &mut [Complex64],
    rows: usize,
    cols: usize,
    inverse: bool,
) {
    let row_fft = if inverse {
        planner.plan_fft_inverse(cols)
    } else {
        planner.plan_fft_forward(cols)
    };
    for row in data.chunks_exact_mut(cols) {
        row_fft.process(row);
    }

    let col_fft = if inverse {
        planner.plan_fft_inverse(rows)
    } else {
        planner.plan_fft_forward(rows)
    };
    let mut column = vec![Complex64::new(0.0, 0.0); rows];
    for c in 0..cols {
        for r in 0..rows {
            column[r] = data[r * cols + c];
        }
        col_fft.process(&mut column);
        for r in 0..rows {
            data[r * cols + c] = column[r];
        }
    }
}

/// Copy an image into a complex buffer, applying the window.
fn windowed_complex(image: ArrayView2<'_, f64>, window: &Array2<f64>) -> Vec<Complex64> {
    let (rows, cols) = image.dim();
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            out.push(Complex64::new(image[[r, c]] * window[[r, c]], 0.0));
        }
    }
    out
}

/// Refine a peak coordinate with a three-point parabolic fit.
///
/// `prev`, `center`, `next` are the correlation values at offsets -1, 0, +1
/// around the integer peak. Returns a sub-pixel offset in (-0.5, 0.5).
fn parabolic_offset(prev: f64, center: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * center + next;
    if denom.abs() < SPECTRUM_EPSILON {
        return 0.0;
    }
    let offset = 0.5 * (prev - next) / denom;
    offset.clamp(-0.5, 0.5)
}

/// Measure the translation of `current` relative to `reference`.
///
/// Both images are Hann-windowed, transformed, and correlated through the
/// normalized cross-power spectrum; the correlation peak is located with
/// sub-pixel precision and its height is reported as the response.
///
/// # Arguments
/// * `reference` - Image captured first
/// * `current` - Image captured second
///
/// # Errors
/// Returns [`ShiftError::DimensionMismatch`] if the images differ in shape
/// and [`ShiftError::TooSmall`] for images under 2x2 pixels.
pub fn phase_correlate(
    reference: ArrayView2<'_, f64>,
    current: ArrayView2<'_, f64>,
) -> Result<Shift, ShiftError> {
    let (rows, cols) = reference.dim();
    let (cur_rows, cur_cols) = current.dim();
    if (rows, cols) != (cur_rows, cur_cols) {
        return Err(ShiftError::DimensionMismatch {
            ref_rows: rows,
            ref_cols: cols,
            cur_rows,
            cur_cols,
        });
    }
    if rows < 2 || cols < 2 {
        return Err(ShiftError::TooSmall { rows, cols });
    }

    let window = hann_window(rows, cols);
    let mut spectrum_ref = windowed_complex(reference, &window);
    let mut spectrum_cur = windowed_complex(current, &window);

    let mut planner = FftPlanner::new();
    fft2(&mut planner, &mut spectrum_ref, rows, cols, false);
    fft2(&mut planner, &mut spectrum_cur, rows, cols, false);

    // Normalized cross-power spectrum: conj(F_ref) * F_cur / |.|
    // leaves only the phase ramp introduced by the translation.
    let mut cross: Vec<Complex64> = spectrum_ref
        .iter()
        .zip(spectrum_cur.iter())
        .map(|(a, b)| {
            let g = a.conj() * b;
            let magnitude = g.norm();
            if magnitude > SPECTRUM_EPSILON {
                g / magnitude
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect();

    fft2(&mut planner, &mut cross, rows, cols, true);

    // rustfft leaves transforms unnormalized: a perfect correlation peaks
    // at rows*cols after the inverse pass.
    let scale = 1.0 / (rows * cols) as f64;
    let surface: Vec<f64> = cross.iter().map(|v| v.re * scale).collect();

    let mut peak_index = 0;
    let mut peak_value = f64::NEG_INFINITY;
    for (i, &v) in surface.iter().enumerate() {
        if v > peak_value {
            peak_value = v;
            peak_index = i;
        }
    }
    let peak_row = peak_index / cols;
    let peak_col = peak_index % cols;

    let at = |r: usize, c: usize| surface[r * cols + c];
    let left = at(peak_row, (peak_col + cols - 1) % cols);
    let right = at(peak_row, (peak_col + 1) % cols);
    let above = at((peak_row + rows - 1) % rows, peak_col);
    let below = at((peak_row + 1) % rows, peak_col);

    let mut dx = peak_col as f64 + parabolic_offset(left, peak_value, right);
    let mut dy = peak_row as f64 + parabolic_offset(above, peak_value, below);

    // The correlation surface is circular: peaks past the midpoint are
    // negative shifts wrapped around.
    if dx > cols as f64 / 2.0 {
        dx -= cols as f64;
    }
    if dy > rows as f64 / 2.0 {
        dy -= rows as f64;
    }

    Ok(Shift {
        dx,
        dy,
        response: peak_value.max(0.0),
    })
}
