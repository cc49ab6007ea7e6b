//! Lifting implementations of the 5/3 and 9/7 wavelets.
//!
//! One-dimensional transforms work in place: the forward transform leaves the
//! `ceil(n/2)` low-pass coefficients first and the high-pass ones after them,
//! the inverse expects that layout. Boundaries use whole-sample symmetric
//! extension. A single sample passes through unchanged.

/// A separable wavelet applied line by line.
pub trait Wavelet {
    type Sample: Copy + Default;

    fn forward(&mut self, line: &mut [Self::Sample]);

    fn inverse(&mut self, line: &mut [Self::Sample]);
}

/// Reversible integer 5/3 wavelet.
#[derive(Debug, Default)]
pub struct Dwt53 {
    scratch: Vec<i32>,
    wide: Vec<i64>,
}

impl Wavelet for Dwt53 {
    type Sample = i32;

    fn forward(&mut self, line: &mut [i32]) {
        if line.len() < 2 {
            return;
        }
        // y[2n+1] = x[2n+1] - floor((x[2n] + x[2n+2]) / 2)
        lift(line, 1, |x, left, right| x - ((left + right) >> 1));
        // y[2n] = x[2n] + floor((y[2n-1] + y[2n+1] + 2) / 4)
        lift(line, 0, |x, left, right| x + ((left + right + 2) >> 2));
        deinterleave(line, &mut self.scratch);
    }

    /// Runs in 64 bits and saturates, so damaged coefficients cannot overflow.
    fn inverse(&mut self, line: &mut [i32]) {
        let n = line.len();
        if n < 2 {
            return;
        }
        let low = n.div_ceil(2);
        self.wide.clear();
        self.wide.resize(n, 0);
        for (i, &value) in line.iter().enumerate() {
            let slot = if i < low { 2 * i } else { 2 * (i - low) + 1 };
            self.wide[slot] = i64::from(value);
        }
        lift(&mut self.wide, 0, |x, left, right| x - ((left + right + 2) >> 2));
        lift(&mut self.wide, 1, |x, left, right| x + ((left + right) >> 1));
        for (out, &value) in line.iter_mut().zip(&self.wide) {
            *out = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        }
    }
}

/// Irreversible 9/7 wavelet.
#[derive(Debug, Default)]
pub struct Dwt97 {
    scratch: Vec<f32>,
}

impl Dwt97 {
    const ALPHA: f32 = -1.5861343;
    const BETA: f32 = -0.05298012;
    const GAMMA: f32 = 0.8829111;
    const DELTA: f32 = 0.44350687;
    const K: f32 = 1.2301741;
    const INV_K: f32 = 1.0 / 1.2301741;

    fn scale(line: &mut [f32], low: f32, high: f32) {
        for (i, value) in line.iter_mut().enumerate() {
            *value *= if i % 2 == 0 { low } else { high };
        }
    }
}

impl Wavelet for Dwt97 {
    type Sample = f32;

    fn forward(&mut self, line: &mut [f32]) {
        if line.len() < 2 {
            return;
        }
        lift(line, 1, |x, left, right| x + Self::ALPHA * (left + right));
        lift(line, 0, |x, left, right| x + Self::BETA * (left + right));
        lift(line, 1, |x, left, right| x + Self::GAMMA * (left + right));
        lift(line, 0, |x, left, right| x + Self::DELTA * (left + right));
        Self::scale(line, Self::INV_K, Self::K);
        deinterleave(line, &mut self.scratch);
    }

    fn inverse(&mut self, line: &mut [f32]) {
        if line.len() < 2 {
            return;
        }
        interleave(line, &mut self.scratch);
        Self::scale(line, Self::K, Self::INV_K);
        lift(line, 0, |x, left, right| x - Self::DELTA * (left + right));
        lift(line, 1, |x, left, right| x - Self::GAMMA * (left + right));
        lift(line, 0, |x, left, right| x - Self::BETA * (left + right));
        lift(line, 1, |x, left, right| x - Self::ALPHA * (left + right));
    }
}

/// Applies `step` to every sample of the given parity with its mirrored
/// neighbours. Requires at least two samples.
fn lift<T: Copy>(x: &mut [T], parity: usize, step: impl Fn(T, T, T) -> T) {
    let n = x.len();
    for i in (parity..n).step_by(2) {
        let left = if i > 0 { x[i - 1] } else { x[i + 1] };
        let right = if i + 1 < n { x[i + 1] } else { x[i - 1] };
        x[i] = step(x[i], left, right);
    }
}

fn deinterleave<T: Copy>(x: &mut [T], scratch: &mut Vec<T>) {
    scratch.clear();
    scratch.extend(x.iter().step_by(2));
    scratch.extend(x.iter().skip(1).step_by(2));
    x.copy_from_slice(scratch);
}

fn interleave<T: Copy>(x: &mut [T], scratch: &mut Vec<T>) {
    let low = x.len().div_ceil(2);
    scratch.clear();
    scratch.extend_from_slice(x);
    for (i, &value) in scratch.iter().enumerate() {
        let slot = if i < low { 2 * i } else { 2 * (i - low) + 1 };
        x[slot] = value;
    }
}

/// One decomposition level on the top-left `width x height` region: rows,
/// then columns.
pub fn forward_2d<W: Wavelet>(
    wavelet: &mut W,
    plane: &mut [W::Sample],
    stride: usize,
    width: usize,
    height: usize,
) {
    for y in 0..height {
        wavelet.forward(&mut plane[y * stride..y * stride + width]);
    }
    let mut column = Vec::with_capacity(height);
    for x in 0..width {
        gather_column(plane, stride, x, height, &mut column);
        wavelet.forward(&mut column);
        scatter_column(plane, stride, x, &column);
    }
}

/// Undoes [`forward_2d`]: columns, then rows.
pub fn inverse_2d<W: Wavelet>(
    wavelet: &mut W,
    plane: &mut [W::Sample],
    stride: usize,
    width: usize,
    height: usize,
) {
    let mut column = Vec::with_capacity(height);
    for x in 0..width {
        gather_column(plane, stride, x, height, &mut column);
        wavelet.inverse(&mut column);
        scatter_column(plane, stride, x, &column);
    }
    for y in 0..height {
        wavelet.inverse(&mut plane[y * stride..y * stride + width]);
    }
}

fn gather_column<T: Copy>(plane: &[T], stride: usize, x: usize, height: usize, column: &mut Vec<T>) {
    column.clear();
    column.extend((0..height).map(|y| plane[y * stride + x]));
}

fn scatter_column<T: Copy>(plane: &mut [T], stride: usize, x: usize, column: &[T]) {
    for (y, &value) in column.iter().enumerate() {
        plane[y * stride + x] = value;
    }
}

/// Mallat decomposition of a `width x height` plane (stride `width`).
pub fn forward_levels<W: Wavelet>(
    wavelet: &mut W,
    plane: &mut [W::Sample],
    width: usize,
    height: usize,
    levels: usize,
) {
    let (mut w, mut h) = (width, height);
    for _ in 0..levels {
        forward_2d(wavelet, plane, width, w, h);
        w = w.div_ceil(2);
        h = h.div_ceil(2);
    }
}

/// Inverts levels `levels` down to `skipped_levels + 1`. The top-left region
/// then holds the image at `skipped_levels` reductions.
pub fn inverse_levels<W: Wavelet>(
    wavelet: &mut W,
    plane: &mut [W::Sample],
    width: usize,
    height: usize,
    levels: usize,
    skipped_levels: usize,
) {
    let sizes = super::subband::level_sizes(width, height, levels);
    for level in (skipped_levels + 1..=levels).rev() {
        let (w, h) = sizes[level - 1];
        inverse_2d(wavelet, plane, width, w, h);
    }
}
