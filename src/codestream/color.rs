//! Multi-component transforms applied to the first three components.

/// Reversible color transform, in place: (R, G, B) -> (Y, Cb, Cr).
pub fn forward_rct(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    for ((r, g), b) in c0.iter_mut().zip(c1.iter_mut()).zip(c2.iter_mut()) {
        let (red, green, blue) = (*r, *g, *b);
        *r = (red + 2 * green + blue) >> 2;
        *g = blue - green;
        *b = red - green;
    }
}

/// Inverse of [`forward_rct`]. Saturates instead of overflowing on damaged input.
pub fn inverse_rct(c0: &mut [i32], c1: &mut [i32], c2: &mut [i32]) {
    for ((y, cb), cr) in c0.iter_mut().zip(c1.iter_mut()).zip(c2.iter_mut()) {
        let (luma, blue_diff, red_diff) = (i64::from(*y), i64::from(*cb), i64::from(*cr));
        let green = luma - ((blue_diff + red_diff) >> 2);
        *y = saturate(red_diff + green);
        *cb = saturate(green);
        *cr = saturate(blue_diff + green);
    }
}

/// Irreversible color transform (RGB to YCbCr), in place.
pub fn forward_ict(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    for ((r, g), b) in c0.iter_mut().zip(c1.iter_mut()).zip(c2.iter_mut()) {
        let (red, green, blue) = (*r, *g, *b);
        *r = 0.299 * red + 0.587 * green + 0.114 * blue;
        *g = -0.168_736 * red - 0.331_264 * green + 0.5 * blue;
        *b = 0.5 * red - 0.418_688 * green - 0.081_312 * blue;
    }
}

pub fn inverse_ict(c0: &mut [f32], c1: &mut [f32], c2: &mut [f32]) {
    for ((y, cb), cr) in c0.iter_mut().zip(c1.iter_mut()).zip(c2.iter_mut()) {
        let (luma, blue_diff, red_diff) = (*y, *cb, *cr);
        *y = luma + 1.402 * red_diff;
        *cb = luma - 0.344_136 * blue_diff - 0.714_136 * red_diff;
        *cr = luma + 1.772 * blue_diff;
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
