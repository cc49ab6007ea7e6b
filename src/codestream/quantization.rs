//! Dead-zone scalar quantization for the irreversible path.

/// Dead-zone quantization: `sign(x) * floor(|x| / step)`.
pub fn quantize_scalar(coeff: f32, step_size: f32) -> i32 {
    if step_size <= 0.0 {
        return coeff as i32;
    }
    let magnitude = (coeff.abs() / step_size).floor() as i32;
    if coeff < 0.0 { -magnitude } else { magnitude }
}

/// Mid-point reconstruction; zero stays zero.
pub fn dequantize_scalar(q: i32, step_size: f32) -> f32 {
    if q == 0 {
        return 0.0;
    }
    let magnitude = (q.unsigned_abs() as f32 + 0.5) * step_size;
    if q < 0 { -magnitude } else { magnitude }
}

/// Encodes a relative step as the QCD `(exponent << 11) | mantissa` word,
/// step = 2^-exponent * (1 + mantissa / 2048).
pub fn encode_step(step: f32) -> u16 {
    let mut exponent = 0u16;
    let mut mantissa = step;
    while mantissa < 1.0 && exponent < 31 {
        mantissa *= 2.0;
        exponent += 1;
    }
    let fraction = ((mantissa - 1.0) * 2048.0).round().clamp(0.0, 2047.0) as u16;
    (exponent << 11) | fraction
}

pub fn decode_step(word: u16) -> f32 {
    let exponent = i32::from(word >> 11);
    let mantissa = f32::from(word & 0x7FF);
    (1.0 + mantissa / 2048.0) * 2f32.powi(-exponent)
}

/// Absolute step for a component of `bit_depth` bits.
pub fn absolute_step(relative_step: f32, bit_depth: u8) -> f32 {
    relative_step * 2f32.powi(i32::from(bit_depth))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_dead_zone() {
        // 10.5 / 2.0 = 5.25 -> 5
        assert_eq!(quantize_scalar(10.5, 2.0), 5);
        assert_eq!(quantize_scalar(-10.5, 2.0), -5);
        assert_eq!(quantize_scalar(1.9, 2.0), 0);
        assert_eq!(dequantize_scalar(5, 2.0), 11.0);
        assert_eq!(dequantize_scalar(-5, 2.0), -11.0);
        assert_eq!(dequantize_scalar(0, 2.0), 0.0);
    }

    #[test]
    fn test_step_word() {
        assert_eq!(encode_step(1.0), 0);
        assert_eq!(decode_step(encode_step(0.5)), 0.5);
        for step in [0.001f32, 0.01, 0.3, 0.75] {
            let decoded = decode_step(encode_step(step));
            assert!((decoded - step).abs() / step < 1e-3, "{step} -> {decoded}");
        }
    }

    #[test]
    fn test_absolute_step() {
        assert_eq!(absolute_step(0.5, 8), 128.0);
    }
}
