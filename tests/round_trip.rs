//! End-to-end compress/decompress round trips through the reference codec.

use htj2k_bridge::{
    BmpPixelLayout, CompressionParams, DecodeOptions, ErrorKind, ImageDescriptor,
    ProgressionOrder, bmp_to_raw, compress, decompress, raw_to_bmp,
};
use htj2k_bridge::codestream::quantization::{absolute_step, decode_step, encode_step};

/// Gradient, checkerboard and diagonal ramp in components 0, 1 and 2; any
/// further component repeats the pattern of `c % 3`.
fn gradient_image(descriptor: &ImageDescriptor) -> Vec<u8> {
    let (w, h) = (descriptor.width as i64, descriptor.height as i64);
    let max = i64::from(descriptor.max_sample_value());
    let mut samples = Vec::with_capacity(descriptor.raw_size());
    for y in 0..h {
        for x in 0..w {
            for c in 0..descriptor.components {
                let value = match c % 3 {
                    0 => (x * max) / w,
                    1 => ((x / 16 + y / 16) % 2) * max,
                    _ => ((x + y) * max) / (w + h),
                };
                samples.push(value);
            }
        }
    }
    pack(descriptor, &samples)
}

fn pack(descriptor: &ImageDescriptor, samples: &[i64]) -> Vec<u8> {
    if descriptor.sample_width_bytes() == 1 {
        samples.iter().map(|&v| v as u8).collect()
    } else {
        samples
            .iter()
            .flat_map(|&v| (v as u16).to_le_bytes())
            .collect()
    }
}

fn unpack(descriptor: &ImageDescriptor, raw: &[u8]) -> Vec<i64> {
    match (descriptor.sample_width_bytes(), descriptor.signed) {
        (1, false) => raw.iter().map(|&b| i64::from(b)).collect(),
        (1, true) => raw.iter().map(|&b| i64::from(b as i8)).collect(),
        (_, false) => raw
            .chunks_exact(2)
            .map(|w| i64::from(u16::from_le_bytes([w[0], w[1]])))
            .collect(),
        (_, true) => raw
            .chunks_exact(2)
            .map(|w| i64::from(i16::from_le_bytes([w[0], w[1]])))
            .collect(),
    }
}

fn assert_lossless(descriptor: ImageDescriptor, params: CompressionParams) {
    let raw = gradient_image(&descriptor);
    let codestream = compress(&raw, &descriptor, &params).unwrap();
    let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
    assert_eq!(image.descriptor, descriptor.with_planar(false));
    assert_eq!(image.data.len(), raw.len());
    assert!(image.data == raw, "lossless round trip differs for {descriptor:?}");
}

#[test]
fn test_gradient_256x256_rgb_lossless() {
    let descriptor = ImageDescriptor::new(256, 256, 3, 8);
    let raw = gradient_image(&descriptor);
    assert_eq!(raw.len(), 196_608);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    assert_eq!(&codestream[..2], &[0xFF, 0x4F]);
    assert_eq!(&codestream[codestream.len() - 2..], &[0xFF, 0xD9]);

    let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
    assert_eq!(image.descriptor, descriptor);
    assert_eq!(image.data, raw);
}

#[test]
fn test_every_progression_order() {
    let descriptor = ImageDescriptor::new(64, 64, 3, 8);
    for order in ProgressionOrder::ALL {
        assert_lossless(
            descriptor,
            CompressionParams::default().with_progression_order(order),
        );
    }
}

#[test]
fn test_component_counts() {
    for components in [1, 2, 3, 4] {
        assert_lossless(
            ImageDescriptor::new(37, 23, components, 8),
            CompressionParams::default(),
        );
    }
}

#[test]
fn test_wide_samples() {
    for bits in [9, 12, 16] {
        assert_lossless(
            ImageDescriptor::new(31, 17, 3, bits),
            CompressionParams::default(),
        );
    }
    assert_lossless(
        ImageDescriptor::new(20, 20, 1, 16),
        CompressionParams::default().with_decomposition_levels(2),
    );
}

#[test]
fn test_signed_samples() {
    let descriptor = ImageDescriptor::new(19, 11, 3, 12).with_signed(true);
    let samples: Vec<i64> = (0..descriptor.samples_per_row() as i64 * 11)
        .map(|i| (i * 37) % 4096 - 2048)
        .collect();
    let raw = pack(&descriptor, &samples);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
    assert!(image.descriptor.signed);
    assert_eq!(unpack(&image.descriptor, &image.data), samples);
}

#[test]
fn test_planar_exchange_matches_interleaved() {
    let descriptor = ImageDescriptor::new(24, 13, 3, 8);
    let raw = gradient_image(&descriptor);
    let params = CompressionParams::default();
    let interleaved = compress(&raw, &descriptor, &params).unwrap();
    let planar = compress(&raw, &descriptor.with_planar(true), &params).unwrap();
    assert_eq!(interleaved, planar);
    assert_lossless(descriptor.with_planar(true), params);
}

#[test]
fn test_small_and_degenerate_extents() {
    let params = CompressionParams::default();
    assert_lossless(ImageDescriptor::new(1, 1, 1, 8), params);
    assert_lossless(ImageDescriptor::new(1, 40, 3, 8), params);
    assert_lossless(ImageDescriptor::new(40, 1, 4, 12), params);
    assert_lossless(
        ImageDescriptor::new(9, 9, 1, 1),
        params.with_decomposition_levels(0),
    );
}

#[test]
fn test_codeblock_sizes_and_levels() {
    let descriptor = ImageDescriptor::new(50, 30, 3, 8);
    assert_lossless(descriptor, CompressionParams::default().with_codeblock_size(4, 4));
    assert_lossless(descriptor, CompressionParams::default().with_codeblock_size(32, 128));
    assert_lossless(descriptor, CompressionParams::default().with_decomposition_levels(8));
    assert_lossless(descriptor, CompressionParams::default().with_color_transform(false));
}

#[test]
fn test_lossy_error_scales_with_step() {
    for (components, bits, relative) in [(1, 8, 0.001), (3, 8, 0.001), (3, 12, 0.001), (3, 8, 0.01)] {
        let descriptor = ImageDescriptor::new(64, 48, components, bits);
        let raw = gradient_image(&descriptor);
        let codestream = compress(&raw, &descriptor, &CompressionParams::lossy(relative)).unwrap();
        let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
        assert_eq!(image.descriptor, descriptor);

        // the step the codestream signals, scaled to the sample range
        let step = f64::from(absolute_step(decode_step(encode_step(relative)), bits));
        let tolerance = 8.0 * step + 1.0;
        let worst = unpack(&descriptor, &raw)
            .into_iter()
            .zip(unpack(&descriptor, &image.data))
            .map(|(expected, actual)| (expected - actual).abs())
            .max()
            .unwrap();
        assert!(
            worst as f64 <= tolerance,
            "error {worst} above {tolerance} ({components} components, {bits} bits, step {relative})"
        );
    }
}

#[test]
fn test_lossy_is_smaller_than_lossless() {
    let descriptor = ImageDescriptor::new(128, 128, 3, 8);
    let raw = gradient_image(&descriptor);
    let lossless = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let lossy = compress(&raw, &descriptor, &CompressionParams::lossy(0.05)).unwrap();
    assert!(lossy.len() < lossless.len());
}

/// Chroma that is constant over every 2x2 block survives subsampling exactly.
fn block_chroma_image(descriptor: &ImageDescriptor) -> Vec<u8> {
    let (w, h) = (descriptor.width, descriptor.height);
    (0..h)
        .flat_map(|y| {
            (0..w).flat_map(move |x| {
                let block = (x / 2 + 3 * (y / 2)) as u8;
                [(x * 7 + y) as u8, block.wrapping_mul(5), 255 - block]
            })
        })
        .collect()
}

#[test]
fn test_chroma_subsample_without_color_transform() {
    for (width, height) in [(64, 64), (15, 9)] {
        let descriptor = ImageDescriptor::new(width, height, 3, 8);
        let raw = block_chroma_image(&descriptor);
        let params = CompressionParams::default()
            .with_chroma_subsample(true)
            .with_color_transform(false);
        let codestream = compress(&raw, &descriptor, &params).unwrap();
        let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
        assert_eq!(image.descriptor, descriptor);
        assert_eq!(image.data, raw);
    }
}

#[test]
fn test_chroma_subsample_with_color_transform_is_rejected() {
    let descriptor = ImageDescriptor::new(16, 16, 3, 8);
    let raw = block_chroma_image(&descriptor);
    let err = compress(
        &raw,
        &descriptor,
        &CompressionParams::default().with_chroma_subsample(true),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodecFailure);
}

#[test]
fn test_resolution_reduction() {
    let descriptor = ImageDescriptor::new(64, 48, 3, 8);
    let raw = gradient_image(&descriptor);
    let params = CompressionParams::default().with_decomposition_levels(3);
    let codestream = compress(&raw, &descriptor, &params).unwrap();

    for reduce in 1..=3 {
        let options = DecodeOptions::default().with_reduce_level(reduce);
        let image = decompress(&codestream, &options).unwrap();
        assert_eq!(image.descriptor.width, 64 >> reduce);
        assert_eq!(image.descriptor.height, 48 >> reduce);
        assert_eq!(image.descriptor.components, 3);
        assert_eq!(image.data.len(), ((64 >> reduce) * (48 >> reduce) * 3) as usize);
    }

    let err = decompress(&codestream, &DecodeOptions::default().with_reduce_level(4)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodecFailure);
}

#[test]
fn test_reduced_odd_extent_with_wide_samples() {
    let descriptor = ImageDescriptor::new(45, 23, 1, 16);
    let raw = gradient_image(&descriptor);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let image = decompress(&codestream, &DecodeOptions::default().with_reduce_level(2)).unwrap();
    assert_eq!((image.descriptor.width, image.descriptor.height), (11, 5));
    assert_eq!(image.data.len(), 11 * 5 * 2);
}

#[test]
fn test_bmp_pixels_round_trip_through_codec() {
    let layout = BmpPixelLayout::new(13, 6, 24);
    let pixels: Vec<u8> = (0..layout.row_stride() * 6).map(|i| (i * 11) as u8).collect();
    let (raw, descriptor) = bmp_to_raw(&pixels, &layout).unwrap();
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let image = decompress(&codestream, &DecodeOptions::default()).unwrap();
    let (decoded, decoded_layout) = raw_to_bmp(&image.data, &image.descriptor).unwrap();
    assert_eq!(decoded_layout, layout);
    // padding bytes are not image data
    let stride = layout.row_stride();
    for (expected, decoded) in pixels.chunks(stride).zip(decoded.chunks(stride)) {
        assert_eq!(&expected[..13 * 3], &decoded[..13 * 3]);
    }
}
