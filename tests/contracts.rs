//! Caller-buffer sizing, file-path variants, parameter validation and damaged
//! codestreams.

use htj2k_bridge::{
    BridgeError, BufferFill, CompressionParams, DecodeOptions, ErrorKind, ImageDescriptor,
    compress, compress_into, compress_to_file, decompress, decompress_from_file, decompress_into,
};

fn test_image(width: u32, height: u32, components: u8) -> (Vec<u8>, ImageDescriptor) {
    let descriptor = ImageDescriptor::new(width, height, components, 8);
    let raw = (0..descriptor.raw_size())
        .map(|i| {
            let pixel = i / usize::from(components);
            let (x, y) = (pixel % width as usize, pixel / width as usize);
            ((x * 3 + y * 5 + (i % usize::from(components)) * 40) % 256) as u8
        })
        .collect();
    (raw, descriptor)
}

/// Deterministic byte noise.
fn noise(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

#[test]
fn test_compress_into_reports_required_size() {
    let (raw, descriptor) = test_image(40, 30, 3);
    let params = CompressionParams::default();
    let expected = compress(&raw, &descriptor, &params).unwrap();

    let mut small = vec![0xAAu8; 10];
    let fill = compress_into(&raw, &descriptor, &params, &mut small).unwrap();
    assert_eq!(fill, BufferFill::TooSmall(expected.len()));
    assert!(small.iter().all(|&b| b == 0xAA));
    assert!(matches!(
        fill.into_result(),
        Err(BridgeError::BufferTooSmall { required }) if required == expected.len()
    ));

    let mut exact = vec![0u8; expected.len()];
    let fill = compress_into(&raw, &descriptor, &params, &mut exact).unwrap();
    assert_eq!(fill, BufferFill::Filled(expected.len()));
    assert_eq!(exact, expected);

    let mut roomy = vec![0u8; expected.len() + 64];
    let written = compress_into(&raw, &descriptor, &params, &mut roomy)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(&roomy[..written], &expected[..]);
}

#[test]
fn test_decompress_into_reports_required_size() {
    let (raw, descriptor) = test_image(33, 17, 4);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let options = DecodeOptions::default();

    let mut small = vec![7u8; raw.len() - 1];
    let (fill, layout) = decompress_into(&codestream, &mut small, &options).unwrap();
    assert_eq!(fill, BufferFill::TooSmall(raw.len()));
    assert_eq!(layout, descriptor);
    assert!(small.iter().all(|&b| b == 7));

    let mut out = vec![0u8; raw.len()];
    let (fill, _) = decompress_into(&codestream, &mut out, &options).unwrap();
    assert!(fill.is_filled());
    assert_eq!(out, raw);
}

#[test]
fn test_reduced_decode_into_reports_reduced_size() {
    let (raw, descriptor) = test_image(64, 40, 1);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let options = DecodeOptions::default().with_reduce_level(1);
    let mut out = Vec::new();
    let (fill, layout) = decompress_into(&codestream, &mut out, &options).unwrap();
    assert_eq!(fill, BufferFill::TooSmall(32 * 20));
    assert_eq!((layout.width, layout.height), (32, 20));
}

#[test]
fn test_invalid_parameters() {
    let (raw, descriptor) = test_image(8, 8, 3);
    let params = CompressionParams::default();
    let cases: Vec<(Vec<u8>, ImageDescriptor, CompressionParams)> = vec![
        (raw[..raw.len() - 1].to_vec(), descriptor, params),
        (raw.clone(), ImageDescriptor::new(0, 8, 3, 8), params),
        (raw.clone(), ImageDescriptor::new(8, 8, 5, 8), params),
        (raw.clone(), ImageDescriptor::new(8, 8, 3, 17), params),
        (raw.clone(), descriptor, params.with_codeblock_size(3, 64)),
        (raw.clone(), descriptor, params.with_codeblock_size(128, 64)),
        (raw.clone(), descriptor, params.with_decomposition_levels(33)),
        (raw.clone(), descriptor, CompressionParams::lossy(0.0)),
        (raw.clone(), descriptor, CompressionParams::lossy(f32::NAN)),
        (raw.clone(), descriptor, CompressionParams::lossy(2.0)),
        (raw.clone(), descriptor, CompressionParams::lossy(4.0)),
    ];
    for (raw, descriptor, params) in cases {
        let err = compress(&raw, &descriptor, &params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter, "{descriptor:?} {params:?}");
    }

    // 16-bit samples need an even byte count
    let wide = ImageDescriptor::new(3, 1, 1, 16);
    assert!(compress(&[0; 5], &wide, &params).is_err());
    assert_eq!(
        decompress(&[], &DecodeOptions::default()).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
}

#[test]
fn test_lossless_ignores_quantization_step() {
    let (raw, descriptor) = test_image(16, 16, 1);
    let params = CompressionParams {
        quantization_step: -1.0,
        ..CompressionParams::default()
    };
    let codestream = compress(&raw, &descriptor, &params).unwrap();
    assert_eq!(decompress(&codestream, &DecodeOptions::default()).unwrap().data, raw);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.j2c");
    let (raw, descriptor) = test_image(48, 32, 3);
    let params = CompressionParams::default();

    let written = compress_to_file(&raw, &descriptor, &params, &path).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(written, on_disk.len() as u64);
    assert_eq!(on_disk, compress(&raw, &descriptor, &params).unwrap());

    let image = decompress_from_file(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(image.descriptor, descriptor);
    assert_eq!(image.data, raw);
}

#[test]
fn test_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.j2c");
    let err = decompress_from_file(&missing, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodecFailure);
    assert!(matches!(err, BridgeError::Io { .. }));
    assert!(err.to_string().contains("missing.j2c"));

    let unwritable = dir.path().join("no-such-dir").join("out.j2c");
    let (raw, descriptor) = test_image(8, 8, 1);
    let err = compress_to_file(&raw, &descriptor, &CompressionParams::default(), &unwritable)
        .unwrap_err();
    assert!(matches!(err, BridgeError::Io { .. }));

    let empty = dir.path().join("empty.j2c");
    std::fs::write(&empty, []).unwrap();
    let err = decompress_from_file(&empty, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_failed_file_compress_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chroma.j2c");
    let (raw, descriptor) = test_image(16, 16, 3);
    let params = CompressionParams::default().with_chroma_subsample(true);
    let err = compress_to_file(&raw, &descriptor, &params, &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodecFailure);
    assert!(!path.exists());

    // invalid input is rejected before the file is created
    let err = compress_to_file(&raw[1..], &descriptor, &params, &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert!(!path.exists());
}

#[test]
fn test_resilient_decode_of_corrupted_stream() {
    let (raw, descriptor) = test_image(256, 256, 3);
    let mut codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    assert!(codestream.len() > 600);
    codestream[500..520].copy_from_slice(&noise(7, 20));

    let options = DecodeOptions::default().with_resilient(true);
    match decompress(&codestream, &options) {
        Ok(image) => {
            assert_eq!(image.descriptor, descriptor);
            assert_eq!(image.data.len(), raw.len());
        }
        Err(err) => assert_eq!(err.kind(), ErrorKind::CodecFailure),
    }
}

#[test]
fn test_truncated_stream_strict_and_resilient() {
    let (raw, descriptor) = test_image(64, 64, 3);
    let codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    let truncated = &codestream[..codestream.len() * 2 / 3];

    let err = decompress(truncated, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodecFailure);

    let image = decompress(truncated, &DecodeOptions::default().with_resilient(true)).unwrap();
    assert_eq!(image.descriptor, descriptor);
    assert_eq!(image.data.len(), raw.len());
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_oversized_extent_is_a_codec_failure() {
    let (raw, descriptor) = test_image(8, 8, 1);
    let mut codestream = compress(&raw, &descriptor, &CompressionParams::default()).unwrap();
    // Xsiz, Ysiz, then XTsiz, YTsiz after the two origin fields
    for field in [8, 12, 24, 28] {
        codestream[field..field + 4].copy_from_slice(&u32::MAX.to_be_bytes());
    }
    for options in [DecodeOptions::default(), DecodeOptions::default().with_resilient(true)] {
        let err = decompress(&codestream, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CodecFailure, "{options:?}");
        assert!(err.to_string().contains("Not enough memory"), "{err}");
    }
}

#[test]
fn test_garbage_is_a_codec_failure() {
    for seed in 1..8 {
        let bytes = noise(seed, 300);
        for options in [
            DecodeOptions::default(),
            DecodeOptions::default().with_resilient(true),
        ] {
            let err = decompress(&bytes, &options).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CodecFailure);
        }
    }
}
