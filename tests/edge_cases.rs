// tests/edge_cases.rs
//
// Edge case tests for webp-batch
// Boundary sizes, repeated inputs, encode/storage failures and storage upkeep

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use webp_batch::engine::{fit_within, Bounds, Codec, ImageCodec, WEBP_MAX_DIMENSION};
use webp_batch::{ErrorKind, TempStorage, TranscodeConfig, Transcoder, Upload};

// Helper function to create test images
fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn png_of(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn png(width: u32, height: u32) -> Vec<u8> {
    png_of(&create_test_image(width, height))
}

fn codec_in(dir: &tempfile::TempDir) -> ImageCodec {
    ImageCodec::new(TempStorage::new(dir.path()))
}

fn entries(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

mod geometry_tests {
    use super::*;

    #[test]
    fn test_within_bounds_is_not_resized() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let bounds = Bounds::new(1920, 1080).unwrap();
        for (w, h) in [(800, 600), (1920, 1080), (1, 1), (1920, 1), (1, 1080)] {
            let upload = Upload::from_bytes("in.png", "image/png", png(w, h));
            let info = codec.transcode(&upload, bounds).unwrap();
            assert_eq!((info.width, info.height), (w, h));
        }
    }

    #[test]
    fn test_limiting_side_equals_bound() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let bounds = Bounds::new(300, 300).unwrap();

        let wide = Upload::from_bytes("wide.png", "image/png", png(1000, 500));
        let info = codec.transcode(&wide, bounds).unwrap();
        assert_eq!((info.width, info.height), (300, 150));

        let tall = Upload::from_bytes("tall.png", "image/png", png(500, 1000));
        let info = codec.transcode(&tall, bounds).unwrap();
        assert_eq!((info.width, info.height), (150, 300));
    }

    #[test]
    fn test_one_side_over_bound() {
        // Only the height is too large
        assert_eq!(
            fit_within(800, 2000, Bounds::new(1920, 1080).unwrap()),
            Some((432, 1080))
        );
        // Extreme aspect ratio never collapses to zero
        assert_eq!(
            fit_within(10_000, 3, Bounds::new(100, 100).unwrap()),
            Some((100, 1))
        );
    }

    #[test]
    fn test_zero_bounds_rejected() {
        assert_eq!(Bounds::new(0, 10).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(Bounds::new(10, 0).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
}

mod repeat_tests {
    use super::*;

    #[test]
    fn test_same_input_twice_gives_distinct_files_with_equal_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TranscodeConfig::new(dir.path().join("temp"))
            .with_bounds(64, 64)
            .with_workers(2);
        let t = Transcoder::from_config(&config).unwrap();
        let data = png(120, 90);
        let images = t
            .process_batch(vec![
                Upload::from_bytes("a.png", "image/png", data.clone()),
                Upload::from_bytes("a.png", "image/png", data),
            ])
            .unwrap();

        let (a, b) = (&images.images[0], &images.images[1]);
        assert_ne!(a.filename, b.filename);
        assert_eq!(a.encoded_size, b.encoded_size);
        assert_eq!(a.original_size, b.original_size);
        let bytes_a = std::fs::read(t.storage().root().join(&a.filename)).unwrap();
        let bytes_b = std::fs::read(t.storage().root().join(&b.filename)).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_encode_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let upload = Upload::from_bytes("wide.png", "image/png", png(WEBP_MAX_DIMENSION + 1, 1));
        let bounds = Bounds::new(WEBP_MAX_DIMENSION * 2, 10).unwrap();
        let err = codec.transcode(&upload, bounds).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeError);
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_decode_failures() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let bounds = Bounds::new(64, 64).unwrap();

        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("empty", Vec::new()),
            ("text", b"hello world".to_vec()),
            ("truncated", {
                let full = png(32, 32);
                full[..full.len() / 3].to_vec()
            }),
        ];
        for (name, data) in cases {
            let upload = Upload::from_bytes(name, "image/png", data);
            let err = codec.transcode(&upload, bounds).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DecodeError, "{name}");
        }
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_decompression_bomb_header_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        // 40000x1: over MAX_DIMENSION, tiny on the wire
        let upload = Upload::from_bytes("bomb.png", "image/png", png(40_000, 1));
        let err = codec
            .transcode(&upload, Bounds::new(64, 64).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[cfg(not(feature = "heif"))]
    #[test]
    fn test_heic_without_support_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let upload = Upload::from_bytes("photo.heic", "image/heic", png(4, 4));
        let err = codec
            .transcode(&upload, Bounds::new(64, 64).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        assert_eq!(entries(&dir), 0);
    }

    #[test]
    fn test_missing_storage_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let codec = ImageCodec::new(TempStorage::new(dir.path().join("gone")));
        let upload = Upload::from_bytes("a.png", "image/png", png(4, 4));
        let err = codec
            .transcode(&upload, Bounds::new(64, 64).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageError);
    }

    #[test]
    fn test_missing_path_upload() {
        let dir = tempfile::tempdir().unwrap();
        let err = Upload::from_path("x.png", "image/png", dir.path().join("nope.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }
}

mod format_tests {
    use super::*;

    #[test]
    fn test_alpha_survives() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(40, 40, |x, _| {
            Rgba([0, 0, 255, if x < 20 { 0 } else { 255 }])
        }));
        let upload = Upload::from_bytes("alpha.png", "image/png", png_of(&img));
        let info = codec.transcode(&upload, Bounds::new(20, 20).unwrap()).unwrap();
        let stored = image::open(dir.path().join(&info.filename)).unwrap();
        assert!(stored.color().has_alpha());
        assert_eq!(stored.dimensions(), (20, 20));
    }

    #[test]
    fn test_webp_input_is_reencoded() {
        let dir = tempfile::tempdir().unwrap();
        let codec = codec_in(&dir);
        let rgb = create_test_image(30, 20).to_rgb8();
        let webp = webp::Encoder::from_rgb(rgb.as_raw(), 30, 20)
            .encode(90.0)
            .to_vec();
        let upload = Upload::from_bytes("in.webp", "image/webp", webp);
        let info = codec.transcode(&upload, Bounds::new(15, 15).unwrap()).unwrap();
        assert_eq!((info.width, info.height), (15, 10));
    }
}

mod storage_tests {
    use super::*;

    #[test]
    fn test_delete_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let config = TranscodeConfig::new(dir.path().join("temp")).with_workers(1);
        let t = Transcoder::from_config(&config).unwrap();
        let uploads = (0..4)
            .map(|i| Upload::from_bytes(format!("{i}.png"), "image/png", png(6, 6)))
            .collect();
        let images = t.process_batch(uploads).unwrap();

        t.delete_output(&images.images[1].filename).unwrap();
        let err = t.delete_output(&images.images[1].filename).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageError);
        let err = t.delete_output("../escape.webp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert_eq!(t.cleanup().unwrap(), 3);
        assert!(t.list_outputs().unwrap().is_empty());
        assert!(t.storage().root().is_dir());
    }
}
