#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use webp_batch::engine::Bounds;
use webp_batch::{TranscodeConfig, Transcoder, Upload};

#[derive(Arbitrary, Debug)]
struct Input {
    items: Vec<(u8, Vec<u8>)>,
    workers: u8,
    max_width: u16,
    max_height: u16,
}

const CONTENT_TYPES: [&str; 5] = ["image/jpeg", "image/png", "image/webp", "image/heic", "image/bmp"];

fuzz_target!(|input: Input| {
    // Cap items to avoid huge allocations
    let items: Vec<_> = input.items.into_iter().take(32).collect();
    let Ok(bounds) = Bounds::new(input.max_width as u32, input.max_height as u32) else {
        return;
    };
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let config = TranscodeConfig::new(dir.path()).with_workers((input.workers % 8) as usize + 1);
    let Ok(transcoder) = Transcoder::from_config(&config) else {
        return;
    };

    let total = items.len();
    let uploads: Vec<Upload> = items
        .into_iter()
        .enumerate()
        .map(|(i, (kind, data))| {
            let content_type = CONTENT_TYPES[kind as usize % CONTENT_TYPES.len()];
            Upload::from_bytes(format!("{i}"), content_type, data)
        })
        .collect();

    match transcoder.process_batch_with_bounds(uploads, bounds) {
        Ok(images) => {
            assert_eq!(images.len(), total);
            for info in images.iter() {
                assert!(info.width <= bounds.max_width() && info.height <= bounds.max_height());
            }
        }
        Err(err) => {
            assert!(err.index().map_or(total == 0, |i| i < total));
        }
    }
});
