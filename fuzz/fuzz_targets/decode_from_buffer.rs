#![no_main]

use libfuzzer_sys::fuzz_target;
use webp_batch::engine::{decode_image, MediaType};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Declared type only picks the decode path; every path must fail cleanly
    for media_type in [MediaType::Jpeg, MediaType::Png, MediaType::WebP, MediaType::Heic] {
        let _ = decode_image(data, media_type);
    }
});
