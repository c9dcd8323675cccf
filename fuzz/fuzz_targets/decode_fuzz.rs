#![no_main]
use libfuzzer_sys::fuzz_target;
use narcrs::{narc, yaz0};

fuzz_target!(|data: &[u8]| {
    // Neither decoder may panic on arbitrary bytes, only return errors.
    let _ = narc::decode(data);
    let _ = yaz0::decompress(data);

    // Reach past the magic checks as well.
    let mut narc_like = b"NARC\xFE\xFF\x00\x01".to_vec();
    narc_like.extend_from_slice(&((data.len() + 16) as u32).to_le_bytes());
    narc_like.extend_from_slice(&[0x10, 0x00, 0x03, 0x00]);
    narc_like.extend_from_slice(data);
    let _ = narc::decode(&narc_like);

    let mut yaz0_like = b"Yaz0".to_vec();
    yaz0_like.extend_from_slice(&((data.len() * 4) as u32).to_be_bytes());
    yaz0_like.extend_from_slice(&[0; 8]);
    yaz0_like.extend_from_slice(data);
    let _ = yaz0::decompress(&yaz0_like);
});
