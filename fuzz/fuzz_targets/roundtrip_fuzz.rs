#![no_main]
use libfuzzer_sys::fuzz_target;
use narcrs::yaz0;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the level.
    let level = (data[0] % 9) as u32 + 1;
    let payload = &data[1..];

    let packed = yaz0::compress(payload, level);
    assert_eq!(packed.len() % 4, 0);
    let unpacked = yaz0::decompress(&packed).unwrap();
    assert_eq!(unpacked, payload);
});
