#![no_main]
use libfuzzer_sys::fuzz_target;
use narcrs::narc::Archive;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Byte 0: flags. Remaining bytes: (parent selector, kind/length) pairs.
    let flags = data[0];
    let mut archive = Archive {
        nameless: flags & 1 != 0,
        has_alignment: flags & 2 != 0,
        ..Archive::default()
    };
    let mut dirs = vec![archive.root()];
    for (i, pair) in data[1..].chunks_exact(2).enumerate() {
        let parent = dirs[pair[0] as usize % dirs.len()];
        let name = format!("n{i}");
        if pair[1] & 0x80 != 0 {
            let dir = archive.tree.branch_or_create(parent, &name).unwrap();
            dirs.push(dir);
        } else {
            let contents = vec![pair[0]; (pair[1] & 0x7F) as usize];
            archive.tree.put_leaf(parent, &name, contents).unwrap();
        }
    }

    let bytes = archive.encode().unwrap();
    let back = Archive::decode(&bytes).unwrap();
    assert_eq!(back.file_count(), archive.file_count());
    assert_eq!(back.nameless, archive.nameless);
    if archive.has_alignment {
        assert!(back.has_alignment);
    }
    assert_eq!(back.encode().unwrap(), bytes);
});
