use narcrs::narc::Archive;
use narcrs::tree::{NodeId, Tree};
use narcrs::yaz0;
use proptest::prelude::*;

/// Build a tree from a flat list of (depth hint, is_dir, name, contents).
fn build(items: &[(usize, bool, String, Vec<u8>)]) -> Tree {
    let mut tree = Tree::new();
    let mut dirs: Vec<NodeId> = vec![tree.root()];
    for (hint, is_dir, name, contents) in items {
        let parent = dirs[hint % dirs.len()];
        let node = if *is_dir {
            tree.new_branch(name.as_str()).unwrap()
        } else {
            tree.new_leaf(name.as_str(), contents.clone()).unwrap()
        };
        tree.add_child(parent, node).unwrap();
        if *is_dir {
            dirs.push(node);
        }
    }
    tree
}

fn snapshot(tree: &Tree) -> Vec<(usize, String, Option<Vec<u8>>)> {
    tree.walk(tree.root())
        .map(|(d, id)| (d, tree.path_of(id).unwrap(), tree.contents(id).ok().map(<[u8]>::to_vec)))
        .collect()
}

fn items() -> impl Strategy<Value = Vec<(usize, bool, String, Vec<u8>)>> {
    proptest::collection::vec(
        (
            0usize..64,
            any::<bool>(),
            "[a-zA-Z0-9_.]{1,12}",
            proptest::collection::vec(any::<u8>(), 0..64),
        ),
        0..40,
    )
}

proptest! {
    #[test]
    fn prop_yaz0_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        level in 1u32..=9u32
    ) {
        let packed = yaz0::compress(&data, level);
        prop_assert_eq!(packed.len() % 4, 0);
        prop_assert_eq!(yaz0::decompress(&packed).unwrap(), data);
    }

    #[test]
    fn prop_yaz0_roundtrip_low_entropy(
        data in proptest::collection::vec(0u8..4, 0..8192),
        level in 1u32..=9u32
    ) {
        let packed = yaz0::compress(&data, level);
        prop_assert_eq!(yaz0::decompress(&packed).unwrap(), data);
    }

    #[test]
    fn prop_decoded_output_independent_of_level(
        data in proptest::collection::vec(0u8..8, 0..2048),
        a in 1u32..=9u32,
        b in 1u32..=9u32
    ) {
        let da = yaz0::decompress(&yaz0::compress(&data, a)).unwrap();
        let db = yaz0::decompress(&yaz0::compress(&data, b)).unwrap();
        prop_assert_eq!(da, db);
    }

    #[test]
    fn prop_yaz0_decompress_never_panics(
        data in proptest::collection::vec(any::<u8>(), 0..256)
    ) {
        let mut stream = b"Yaz0\0\0\x01\0\0\0\0\0\0\0\0\0".to_vec();
        stream.extend_from_slice(&data);
        let _ = yaz0::decompress(&stream);
    }

    #[test]
    fn prop_archive_roundtrip(
        items in items(),
        aligned in any::<bool>()
    ) {
        let archive = Archive { tree: build(&items), nameless: false, has_alignment: aligned };
        let bytes = archive.encode().unwrap();
        let back = Archive::decode(&bytes).unwrap();
        prop_assert_eq!(snapshot(&back.tree), snapshot(&archive.tree));
        if aligned {
            prop_assert!(back.has_alignment);
        } else if back.has_alignment {
            // Only when both layouts produce the same bytes.
            let padded = Archive { has_alignment: true, ..back.clone() };
            prop_assert_eq!(padded.encode().unwrap(), bytes.clone());
        }
        prop_assert_eq!(back.encode().unwrap(), bytes);
    }

    #[test]
    fn prop_nameless_keeps_file_count(items in items()) {
        let archive = Archive { tree: build(&items), nameless: true, has_alignment: true };
        let back = Archive::decode(&archive.encode().unwrap()).unwrap();
        prop_assert_eq!(back.file_count(), archive.file_count());
        let root_children = back.tree.children(back.root()).unwrap();
        prop_assert!(root_children.iter().all(|&c| back.tree.is_leaf(c)));
    }

    #[test]
    fn prop_narc_decode_never_panics(
        data in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut bytes = b"NARC\xFE\xFF\x00\x01".to_vec();
        bytes.extend_from_slice(&((data.len() + 16) as u32).to_le_bytes());
        bytes.extend_from_slice(&[0x10, 0x00, 0x03, 0x00]);
        bytes.extend_from_slice(&data);
        let _ = Archive::decode(&bytes);
    }

    #[test]
    fn prop_add_then_remove_restores_children(items in items()) {
        let mut tree = build(&items);
        let root = tree.root();
        let before = tree.children(root).unwrap().to_vec();
        let extra = tree.new_leaf("extra", vec![1]).unwrap();
        tree.add_child(root, extra).unwrap();
        let removed = tree.remove_child(root, extra).unwrap();
        prop_assert_eq!(removed, extra);
        prop_assert_eq!(tree.children(root).unwrap(), before.as_slice());
    }
}
