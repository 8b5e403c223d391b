//! Metal kernel vs the host kernel, flag for flag

#![cfg(all(feature = "gpu", target_os = "macos"))]

use preimage_search::gpu::{MetalContext, MetalDevice};
use preimage_search::{magic_hash, Alphabet, ComputeDevice, DeviceLayout, HostDevice, Pattern, SearchSpace, WILDCARD};

fn layout(template: &str, lo: u8, hi: u8) -> DeviceLayout {
    let pattern = Pattern::parse(template.as_bytes(), WILDCARD, true).unwrap();
    let alphabets = vec![Alphabet::range(lo, hi).unwrap()];
    let space = SearchSpace::new(pattern, &alphabets).unwrap();
    DeviceLayout::new(&space, &alphabets).unwrap()
}

#[test]
fn test_metal_flags_match_host() {
    if !MetalContext::is_available() {
        println!("No Metal device - skipping");
        return;
    }

    // 10^5 candidates, contains "240610708"
    let layout = layout("2406?????", b'0', b'9');
    let chunk = 4096;

    let mut metal = MetalDevice::open().expect("Metal init failed");
    let mut host = HostDevice::new(magic_hash);
    metal.prepare(&layout, chunk).unwrap();
    host.prepare(&layout, chunk).unwrap();

    let mut offset = 0u64;
    let mut hits = Vec::new();
    while offset < layout.total {
        let count = (chunk as u64).min(layout.total - offset) as usize;
        let mut from_metal = vec![0u8; count];
        let mut from_host = vec![0u8; count];
        metal.dispatch(offset, &mut from_metal).unwrap();
        host.dispatch(offset, &mut from_host).unwrap();
        assert_eq!(from_metal, from_host, "chunk at {}", offset);

        hits.extend(
            from_metal
                .iter()
                .enumerate()
                .filter(|&(_, &f)| f != 0)
                .map(|(i, _)| layout.candidate(offset + i as u64)),
        );
        offset += count as u64;
    }

    assert!(hits.contains(&b"240610708".to_vec()));
}
