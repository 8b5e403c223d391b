//! MD5 engine vs the md-5 crate, across every padding boundary

use md5::{Digest as _, Md5};
use preimage_search::digest;

fn reference(message: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(message));
    out
}

#[test]
fn test_all_lengths_up_to_three_blocks() {
    let mut message = Vec::with_capacity(130);
    for len in 0..=130usize {
        message.clear();
        message.extend((0..len).map(|i| (i * 31 + 7) as u8));
        assert_eq!(
            digest(&message).0,
            reference(&message),
            "length {}",
            len
        );
    }
}

#[test]
fn test_padding_boundaries() {
    // 55 fits one block, 56..=63 spill the length into a second one
    for len in [55usize, 56, 57, 63, 64, 65, 119, 120] {
        let message = vec![b'a'; len];
        assert_eq!(digest(&message).0, reference(&message), "length {}", len);
    }
}

#[test]
fn test_seeded_random_messages() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x6d35);
    for _ in 0..200 {
        let len = rng.gen_range(0..300usize);
        let message: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        assert_eq!(digest(&message).0, reference(&message));
    }
}
