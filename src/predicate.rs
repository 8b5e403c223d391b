use crate::md5::Digest;

/// Boolean test applied to every candidate digest.
///
/// A plain function pointer: the predicate is compiled in, never built from
/// runtime data, and can be shared by every worker without synchronization.
pub type Predicate = fn(&Digest) -> bool;

/// First byte a "magic" digest must start with.
pub const MAGIC_PREFIX: u8 = 0x0e;

/// Matches digests whose hex form reads `0e` followed by decimal digits only,
/// i.e. strings that loose numeric comparison treats as `0`.
pub fn magic_hash(digest: &Digest) -> bool {
    let bytes = digest.as_bytes();
    if bytes[0] != MAGIC_PREFIX {
        return false;
    }
    bytes[1..].iter().all(|&b| (b >> 4) <= 9 && (b & 0x0f) <= 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_hash_accepts_decimal_nibbles() {
        let d = Digest([
            0x0e, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
            0x07, 0x08, 0x09, 0x10, 0x99, 0x42, 0x90, 0x09,
        ]);
        assert!(magic_hash(&d));
    }

    #[test]
    fn test_magic_hash_rejects_hex_letters() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x0e;
        bytes[1] = 0x0a;
        assert!(!magic_hash(&Digest(bytes)));

        // high nibble >= 10
        bytes[1] = 0xa0;
        assert!(!magic_hash(&Digest(bytes)));

        // only the last byte is bad
        bytes[1] = 0x00;
        bytes[15] = 0x9f;
        assert!(!magic_hash(&Digest(bytes)));
    }

    #[test]
    fn test_magic_hash_requires_prefix() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x0f;
        assert!(!magic_hash(&Digest(bytes)));
        bytes[0] = 0x00;
        assert!(!magic_hash(&Digest(bytes)));
    }

    #[test]
    fn test_known_magic_string() {
        // "240610708" is the classic md5 magic-hash example: 0e462097431906509019562988736854
        let d = crate::md5::digest(b"240610708");
        assert_eq!(d.to_hex(), "0e462097431906509019562988736854");
        assert!(magic_hash(&d));
        assert!(!magic_hash(&crate::md5::digest(b"abc")));
    }
}
