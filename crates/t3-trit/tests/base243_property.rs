//! Property tests for base-243 packing.

use proptest::prelude::*;
use t3_trit::{pack_base243, unpack_base243, TRITS_PER_BYTE};

proptest! {
    /// `unpack(pack(v), |v|) == v` for arbitrary unbalanced trit vectors.
    #[test]
    fn pack_unpack_roundtrip(trits in prop::collection::vec(0u8..3, 0..512)) {
        let bytes = pack_base243(&trits);
        prop_assert_eq!(bytes.len(), trits.len().div_ceil(TRITS_PER_BYTE));
        let back = unpack_base243(&bytes, trits.len()).unwrap();
        prop_assert_eq!(back, trits);
    }

    /// Packed bytes stay within [0, 242] and a partial tail byte within 3^k.
    #[test]
    fn packed_bytes_in_range(trits in prop::collection::vec(0u8..3, 1..512)) {
        let bytes = pack_base243(&trits);
        for &b in &bytes {
            prop_assert!(u16::from(b) < 243);
        }
        let tail = trits.len() % TRITS_PER_BYTE;
        if tail != 0 {
            let last = *bytes.last().unwrap();
            prop_assert!(u16::from(last) < 3u16.pow(tail as u32));
        }
    }
}
