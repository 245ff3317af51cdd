use crate::address::{OverlayAddress, ADDRESS_SIZE};

/// Proximity of an address to itself: every bit agrees.
pub const MAX_PROXIMITY: usize = ADDRESS_SIZE * 8;

/// Returns the proximity order of the MSB distance between `one` and
/// `other`.
///
/// The distance metric MSB(x, y) of two equal-length bit sequences is the
/// big-endian integer cast of `x ^ y`. Proximity is a discrete logarithmic
/// scaling of that distance: the number of common leading zeros in the
/// binary representation of `x ^ y` (0 farthest, [`MAX_PROXIMITY`] for
/// identical addresses).
///
/// Taking the proximity order relative to a fixed point classifies
/// addresses into bins: items in each bin are at most half as distant from
/// the anchor as items in the previous bin, so a uniform sample maps onto
/// bins with cardinalities on a negative exponential scale. Any two items
/// in the same bin are at most half as distant from each other as from the
/// anchor, which is what makes relative proximity usable for local routing
/// decisions with a bounded hop count.
pub fn proximity(one: &OverlayAddress, other: &OverlayAddress) -> usize {
    for i in 0..ADDRESS_SIZE {
        let oxo = one.0[i] ^ other.0[i];
        if oxo != 0 {
            return i * 8 + oxo.leading_zeros() as usize;
        }
    }
    MAX_PROXIMITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proximity_single_bit() {
        let base = OverlayAddress::ZERO;
        for po in 0..MAX_PROXIMITY {
            let mut bytes = [0u8; ADDRESS_SIZE];
            bytes[po / 8] = 0x80 >> (po % 8);
            let addr = OverlayAddress::from(bytes);
            assert_eq!(proximity(&base, &addr), po, "bit {po}");
            assert_eq!(proximity(&addr, &base), po, "bit {po} reversed");
        }
    }

    #[test]
    fn test_proximity_self() {
        let addr = OverlayAddress::repeat_byte(0xa5);
        assert_eq!(proximity(&addr, &addr), MAX_PROXIMITY);
    }

    #[test]
    fn test_proximity_trailing_bits_ignored() {
        let base = OverlayAddress::ZERO;
        let a = OverlayAddress::right_padding_from(&[0b0000_0100, 0xff, 0xff]);
        assert_eq!(proximity(&base, &a), 5);
    }
}
