use crate::address::{OverlayAddress, ADDRESS_SIZE};
use crate::proximity::proximity;

/// Returns the inclusive interval of chunk addresses for which `other` is
/// within the `prox_limit`-neighborhood of `one`.
///
/// When `other` sits inside the saturated neighborhood (`po >= prox_limit`)
/// the interval covers every address sharing `prox_limit` leading bits with
/// `one`. When the pair diverges earlier, the interval is the subtree on
/// `other`'s side of the first differing bit. The bounds are raw addresses,
/// ready for an external chunk iterator.
pub fn key_range(
    one: &OverlayAddress,
    other: &OverlayAddress,
    prox_limit: usize,
) -> (OverlayAddress, OverlayAddress) {
    (
        common_bits_address(one, other, prox_limit, 0x00),
        common_bits_address(one, other, prox_limit, 0xff),
    )
}

/// Builds an address that keeps the leading `min(po(one, other), prox_limit)`
/// bits of `one`, takes the next bit from `other` when the pair diverges
/// before the limit, and fills every remaining bit with `fill`.
fn common_bits_address(
    one: &OverlayAddress,
    other: &OverlayAddress,
    prox_limit: usize,
    fill: u8,
) -> OverlayAddress {
    let po = proximity(one, other);
    let diverges = prox_limit > po;
    let prox = if diverges { po } else { prox_limit };

    let pos = prox / 8;
    if pos >= ADDRESS_SIZE {
        // The whole prefix is shared; the interval collapses to a point.
        return *one;
    }
    let trans = prox % 8;
    let filled: u8 = (if diverges { 0x7f } else { 0xff }) >> trans;

    let mut addr = *one;
    let mut byte = addr.0[pos] & !filled;
    if diverges {
        byte |= other.0[pos] & (0x80 >> trans);
    }
    byte |= fill & filled;
    addr.0[pos] = byte;
    for b in addr.0[pos + 1..].iter_mut() {
        *b = fill;
    }
    addr
}
