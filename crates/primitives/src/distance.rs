use std::cmp::Ordering;

use alloy_primitives::U256;

use crate::address::{OverlayAddress, ADDRESS_SIZE};

/// Returns the distance between address `x` and address `y`: the XOR of the
/// two, cast big-endian to an integer.
pub fn distance(x: &OverlayAddress, y: &OverlayAddress) -> U256 {
    let mut xor = [0u8; ADDRESS_SIZE];
    for (i, b) in xor.iter_mut().enumerate() {
        *b = x.0[i] ^ y.0[i];
    }
    U256::from_be_slice(&xor)
}

/// Compares the distances of `x` and `y` to `anchor` under the XOR metric.
///
/// Returns:
/// - `Ordering::Less` if `x` is closer to `anchor` than `y`
/// - `Ordering::Equal` if `x` and `y` are equidistant from `anchor`
///   (which means `x` and `y` are the same address)
/// - `Ordering::Greater` if `x` is farther from `anchor` than `y`
pub fn distance_cmp(anchor: &OverlayAddress, x: &OverlayAddress, y: &OverlayAddress) -> Ordering {
    for i in 0..ADDRESS_SIZE {
        let dx = x.0[i] ^ anchor.0[i];
        let dy = y.0[i] ^ anchor.0[i];
        if dx != dy {
            return if dx < dy {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_primitives::b256;

    use super::*;

    #[test]
    fn test_distance() {
        let x = b256!("9100000000000000000000000000000000000000000000000000000000000000");
        let y = b256!("8200000000000000000000000000000000000000000000000000000000000000");

        assert_eq!(
            distance(&x, &y),
            U256::from_str(
                "8593944123082061379093159043613555660984881674403010612303492563087302590464"
            )
            .unwrap()
        );
    }

    macro_rules! distance_cmp_test {
        ($test_name:ident, $ordering:expr, $a:expr, $x:expr, $y:expr) => {
            #[test]
            fn $test_name() {
                assert_eq!(distance_cmp(&b256!($a), &b256!($x), &b256!($y)), $ordering);
            }
        };
    }

    distance_cmp_test!(
        distance_cmp_eq,
        Ordering::Equal,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000"
    );

    distance_cmp_test!(
        distance_cmp_closer,
        Ordering::Less,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "8200000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000"
    );

    distance_cmp_test!(
        distance_cmp_farther,
        Ordering::Greater,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000",
        "8200000000000000000000000000000000000000000000000000000000000000"
    );
}
