//! Primitive types shared across the apiary overlay.
//!
//! Every peer and every cached chunk lives in the same fixed-width address
//! space; this crate holds that address type together with the XOR
//! proximity algebra built on it, and the chunk shape exchanged with the
//! storage layer.

mod address;
mod chunk;
mod distance;
mod keyrange;
mod proximity;

pub use address::{ChunkAddress, OverlayAddress, PrefixBits, ADDRESS_SIZE};
pub use chunk::Chunk;
pub use distance::{distance, distance_cmp};
pub use keyrange::key_range;
pub use proximity::{proximity, MAX_PROXIMITY};
