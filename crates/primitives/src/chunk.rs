use bytes::Bytes;

use crate::address::ChunkAddress;

/// A chunk of content-addressed data as handed over by the storage layer.
///
/// The payload is reference-counted, so cloning a chunk in and out of a
/// cache does not copy the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    address: ChunkAddress,
    data: Bytes,
}

impl Chunk {
    /// Creates a chunk from its address and payload.
    pub fn new(address: ChunkAddress, data: impl Into<Bytes>) -> Self {
        Self {
            address,
            data: data.into(),
        }
    }

    /// The chunk's address.
    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    /// The chunk payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_accessors() {
        let address = ChunkAddress::repeat_byte(0x01);
        let chunk = Chunk::new(address, &b"cached chunk payload"[..]);
        assert_eq!(chunk.address(), address);
        assert_eq!(chunk.data().as_ref(), b"cached chunk payload");
        assert_eq!(chunk.size(), 20);
    }
}
