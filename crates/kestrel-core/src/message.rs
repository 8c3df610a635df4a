//! Fixed-shape actor messages
//!
//! TigerStyle: Fixed width, no variable-length fields.
//!
//! Wire layout (24 bytes, little-endian):
//!
//! ```text
//! +---------------------------+-------------+
//! | sender_id (u128, 16 B)    | payload (8) |
//! +---------------------------+-------------+
//! ```

use crate::actor::ActorId;
use crate::constants::MESSAGE_WIRE_SIZE_BYTES;
use crate::error::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A message exchanged between actors
///
/// Copied by value between components; immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Message {
    sender_id: ActorId,
    payload: u64,
}

impl Message {
    /// Create a new message
    pub fn new(sender_id: ActorId, payload: u64) -> Self {
        Self { sender_id, payload }
    }

    /// The identity of the sending actor
    pub fn sender_id(&self) -> ActorId {
        self.sender_id
    }

    /// The message payload
    pub fn payload(&self) -> u64 {
        self.payload
    }

    /// Encode into a freshly allocated buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(MESSAGE_WIRE_SIZE_BYTES);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the wire form to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let start = buf.len();
        buf.reserve(MESSAGE_WIRE_SIZE_BYTES);
        buf.put_u128_le(self.sender_id.get());
        buf.put_u64_le(self.payload);
        debug_assert_eq!(buf.len() - start, MESSAGE_WIRE_SIZE_BYTES);
    }

    /// Decode a message from exactly [`MESSAGE_WIRE_SIZE_BYTES`] bytes
    ///
    /// # Errors
    /// - `Error::MessageSizeInvalid` if `bytes` has the wrong length
    /// - `Error::InvalidActorId` if the encoded sender is zero
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != MESSAGE_WIRE_SIZE_BYTES {
            return Err(Error::MessageSizeInvalid {
                size: bytes.len(),
                expected: MESSAGE_WIRE_SIZE_BYTES,
            });
        }

        let mut buf = bytes;
        let sender_id = ActorId::try_new(buf.get_u128_le())?;
        let payload = buf.get_u64_le();
        debug_assert!(buf.is_empty());

        Ok(Self { sender_id, payload })
    }
}
