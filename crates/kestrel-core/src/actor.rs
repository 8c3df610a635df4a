//! Actor identity for Kestrel
//!
//! TigerStyle: Explicit types, assertions, bounded operations.

use crate::constants::ACTOR_ID_NODE_BITS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU128;

/// Unique identifier for an actor
///
/// A 128-bit unsigned integer. Zero is reserved and cannot be represented.
/// The core treats the value as an opaque key; callers may split it into
/// a node part (high 64 bits) and a local part (low 64 bits) with
/// [`ActorId::from_parts`].
///
/// # TigerStyle
/// - Zero rejected on construction
/// - Immutable after creation
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct ActorId(NonZeroU128);

impl ActorId {
    /// Create a new ActorId
    ///
    /// # Panics
    /// Panics if `id` is zero. A zero id is a programmer error.
    pub fn new(id: u128) -> Self {
        let Some(id) = NonZeroU128::new(id) else {
            panic!("actor id must be non-zero");
        };
        Self(id)
    }

    /// Create a new ActorId from untrusted input
    ///
    /// # Errors
    /// Returns `Error::InvalidActorId` if `id` is zero.
    pub fn try_new(id: u128) -> Result<Self> {
        NonZeroU128::new(id).map(Self).ok_or_else(|| Error::InvalidActorId {
            reason: "actor id 0 is reserved".into(),
        })
    }

    /// Compose an id from a node part and a local part
    ///
    /// # Panics
    /// Panics if both parts are zero.
    pub fn from_parts(node: u64, local: u64) -> Self {
        Self::new((u128::from(node) << ACTOR_ID_NODE_BITS) | u128::from(local))
    }

    /// Get the raw 128-bit value
    pub fn get(&self) -> u128 {
        self.0.get()
    }

    /// Get the node part (high 64 bits)
    pub fn node(&self) -> u64 {
        (self.get() >> ACTOR_ID_NODE_BITS) as u64
    }

    /// Get the local part (low 64 bits)
    pub fn local(&self) -> u64 {
        self.get() as u64
    }
}

impl From<NonZeroU128> for ActorId {
    fn from(id: NonZeroU128) -> Self {
        Self(id)
    }
}

impl From<ActorId> for u128 {
    fn from(id: ActorId) -> Self {
        id.get()
    }
}

impl TryFrom<u128> for ActorId {
    type Error = Error;

    fn try_from(id: u128) -> Result<Self> {
        Self::try_new(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}
