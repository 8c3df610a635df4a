//! TigerStyle constants for Kestrel
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Runtime Limits
// =============================================================================

/// Maximum number of actors registered with one runtime at the same time
pub const ACTORS_REGISTERED_COUNT_MAX: usize = 256;

/// Maximum number of ticks a single `run_ticks` call may execute
pub const RUNTIME_TICKS_COUNT_MAX: u64 = 1_000_000;

// =============================================================================
// Mailbox Limits
// =============================================================================

/// Maximum capacity of a single actor mailbox
pub const MAILBOX_CAPACITY_COUNT_MAX: usize = 1_000_000;

/// Default mailbox capacity used by `MailboxConfig`
pub const MAILBOX_CAPACITY_COUNT_DEFAULT: usize = 64;

// =============================================================================
// Message Limits
// =============================================================================

/// Width of the sender id on the wire (u128)
pub const MESSAGE_SENDER_SIZE_BYTES: usize = 16;

/// Width of the payload on the wire (u64)
pub const MESSAGE_PAYLOAD_SIZE_BYTES: usize = 8;

/// Total width of an encoded message
pub const MESSAGE_WIRE_SIZE_BYTES: usize = MESSAGE_SENDER_SIZE_BYTES + MESSAGE_PAYLOAD_SIZE_BYTES;

// =============================================================================
// Identity
// =============================================================================

/// Number of high bits of an actor id reserved for the node by convention
pub const ACTOR_ID_NODE_BITS: u32 = 64;

// =============================================================================
// DST Limits
// =============================================================================

/// Maximum simulation steps before forced termination
pub const DST_STEPS_COUNT_MAX: u64 = 10_000_000;

/// Default probability that a simulation step is a send rather than a tick
pub const DST_SEND_PROBABILITY_DEFAULT: f64 = 0.7;

/// Default probability that a simulated send targets an unregistered id
pub const DST_UNKNOWN_TARGET_PROBABILITY_DEFAULT: f64 = 0.05;

// Compile-time assertions for constant validity
const _: () = {
    assert!(ACTORS_REGISTERED_COUNT_MAX == 256);
    assert!(RUNTIME_TICKS_COUNT_MAX == 1_000_000);
    assert!(MAILBOX_CAPACITY_COUNT_DEFAULT > 0);
    assert!(MAILBOX_CAPACITY_COUNT_DEFAULT <= MAILBOX_CAPACITY_COUNT_MAX);
    assert!(MESSAGE_WIRE_SIZE_BYTES == 24);
    assert!(ACTOR_ID_NODE_BITS < 128);
};
