//! Kestrel Runtime
//!
//! Mailboxes, actor lifecycle, and the tick scheduler for Kestrel actors.
//!
//! # Overview
//!
//! The runtime provides:
//! - Bounded, lock-guarded FIFO mailboxes safe under concurrent senders
//! - A total 4-state/4-event lifecycle state machine per actor
//! - A bounded registry routing messages by actor id
//! - A single-threaded round-robin scheduler driven in ticks
//!
//! # Example
//!
//! ```rust
//! use kestrel_core::ActorId;
//! use kestrel_runtime::{Actor, ActorState, Runtime};
//!
//! let ping = Actor::new(ActorId::new(1), 16);
//! let pong = Actor::new(ActorId::new(2), 16);
//!
//! let mut runtime = Runtime::new();
//! runtime.register(&ping).unwrap();
//! runtime.register(&pong).unwrap();
//!
//! assert!(runtime.send_msg(ping.id(), pong.id(), 42));
//! assert_eq!(runtime.run_ticks(5), 1);
//! assert_eq!(ping.state(), ActorState::Running);
//! ```
//!
//! # TigerStyle
//! - Explicit limits (256 actors, 1,000,000 ticks per run)
//! - Full mailboxes reject; nothing blocks, nothing retries
//! - Contract violations are assertions, expected outcomes are `Result`s

pub mod actor;
pub mod fsm;
pub mod mailbox;
pub mod runtime;

pub use actor::{Actor, IgnoreMessages, MessageHandler, StartOnPositivePayload};
pub use fsm::{ActorState, Event, StateMachine};
pub use mailbox::{Mailbox, MailboxFullError};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeStats, StopHandle};
