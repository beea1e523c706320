//! Signal relay
//!
//! Turns membership changes and chat into per-recipient deliveries:
//!
//! - `user-connected` goes to every member except the newcomer
//! - `user-disconnected` goes to every remaining member
//! - `receive-message` goes to every member except the sender; the sender
//!   renders its own message locally
//!
//! Ordering holds per room only: all sends for a room happen under the
//! room's lock and each recipient drains a single FIFO outbox.

pub mod signal;

pub use signal::SignalRelay;
