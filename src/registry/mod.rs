//! Room registry
//!
//! The registry tracks which participants are in which room. Each room has
//! its own lock; join and leave hand the locked room back to the caller so
//! the notification that follows a membership change is sent before any
//! other event on the same room.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<RoomRegistry>
//!                     ┌─────────────────────────┐
//!                     │ rooms: HashMap<RoomId,  │
//!                     │   Mutex<RoomEntry {     │
//!                     │     members: [Member {  │
//!                     │       participant,      │
//!                     │       outbox: mpsc::Tx, │
//!                     │     }]                  │
//!                     │   }>                    │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │ fan_out()
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [Connection]            [Connection]            [Connection]
//!    writer task             writer task             writer task
//!         │                       │                       │
//!         └──────────────► FrameWriter ──► TCP ◄──────────┘
//! ```
//!
//! Every recipient has exactly one outbox, and all sends for a room happen
//! under that room's lock, so a recipient sees a room's events in the order
//! they were broadcast.

pub mod config;
pub mod entry;
pub mod error;
pub mod invite;
pub mod participant;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{FanOut, JoinOutcome, RoomEntry};
pub use error::RegistryError;
pub use invite::RoomInvite;
pub use participant::{Member, Outbox, Participant};
pub use store::{Departure, RoomGuard, RoomRegistry};
