//! Gridmatch - two-player tic-tac-toe, locally or across devices.
//!
//! # Architecture
//!
//! - **Board**: pure rule engine (move legality, win/draw detection)
//! - **AI**: three-tier computer opponent, up to exhaustive minimax
//! - **Record**: the shared session record two devices coordinate through
//! - **Store**: remote store seam (atomic conditional update + push
//!   subscription) with an in-memory implementation
//! - **Arbiter**: the slot-claim protocol resolving concurrent joins
//! - **Controller**: turn state machines driving a presentation adapter
//!
//! # Example
//!
//! ```no_run
//! use gridmatch::{MemoryStore, arbiter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let host = arbiter::create_session(&store, &"host-device".to_string()).await?;
//! let guest = arbiter::join_session(&store, &host.id, &"guest-device".to_string()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod ai;
pub mod arbiter;
mod board;
mod controller;
mod identity;
mod record;
mod store;
mod ui;

// Crate-level exports - rules
pub use board::{Board, InvalidMove, Mark, Outcome, Square, WIN_LINES};

// Crate-level exports - computer opponent
pub use ai::{Difficulty, choose_move};

// Crate-level exports - shared session record
pub use record::{ClientId, SessionId, SessionRecord, new_session_id, sanitize_session_id};

// Crate-level exports - store seam
pub use store::{Commit, MemoryStore, Mutator, RemoteStore, StoreError, Subscription};

// Crate-level exports - arbitration
pub use arbiter::{JoinError, SessionHandle};

// Crate-level exports - controllers and adapter contract
pub use controller::{Computer, LocalGame, Phase, RemoteGame};
pub use identity::get_or_create_client_id;
pub use ui::{GameUi, SoundKind};
