//! # Helix Canonical Motion Front-End
//!
//! The layer between a G-code interpreter and the real-time trajectory
//! executor. The interpreter issues canonical commands (traverses, feeds,
//! arcs, splines, dwells, spindle and coolant changes, tool offsets, I/O
//! synchronization); this crate translates each into zero or more
//! trajectory messages with fully resolved end positions, feedrates, and
//! kinematic limits, appended in strict dispatch order to the interpreter
//! list.
//!
//! ## Architecture
//!
//! - [`state`] — the canonical world state (origins, offsets, rotation,
//!   units, plane, modes, spindle bookkeeping)
//! - [`xform`] — program↔internal↔external unit conversions and the
//!   rotation/offset transforms (the only module allowed to mix unit
//!   systems)
//! - [`envelope`] — min-of-axis-maxima velocity/acceleration/jerk
//!   derivation and move classification
//! - [`segments`] — the collinear fusion chain and its linkable predicate
//! - [`list`] — the interpreter list consumed by the executor
//! - [`engine`] — [`engine::CanonEngine`], owning all of the above
//! - [`dispatch`] — the canonical command entry points
//! - [`query`] — read-only accessors of external state
//! - [`probe_log`] — the probe sample file
//!
//! All work is synchronous on the caller; nothing here spawns or blocks.

pub mod dispatch;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod list;
pub mod probe_log;
pub mod query;
pub mod segments;
pub mod state;
pub mod xform;

pub use engine::CanonEngine;
pub use error::CanonError;
