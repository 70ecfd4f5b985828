//! Incident lifecycle engine.
//!
//! [`LifecycleEngine`] is the only component that changes incident state.
//! It serves two call paths that may race on the same record:
//!
//! - on demand: [`view`](LifecycleEngine::view), the transition operations
//!   and [`refresh`](LifecycleEngine::refresh);
//! - scheduled: [`sweep`](LifecycleEngine::sweep), run by the worker once
//!   per interval.
//!
//! Every write is a compare-and-set against the record version, so the
//! store's per-record atomicity is all the coordination needed.

pub mod engine;
pub mod memory;
pub mod sweep;
pub mod view;

pub use engine::LifecycleEngine;
pub use memory::InMemoryIncidentStore;
pub use sweep::{NetworkSweepStats, RecordOutcome, SweepFailure, SweepReport};
pub use view::IncidentView;
