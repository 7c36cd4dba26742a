//! Platform events
//!
//! Everything the page can observe about the worker lifecycle arrives as a
//! `PlatformEvent`. The host queues events as they happen and the page drains
//! them through [`crate::WorkerPlatform::take_events`].

use crate::worker::WorkerState;

/// A lifecycle notification emitted by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// A new worker has started installing.
    UpdateFound { worker: u64 },
    /// A worker moved to a new lifecycle state.
    StateChange { worker: u64, state: WorkerState },
    /// The worker controlling the page changed. `None` means the previous
    /// controller went away without a replacement.
    ControllerChange { controller: Option<u64> },
}
