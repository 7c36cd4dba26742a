//! Worker lifecycle observer
//!
//! The platform does not hand over a single "a worker is waiting" signal: a
//! worker may already be parked in the waiting slot before anyone looks, may
//! still be mid-install, or may only start installing later. The observer
//! folds those cases into one at-most-once resolution.

use swuf_platform::{PlatformEvent, RegistrationSnapshot, WorkerState};

#[derive(Debug)]
enum WaitingWatch {
    /// Not armed yet; events are ignored.
    Idle,
    /// Armed. When a worker id is tracked, its transition to `Installed`
    /// resolves the watch; an update-found event switches tracking to the
    /// new worker.
    Watching { tracked: Option<u64> },
    /// Already resolved; never fires again.
    Resolved,
}

/// One-shot watch for a waiting worker.
#[derive(Debug)]
pub struct WorkerLifecycleObserver {
    watch: WaitingWatch,
}

impl Default for WorkerLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerLifecycleObserver {
    pub fn new() -> Self {
        Self {
            watch: WaitingWatch::Idle,
        }
    }

    /// Start watching a registration. Returns `true` when a waiting worker is
    /// already present, in which case the watch resolves immediately. Calling
    /// again after resolution is a no-op; calling again while watching only
    /// refreshes which installing worker is tracked.
    pub fn arm(&mut self, reg: &RegistrationSnapshot) -> bool {
        if matches!(self.watch, WaitingWatch::Resolved) {
            return false;
        }
        if reg.waiting.is_some() {
            self.watch = WaitingWatch::Resolved;
            return true;
        }
        self.watch = WaitingWatch::Watching {
            tracked: reg.installing.as_ref().map(|w| w.id),
        };
        false
    }

    /// Feed one platform event. Returns `true` exactly once: the first time
    /// the tracked worker reaches the installed state.
    pub fn on_event(&mut self, event: &PlatformEvent) -> bool {
        let WaitingWatch::Watching { tracked } = &mut self.watch else {
            return false;
        };
        match event {
            PlatformEvent::UpdateFound { worker } => {
                *tracked = Some(*worker);
                false
            }
            PlatformEvent::StateChange { worker, state }
                if *state == WorkerState::Installed && *tracked == Some(*worker) =>
            {
                self.watch = WaitingWatch::Resolved;
                true
            }
            _ => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.watch, WaitingWatch::Resolved)
    }
}
