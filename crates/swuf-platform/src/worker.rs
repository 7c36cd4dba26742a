//! Worker lifecycle states, worker handles, and registration snapshots.

/// Service worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// A point-in-time view of one registered worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceWorker {
    pub id: u64,
    pub script_url: String,
    pub state: WorkerState,
}

/// How a registration snapshot relates to the page's update flow.
///
/// Derived from the snapshot on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateClassification {
    /// A new worker is coming in and nothing is active yet.
    FirstInstall,
    /// A new worker is coming in while a previous one is still active.
    UpdateAvailable,
    /// No incoming worker.
    NoUpdate,
}

/// Immutable view of a worker registration's three lifecycle slots.
///
/// In normal operation at most one of `installing`/`waiting` is populated at
/// a time; `active` persists across updates until a new worker takes over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    pub installing: Option<ServiceWorker>,
    pub waiting: Option<ServiceWorker>,
    pub active: Option<ServiceWorker>,
}

impl RegistrationSnapshot {
    /// The incoming worker, if any: the installing slot wins over waiting.
    pub fn new_worker(&self) -> Option<&ServiceWorker> {
        self.installing.as_ref().or(self.waiting.as_ref())
    }

    pub fn classify(&self) -> UpdateClassification {
        match (self.new_worker(), &self.active) {
            (Some(_), None) => UpdateClassification::FirstInstall,
            (Some(_), Some(_)) => UpdateClassification::UpdateAvailable,
            (None, _) => UpdateClassification::NoUpdate,
        }
    }
}
