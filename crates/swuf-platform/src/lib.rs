//! swuf platform layer
//!
//! The worker-registration primitive the update-flow client runs against:
//! lifecycle states and registration snapshots, the platform event stream,
//! the client->worker command wire, and an in-process simulated host so the
//! whole flow runs and tests without a browser.

pub mod command;
pub mod events;
pub mod fetch;
pub mod host;
pub mod worker;

pub use command::ClientCommand;
pub use events::PlatformEvent;
pub use fetch::{HttpScriptFetcher, MemoryScripts, ScriptFetcher};
pub use host::SimulatedHost;
pub use worker::{RegistrationSnapshot, ServiceWorker, UpdateClassification, WorkerState};

/// Platform error
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("service workers are not supported in this environment")]
    Unsupported,

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("worker script not found: {0}")]
    ScriptNotFound(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("no such worker: {0}")]
    UnknownWorker(u64),

    #[error("invalid message payload: {0}")]
    InvalidMessage(String),
}

/// The worker-registration capability the host environment supplies.
///
/// [`SimulatedHost`] is the in-process implementation; the client only ever
/// talks to this trait, so tests can substitute their own.
pub trait WorkerPlatform {
    /// Whether this environment supports workers at all.
    fn is_supported(&self) -> bool;

    /// Register the worker script. Idempotent when the script is unchanged;
    /// a new or changed script starts an install.
    fn register(&mut self, script_url: &str) -> Result<RegistrationSnapshot, PlatformError>;

    /// Lightweight existence probe against the script URL. Fails loudly when
    /// the device is offline.
    fn probe(&mut self, script_url: &str) -> Result<(), PlatformError>;

    /// Ask the platform to look for an updated script.
    fn check_update(&mut self) -> Result<RegistrationSnapshot, PlatformError>;

    /// Current view of the registration slots.
    fn snapshot(&self) -> RegistrationSnapshot;

    /// The worker currently controlling the page, if any.
    fn controller(&self) -> Option<u64>;

    /// Post an encoded command to a specific worker instance.
    fn post_message(&mut self, worker: u64, payload: &[u8]) -> Result<(), PlatformError>;

    /// Drain queued lifecycle events.
    fn take_events(&mut self) -> Vec<PlatformEvent>;
}
