//! swuf client
//!
//! Client-side coordination of the service worker update flow: a lifecycle
//! observer that turns the platform's inconsistent install signals into a
//! single "a worker is waiting" notification, and an update coordinator that
//! classifies registration snapshots, asks the user before activating an
//! update, and sequences the final reload.
//!
//! # Wiring
//!
//! ```no_run
//! use swuf_client::{ConsoleLog, ScriptedPrompt, ServiceWorkerClient};
//! use swuf_platform::{MemoryScripts, SimulatedHost};
//!
//! let mut scripts = MemoryScripts::new();
//! scripts.publish("/sw.js", b"v1".to_vec());
//! let mut host = SimulatedHost::new(scripts);
//!
//! let mut client = ServiceWorkerClient::new(
//!     "/sw.js",
//!     ScriptedPrompt::accepting(),
//!     ConsoleLog::new("SW Client", true),
//! );
//! client.register(&mut host);
//! // ...from the page's event loop:
//! client.pump(&mut host);
//! ```

pub mod client;
pub mod logger;
pub mod observer;
pub mod prompt;

pub use client::ServiceWorkerClient;
pub use logger::{ConsoleLog, Logger};
pub use observer::WorkerLifecycleObserver;
pub use prompt::{PromptCall, ScriptedPrompt, UserPrompt};
