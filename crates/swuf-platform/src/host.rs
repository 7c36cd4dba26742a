//! Simulated worker host
//!
//! An in-process stand-in for the browser's worker machinery: it owns the
//! three registration slots, tracks which worker controls the page, fetches
//! scripts through a [`ScriptFetcher`], and queues [`PlatformEvent`]s for the
//! page to drain.
//!
//! Install and activation are driven explicitly ([`finish_install`],
//! [`finish_activation`]) so a page or test controls when each stage lands,
//! the same way the real platform interleaves them with page turns.
//!
//! [`finish_install`]: SimulatedHost::finish_install
//! [`finish_activation`]: SimulatedHost::finish_activation

use crate::command::{self, ClientCommand};
use crate::events::PlatformEvent;
use crate::fetch::ScriptFetcher;
use crate::worker::{RegistrationSnapshot, ServiceWorker, WorkerState};
use crate::{PlatformError, WorkerPlatform};

/// A worker living inside the host, with its script body.
#[derive(Debug)]
struct HostWorker {
    id: u64,
    script_url: String,
    script: Vec<u8>,
    state: WorkerState,
    /// Skip-waiting arrived while the worker was still installing.
    skip_requested: bool,
}

impl HostWorker {
    fn view(&self) -> ServiceWorker {
        ServiceWorker {
            id: self.id,
            script_url: self.script_url.clone(),
            state: self.state,
        }
    }
}

/// In-process worker host implementing [`WorkerPlatform`].
pub struct SimulatedHost<F> {
    fetcher: F,
    supported: bool,
    script_url: Option<String>,
    installing: Option<HostWorker>,
    waiting: Option<HostWorker>,
    active: Option<HostWorker>,
    controller: Option<u64>,
    events: Vec<PlatformEvent>,
    commands: Vec<(u64, ClientCommand)>,
    update_checks: usize,
    next_id: u64,
}

impl<F: ScriptFetcher> SimulatedHost<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            supported: true,
            script_url: None,
            installing: None,
            waiting: None,
            active: None,
            controller: None,
            events: Vec::new(),
            commands: Vec::new(),
            update_checks: 0,
            next_id: 1,
        }
    }

    /// A host without worker support, for exercising the no-op paths.
    pub fn unsupported(fetcher: F) -> Self {
        let mut host = Self::new(fetcher);
        host.supported = false;
        host
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Commands delivered over the message channel, in order.
    pub fn delivered_commands(&self) -> &[(u64, ClientCommand)] {
        &self.commands
    }

    /// How many platform update checks have run.
    pub fn update_checks(&self) -> usize {
        self.update_checks
    }

    /// Drive the installing worker to the installed state. Without a prior
    /// skip request the worker parks in the waiting slot; a remembered skip
    /// request activates it immediately.
    pub fn finish_install(&mut self) {
        let Some(mut worker) = self.installing.take() else {
            log::warn!("finish_install: no installing worker");
            return;
        };
        self.set_state(&mut worker, WorkerState::Installed);
        if let Some(mut stale) = self.waiting.take() {
            self.set_state(&mut stale, WorkerState::Redundant);
        }
        if worker.skip_requested {
            self.activate(worker);
        } else {
            self.waiting = Some(worker);
        }
    }

    /// Activate the waiting worker. The platform does this on its own when no
    /// active worker exists; pages and tests invoke it to drive that stage.
    pub fn finish_activation(&mut self) {
        let Some(worker) = self.waiting.take() else {
            log::warn!("finish_activation: no waiting worker");
            return;
        };
        self.activate(worker);
    }

    /// The page performed a reload. A freshly loaded page comes under the
    /// control of the current active worker; no controller-change event is
    /// emitted for a fresh load.
    pub fn page_reloaded(&mut self) {
        match &self.active {
            Some(active) => {
                log::info!("Page reloaded; now controlled by worker {}", active.id);
                self.controller = Some(active.id);
            }
            None => self.controller = None,
        }
    }

    fn emit(&mut self, event: PlatformEvent) {
        self.events.push(event);
    }

    fn set_state(&mut self, worker: &mut HostWorker, state: WorkerState) {
        worker.state = state;
        self.emit(PlatformEvent::StateChange {
            worker: worker.id,
            state,
        });
    }

    fn activate(&mut self, mut worker: HostWorker) {
        self.set_state(&mut worker, WorkerState::Activating);
        self.set_state(&mut worker, WorkerState::Activated);
        if let Some(mut old) = self.active.take() {
            self.set_state(&mut old, WorkerState::Redundant);
        }
        let id = worker.id;
        log::info!("Worker {id} is now active");
        self.active = Some(worker);
        // Only a controlled page sees its controller replaced; an
        // uncontrolled page stays uncontrolled until it reloads.
        if self.controller.is_some() {
            self.controller = Some(id);
            self.emit(PlatformEvent::ControllerChange {
                controller: Some(id),
            });
        }
    }

    fn spawn_installing(&mut self, url: &str, script: Vec<u8>) {
        if let Some(mut stale) = self.installing.take() {
            self.set_state(&mut stale, WorkerState::Redundant);
        }
        let id = self.next_id;
        self.next_id += 1;
        let mut worker = HostWorker {
            id,
            script_url: url.to_string(),
            script,
            state: WorkerState::Parsed,
            skip_requested: false,
        };
        log::info!("New service worker {id} installing for {url}");
        self.emit(PlatformEvent::UpdateFound { worker: id });
        self.set_state(&mut worker, WorkerState::Installing);
        self.installing = Some(worker);
    }

    /// The most recently fetched worker, newest lifecycle stage first.
    fn newest(&self) -> Option<&HostWorker> {
        self.installing
            .as_ref()
            .or(self.waiting.as_ref())
            .or(self.active.as_ref())
    }

    fn ensure_supported(&self) -> Result<(), PlatformError> {
        if self.supported {
            Ok(())
        } else {
            Err(PlatformError::Unsupported)
        }
    }
}

impl<F: ScriptFetcher> WorkerPlatform for SimulatedHost<F> {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn register(&mut self, script_url: &str) -> Result<RegistrationSnapshot, PlatformError> {
        self.ensure_supported()?;
        let script = self.fetcher.fetch(script_url)?;
        let changed = self
            .newest()
            .map_or(true, |w| w.script_url != script_url || w.script != script);
        if changed {
            self.spawn_installing(script_url, script);
        } else {
            log::debug!("register: script unchanged, keeping current workers");
        }
        self.script_url = Some(script_url.to_string());
        Ok(self.snapshot())
    }

    fn probe(&mut self, script_url: &str) -> Result<(), PlatformError> {
        self.ensure_supported()?;
        self.fetcher.probe(script_url)
    }

    fn check_update(&mut self) -> Result<RegistrationSnapshot, PlatformError> {
        self.ensure_supported()?;
        let url = self
            .script_url
            .clone()
            .ok_or_else(|| PlatformError::Registration("no registration".to_string()))?;
        self.update_checks += 1;
        let script = self.fetcher.fetch(&url)?;
        let changed = self
            .newest()
            .map_or(true, |w| w.script_url != url || w.script != script);
        if changed {
            self.spawn_installing(&url, script);
        }
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> RegistrationSnapshot {
        RegistrationSnapshot {
            installing: self.installing.as_ref().map(HostWorker::view),
            waiting: self.waiting.as_ref().map(HostWorker::view),
            active: self.active.as_ref().map(HostWorker::view),
        }
    }

    fn controller(&self) -> Option<u64> {
        self.controller
    }

    fn post_message(&mut self, worker: u64, payload: &[u8]) -> Result<(), PlatformError> {
        self.ensure_supported()?;
        let cmd = command::decode(payload)?;
        log::debug!("Worker {worker} received message: {cmd:?}");
        self.commands.push((worker, cmd));
        match cmd {
            ClientCommand::SkipWaiting => {
                if self.waiting.as_ref().map_or(false, |w| w.id == worker) {
                    log::info!("Worker {worker} executing skip-waiting");
                    if let Some(w) = self.waiting.take() {
                        self.activate(w);
                    }
                } else if self.installing.as_ref().map_or(false, |w| w.id == worker) {
                    log::info!("Worker {worker} still installing; skip-waiting noted");
                    if let Some(w) = self.installing.as_mut() {
                        w.skip_requested = true;
                    }
                } else if self.active.as_ref().map_or(false, |w| w.id == worker) {
                    log::debug!("Worker {worker} is already active; skip-waiting ignored");
                } else {
                    return Err(PlatformError::UnknownWorker(worker));
                }
            }
        }
        Ok(())
    }

    fn take_events(&mut self) -> Vec<PlatformEvent> {
        std::mem::take(&mut self.events)
    }
}
