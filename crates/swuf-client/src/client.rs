//! Update coordinator
//!
//! [`ServiceWorkerClient`] wraps a worker registration and coordinates the
//! update flow with the user: register the worker, notice when an updated
//! worker is parked in the waiting slot, ask before activating it, and reload
//! once the new worker has taken over the page.
//!
//! Two chains can discover the same pending update: the passive waiting
//! watcher armed at registration, and an explicit user-triggered check. Both
//! funnel into the same handling routine, which carries a sticky flag so that
//! once the user has engaged with the pending update, only the user-initiated
//! path may offer it again. Without the flag a single update would prompt
//! twice, and a rejection would be second-guessed moments later by the
//! passive chain.
//!
//! The client never lets a platform failure escape to the hosting page:
//! every failure path ends in a log line and at most one prompt call.

use swuf_platform::command::{self, ClientCommand};
use swuf_platform::{
    PlatformError, PlatformEvent, RegistrationSnapshot, ServiceWorker, UpdateClassification,
    WorkerPlatform,
};

use crate::logger::Logger;
use crate::observer::WorkerLifecycleObserver;
use crate::prompt::UserPrompt;

/// Client-side wrapper around a worker registration.
///
/// One instance per page load. Drive it with [`register`], an optional
/// [`check_for_update`] on user request, and [`pump`] from the page's event
/// loop so queued platform events reach the coordinator.
///
/// [`register`]: ServiceWorkerClient::register
/// [`check_for_update`]: ServiceWorkerClient::check_for_update
/// [`pump`]: ServiceWorkerClient::pump
pub struct ServiceWorkerClient<U, L> {
    script_url: String,
    ui: U,
    log: L,
    observer: WorkerLifecycleObserver,
    /// The controller-change listener is armed by `register` and stays armed
    /// for the rest of the page's life.
    reload_on_controller_change: bool,
    /// Sticky: set once a user-initiated check engages with the pending
    /// update, never reset.
    update_button_has_been_pressed: bool,
}

impl<U: UserPrompt, L: Logger> ServiceWorkerClient<U, L> {
    pub fn new(script_url: impl Into<String>, ui: U, log: L) -> Self {
        Self {
            script_url: script_url.into(),
            ui,
            log,
            observer: WorkerLifecycleObserver::new(),
            reload_on_controller_change: false,
            update_button_has_been_pressed: false,
        }
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Register the worker and arm the passive update watcher.
    ///
    /// Registration failures are logged and swallowed; a page works without
    /// its worker.
    pub fn register<P: WorkerPlatform>(&mut self, platform: &mut P) {
        if self.unsupported(platform) {
            return;
        }
        self.log.log("Registering service worker...");
        match platform.register(&self.script_url) {
            Ok(reg) => {
                self.report_registration(&reg, "Service worker registered");
                if self.observer.arm(&reg) {
                    // A worker was already parked in the waiting slot before
                    // this page load looked.
                    self.log.log("New waiting service worker found.");
                    let snapshot = platform.snapshot();
                    self.handle_update_to(platform, &snapshot, false);
                }
                self.reload_on_controller_change = true;
            }
            Err(err) => {
                self.log
                    .error(&format!("Error registering service worker: {err}"));
            }
        }
    }

    /// Check for an update to the worker, and if one is found, handle it.
    ///
    /// Mostly called from a user interaction such as a "check for updates"
    /// button; pass `user_initiated = false` for automated checks. Only a
    /// user-initiated check surfaces failures through the prompt.
    pub fn check_for_update<P: WorkerPlatform>(&mut self, platform: &mut P, user_initiated: bool) {
        if self.unsupported(platform) {
            return;
        }
        self.log.log(&format!(
            "Checking for updates to service worker (user_initiated={user_initiated})"
        ));
        match self.run_update_check(platform) {
            Ok(reg) => {
                self.report_registration(&reg, "Update check complete. Registration state");
                match reg.classify() {
                    UpdateClassification::UpdateAvailable => {
                        self.log.log("Update found by update checker. Handling it...");
                        self.handle_update_to(platform, &reg, user_initiated);
                    }
                    UpdateClassification::FirstInstall => {
                        self.log.log(
                            "Service worker is installing for the first time. Nothing to offer.",
                        );
                    }
                    UpdateClassification::NoUpdate => {
                        self.log.log("No update found.");
                        if user_initiated {
                            self.ui.update_not_found();
                        }
                    }
                }
            }
            Err(err) => {
                self.log
                    .error(&format!("Error checking for service worker update: {err}"));
                if user_initiated {
                    self.ui.update_error(&err);
                }
            }
        }
    }

    /// Feed one platform event to the coordinator.
    pub fn handle_event<P: WorkerPlatform>(&mut self, platform: &mut P, event: PlatformEvent) {
        if let PlatformEvent::ControllerChange { controller } = event {
            if self.reload_on_controller_change {
                self.on_controller_change(controller);
            }
            return;
        }
        if self.observer.on_event(&event) {
            self.log.log("New waiting service worker found.");
            let snapshot = platform.snapshot();
            self.handle_update_to(platform, &snapshot, false);
        }
    }

    /// Drain and handle platform events until the queue stays empty.
    /// Handling an event can enqueue more (an accepted update activates and
    /// changes the controller), so drain in rounds.
    pub fn pump<P: WorkerPlatform>(&mut self, platform: &mut P) {
        loop {
            let events = platform.take_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.handle_event(platform, event);
            }
        }
    }

    /// Re-register, probe the script URL, then run the platform update check.
    ///
    /// The probe must complete before the platform check so that an offline
    /// device produces a connectivity error rather than an ambiguous
    /// "no update" result.
    fn run_update_check<P: WorkerPlatform>(
        &mut self,
        platform: &mut P,
    ) -> Result<RegistrationSnapshot, PlatformError> {
        platform.register(&self.script_url)?;
        platform.probe(&self.script_url)?;
        platform.check_update()
    }

    /// The re-entrancy guard and decision sequencer shared by the passive
    /// watcher and the explicit check.
    fn handle_update_to<P: WorkerPlatform>(
        &mut self,
        platform: &mut P,
        reg: &RegistrationSnapshot,
        user_initiated: bool,
    ) {
        if user_initiated {
            self.update_button_has_been_pressed = true;
        } else if self.update_button_has_been_pressed {
            // The user already engaged with the pending update; a rejected
            // update must not be re-offered by the watcher.
            self.log.log("Blocking redundant attempt to handle update.");
            return;
        }
        let Some(new_worker) = reg.new_worker().cloned() else {
            self.log.error("No update to handle!");
            return;
        };
        if reg.active.is_none() {
            self.log.log(
                "Service worker installing for the first time. Activation should be automatic.",
            );
            return;
        }
        if platform.controller().is_some() {
            self.confirm_and_request_activation(platform, &new_worker);
        } else {
            // The new worker activates automatically on an uncontrolled page
            // and no controller-change will fire, so the reload has to come
            // from here.
            self.log.warn(
                "This client is NOT controlled by the service worker. \
                 The new service worker activates automatically; a reload is needed now.",
            );
            let mut acknowledged = false;
            self.ui.update_found_reload_needed(&mut || acknowledged = true);
            if acknowledged {
                self.log.warn("User has acknowledged. Reloading application...");
                self.ui.reload();
            }
        }
    }

    fn confirm_and_request_activation<P: WorkerPlatform>(
        &mut self,
        platform: &mut P,
        new_worker: &ServiceWorker,
    ) {
        let mut accepted = false;
        self.ui.confirm_update_with_user(&mut |accept| accepted = accept);
        if !accepted {
            // Stays parked in the waiting slot until the next explicit check
            // or page reload.
            self.log.log("Update rejected by user.");
            return;
        }
        self.log.log("Proceeding with update...");
        self.log
            .log("Sending skip-waiting command to the new service worker so that it activates.");
        let payload = match command::encode(&ClientCommand::SkipWaiting) {
            Ok(payload) => payload,
            Err(err) => {
                self.log
                    .error(&format!("Error encoding skip-waiting command: {err}"));
                return;
            }
        };
        if let Err(err) = platform.post_message(new_worker.id, &payload) {
            self.log
                .error(&format!("Error sending skip-waiting command: {err}"));
        }
    }

    /// Persistent controller-change handler, armed for the page's lifetime.
    fn on_controller_change(&mut self, controller: Option<u64>) {
        self.log.log("Controller has changed!");
        if controller.is_some() {
            self.log.log("Controller is new. Reloading...");
            self.ui.reload();
        } else {
            self.log.log("Controller is gone. Doing nothing.");
        }
    }

    fn unsupported<P: WorkerPlatform>(&self, platform: &P) -> bool {
        if platform.is_supported() {
            false
        } else {
            self.log
                .warn("Service workers are not supported in this environment.");
            true
        }
    }

    fn report_registration(&self, reg: &RegistrationSnapshot, heading: &str) {
        fn slot(worker: Option<&ServiceWorker>) -> String {
            match worker {
                Some(w) => format!("✓ ({})", w.state),
                None => "✗".to_string(),
            }
        }
        self.log.log(&format!(
            "{heading}:\n - installing: {}\n - waiting:    {}\n - active:     {}",
            slot(reg.installing.as_ref()),
            slot(reg.waiting.as_ref()),
            slot(reg.active.as_ref()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swuf_platform::fetch::{MemoryScripts, ScriptFetcher};
    use swuf_platform::{ClientCommand, SimulatedHost};

    use crate::logger::ConsoleLog;
    use crate::prompt::{PromptCall, ScriptedPrompt};

    const SW: &str = "/sw.js";

    type TestClient = ServiceWorkerClient<ScriptedPrompt, ConsoleLog>;

    fn client(prompt: ScriptedPrompt) -> TestClient {
        ServiceWorkerClient::new(SW, prompt, ConsoleLog::new("test", false))
    }

    fn host_with(script: &[u8]) -> SimulatedHost<MemoryScripts> {
        let mut scripts = MemoryScripts::new();
        scripts.publish(SW, script.to_vec());
        SimulatedHost::new(scripts)
    }

    /// Register v1 through the client and drive it to the active state.
    fn install_v1(client: &mut TestClient, host: &mut SimulatedHost<MemoryScripts>) {
        client.register(host);
        host.finish_install();
        client.pump(host);
        host.finish_activation();
        client.pump(host);
    }

    /// A page controlled by an active v1 worker, with a fresh client the way
    /// a reloaded page would have one.
    fn controlled_page() -> (TestClient, SimulatedHost<MemoryScripts>) {
        let mut host = host_with(b"v1");
        let mut first = client(ScriptedPrompt::accepting());
        install_v1(&mut first, &mut host);
        host.page_reloaded();

        let mut reloaded = client(ScriptedPrompt::accepting());
        reloaded.register(&mut host);
        reloaded.pump(&mut host);
        assert!(reloaded.ui().calls.is_empty());
        (reloaded, host)
    }

    /// Park an updated worker in the waiting slot without the client having
    /// noticed it yet.
    fn park_update(host: &mut SimulatedHost<MemoryScripts>, script: &[u8]) {
        host.fetcher_mut().publish(SW, script.to_vec());
        host.check_update().unwrap();
        host.finish_install();
    }

    // --- classification dispatch -------------------------------------------

    #[test]
    fn test_first_install_no_prompt() {
        // Scenario A: no prior active worker; the observer resolves when the
        // install lands and the coordinator only logs.
        let mut host = host_with(b"v1");
        let mut client = client(ScriptedPrompt::rejecting());

        client.register(&mut host);
        host.finish_install();
        client.pump(&mut host);

        assert!(client.ui().calls.is_empty());
        assert!(host.delivered_commands().is_empty());
        assert!(!client.update_button_has_been_pressed);
    }

    #[test]
    fn test_user_check_with_no_update_reports_not_found() {
        let (mut client, mut host) = controlled_page();

        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert_eq!(client.ui().calls, vec![PromptCall::UpdateNotFound]);
    }

    #[test]
    fn test_passive_check_with_no_update_stays_silent() {
        let (mut client, mut host) = controlled_page();

        client.check_for_update(&mut host, false);
        client.pump(&mut host);

        assert!(client.ui().calls.is_empty());
    }

    #[test]
    fn test_first_install_during_user_check_logs_only() {
        // The check itself starts the very first install; no prompt, and in
        // particular no "not found" message.
        let mut host = host_with(b"v1");
        let mut client = client(ScriptedPrompt::accepting());

        client.check_for_update(&mut host, true);

        assert!(client.ui().calls.is_empty());
    }

    // --- controlled update flow --------------------------------------------

    #[test]
    fn test_accepted_update_sends_activation_command_once_then_reloads() {
        // Scenario B: waiting update on a controlled page, user-triggered
        // check, user accepts.
        let (mut client, mut host) = controlled_page();
        park_update(&mut host, b"v2");
        let new_worker = host.snapshot().waiting.unwrap().id;

        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert_eq!(
            client.ui().calls,
            vec![PromptCall::ConfirmUpdate, PromptCall::Reload]
        );
        assert_eq!(
            host.delivered_commands(),
            &[(new_worker, ClientCommand::SkipWaiting)]
        );
    }

    #[test]
    fn test_rejected_update_stays_parked() {
        let (mut client, mut host) = controlled_page();
        client.ui_mut().accept_update = false;
        park_update(&mut host, b"v2");

        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert_eq!(client.ui().calls, vec![PromptCall::ConfirmUpdate]);
        assert!(host.delivered_commands().is_empty());
        assert!(host.snapshot().waiting.is_some());
    }

    #[test]
    fn test_passive_detection_does_not_second_guess_a_rejection() {
        let (mut client, mut host) = controlled_page();
        client.ui_mut().accept_update = false;
        park_update(&mut host, b"v2");

        client.check_for_update(&mut host, true);
        // The waiting watcher fires afterwards with the same pending update.
        client.pump(&mut host);
        client.pump(&mut host);

        assert_eq!(client.ui().calls, vec![PromptCall::ConfirmUpdate]);
        assert!(host.delivered_commands().is_empty());
    }

    #[test]
    fn test_rejected_update_is_reoffered_on_next_explicit_check() {
        let (mut client, mut host) = controlled_page();
        client.ui_mut().accept_update = false;
        park_update(&mut host, b"v2");

        client.check_for_update(&mut host, true);
        client.pump(&mut host);
        assert_eq!(client.ui().calls, vec![PromptCall::ConfirmUpdate]);

        // The user asks again and accepts this time.
        client.ui_mut().accept_update = true;
        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert_eq!(
            client.ui().calls,
            vec![
                PromptCall::ConfirmUpdate,
                PromptCall::ConfirmUpdate,
                PromptCall::Reload
            ]
        );
        assert_eq!(host.delivered_commands().len(), 1);
    }

    #[test]
    fn test_parked_update_is_reoffered_after_page_reload() {
        // A rejected update sits in the waiting slot; the next page load finds
        // it immediately and offers it again.
        let (mut client, mut host) = controlled_page();
        client.ui_mut().accept_update = false;
        park_update(&mut host, b"v2");
        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        host.page_reloaded();
        let mut fresh = self::client(ScriptedPrompt::accepting());
        fresh.register(&mut host);
        fresh.pump(&mut host);

        assert_eq!(
            fresh.ui().calls,
            vec![PromptCall::ConfirmUpdate, PromptCall::Reload]
        );
    }

    #[test]
    fn test_passive_detection_prompts_when_user_never_checked() {
        // Without a user-initiated check the waiting watcher is the one that
        // offers the update.
        let (mut client, mut host) = controlled_page();
        park_update(&mut host, b"v2");

        client.pump(&mut host);

        assert_eq!(
            client.ui().calls,
            vec![PromptCall::ConfirmUpdate, PromptCall::Reload]
        );
        assert_eq!(host.delivered_commands().len(), 1);
    }

    // --- uncontrolled update flow ------------------------------------------

    #[test]
    fn test_uncontrolled_update_reloads_directly() {
        // Scenario C: an active worker exists but the page never came under
        // its control. The coordinator must drive the reload itself.
        let mut host = host_with(b"v1");
        let mut client = client(ScriptedPrompt::accepting());
        install_v1(&mut client, &mut host);
        assert_eq!(host.controller(), None);

        host.fetcher_mut().publish(SW, b"v2".to_vec());
        client.check_for_update(&mut host, true);

        assert_eq!(
            client.ui().calls,
            vec![PromptCall::ReloadNeeded, PromptCall::Reload]
        );
        // No skip-waiting message exists on this path.
        assert!(host.delivered_commands().is_empty());
    }

    // --- failure paths ------------------------------------------------------

    #[test]
    fn test_offline_user_check_reports_error_once() {
        // Scenario D: the device goes offline before a user-initiated check.
        let (mut client, mut host) = controlled_page();
        host.fetcher_mut().set_offline(true);
        let checks_before = host.update_checks();

        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert_eq!(client.ui().calls.len(), 1);
        assert!(matches!(client.ui().calls[0], PromptCall::UpdateError(_)));
        // The platform's own update check never ran.
        assert_eq!(host.update_checks(), checks_before);
    }

    #[test]
    fn test_offline_passive_check_stays_silent() {
        let (mut client, mut host) = controlled_page();
        host.fetcher_mut().set_offline(true);

        client.check_for_update(&mut host, false);
        client.pump(&mut host);

        assert!(client.ui().calls.is_empty());
    }

    #[test]
    fn test_probe_failure_prevents_platform_update_check() {
        // The existence probe runs after re-registration but before the
        // platform check, so a HEAD failure alone must stop the sequence.
        struct ProbeBlocked(MemoryScripts);
        impl ScriptFetcher for ProbeBlocked {
            fn probe(&mut self, _url: &str) -> Result<(), PlatformError> {
                Err(PlatformError::Network("probe refused".to_string()))
            }
            fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlatformError> {
                self.0.fetch(url)
            }
        }

        let mut scripts = MemoryScripts::new();
        scripts.publish(SW, b"v1".to_vec());
        let mut host = SimulatedHost::new(ProbeBlocked(scripts));
        let mut client = client(ScriptedPrompt::accepting());

        client.check_for_update(&mut host, true);

        assert_eq!(client.ui().calls.len(), 1);
        assert!(matches!(client.ui().calls[0], PromptCall::UpdateError(_)));
        assert_eq!(host.update_checks(), 0);
    }

    #[test]
    fn test_registration_failure_is_logged_not_prompted() {
        let mut host = host_with(b"v1");
        host.fetcher_mut().set_offline(true);
        let mut client = client(ScriptedPrompt::accepting());

        client.register(&mut host);

        assert!(client.ui().calls.is_empty());
    }

    #[test]
    fn test_unsupported_environment_is_a_noop() {
        let mut host = SimulatedHost::unsupported(MemoryScripts::new());
        let mut client = client(ScriptedPrompt::rejecting());

        client.register(&mut host);
        client.check_for_update(&mut host, true);
        client.pump(&mut host);

        assert!(client.ui().calls.is_empty());
    }

    #[test]
    fn test_update_handling_without_new_worker_is_nonfatal() {
        // Protocol invariant violation: handled as an anomaly, not a panic.
        let (mut client, mut host) = controlled_page();
        let reg = host.snapshot();
        client.handle_update_to(&mut host, &reg, false);

        assert!(client.ui().calls.is_empty());
    }

    // --- controller change --------------------------------------------------

    #[test]
    fn test_controller_change_to_new_worker_reloads() {
        let (mut client, mut host) = controlled_page();
        park_update(&mut host, b"v2");
        let new_worker = host.snapshot().waiting.unwrap().id;
        client.pump(&mut host); // passive accept sends skip-waiting

        assert_eq!(host.controller(), Some(new_worker));
        assert_eq!(
            client.ui().calls.last(),
            Some(&PromptCall::Reload),
            "reload must be driven by the controller change"
        );
    }

    #[test]
    fn test_controller_going_away_does_not_reload() {
        let (mut client, mut host) = controlled_page();
        client.handle_event(
            &mut host,
            PlatformEvent::ControllerChange { controller: None },
        );
        assert!(client.ui().calls.is_empty());
    }

    #[test]
    fn test_controller_change_before_registration_is_ignored() {
        let mut host = host_with(b"v1");
        let mut client = client(ScriptedPrompt::accepting());
        client.handle_event(
            &mut host,
            PlatformEvent::ControllerChange {
                controller: Some(1),
            },
        );
        assert!(client.ui().calls.is_empty());
    }
}
