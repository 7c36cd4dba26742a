//! User prompt capability
//!
//! The five operations the client needs from the surrounding app's UI. The
//! decision callbacks are invoked by the implementation within the same turn
//! (the platform guarantees callback-level atomicity, not preemption); an
//! implementation that never invokes a callback counts as a rejection.

use swuf_platform::PlatformError;

/// UI callbacks the hosting app must supply.
pub trait UserPrompt {
    /// An update check failed in a way the user should know about
    /// (typically: offline).
    fn update_error(&mut self, err: &PlatformError);

    /// An update is ready; ask whether to apply it now. The implementation
    /// reports the answer through `decision`.
    fn confirm_update_with_user(&mut self, decision: &mut dyn FnMut(bool));

    /// An update activated on its own and the page must reload to come under
    /// its control. Invoke `acknowledged` once the user has seen the notice.
    fn update_found_reload_needed(&mut self, acknowledged: &mut dyn FnMut());

    /// A user-requested check found nothing.
    fn update_not_found(&mut self);

    /// Reload the page.
    fn reload(&mut self);
}

/// One recorded prompt interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCall {
    UpdateError(String),
    ConfirmUpdate,
    ReloadNeeded,
    UpdateNotFound,
    Reload,
}

/// Recording [`UserPrompt`] with a scripted answer, for tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    /// Answer given whenever the client asks to confirm an update.
    pub accept_update: bool,
    /// Every prompt call, in invocation order.
    pub calls: Vec<PromptCall>,
}

impl ScriptedPrompt {
    pub fn accepting() -> Self {
        Self {
            accept_update: true,
            calls: Vec::new(),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept_update: false,
            calls: Vec::new(),
        }
    }
}

impl UserPrompt for ScriptedPrompt {
    fn update_error(&mut self, err: &PlatformError) {
        self.calls.push(PromptCall::UpdateError(err.to_string()));
    }

    fn confirm_update_with_user(&mut self, decision: &mut dyn FnMut(bool)) {
        self.calls.push(PromptCall::ConfirmUpdate);
        decision(self.accept_update);
    }

    fn update_found_reload_needed(&mut self, acknowledged: &mut dyn FnMut()) {
        self.calls.push(PromptCall::ReloadNeeded);
        acknowledged();
    }

    fn update_not_found(&mut self) {
        self.calls.push(PromptCall::UpdateNotFound);
    }

    fn reload(&mut self) {
        self.calls.push(PromptCall::Reload);
    }
}
