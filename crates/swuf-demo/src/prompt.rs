//! Terminal prompt
//!
//! Stands in for the dialogs a real app would show: questions go to stdout,
//! answers come from stdin, and a scripted answer makes the whole walkthrough
//! non-interactive.

use std::io::{self, BufRead, Write};

use swuf_client::UserPrompt;
use swuf_platform::PlatformError;

/// [`UserPrompt`] backed by the terminal.
pub struct ConsolePrompt {
    /// When set, every question is answered without touching stdin.
    scripted_answer: Option<bool>,
    reload_requested: bool,
}

impl ConsolePrompt {
    pub fn new(scripted_answer: Option<bool>) -> Self {
        Self {
            scripted_answer,
            reload_requested: false,
        }
    }

    /// Whether a reload was requested since the last call.
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    fn ask(&self, question: &str) -> bool {
        if let Some(answer) = self.scripted_answer {
            println!("{question} [scripted: {}]", if answer { "y" } else { "n" });
            return answer;
        }
        print!("{question} [y/N] ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn wait_for_enter(&self) {
        if self.scripted_answer.is_some() {
            return;
        }
        print!("Press enter to continue... ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}

impl UserPrompt for ConsolePrompt {
    fn update_error(&mut self, err: &PlatformError) {
        println!("Error! Cannot check for updates ({err}). Are you offline?");
    }

    fn confirm_update_with_user(&mut self, decision: &mut dyn FnMut(bool)) {
        let accepted = self.ask("Update available! An update is available for this app. Use it now?");
        decision(accepted);
    }

    fn update_found_reload_needed(&mut self, acknowledged: &mut dyn FnMut()) {
        println!("Update found! The app will reload to complete the update.");
        self.wait_for_enter();
        acknowledged();
    }

    fn update_not_found(&mut self) {
        println!("No update found. You are already on the latest version.");
    }

    fn reload(&mut self) {
        println!("The app will reload now to complete the update.");
        self.reload_requested = true;
    }
}
