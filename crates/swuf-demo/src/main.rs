//! swuf demo - scripted walkthrough of the update flow
//!
//! Simulates the life of a page: first install, a reload that brings the page
//! under the worker's control, a fruitless update check, a published update,
//! and the confirm / skip-waiting / controller-change / reload sequence.
//!
//! Run interactively, or pass `--yes` / `--no` to script the update decision.

mod prompt;

use swuf_client::{ConsoleLog, Logger, ServiceWorkerClient};
use swuf_platform::{MemoryScripts, SimulatedHost, WorkerPlatform};

use crate::prompt::ConsolePrompt;

const SW_URL: &str = "/sw.js";

type DemoClient = ServiceWorkerClient<ConsolePrompt, ConsoleLog>;

fn new_client(scripted_answer: Option<bool>) -> DemoClient {
    ServiceWorkerClient::new(
        SW_URL,
        ConsolePrompt::new(scripted_answer),
        ConsoleLog::new("SW Client", true),
    )
}

/// Simulate a page reload: the host claims the page for the active worker and
/// the fresh page constructs and registers a new client.
fn reload_page(
    host: &mut SimulatedHost<MemoryScripts>,
    scripted_answer: Option<bool>,
) -> DemoClient {
    host.page_reloaded();
    let mut client = new_client(scripted_answer);
    client.register(host);
    client.pump(host);
    client
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scripted_answer = std::env::args().nth(1).and_then(|arg| match arg.as_str() {
        "--yes" => Some(true),
        "--no" => Some(false),
        _ => None,
    });

    let banner = ConsoleLog::new("Demo", true);

    let mut scripts = MemoryScripts::new();
    scripts.publish(SW_URL, b"// worker v1".to_vec());
    let mut host = SimulatedHost::new(scripts);

    banner.heading("First page load: the worker installs for the first time");
    let mut client = new_client(scripted_answer);
    client.register(&mut host);
    host.finish_install();
    client.pump(&mut host);
    host.finish_activation();
    client.pump(&mut host);

    banner.heading("Page reload: the page comes under the worker's control");
    let mut client = reload_page(&mut host, scripted_answer);

    banner.heading("Check for updates before any new version exists");
    client.check_for_update(&mut host, true);
    client.pump(&mut host);

    banner.heading("A new worker version is published");
    host.fetcher_mut().publish(SW_URL, b"// worker v2".to_vec());

    banner.heading("Check for updates again");
    client.check_for_update(&mut host, true);
    host.finish_install();
    client.pump(&mut host);

    if client.ui_mut().take_reload_request() {
        let _client = reload_page(&mut host, scripted_answer);
        banner.log(&format!(
            "Update complete; the page is controlled by worker {:?}.",
            host.controller()
        ));
    } else {
        banner.log("Update left waiting; check again or reload the page to apply it.");
    }
}
