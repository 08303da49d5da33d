// Background service worker logic for the LinkedIn to Airtable extension
// Host-independent: Chrome bindings live in `chrome.rs`

use std::future::Future;

use airtable_client::AirtableService;
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::messages::{InstallDetails, Response, Tab};
use crate::panel::{PanelTrigger, SidePanel};

/// The worker's single service instance.
///
/// Built once when the worker starts and handed to every listener; it holds no
/// mutable state of its own.
pub struct BackgroundService<S, P> {
    dispatcher: Dispatcher<S>,
    panel: PanelTrigger<P>,
}

impl<S, P> BackgroundService<S, P>
where
    S: AirtableService + 'static,
    P: SidePanel + 'static,
{
    pub fn new(service: S, side_panel: P) -> Self {
        let background = Self {
            dispatcher: Dispatcher::new(service),
            panel: PanelTrigger::new(side_panel),
        };
        log::info!("Background service initialized");
        background
    }

    /// `chrome.runtime.onMessage`: `reply` is called exactly once
    pub fn on_message<F>(&self, message: Value, reply: F) -> impl Future<Output = ()> + 'static
    where
        F: FnOnce(Response) + 'static,
    {
        self.dispatcher.listen(message, reply)
    }

    /// `chrome.action.onClicked`
    pub fn on_action_clicked(&self, tab: &Tab) -> impl Future<Output = ()> + 'static {
        self.panel.on_activated(tab)
    }

    /// `chrome.runtime.onStartup`
    pub fn on_startup(&self) {
        log::info!("LinkedIn to Airtable extension started");
    }

    /// `chrome.runtime.onInstalled`
    pub fn on_installed(&self, details: Value) {
        match serde_json::from_value::<InstallDetails>(details.clone()) {
            Ok(details) => log::info!(
                "LinkedIn to Airtable extension installed/updated (reason: {}, previous version: {})",
                details.reason,
                details.previous_version.as_deref().unwrap_or("none")
            ),
            Err(_) => log::info!("LinkedIn to Airtable extension installed/updated {}", details),
        }
    }
}
