// Opens the side panel when the toolbar icon is clicked

use std::future::Future;
use std::rc::Rc;

use anyhow::Result;
use futures::future::LocalBoxFuture;

use crate::messages::Tab;

/// Host side-panel API (`chrome.sidePanel`)
pub trait SidePanel {
    /// Ask the host to open the panel for `tab_id`.
    ///
    /// Implementations must issue the host call before returning; the future
    /// only reports how it went.
    fn open(&self, tab_id: i32) -> LocalBoxFuture<'static, Result<()>>;
}

pub struct PanelTrigger<P> {
    host: Rc<P>,
}

impl<P> Clone for PanelTrigger<P> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
        }
    }
}

impl<P: SidePanel> PanelTrigger<P> {
    pub fn new(host: P) -> Self {
        Self {
            host: Rc::new(host),
        }
    }

    /// Handle a toolbar click on `tab`.
    ///
    /// A tab without an id (or with id `0`) is ignored; any other id, including
    /// Chrome's `-1`, is passed to the host. Failures are logged and never
    /// surface to the caller.
    pub fn on_activated(&self, tab: &Tab) -> impl Future<Output = ()> + 'static
    where
        P: 'static,
    {
        // chrome.sidePanel.open is only honoured inside the user gesture, so
        // the host call happens now rather than on first poll.
        let pending = tab
            .id
            .filter(|id| *id != 0)
            .map(|id| (id, self.host.open(id)));

        async move {
            let Some((tab_id, pending)) = pending else {
                log::debug!("Action clicked without a tab id, not opening side panel");
                return;
            };

            match pending.await {
                Ok(()) => log::debug!("Side panel opened for tab {}", tab_id),
                Err(e) => log::error!("Failed to open side panel: {:#}", e),
            }
        }
    }
}
