// LinkedIn to Airtable extension: background service worker
// All behaviour is in Rust, the service-worker script is only glue to Chrome APIs

pub mod background;
pub mod config;
pub mod dispatcher;
pub mod messages;
pub mod panel;

#[cfg(target_arch = "wasm32")]
mod chrome;

pub use background::BackgroundService;
pub use dispatcher::Dispatcher;
pub use messages::{Request, Response};
pub use panel::{PanelTrigger, SidePanel};

#[cfg(target_arch = "wasm32")]
pub use chrome::{Background, ChromeSidePanel};
