// Chrome extension API bindings
// Exposes `Background` to the service-worker glue script, which constructs it
// once and forwards chrome.runtime / chrome.action events to it

use airtable_client::AirtableClient;
use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Function, Promise, JSON};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::background::BackgroundService;
use crate::config::BackgroundConfig;
use crate::messages::{Response, Tab};
use crate::panel::SidePanel;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "sidePanel"], js_name = open)]
    fn side_panel_open(options: &JsValue) -> Result<Promise, JsValue>;
}

/// `chrome.sidePanel`
pub struct ChromeSidePanel;

impl SidePanel for ChromeSidePanel {
    fn open(&self, tab_id: i32) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        let options = js_sys::Object::new();
        let call = js_sys::Reflect::set(&options, &"tabId".into(), &tab_id.into())
            .and_then(|_| side_panel_open(&options));

        async move {
            let promise = call.map_err(js_error)?;
            JsFuture::from(promise).await.map_err(js_error)?;
            Ok(())
        }
        .boxed_local()
    }
}

#[wasm_bindgen]
pub struct Background {
    service: BackgroundService<AirtableClient, ChromeSidePanel>,
}

#[wasm_bindgen]
impl Background {
    /// Load the bundled config, install the console logger and build the
    /// service. Throws if the bundled config is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Background, JsValue> {
        let config = BackgroundConfig::bundled().map_err(to_js_error)?;
        let level = config.log_level().map_err(to_js_error)?;
        wasm_logger::init(wasm_logger::Config::new(level));

        let client = AirtableClient::new(&config.airtable.api_url).map_err(to_js_error)?;

        Ok(Background {
            service: BackgroundService::new(client, ChromeSidePanel),
        })
    }

    /// `chrome.runtime.onMessage` listener body.
    ///
    /// Returns `true` so Chrome keeps the channel open until `send_response`
    /// is called.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue, send_response: Function) -> bool {
        let reply = move |response: Response| {
            if let Err(e) = send_response.call1(&JsValue::NULL, &response_to_js(&response)) {
                log::warn!("Message channel closed before the reply was sent: {:?}", e);
            }
        };

        spawn_local(self.service.on_message(js_to_json(&message), reply));
        true
    }

    /// `chrome.action.onClicked` listener body
    #[wasm_bindgen(js_name = handleActionClick)]
    pub fn handle_action_click(&self, tab: JsValue) {
        let tab: Tab = serde_json::from_value(js_to_json(&tab)).unwrap_or_default();
        spawn_local(self.service.on_action_clicked(&tab));
    }

    #[wasm_bindgen(js_name = handleStartup)]
    pub fn handle_startup(&self) {
        self.service.on_startup();
    }

    #[wasm_bindgen(js_name = handleInstalled)]
    pub fn handle_installed(&self, details: JsValue) {
        self.service.on_installed(js_to_json(&details));
    }
}

/// JS value to JSON; `undefined` and anything JSON cannot express become `null`
fn js_to_json(value: &JsValue) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }

    JSON::stringify(value)
        .ok()
        .and_then(|json| json.as_string())
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or(Value::Null)
}

fn response_to_js(response: &Response) -> JsValue {
    let converted = serde_json::to_string(response)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
        .and_then(|json| JSON::parse(&json));

    match converted {
        Ok(value) => value,
        Err(e) => {
            log::error!("Failed to convert response: {:?}", e);
            JsValue::NULL
        }
    }
}

fn js_error(err: JsValue) -> anyhow::Error {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    anyhow::anyhow!(message)
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}
