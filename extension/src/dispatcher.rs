// Routes side-panel requests to the Airtable service

use std::future::Future;
use std::rc::Rc;

use airtable_client::AirtableService;
use serde_json::Value;

use crate::messages::{Request, Response};

pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Maps each [`Request`] to one Airtable operation and always produces
/// exactly one [`Response`], failures included.
pub struct Dispatcher<S> {
    service: Rc<S>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: AirtableService> Dispatcher<S> {
    pub fn new(service: S) -> Self {
        Self {
            service: Rc::new(service),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        log::debug!("Dispatching {}", action);

        let result = match request {
            Request::SaveToAirtable {
                data,
                config,
                field_mappings,
            } => {
                self.service
                    .save_to_airtable(data, config, field_mappings)
                    .await
            }
            Request::TestAirtableConnection { config } => {
                self.service.test_airtable_connection(config).await
            }
            Request::TestFieldMappings {
                data,
                config,
                field_mappings,
            } => {
                self.service
                    .test_field_mappings(data, config, field_mappings)
                    .await
            }
            Request::Unknown => {
                log::warn!("Ignoring message with unknown action");
                return Response::failure(UNKNOWN_ACTION);
            }
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                log::error!("Background service error ({}): {:#}", action, e);
                Response::failure(e.to_string())
            }
        }
    }

    /// Decode a raw message and handle it
    pub async fn handle_value(&self, message: Value) -> Response {
        self.handle(Request::from_value(message)).await
    }

    /// Channel adapter: the returned future resolves after `reply` has been
    /// called with the response. `reply` is `FnOnce`, so a request can never be
    /// answered twice; the caller keeps the channel open until then.
    pub fn listen<F>(&self, message: Value, reply: F) -> impl Future<Output = ()> + 'static
    where
        S: 'static,
        F: FnOnce(Response) + 'static,
    {
        let dispatcher = self.clone();
        async move {
            let response = dispatcher.handle_value(message).await;
            reply(response);
        }
    }
}
