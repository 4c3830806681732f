//! Client for the remote Secret Santa service.
//!
//! The service owns the participant pool and the assignments. This side only asks how many people
//! have joined and registers a name. Transport lives in `HttpSantaApi`; turning a status and a body
//! into a typed result lives in `interpret_count` / `interpret_join` so it can be tested off the
//! browser.

#![allow(async_fn_in_trait)]

use serde::de::DeserializeOwned;

use crate::error::JoinError;
use crate::model::{ErrorBody, JoinResult, ParticipantCount};
#[cfg(feature = "hydrate")]
use crate::model::JoinRequest;

pub const SANTA_API: &str = "https://functions.poehali.dev/cca35df5-c04f-4d6a-b5dc-580871184a95";

/// The two calls the page makes against the service.
pub trait SantaApi {
    /// Current number of registered participants.
    async fn participant_count(&self) -> Result<u32, JoinError>;

    /// Registers `name` (already trimmed) and returns the assignment, if any.
    async fn join(&self, name: &str) -> Result<JoinResult, JoinError>;
}

#[derive(Debug, Clone, Copy)]
pub struct HttpSantaApi {
    endpoint: &'static str,
}

impl Default for HttpSantaApi {
    fn default() -> Self {
        Self::new(SANTA_API)
    }
}

impl HttpSantaApi {
    pub fn new(endpoint: &'static str) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

#[cfg(feature = "hydrate")]
impl SantaApi for HttpSantaApi {
    async fn participant_count(&self) -> Result<u32, JoinError> {
        use gloo_net::http::Request;
        use web_sys::RequestMode;

        let resp = Request::get(self.endpoint)
            .mode(RequestMode::Cors)
            .header("Accept", "application/json")
            .send()
            .await?;
        let ok = resp.ok();
        let body = resp.text().await?;
        interpret_count(ok, &body)
    }

    async fn join(&self, name: &str) -> Result<JoinResult, JoinError> {
        use gloo_net::http::Request;
        use web_sys::RequestMode;

        let resp = Request::post(self.endpoint)
            .mode(RequestMode::Cors)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(&JoinRequest {
                name: name.to_string(),
            })?
            .send()
            .await?;
        let ok = resp.ok();
        let body = resp.text().await?;
        interpret_join(ok, &body)
    }
}

// The form is only ever driven from the browser. During server rendering there is nothing to
// fetch from.
#[cfg(not(feature = "hydrate"))]
impl SantaApi for HttpSantaApi {
    async fn participant_count(&self) -> Result<u32, JoinError> {
        Err(JoinError::network(format!(
            "{} is only reachable from the browser",
            self.endpoint
        )))
    }

    async fn join(&self, _name: &str) -> Result<JoinResult, JoinError> {
        Err(JoinError::network(format!(
            "{} is only reachable from the browser",
            self.endpoint
        )))
    }
}

/// Interprets the reply to `GET <endpoint>`.
pub fn interpret_count(ok: bool, body: &str) -> Result<u32, JoinError> {
    interpret::<ParticipantCount>(ok, body).map(|c| c.participant_count)
}

/// Interprets the reply to `POST <endpoint>`.
pub fn interpret_join(ok: bool, body: &str) -> Result<JoinResult, JoinError> {
    interpret(ok, body)
}

fn interpret<T: DeserializeOwned>(ok: bool, body: &str) -> Result<T, JoinError> {
    if !ok {
        // Anything that isn't `{ "error": "..." }` gets the generic message.
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error);
        return Err(JoinError::service(message));
    }
    Ok(serde_json::from_str(body)?)
}
