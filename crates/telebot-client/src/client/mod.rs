//! The client facade: configuration, transport, retry, poller and events.

mod files;
mod manage;
mod polling;
mod send;


pub use files::FileDownload;
pub use polling::PollState;

use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use telebot_core::{
    config::ClientConfig,
    error::BotError,
    events::{Event, EventRegistry},
    request::{Params, Upload},
    traits::Transport,
    types::Identity,
};

/// Telegram Bot API client.
///
/// Cheap to clone; clones share state, so a handler can keep a clone and
/// call back into the client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    events: EventRegistry,
    /// Next update id the poller expects. Only the poller advances it.
    offset: AtomicI64,
    identity: RwLock<Option<Identity>>,
    poll: Mutex<polling::PollSlot>,
}

impl Client {
    /// Create a client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, BotError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, BotError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                retry: RetryPolicy::from_config(&config),
                offset: AtomicI64::new(config.offset),
                config,
                transport,
                events: EventRegistry::new(),
                identity: RwLock::new(None),
                poll: Mutex::new(polling::PollSlot::default()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventRegistry {
        &self.inner.events
    }

    /// Register an event handler. Chainable.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.on(name, handler);
        self
    }

    /// Next update id the poller will ask for.
    pub fn offset(&self) -> i64 {
        self.inner.offset.load(Ordering::SeqCst)
    }

    /// Identity cached by the last successful `get_me`.
    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `call` under the retry policy, emitting `retry` events.
    pub async fn with_retry<T, F, Fut>(&self, call: F) -> Result<T, BotError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BotError>>,
    {
        let events = &self.inner.events;
        self.inner
            .retry
            .run(call, |attempt| {
                events.emit(&Event::Retry { attempt });
            })
            .await
    }

    /// Call any API method and return its raw `result`.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value, BotError> {
        self.request(method, params).await
    }

    /// Simple call: GET with query parameters, decoded into `T`.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
    ) -> Result<T, BotError> {
        let transport = &self.inner.transport;
        let reply = self
            .with_retry(|| transport.get(method, &params, None))
            .await?;
        decode(method, reply.into_result()?)
    }

    /// Multipart call carrying one file part.
    pub(crate) async fn request_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
        upload: Upload,
    ) -> Result<T, BotError> {
        let transport = &self.inner.transport;
        let reply = self
            .with_retry(|| transport.post_multipart(method, &params, &upload))
            .await?;
        decode(method, reply.into_result()?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.config.base_url)
            .field("offset", &self.offset())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(method: &str, result: Value) -> Result<T, BotError> {
    serde_json::from_value(result)
        .map_err(|e| BotError::Decode(format!("unexpected {method} result: {e}")))
}
