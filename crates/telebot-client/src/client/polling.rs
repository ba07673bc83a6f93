//! Update poller: the long-poll loop, offset tracking and dispatch.

use super::Client;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::PoisonError;
use telebot_core::{
    command::parse_command,
    error::BotError,
    events::Event,
    request::Params,
    types::{Message, Update},
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Poller lifecycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    #[default]
    Idle,
    Polling,
    /// Between `stop()` and the aborted poll task winding down.
    Stopping,
}

/// Poll state plus the task that owns the in-flight request.
#[derive(Debug, Default)]
pub(super) struct PollSlot {
    state: PollState,
    task: Option<JoinHandle<()>>,
    /// Bumped on every start, so a loop from an earlier start never
    /// mistakes a later one for its own.
    generation: u64,
}

impl Client {
    pub fn state(&self) -> PollState {
        self.slot().state
    }

    pub fn is_polling(&self) -> bool {
        self.state() == PollState::Polling
    }

    /// Begin receiving updates.
    ///
    /// With a webhook configured this registers it and does not poll.
    /// Otherwise it spawns the poll loop; calling it while already polling
    /// is a no-op. Calling it while `Stopping` starts a fresh loop.
    /// Must be called inside a tokio runtime.
    pub async fn start(&self) -> Result<(), BotError> {
        if let Some(url) = self.inner.config.webhook.clone() {
            self.set_webhook(&url).await?;
            info!("webhook registered, updates will be pushed; not polling");
            return Ok(());
        }

        let mut slot = self.slot();
        if slot.state == PollState::Polling {
            debug!("start() while already polling, ignoring");
            return Ok(());
        }
        slot.generation += 1;
        slot.state = PollState::Polling;
        let generation = slot.generation;
        let client = self.clone();
        slot.task = Some(tokio::spawn(async move {
            client.poll_loop(generation).await;
        }));

        info!(offset = self.offset(), "started polling for updates");
        Ok(())
    }

    /// Stop polling and abort the in-flight poll request. Idempotent.
    ///
    /// The state is `Stopping` until the aborted task has wound down, then
    /// `Idle`. Facade calls already in flight are not affected.
    pub fn stop(&self) {
        let (task, generation) = {
            let mut slot = self.slot();
            if slot.state != PollState::Polling {
                return;
            }
            slot.state = PollState::Stopping;
            (slot.task.take(), slot.generation)
        };
        info!(offset = self.offset(), "stopping polling");

        match (task, Handle::try_current()) {
            (Some(task), Ok(runtime)) => {
                task.abort();
                let client = self.clone();
                runtime.spawn(async move {
                    // Resolves with a cancellation error once the abort lands.
                    let _ = task.await;
                    client.settle_stop(generation);
                });
            }
            (task, _) => {
                if let Some(task) = task {
                    task.abort();
                }
                self.settle_stop(generation);
            }
        }
    }

    async fn poll_loop(self, generation: u64) {
        while self.still_polling(generation) {
            let pause = match self.poll_once().await {
                Ok(_) if self.inner.config.is_long_poll() => None,
                Ok(_) => Some(self.inner.config.interval()),
                Err(e) if e.is_timeout() => {
                    debug!("long poll expired without a response, polling again");
                    None
                }
                Err(e) => {
                    let fatal = matches!(e, BotError::InvalidToken);
                    if fatal {
                        error!("poll failed, stopping: {e}");
                    } else {
                        warn!("poll failed: {e}");
                    }
                    self.inner.events.emit(&Event::Error(e));
                    if fatal {
                        self.finish(generation);
                        return;
                    }
                    Some(self.inner.config.interval())
                }
            };

            if let Some(pause) = pause {
                if !self.still_polling(generation) {
                    break;
                }
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// Fetch one batch from `getUpdates` and dispatch it.
    ///
    /// Returns how many updates were processed (redeliveries excluded).
    pub async fn poll_once(&self) -> Result<usize, BotError> {
        let config = &self.inner.config;
        let mut params = Params::new();
        params.insert("offset".into(), self.offset().into());
        params.insert("timeout".into(), config.timeout_secs.into());
        let timeout = Some(config.request_timeout());

        let transport = &self.inner.transport;
        let reply = self
            .with_retry(|| transport.get("getUpdates", &params, timeout))
            .await?;
        if let Some(err) = reply.status_error() {
            return Err(err);
        }

        let batch = match reply.into_result()? {
            Value::Array(items) => items,
            other => {
                return Err(BotError::Decode(format!(
                    "getUpdates result is not an array: {other}"
                )))
            }
        };
        if !batch.is_empty() {
            debug!(count = batch.len(), "received updates");
        }

        // Array order: a bad entry moves the offset only at its own position.
        let mut processed = 0;
        for raw in batch {
            match serde_json::from_value::<Update>(raw.clone()) {
                Ok(update) => processed += usize::from(self.process_update(update)),
                Err(e) => self.skip_malformed(&raw, e),
            }
        }
        Ok(processed)
    }

    /// Dispatch a batch in order. Updates below the current offset are
    /// dropped silently; the offset never moves backwards.
    pub fn process_updates(&self, updates: impl IntoIterator<Item = Update>) -> usize {
        updates
            .into_iter()
            .map(|update| usize::from(self.process_update(update)))
            .sum()
    }

    /// Returns false for a redelivered update.
    fn process_update(&self, update: Update) -> bool {
        let offset = self.offset();
        if update.update_id < offset {
            debug!(
                update_id = update.update_id,
                offset, "skipping redelivered update"
            );
            return false;
        }
        self.advance_offset(update.update_id);

        let (message, callback_query) = update.into_parts();
        if let Some(message) = message {
            self.dispatch_message(message);
        }
        if let Some(query) = callback_query {
            self.inner.events.emit(&Event::CallbackQuery(query));
        }
        true
    }

    fn dispatch_message(&self, message: Message) {
        let events = &self.inner.events;
        if self.inner.config.parse_command {
            if let Some(cmd) = message.text.as_deref().and_then(parse_command) {
                debug!(command = %cmd.name, chat_id = message.chat.id, "command received");
                events.emit(&Event::Command {
                    name: cmd.name,
                    message: message.clone(),
                    args: cmd.args,
                    target: cmd.target,
                });
            }
        }
        events.emit(&Event::Message(message));
    }

    /// Still advance past an update we cannot decode, or it is redelivered forever.
    fn skip_malformed(&self, raw: &Value, e: serde_json::Error) {
        let update_id = raw.get("update_id").and_then(Value::as_i64);
        if let Some(id) = update_id {
            if id < self.offset() {
                return;
            }
            self.advance_offset(id);
        }
        warn!(?update_id, "skipping malformed update: {e}");
        self.inner.events.emit(&Event::Error(BotError::Decode(format!(
            "malformed update {update_id:?}: {e}"
        ))));
    }

    fn advance_offset(&self, update_id: i64) {
        self.inner
            .offset
            .fetch_max(update_id.saturating_add(1), Ordering::SeqCst);
    }

    fn still_polling(&self, generation: u64) -> bool {
        let slot = self.slot();
        slot.state == PollState::Polling && slot.generation == generation
    }

    /// The aborted task is gone; finish the stop unless a restart happened.
    fn settle_stop(&self, generation: u64) {
        let mut slot = self.slot();
        if slot.generation == generation && slot.state == PollState::Stopping {
            slot.state = PollState::Idle;
            debug!("poll task wound down");
        }
    }

    /// The loop ended on its own; release the slot if it is still ours.
    fn finish(&self, generation: u64) {
        let mut slot = self.slot();
        if slot.generation == generation && slot.state == PollState::Polling {
            slot.state = PollState::Idle;
            slot.task = None;
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, PollSlot> {
        self.inner.poll.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
