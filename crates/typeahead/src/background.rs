//! Running a suggestion provider on a dedicated thread.
//!
//! Slow providers (network lookups, large indexes) should not stall the
//! keystroke path. [`BackgroundProvider`] moves the provider onto its own
//! thread and exchanges generation-tagged messages with it:
//!
//! 1. The controller bumps its generation on every text change and calls
//!    [`BackgroundProvider::request`].
//! 2. The worker drains its queue, keeps only the newest request and runs the
//!    provider once.
//! 3. The controller polls [`BackgroundProvider::try_recv`] from its own
//!    thread and drops every response whose generation is no longer current.
//!
//! Nothing here touches controller state; responses are applied only on the
//! controller's thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use parking_lot::Mutex;
use typeahead_core::logging::targets;

use crate::error::{AssistError, ProviderError};
use crate::provider::{SuggestionProvider, call_provider};

/// Default name of the worker thread.
pub const DEFAULT_WORKER_NAME: &str = "typeahead-provider";

/// Default capacity of the request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The answer to one [`BackgroundProvider::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResponse {
    /// Generation the request was tagged with.
    pub generation: u64,
    /// Text the provider was asked about.
    pub text: String,
    pub result: Result<Vec<String>, ProviderError>,
}

enum WorkerMessage {
    Lookup { generation: u64, text: String },
    Shutdown,
}

/// A suggestion provider running on its own thread.
///
/// Dropping it tells the worker to stop without waiting for it; a lookup in
/// flight finishes on the detached thread and its answer is discarded. Call
/// [`BackgroundProvider::stop_and_join`] to wait for the thread explicitly.
pub struct BackgroundProvider {
    requests: Mutex<Option<Sender<WorkerMessage>>>,
    responses: Receiver<SuggestionResponse>,
    handle: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl BackgroundProvider {
    /// Move `provider` onto a new worker thread.
    pub fn spawn<P>(provider: P) -> Result<Self, AssistError>
    where
        P: SuggestionProvider + Send + 'static,
    {
        Self::spawn_named(provider, DEFAULT_WORKER_NAME, DEFAULT_QUEUE_CAPACITY)
    }

    /// Move `provider` onto a worker thread with the given name and queue capacity.
    pub fn spawn_named<P>(
        provider: P,
        name: impl Into<String>,
        queue_capacity: usize,
    ) -> Result<Self, AssistError>
    where
        P: SuggestionProvider + Send + 'static,
    {
        let (request_tx, request_rx) = bounded(queue_capacity.max(1));
        let (response_tx, response_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                worker_loop(provider, request_rx, response_tx);
                thread_running.store(false, Ordering::Release);
            })
            .map_err(AssistError::WorkerSpawn)?;

        Ok(Self {
            requests: Mutex::new(Some(request_tx)),
            responses: response_rx,
            handle: Mutex::new(Some(handle)),
            running,
        })
    }

    /// Check if the worker thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask for suggestions for `text`, tagged with `generation`.
    pub fn request(&self, generation: u64, text: &str) -> Result<(), ProviderError> {
        let message = WorkerMessage::Lookup {
            generation,
            text: text.to_string(),
        };
        let requests = self.requests.lock();
        let Some(sender) = requests.as_ref() else {
            return Err(ProviderError::Disconnected);
        };
        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(ProviderError::failed("suggestion request queue is full"))
            }
            Err(TrySendError::Disconnected(_)) => Err(ProviderError::Disconnected),
        }
    }

    /// Take the next finished response without blocking.
    pub fn try_recv(&self) -> Option<SuggestionResponse> {
        self.responses.try_recv().ok()
    }

    /// Block until the next finished response arrives.
    ///
    /// Returns `None` once the worker has exited and every response was taken.
    pub fn recv(&self) -> Option<SuggestionResponse> {
        self.responses.recv().ok()
    }

    /// Wait up to `timeout` for the next finished response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SuggestionResponse> {
        self.responses.recv_timeout(timeout).ok()
    }

    /// Tell the worker to exit once its current lookup is done.
    ///
    /// Does not wait for the thread. Later requests fail with
    /// [`ProviderError::Disconnected`].
    pub fn stop(&self) {
        // Dropping the sender wakes the worker even when the queue is full.
        if let Some(sender) = self.requests.lock().take() {
            let _ = sender.try_send(WorkerMessage::Shutdown);
        }
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// Returns `false` if it was already joined or the thread panicked.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        match self.handle.lock().take() {
            Some(handle) => handle.join().is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for BackgroundProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundProvider")
            .field("running", &self.is_running())
            .field("pending_responses", &self.responses.len())
            .finish()
    }
}

impl Drop for BackgroundProvider {
    fn drop(&mut self) {
        // Never block the owning thread on a slow provider.
        self.stop();
    }
}

static_assertions::assert_impl_all!(BackgroundProvider: Send, Sync);

fn worker_loop<P: SuggestionProvider>(
    mut provider: P,
    requests: Receiver<WorkerMessage>,
    responses: Sender<SuggestionResponse>,
) {
    while let Ok(message) = requests.recv() {
        let WorkerMessage::Lookup {
            mut generation,
            mut text,
        } = message
        else {
            break;
        };

        // Only the newest queued request is worth answering.
        let mut shutdown = false;
        while let Ok(next) = requests.try_recv() {
            match next {
                WorkerMessage::Lookup {
                    generation: newer,
                    text: newer_text,
                } => {
                    tracing::trace!(target: targets::PROVIDER, skipped = generation, newer, "coalescing request");
                    generation = newer;
                    text = newer_text;
                }
                WorkerMessage::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }
        if shutdown {
            break;
        }

        let result = call_provider(&mut provider, &text);
        if let Err(err) = &result {
            tracing::debug!(target: targets::PROVIDER, generation, error = %err, "background lookup failed");
        }
        let response = SuggestionResponse {
            generation,
            text,
            result,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    tracing::debug!(target: targets::PROVIDER, "suggestion worker exiting");
}
