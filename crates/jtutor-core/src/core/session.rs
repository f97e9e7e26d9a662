//! Streaming session: one logical streaming exchange at a time.
//!
//! A session accumulates fragments for the request it most recently started.
//! Every `start` advances a generation counter; updates carry the generation
//! they were produced for, and anything tagged with an older generation is
//! dropped on arrival. The network stream behind a superseded request keeps
//! running until it ends on its own; its pump watches the session's current
//! generation and stops delivering once it is no longer current, so a stale
//! pump never waits on a channel nobody drains.
//!
//! Fragments are produced by a pump task (`spawn_fragment_pump`) and applied
//! by the owner of the session, one at a time, so session state needs no
//! locking.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::providers::{GenerateRequest, GenerativeModel, ProviderError};

/// Identifies one `start` of a session.
pub type Generation = u64;

/// Sender half of a session update channel.
pub type UpdateTx = mpsc::Sender<StreamUpdate>;

/// Receiver half of a session update channel.
pub type UpdateRx = mpsc::Receiver<StreamUpdate>;

/// Default channel capacity for update streams.
pub const DEFAULT_UPDATE_CHANNEL_CAPACITY: usize = 128;

/// Creates a bounded update channel with the default capacity.
pub fn create_update_channel() -> (UpdateTx, UpdateRx) {
    mpsc::channel(DEFAULT_UPDATE_CHANNEL_CAPACITY)
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Fragment(String),
    /// The provider stream ended normally.
    Completed,
    /// The request could not start or the stream broke mid-way.
    Failed(ProviderError),
}

/// A pump event tagged with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct StreamUpdate {
    pub generation: Generation,
    pub event: StreamEvent,
}

/// Result of `StreamingSession::start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The key was already complete; no request is needed.
    Cached(String),
    /// A request must be issued and its updates tagged with this generation.
    Started(Generation),
}

/// What applying an update did to the session.
#[derive(Debug, Clone)]
pub enum Applied {
    /// Update belonged to a superseded generation (or an idle session).
    Stale,
    Fragment,
    Completed,
    Failed(ProviderError),
}

/// Write-once store of completed results.
///
/// The first write for a key wins; entries live as long as the cache.
#[derive(Debug)]
pub struct ContentCache<K> {
    entries: HashMap<K, String>,
}

impl<K> Default for ContentCache<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> ContentCache<K> {
    pub fn get(&self, key: &K) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores `text` unless `key` is already present. Returns whether it was
    /// stored.
    pub fn insert(&mut self, key: K, text: String) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, text);
        true
    }

}

/// Accumulator plus supersession state for one streaming widget.
#[derive(Debug)]
pub struct StreamingSession<K> {
    generation: Generation,
    current: watch::Sender<Generation>,
    key: Option<K>,
    text: String,
    streaming: bool,
    error: Option<ProviderError>,
    cache: Option<ContentCache<K>>,
}

impl<K: Clone + Eq + Hash> Default for StreamingSession<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> StreamingSession<K> {
    /// Session whose completed results are cached per key.
    pub fn new() -> Self {
        Self {
            generation: 0,
            current: watch::Sender::new(0),
            key: None,
            text: String::new(),
            streaming: false,
            error: None,
            cache: Some(ContentCache::default()),
        }
    }

    /// Session that never caches; every `start` issues a request.
    pub fn uncached() -> Self {
        Self {
            cache: None,
            ..Self::new()
        }
    }

    /// Begins an exchange for `key`, superseding whatever ran before. A
    /// completed result for `key` is served from the cache.
    pub fn start(&mut self, key: K) -> StartOutcome {
        let Some(cached) = self.cached(&key).map(str::to_string) else {
            return StartOutcome::Started(self.start_fresh(key));
        };

        self.advance();
        self.error = None;
        self.text = cached;
        self.streaming = false;
        self.key = Some(key);
        tracing::debug!(generation = self.generation, "stream served from cache");
        StartOutcome::Cached(self.text.clone())
    }

    /// Begins streaming `key` without consulting the cache.
    pub fn start_fresh(&mut self, key: K) -> Generation {
        self.advance();
        self.error = None;
        self.text.clear();
        self.streaming = true;
        self.key = Some(key);
        tracing::debug!(generation = self.generation, "stream started");
        self.generation
    }

    /// Abandons the current exchange without starting a new one. Updates
    /// still in flight become stale.
    pub fn supersede(&mut self) {
        self.advance();
        self.streaming = false;
        tracing::debug!(generation = self.generation, "stream superseded");
    }

    /// Watch on the current generation, for pumps to notice supersession.
    pub fn watch_generation(&self) -> watch::Receiver<Generation> {
        self.current.subscribe()
    }

    fn advance(&mut self) {
        self.generation += 1;
        self.current.send_replace(self.generation);
    }

    /// Applies one pump update.
    pub fn apply(&mut self, update: StreamUpdate) -> Applied {
        if update.generation != self.generation || !self.streaming {
            tracing::trace!(
                update = update.generation,
                current = self.generation,
                "dropping stale stream update"
            );
            return Applied::Stale;
        }

        match update.event {
            StreamEvent::Fragment(fragment) => {
                self.text.push_str(&fragment);
                Applied::Fragment
            }
            StreamEvent::Completed => {
                self.streaming = false;
                if let (Some(cache), Some(key)) = (self.cache.as_mut(), self.key.clone()) {
                    cache.insert(key, self.text.clone());
                }
                tracing::debug!(
                    generation = self.generation,
                    chars = self.text.len(),
                    "stream completed"
                );
                Applied::Completed
            }
            StreamEvent::Failed(error) => {
                self.streaming = false;
                tracing::warn!(generation = self.generation, error = %error, "stream failed");
                self.error = Some(error.clone());
                Applied::Failed(error)
            }
        }
    }

    /// Text accumulated for the current generation.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// True while `key` is the one currently streaming.
    pub fn is_streaming_key(&self, key: &K) -> bool {
        self.streaming && self.key.as_ref() == Some(key)
    }

    /// Error from the last failed stream, cleared by the next `start`.
    pub fn error(&self) -> Option<&ProviderError> {
        self.error.as_ref()
    }

    pub fn cached(&self, key: &K) -> Option<&str> {
        self.cache.as_ref().and_then(|cache| cache.get(key))
    }
}

/// Delivers one pump's updates while its generation is current.
struct Outbox {
    tx: UpdateTx,
    current: watch::Receiver<Generation>,
    generation: Generation,
}

impl Outbox {
    fn is_stale(&self) -> bool {
        *self.current.borrow() != self.generation
    }

    /// Returns false once the pump should stop reading: the receiver is gone
    /// or the session was dropped.
    async fn deliver(&mut self, event: StreamEvent) -> bool {
        if self.is_stale() {
            return true;
        }

        let Self {
            tx,
            current,
            generation,
        } = self;
        let generation = *generation;
        let update = StreamUpdate { generation, event };
        let superseded = async {
            current
                .wait_for(|latest| *latest != generation)
                .await
                .is_ok()
        };

        tokio::select! {
            biased;
            sent = tx.send(update) => sent.is_ok(),
            superseded = superseded => {
                if superseded {
                    tracing::debug!(generation, "pump superseded while waiting to deliver");
                }
                superseded
            }
        }
    }
}

/// Runs `request` as a stream on a tokio task, forwarding tagged updates.
///
/// Once `current` moves past `generation` the stream is still read to its
/// end, but nothing more is sent. The task ends after `Completed` or
/// `Failed`, or as soon as the receiver is gone.
pub fn spawn_fragment_pump<M: GenerativeModel>(
    model: Arc<M>,
    request: GenerateRequest,
    generation: Generation,
    current: watch::Receiver<Generation>,
    tx: UpdateTx,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut outbox = Outbox {
            tx,
            current,
            generation,
        };

        let mut stream = match model.stream(request).await {
            Ok(stream) => stream,
            Err(error) => {
                outbox.deliver(StreamEvent::Failed(error)).await;
                return;
            }
        };

        while let Some(item) = stream.next().await {
            let delivered = match item {
                Ok(fragment) if fragment.is_empty() => true,
                Ok(fragment) => outbox.deliver(StreamEvent::Fragment(fragment)).await,
                Err(error) => {
                    outbox.deliver(StreamEvent::Failed(error)).await;
                    return;
                }
            };
            if !delivered {
                tracing::debug!(generation, "update receiver dropped; stopping pump");
                return;
            }
        }

        outbox.deliver(StreamEvent::Completed).await;
    })
}
