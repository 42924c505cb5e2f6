//! One content-script instance: store, cache, resolver and presenter wired
//! together, fed by host events.

use crate::cache::{LookupCache, spawn_detached};
use crate::config::Config;
use crate::error::Result;
use crate::geometry::Point;
use crate::presenter::{HoverOutcome, Presenter, Ticket, TooltipState, TooltipSurface};
use crate::resolver::{HostNode, TokenResolver};
use crate::store::{DatasetSource, DocStore, FileSource, FsPartitionStore, PartitionStore};
use crate::types::{DocRecord, SymbolKey};
use anyhow::Context;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// A pointer move reported by the host page.
#[derive(Debug, Clone)]
pub struct PointerEvent<N> {
    /// The element under the pointer.
    pub target: N,
    /// Pointer position in client coordinates.
    pub client: Point,
}

/// A key press or release reported by the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// `KeyboardEvent.key`.
    pub key: String,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: &str) -> Self {
        Self {
            key: key.to_string(),
            pressed: true,
        }
    }

    pub fn up(key: &str) -> Self {
        Self {
            key: key.to_string(),
            pressed: false,
        }
    }
}

/// A lookup that settled after the cold tier finished loading.
#[derive(Debug)]
struct Completion {
    ticket: Ticket,
    key: SymbolKey,
    record: Option<Arc<DocRecord>>,
}

/// Per-page context owning every component. Dropped with the page.
pub struct Session<P, S, T> {
    config: Config,
    store: DocStore<P, S>,
    cache: Arc<LookupCache<P, S>>,
    resolver: TokenResolver,
    presenter: Presenter<T>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<P, S, T> std::fmt::Debug for Session<P, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("presenter", &self.presenter)
            .finish_non_exhaustive()
    }
}

impl<T: TooltipSurface> Session<FsPartitionStore, FileSource, T> {
    /// Reads the config file at `config_path`, or uses defaults when `None`,
    /// and starts a session over on-disk partitions.
    pub async fn open(config_path: Option<&Path>, surface: T) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path).with_context(|| {
                format!("Failed to load hover-docs config from {}", path.display())
            })?,
            None => Config::default(),
        };
        let store = DocStore::<FsPartitionStore, FileSource>::initialize(&config).await;
        Ok(Self::start(config, store, surface).await)
    }
}

impl<P, S, T> Session<P, S, T>
where
    P: PartitionStore,
    S: DatasetSource,
    T: TooltipSurface,
{
    /// Builds the session and loads the common tier.
    ///
    /// A failed load leaves the documentation table empty: the page works,
    /// it just never shows a tooltip.
    pub async fn start(config: Config, store: DocStore<P, S>, surface: T) -> Self {
        match store.load_common().await {
            Ok(()) => tracing::info!(records = store.len(), "Hover docs ready"),
            Err(e) => tracing::error!(error = %e, "Failed to load documentation, tooltips disabled"),
        }
        Self::new(config, store, surface)
    }

    /// Builds the session without loading anything.
    pub fn new(config: Config, store: DocStore<P, S>, surface: T) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let cache = Arc::new(LookupCache::new(store.clone(), capacity));
        let resolver = TokenResolver::from_config(&config);
        let presenter = Presenter::new(surface, &config);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            config,
            store,
            cache,
            resolver,
            presenter,
            completions_tx,
            completions_rx,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn store(&self) -> &DocStore<P, S> {
        &self.store
    }

    pub fn cache(&self) -> &LookupCache<P, S> {
        &self.cache
    }

    pub const fn presenter(&self) -> &Presenter<T> {
        &self.presenter
    }

    pub const fn state(&self) -> &TooltipState {
        self.presenter.state()
    }

    pub const fn surface(&self) -> &T {
        self.presenter.surface()
    }

    /// Handles a pointer move over the host page.
    pub fn on_pointer_move<N: HostNode>(&mut self, event: &PointerEvent<N>, now: Instant) {
        let outcome = match self.resolver.resolve(&event.target, event.client.x) {
            None => HoverOutcome::Missing,
            Some(token) => match self.cache.resolve(&token.key) {
                Some(record) => HoverOutcome::Found {
                    key: token.key,
                    record,
                    anchor: token.rect,
                },
                None if self.store.remaining_in_flight() => HoverOutcome::Pending {
                    key: token.key,
                    anchor: token.rect,
                },
                None => HoverOutcome::Missing,
            },
        };

        let pending_key = match &outcome {
            HoverOutcome::Pending { key, .. } => Some(key.clone()),
            _ => None,
        };
        if let Some(ticket) = self.presenter.hover(event.client, outcome, now)
            && let Some(key) = pending_key
        {
            self.await_hydration(ticket, key);
        }
    }

    /// Handles a key event. Only the configured lock key matters.
    pub fn on_key(&mut self, event: &KeyEvent, pointer_over_panel: bool) {
        if event.key != self.config.lock_key {
            return;
        }
        if event.pressed {
            self.presenter.lock();
        } else {
            self.presenter.unlock(pointer_over_panel);
        }
    }

    /// Applies every late lookup result already delivered. Returns how many
    /// were still current.
    pub fn process_completions(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            applied += usize::from(self.apply(completion, now));
        }
        applied
    }

    /// Waits for the next late lookup result and applies it. Returns whether
    /// it was still current.
    pub async fn next_completion(&mut self) -> bool {
        // the session holds a sender, so the channel never closes
        match self.completions_rx.recv().await {
            Some(completion) => self.apply(completion, Instant::now()),
            None => false,
        }
    }

    fn apply(&mut self, completion: Completion, now: Instant) -> bool {
        tracing::debug!(
            symbol = %completion.key,
            found = completion.record.is_some(),
            "Lookup settled"
        );
        self.presenter
            .complete(completion.ticket, completion.record, now)
    }

    fn await_hydration(&self, ticket: Ticket, key: SymbolKey) {
        let load = self.store.load_remaining();
        let cache = Arc::clone(&self.cache);
        let tx = self.completions_tx.clone();
        spawn_detached(async move {
            let _ = load.await;
            let record = cache.resolve(&key);
            let _ = tx.send(Completion {
                ticket,
                key,
                record,
            });
        });
    }
}
