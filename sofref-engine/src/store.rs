//! Session state for one plugin instance and the fetch protocol that drives it.
//!
//! Every asynchronous continuation re-checks the generation it was started for
//! against the live one before touching state. There is no real cancellation:
//! a superseded request still runs to completion (and still costs a network
//! round-trip), its result is just dropped.

use crate::traits::Services;
use sofref_core::text::remove_italics;
use sofref_core::types::{
    Generation, REFERENCES_FAILED_MESSAGE, ReferenceState, Session, Settings, Status,
};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::{JoinError, JoinHandle};

pub type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct Inner {
    session: Session,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,

    // Snapshots waiting to be delivered, oldest first.
    pending: VecDeque<Session>,
    // Set while some caller is draining `pending`; nested commits only enqueue.
    notifying: bool,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by [`SessionStore::subscribe`].
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe()"]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Returns `false` if the listener was already gone (or the store dropped).
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut inner = lock(&inner);
        let before = inner.listeners.len();
        inner.listeners.retain(|(id, _)| *id != self.id);
        inner.listeners.len() != before
    }
}

/// A fetch started by [`SessionStore::start_fetch`].
pub struct FetchHandle {
    generation: Generation,
    task: JoinHandle<Option<JoinHandle<()>>>,
}

impl FetchHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Waits for the transcript fetch and, if one was started, the citation lookup.
    pub async fn settled(self) -> Result<(), JoinError> {
        if let Some(lookup) = self.task.await? {
            lookup.await?;
        }
        Ok(())
    }
}

/// Owns the [`Session`] of one widget and runs the transcript/citation pipeline.
///
/// Cloning is cheap and yields another handle to the same session. Commands that
/// start work spawn onto the ambient tokio runtime.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    services: Services,
}

impl SessionStore {
    pub fn new(services: Services) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            services,
        }
    }

    pub fn get_state(&self) -> Session {
        lock(&self.inner).session.clone()
    }

    pub fn generation(&self) -> Generation {
        lock(&self.inner).session.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation() == generation
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    /// Registers `listener`; it runs after every mutation, in mutation order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Applies new settings and starts a fresh lineage.
    ///
    /// Always advances the generation. Returns `None` when there is no transcription
    /// id to fetch.
    pub fn update_settings_and_fetch(
        &self,
        api_key: impl Into<String>,
        transcription_id: impl Into<String>,
    ) -> Option<FetchHandle> {
        let settings = Settings::new(api_key, transcription_id);
        let (generation, settings) = self.commit(move |s| {
            s.settings = settings;
            s.generation = s.generation.next();
            s.status = Status::Idle;
            s.display_text.clear();
            s.references = ReferenceState::default();
            (s.generation, s.settings.clone())
        });
        log::debug!("settings applied, generation {generation}");

        self.start_fetch_for(generation, settings)
    }

    /// Starts the transcript fetch for the current generation and settings.
    ///
    /// A missing transcription id is a silent no-op.
    pub fn start_fetch(&self) -> Option<FetchHandle> {
        let current = self.get_state();
        self.start_fetch_for(current.generation, current.settings)
    }

    // Fetch for the lineage that committed `settings`; a newer commit wins.
    fn start_fetch_for(&self, generation: Generation, settings: Settings) -> Option<FetchHandle> {
        if !settings.has_transcription_id() {
            log::warn!("fetch requested without a transcription id; ignoring");
            return None;
        }

        let applied = self.apply_if_current(generation, |s| {
            s.status = Status::Loading;
            s.display_text.clear();
        });
        if !applied {
            return None;
        }

        let store = self.clone();
        let task = tokio::spawn(async move { store.complete_fetch(generation, settings).await });
        Some(FetchHandle { generation, task })
    }

    /// Runs `f` against the session only if `generation` is still the live one.
    ///
    /// The check and the mutation happen under one lock; listeners are notified only
    /// when the mutation was applied.
    pub fn apply_if_current<F>(&self, generation: Generation, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let deliver = {
            let mut inner = lock(&self.inner);
            if inner.session.generation != generation {
                return false;
            }
            f(&mut inner.session);
            Self::enqueue(&mut inner)
        };
        if deliver {
            self.drain_notifications();
        }
        true
    }

    /// Second half of the fetch protocol. Returns the spawned citation lookup, if any.
    pub async fn complete_fetch(
        &self,
        generation: Generation,
        settings: Settings,
    ) -> Option<JoinHandle<()>> {
        let fetched = self
            .services
            .transcription
            .fetch_transcript(&settings.transcription_id, &settings.api_key)
            .await;

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                let applied = self.apply_if_current(generation, |s| {
                    s.status = Status::Error;
                    s.display_text.clear();
                    // A retry with identical settings must form a new lineage.
                    s.generation = s.generation.next();
                    s.references = ReferenceState::default();
                });
                if applied {
                    log::error!("transcript fetch failed (generation {generation}): {e}");
                } else {
                    log::debug!("dropping stale transcript failure (generation {generation}): {e}");
                }
                return None;
            }
        };

        let cleaned = remove_italics(&raw);
        let display = cleaned.clone();
        let applied = self.apply_if_current(generation, move |s| {
            s.display_text = display;
            s.status = Status::Finished;
        });
        if !applied {
            log::debug!("dropping stale transcript (generation {generation})");
            return None;
        }

        if cleaned.is_empty() {
            self.apply_if_current(generation, |s| s.references = ReferenceState::default());
            return None;
        }

        if !self.is_current(generation) {
            return None;
        }
        let store = self.clone();
        Some(tokio::spawn(async move {
            store.find_and_set_refs(generation, cleaned).await;
        }))
    }

    /// Citation lookup for `generation`; runs independently of the transcript pane.
    pub async fn find_and_set_refs(&self, generation: Generation, text: String) {
        if !self.is_current(generation) {
            log::debug!("skipping citation lookup for stale generation {generation}");
            return;
        }
        if !self.apply_if_current(generation, |s| s.references = ReferenceState::loading()) {
            return;
        }

        match self.services.linker.find_citations(&text).await {
            Ok(list) => {
                let count = list.len();
                if self.apply_if_current(generation, |s| {
                    s.references = ReferenceState::loaded(list)
                }) {
                    log::debug!("found {count} citations (generation {generation})");
                } else {
                    log::debug!("dropping stale citations (generation {generation})");
                }
            }
            Err(e) => {
                if self.apply_if_current(generation, |s| {
                    s.references = ReferenceState::failed(REFERENCES_FAILED_MESSAGE)
                }) {
                    log::warn!("citation lookup failed (generation {generation}): {e}");
                } else {
                    log::debug!("dropping stale citation failure (generation {generation}): {e}");
                }
            }
        }
    }

    fn commit<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let (out, deliver) = {
            let mut inner = lock(&self.inner);
            let out = f(&mut inner.session);
            (out, Self::enqueue(&mut inner))
        };
        if deliver {
            self.drain_notifications();
        }
        out
    }

    // Queues a snapshot; returns true when the caller must drain the queue.
    fn enqueue(inner: &mut Inner) -> bool {
        let snapshot = inner.session.clone();
        inner.pending.push_back(snapshot);
        if inner.notifying {
            return false;
        }
        inner.notifying = true;
        true
    }

    fn drain_notifications(&self) {
        loop {
            let (snapshot, listeners) = {
                let mut inner = lock(&self.inner);
                let Some(snapshot) = inner.pending.pop_front() else {
                    inner.notifying = false;
                    return;
                };
                let listeners: Vec<Listener> =
                    inner.listeners.iter().map(|(_, l)| l.clone()).collect();
                (snapshot, listeners)
            };
            // Listeners run without the lock held so they may read state, subscribe,
            // unsubscribe, or issue commands. A panicking listener must not leave
            // `notifying` set, which would silence every later mutation.
            for listener in &listeners {
                if catch_unwind(AssertUnwindSafe(|| listener(&snapshot))).is_err() {
                    log::error!(
                        "session listener panicked (generation {})",
                        snapshot.generation
                    );
                }
            }
        }
    }
}
