use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sofref_core::error::{RemoteServiceError, Service};
use sofref_core::types::{Citation, Generation, ReferenceState, Session, Status};
use sofref_engine::store::SessionStore;
use sofref_engine::traits::{ReferenceLinker, Services, TranscriptionService};
use tokio::sync::oneshot;

type Reply<T> = Result<T, RemoteServiceError>;

/// Holds one pending reply per key; the test decides when (and how) each resolves.
struct Gates<T> {
    pending: Mutex<HashMap<String, oneshot::Receiver<Reply<T>>>>,
    calls: Mutex<Vec<String>>,
}

impl<T> Default for Gates<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Gates<T> {
    fn gate(&self, key: &str) -> oneshot::Sender<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(key.to_string(), rx);
        tx
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait(&self, key: &str, service: Service) -> Reply<T> {
        self.calls.lock().unwrap().push(key.to_string());
        let rx = self.pending.lock().unwrap().remove(key);
        let Some(rx) = rx else {
            return Err(RemoteServiceError::Transport {
                service,
                message: format!("no reply scripted for {key:?}"),
            });
        };
        rx.await.unwrap_or_else(|_| {
            Err(RemoteServiceError::Transport {
                service,
                message: "reply dropped".into(),
            })
        })
    }
}

#[derive(Default)]
struct FakeTranscription {
    gates: Gates<String>,
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl TranscriptionService for FakeTranscription {
    async fn fetch_transcript(&self, transcription_id: &str, api_key: &str) -> Reply<String> {
        self.keys.lock().unwrap().push(api_key.to_string());
        self.gates.wait(transcription_id, Service::Transcription).await
    }
}

#[derive(Default)]
struct FakeLinker {
    gates: Gates<Vec<Citation>>,
}

#[async_trait]
impl ReferenceLinker for FakeLinker {
    async fn find_citations(&self, body: &str) -> Reply<Vec<Citation>> {
        self.gates.wait(body, Service::ReferenceLinker).await
    }
}

struct Harness {
    store: SessionStore,
    transcription: Arc<FakeTranscription>,
    linker: Arc<FakeLinker>,
}

fn harness() -> Harness {
    let transcription = Arc::new(FakeTranscription::default());
    let linker = Arc::new(FakeLinker::default());
    let store = SessionStore::new(Services::new(transcription.clone(), linker.clone()));
    Harness {
        store,
        transcription,
        linker,
    }
}

fn http_error(service: Service) -> RemoteServiceError {
    RemoteServiceError::Status {
        service,
        status: 500,
        body: "boom".into(),
    }
}

async fn wait_until(store: &SessionStore, pred: impl Fn(&Session) -> bool) -> Session {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let s = store.get_state();
            if pred(&s) {
                return s;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("state condition not reached")
}

#[tokio::test]
async fn happy_path_sets_text_and_citations() {
    let h = harness();
    h.transcription
        .gates
        .gate("tx1")
        .send(Ok("Hello <i>skip</i> World".into()))
        .unwrap();
    h.linker
        .gates
        .gate("Hello  World")
        .send(Ok(vec![Citation::new("Genesis 1:1", "Genesis.1.1")]))
        .unwrap();

    let handle = h.store.update_settings_and_fetch("key1", "tx1").unwrap();
    handle.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.status, Status::Finished);
    assert_eq!(s.display_text, "Hello  World");
    assert_eq!(
        s.references,
        ReferenceState {
            loading: false,
            list: Some(vec![Citation::new("Genesis 1:1", "Genesis.1.1")]),
            error: None,
        }
    );
    assert_eq!(*h.transcription.keys.lock().unwrap(), vec!["key1".to_string()]);
    assert_eq!(h.linker.gates.calls(), vec!["Hello  World".to_string()]);
}

#[tokio::test]
async fn transcript_is_shown_while_lookup_is_pending() {
    let h = harness();
    h.transcription
        .gates
        .gate("tx1")
        .send(Ok("Shabbat 31a".into()))
        .unwrap();
    let lookup = h.linker.gates.gate("Shabbat 31a");

    let handle = h.store.update_settings_and_fetch("k", "tx1").unwrap();

    let s = wait_until(&h.store, |s| s.references.loading).await;
    assert_eq!(s.status, Status::Finished);
    assert_eq!(s.display_text, "Shabbat 31a");
    assert!(s.references.list.is_none());

    lookup
        .send(Ok(vec![Citation::new("Shabbat 31a", "Shabbat.31a")]))
        .unwrap();
    handle.settled().await.unwrap();

    let s = h.store.get_state();
    assert!(!s.references.loading);
    assert_eq!(s.references.list.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn late_result_of_superseded_settings_is_ignored() {
    let h = harness();
    let first = h.transcription.gates.gate("id1");
    let second = h.transcription.gates.gate("id2");
    h.linker.gates.gate("second").send(Ok(vec![])).unwrap();

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    let h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();
    assert_eq!(h1.generation(), Generation(1));
    assert_eq!(h2.generation(), Generation(2));

    first.send(Ok("first".into())).unwrap();
    h1.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.generation, Generation(2));
    assert_eq!(s.status, Status::Loading);
    assert_eq!(s.display_text, "");
    assert_eq!(s.references, ReferenceState::default());
    assert!(h.linker.gates.calls().is_empty());

    second.send(Ok("second".into())).unwrap();
    h2.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.status, Status::Finished);
    assert_eq!(s.display_text, "second");
    assert_eq!(s.references.list, Some(vec![]));
}

#[tokio::test]
async fn result_arriving_after_newer_one_does_not_clobber_it() {
    let h = harness();
    let first = h.transcription.gates.gate("id1");
    let second = h.transcription.gates.gate("id2");
    h.linker.gates.gate("second").send(Ok(vec![])).unwrap();

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    let h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();

    second.send(Ok("second".into())).unwrap();
    h2.settled().await.unwrap();
    first.send(Ok("first".into())).unwrap();
    h1.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.display_text, "second");
    assert_eq!(s.status, Status::Finished);
    assert_eq!(h.linker.gates.calls(), vec!["second".to_string()]);
}

#[tokio::test]
async fn citations_of_superseded_lineage_are_dropped() {
    let h = harness();
    h.transcription
        .gates
        .gate("id1")
        .send(Ok("Exodus 2:3".into()))
        .unwrap();
    let lookup = h.linker.gates.gate("Exodus 2:3");
    let _pending_second = h.transcription.gates.gate("id2");

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    wait_until(&h.store, |s| s.references.loading).await;

    let _h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();
    assert_eq!(h.store.get_state().references, ReferenceState::default());

    lookup
        .send(Ok(vec![Citation::new("Exodus 2:3", "Exodus.2.3")]))
        .unwrap();
    h1.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.generation, Generation(2));
    assert_eq!(s.references, ReferenceState::default());
    assert_eq!(s.display_text, "");
    assert_eq!(s.status, Status::Loading);
}

#[tokio::test]
async fn lookup_failure_of_superseded_lineage_is_dropped() {
    let h = harness();
    h.transcription
        .gates
        .gate("id1")
        .send(Ok("Exodus 2:3".into()))
        .unwrap();
    let lookup = h.linker.gates.gate("Exodus 2:3");
    let _pending_second = h.transcription.gates.gate("id2");

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    wait_until(&h.store, |s| s.references.loading).await;

    let _h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();

    lookup.send(Err(http_error(Service::ReferenceLinker))).unwrap();
    h1.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.generation, Generation(2));
    assert_eq!(s.references, ReferenceState::default());
    assert_eq!(s.references.error, None);
    assert_eq!(s.status, Status::Loading);
}

#[tokio::test]
async fn transcript_failure_sets_error_and_starts_new_lineage() {
    let h = harness();
    h.transcription
        .gates
        .gate("tx")
        .send(Err(http_error(Service::Transcription)))
        .unwrap();

    let handle = h.store.update_settings_and_fetch("k", "tx").unwrap();
    handle.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.status, Status::Error);
    assert_eq!(s.display_text, "");
    assert_eq!(s.references, ReferenceState::default());
    assert_eq!(s.generation, Generation(2));

    // Identical settings again: a fresh lineage that can succeed.
    h.transcription
        .gates
        .gate("tx")
        .send(Ok("<i>intro</i>".into()))
        .unwrap();
    let retry = h.store.update_settings_and_fetch("k", "tx").unwrap();
    assert_eq!(retry.generation(), Generation(3));
    retry.settled().await.unwrap();
    assert_eq!(h.store.get_state().status, Status::Finished);
}

#[tokio::test]
async fn stale_failure_does_not_touch_newer_lineage() {
    let h = harness();
    let first = h.transcription.gates.gate("id1");
    let _second = h.transcription.gates.gate("id2");

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    let _h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();

    first.send(Err(http_error(Service::Transcription))).unwrap();
    h1.settled().await.unwrap();

    let s = h.store.get_state();
    assert_eq!(s.generation, Generation(2));
    assert_eq!(s.status, Status::Loading);
}

#[tokio::test]
async fn empty_transcript_skips_lookup() {
    let h = harness();
    h.transcription.gates.gate("blank").send(Ok(String::new())).unwrap();
    h.transcription
        .gates
        .gate("markup")
        .send(Ok("<i>music</i>".into()))
        .unwrap();

    h.store
        .update_settings_and_fetch("k", "blank")
        .unwrap()
        .settled()
        .await
        .unwrap();

    let s = h.store.get_state();
    assert_eq!(s.status, Status::Finished);
    assert_eq!(s.display_text, "");
    assert_eq!(s.references, ReferenceState::default());

    h.store
        .update_settings_and_fetch("k", "markup")
        .unwrap()
        .settled()
        .await
        .unwrap();
    assert_eq!(h.store.get_state().status, Status::Finished);
    assert!(h.linker.gates.calls().is_empty());
}

#[tokio::test]
async fn lookup_failure_is_reported_without_touching_status() {
    let h = harness();
    h.transcription
        .gates
        .gate("tx")
        .send(Ok("Berakhot 2a".into()))
        .unwrap();
    h.linker
        .gates
        .gate("Berakhot 2a")
        .send(Err(http_error(Service::ReferenceLinker)))
        .unwrap();

    h.store
        .update_settings_and_fetch("k", "tx")
        .unwrap()
        .settled()
        .await
        .unwrap();

    let s = h.store.get_state();
    assert_eq!(s.status, Status::Finished);
    assert_eq!(s.display_text, "Berakhot 2a");
    assert_eq!(
        s.references,
        ReferenceState::failed("Failed to load references.")
    );
    assert_eq!(s.generation, Generation(1));
}

#[tokio::test]
async fn generation_counts_settings_changes_and_failures() {
    let h = harness();
    h.transcription
        .gates
        .gate("bad")
        .send(Err(http_error(Service::Transcription)))
        .unwrap();
    h.transcription.gates.gate("ok").send(Ok(String::new())).unwrap();

    assert!(h.store.update_settings_and_fetch("k", "").is_none());
    h.store
        .update_settings_and_fetch("k", "bad")
        .unwrap()
        .settled()
        .await
        .unwrap();
    assert!(h.store.update_settings_and_fetch("", "").is_none());
    h.store
        .update_settings_and_fetch("k", "ok")
        .unwrap()
        .settled()
        .await
        .unwrap();

    // Four settings changes plus one observed failure.
    assert_eq!(h.store.generation(), Generation(5));
}

#[tokio::test]
async fn subscribers_never_see_generation_go_backwards() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::<Session>::new()));
    let sink = seen.clone();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let _sub = h.store.subscribe(move |s| {
        counter.fetch_add(1, Ordering::SeqCst);
        sink.lock().unwrap().push(s.clone());
    });

    let first = h.transcription.gates.gate("id1");
    h.transcription.gates.gate("id2").send(Ok("two".into())).unwrap();
    h.linker.gates.gate("two").send(Ok(vec![])).unwrap();

    let h1 = h.store.update_settings_and_fetch("k", "id1").unwrap();
    let h2 = h.store.update_settings_and_fetch("k", "id2").unwrap();
    h2.settled().await.unwrap();
    first.send(Ok("one".into())).unwrap();
    h1.settled().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), notified.load(Ordering::SeqCst));
    assert!(seen.windows(2).all(|w| w[0].generation <= w[1].generation));
    assert!(seen.iter().all(|s| s.display_text != "one"));
    assert_eq!(seen.last().map(|s| s.display_text.as_str()), Some("two"));
}
