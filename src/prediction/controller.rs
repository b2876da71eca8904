use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    classifier::{Classifier, ClassifierError},
    history::{HistoryStore, HistoryUpdate, PredictionRecord},
    storage::KeyValueStore,
};

use super::{PredictionEvents, PredictionState};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitError {
    #[error("Text is empty")]
    EmptyInput,
    #[error("A prediction is already in progress")]
    Busy,
}

pub type SharedHistory<S> = Arc<Mutex<HistoryStore<S>>>;

fn wall_clock_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn lock_state(state: &StdMutex<PredictionState>) -> MutexGuard<'_, PredictionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held by a running submit. If the submit future is dropped before it
/// settles, the pending state is settled as interrupted so the next submit
/// is accepted.
struct PendingGuard<E: PredictionEvents> {
    state: Arc<StdMutex<PredictionState>>,
    events: Arc<E>,
    armed: bool,
}

impl<E: PredictionEvents> PendingGuard<E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<E: PredictionEvents> Drop for PendingGuard<E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let error = ClassifierError::interrupted();
        let settled = {
            let mut state = lock_state(&self.state);
            if !state.is_pending() {
                return;
            }
            state.fail(error.clone());
            state.clone()
        };

        log_warn!("Prediction was dropped before it settled");
        self.events.error(&error.message);
        self.events.state_changed(&settled);
    }
}

/// Runs one classify-and-record pipeline at a time and reports every
/// transition to the presentation layer.
pub struct PredictionController<C, S, E> {
    state: Arc<StdMutex<PredictionState>>,
    classifier: Arc<C>,
    history: SharedHistory<S>,
    events: Arc<E>,
    clock: fn() -> i64,
}

impl<C, S, E> Clone for PredictionController<C, S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            classifier: self.classifier.clone(),
            history: self.history.clone(),
            events: self.events.clone(),
            clock: self.clock,
        }
    }
}

impl<C, S, E> PredictionController<C, S, E>
where
    C: Classifier,
    S: KeyValueStore,
    E: PredictionEvents,
{
    pub fn new(classifier: C, history: HistoryStore<S>, events: E) -> Self {
        Self {
            state: Arc::new(StdMutex::new(PredictionState::new())),
            classifier: Arc::new(classifier),
            history: Arc::new(Mutex::new(history)),
            events: Arc::new(events),
            clock: wall_clock_ms,
        }
    }

    /// Replace the wall clock (epoch milliseconds) used to stamp records.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn model(&self) -> &str {
        self.classifier.model()
    }

    pub async fn snapshot(&self) -> PredictionState {
        lock_state(&self.state).clone()
    }

    /// Classify `text` and record the result.
    ///
    /// Classifier failures are not errors here: they settle the state as a
    /// failure and are returned inside the snapshot. `Err` means the submit
    /// was refused and nothing changed. A submit refused as `Busy` emits no
    /// events, even when its text is empty.
    pub async fn submit(&self, text: &str) -> Result<PredictionState, SubmitError> {
        let pending = {
            let mut state = lock_state(&self.state);
            if state.is_pending() {
                log_info!("Ignoring submit while a prediction is pending");
                return Err(SubmitError::Busy);
            }
            if text.trim().is_empty() {
                None
            } else {
                state.begin(text);
                Some(state.clone())
            }
        };
        let Some(pending) = pending else {
            self.events.error(&SubmitError::EmptyInput.to_string());
            return Err(SubmitError::EmptyInput);
        };

        let guard = PendingGuard {
            state: self.state.clone(),
            events: self.events.clone(),
            armed: true,
        };
        self.events.state_changed(&pending);

        let settled = match self.classifier.classify(text).await {
            Ok(classification) => {
                let mut history = self.history.lock().await;
                // Never stamp earlier than the newest stored record.
                let time = history
                    .newest()
                    .map_or((self.clock)(), |newest| (self.clock)().max(newest.time()));

                match PredictionRecord::from_classification(text, classification, time) {
                    Ok(record) => {
                        let update = history.prepend(record.clone()).await;
                        drop(history);
                        self.publish_history(&update);
                        self.events.result(&record);

                        let mut state = lock_state(&self.state);
                        state.succeed(record);
                        state.clone()
                    }
                    Err(err) => {
                        drop(history);
                        log_error!("Classifier produced an invalid record: {err}");
                        self.settle_failure(ClassifierError::malformed(err))
                    }
                }
            }
            Err(error) => {
                log_warn!("Prediction failed: {}", error.message);
                self.settle_failure(error)
            }
        };
        guard.disarm();

        self.events.state_changed(&settled);
        Ok(settled)
    }

    fn settle_failure(&self, error: ClassifierError) -> PredictionState {
        self.events.error(&error.message);
        let mut state = lock_state(&self.state);
        state.fail(error);
        state.clone()
    }

    pub async fn history(&self) -> Vec<PredictionRecord> {
        self.history.lock().await.records().to_vec()
    }

    pub async fn delete_history_item(&self, index: usize) -> Vec<PredictionRecord> {
        let update = self.history.lock().await.remove_at(index).await;
        self.publish_history(&update);
        update.records
    }

    pub async fn clear_history(&self) -> Vec<PredictionRecord> {
        let update = self.history.lock().await.clear().await;
        self.publish_history(&update);
        update.records
    }

    pub async fn reload_history(&self) -> Vec<PredictionRecord> {
        let records = self.history.lock().await.load().await.to_vec();
        self.events.history_changed(&records);
        records
    }

    /// Show a past result again without touching the controller state.
    pub async fn recall_history_item(&self, index: usize) -> Option<PredictionRecord> {
        let record = self.history.lock().await.get(index).cloned()?;
        self.events.result(&record);
        Some(record)
    }

    fn publish_history(&self, update: &HistoryUpdate) {
        if let Some(warning) = &update.warning {
            self.events.warning(&warning.message);
        }
        self.events.history_changed(&update.records);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use tokio::{sync::Notify, time::timeout};

    use super::*;
    use crate::{
        classifier::{
            demo::{FixedRandom, MAX_CONFIDENCE, MIN_CONFIDENCE},
            remote::test_server::serve,
            AnyClassifier, Classification, ClassifierError, ClassifierErrorKind, DemoClassifier,
        },
        history::HISTORY_KEY,
        prediction::PredictionStatus,
        storage::MemoryStore,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        State(PredictionStatus),
        Result(String),
        Error(String),
        History(usize),
        Warning(String),
    }

    #[derive(Default)]
    struct Recorder(StdMutex<Vec<Event>>);

    impl Recorder {
        fn push(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl PredictionEvents for Arc<Recorder> {
        fn state_changed(&self, state: &PredictionState) {
            self.push(Event::State(state.status()));
        }
        fn result(&self, record: &PredictionRecord) {
            self.push(Event::Result(record.text().to_string()));
        }
        fn error(&self, message: &str) {
            self.push(Event::Error(message.to_string()));
        }
        fn history_changed(&self, records: &[PredictionRecord]) {
            self.push(Event::History(records.len()));
        }
        fn warning(&self, message: &str) {
            self.push(Event::Warning(message.to_string()));
        }
    }

    fn events(recorder: &Recorder) -> Vec<Event> {
        recorder.0.lock().unwrap().clone()
    }

    /// Counts calls and blocks each one until released.
    struct GatedClassifier {
        calls: AtomicUsize,
        gate: Notify,
    }

    impl GatedClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
            }
        }
    }

    impl Classifier for Arc<GatedClassifier> {
        fn model(&self) -> &str {
            "gated"
        }

        async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(Classification {
                label: "Real".into(),
                confidence: 0.6,
                model: "gated".into(),
            })
        }
    }

    async fn demo_controller(
        backend: MemoryStore,
    ) -> (
        PredictionController<DemoClassifier, MemoryStore, Arc<Recorder>>,
        Arc<Recorder>,
    ) {
        let recorder = Arc::new(Recorder::default());
        let controller = PredictionController::new(
            DemoClassifier::with_random(FixedRandom(0.1)),
            HistoryStore::open(backend).await,
            recorder.clone(),
        )
        .with_clock(|| 1_000);
        (controller, recorder)
    }

    #[tokio::test]
    async fn demo_submit_records_history() {
        let (controller, recorder) = demo_controller(MemoryStore::new()).await;

        let state = controller.submit("BREAKING NEWS NOW").await.unwrap();

        let record = state.record().expect("demo classifier always succeeds");
        assert_eq!(record.text(), "BREAKING NEWS NOW");
        assert_eq!(record.model(), "demo");
        assert_eq!(record.time(), 1_000);
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&record.confidence()));

        let history = controller.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text(), "BREAKING NEWS NOW");

        assert_eq!(
            events(&recorder),
            vec![
                Event::State(PredictionStatus::Pending),
                Event::History(1),
                Event::Result("BREAKING NEWS NOW".into()),
                Event::State(PredictionStatus::Settled),
            ]
        );
    }

    #[tokio::test]
    async fn empty_submit_stays_idle() {
        let backend = MemoryStore::new();
        let (controller, recorder) = demo_controller(backend.clone()).await;

        assert_eq!(controller.submit("").await, Err(SubmitError::EmptyInput));
        assert_eq!(controller.submit("   \n").await, Err(SubmitError::EmptyInput));

        assert_eq!(controller.snapshot().await, PredictionState::Idle);
        assert!(controller.history().await.is_empty());
        assert_eq!(backend.raw(HISTORY_KEY), None);
        assert_eq!(
            events(&recorder),
            vec![
                Event::Error("Text is empty".into()),
                Event::Error("Text is empty".into()),
            ]
        );
    }

    #[tokio::test]
    async fn submit_while_pending_is_ignored() {
        let gated = Arc::new(GatedClassifier::new());
        let recorder = Arc::new(Recorder::default());
        let controller = PredictionController::new(
            gated.clone(),
            HistoryStore::open(MemoryStore::new()).await,
            recorder.clone(),
        );

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("first").await }
        });

        while gated.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(controller.snapshot().await.is_pending());

        assert_eq!(controller.submit("second").await, Err(SubmitError::Busy));

        gated.gate.notify_one();
        let settled = first.await.unwrap().unwrap();

        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
        assert_eq!(settled.record().unwrap().text(), "first");
        assert_eq!(controller.history().await.len(), 1);
        assert!(!events(&recorder).contains(&Event::Result("second".into())));
    }

    #[tokio::test]
    async fn empty_submit_while_pending_is_silent() {
        let gated = Arc::new(GatedClassifier::new());
        let recorder = Arc::new(Recorder::default());
        let controller = PredictionController::new(
            gated.clone(),
            HistoryStore::open(MemoryStore::new()).await,
            recorder.clone(),
        );

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit("first").await }
        });
        while gated.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let before = events(&recorder);

        assert_eq!(controller.submit("  ").await, Err(SubmitError::Busy));
        assert_eq!(events(&recorder), before);
        assert!(controller.snapshot().await.is_pending());

        gated.gate.notify_one();
        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_submit_settles_and_frees_the_controller() {
        let gated = Arc::new(GatedClassifier::new());
        let recorder = Arc::new(Recorder::default());
        let controller = PredictionController::new(
            gated.clone(),
            HistoryStore::open(MemoryStore::new()).await,
            recorder.clone(),
        );

        let abandoned = timeout(Duration::from_millis(50), controller.submit("first")).await;
        assert!(abandoned.is_err());

        let state = controller.snapshot().await;
        assert_eq!(state.status(), PredictionStatus::Settled);
        assert_eq!(state.error().unwrap().kind, ClassifierErrorKind::Interrupted);
        assert!(controller.history().await.is_empty());
        assert_eq!(
            events(&recorder),
            vec![
                Event::State(PredictionStatus::Pending),
                Event::Error("Prediction failed. Try again.".into()),
                Event::State(PredictionStatus::Settled),
            ]
        );

        gated.gate.notify_one();
        let next = controller.submit("second").await.unwrap();

        assert_eq!(gated.calls.load(Ordering::SeqCst), 2);
        assert_eq!(next.record().unwrap().text(), "second");
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test]
    async fn server_error_settles_failure_then_recovers() {
        let (url, _server) = serve(vec![
            (500, "{}".into()),
            (200, r#"{"label":"Real","confidence":0.82}"#.into()),
        ])
        .await;
        let recorder = Arc::new(Recorder::default());
        let controller = PredictionController::new(
            AnyClassifier::resolve(Some(url.as_str()), None).unwrap(),
            HistoryStore::open(MemoryStore::new()).await,
            recorder.clone(),
        );

        let failed = controller.submit("some story").await.unwrap();
        assert_eq!(
            failed.error().unwrap().kind,
            ClassifierErrorKind::ServerError(500)
        );
        assert!(controller.history().await.is_empty());
        assert!(events(&recorder).contains(&Event::Error("Server error 500".into())));

        let ok = controller.submit("some story").await.unwrap();
        let record = ok.record().unwrap();
        assert_eq!(record.label(), "Real");
        assert_eq!(record.model(), "remote");
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let backend = MemoryStore::new();
        backend.insert_raw(
            HISTORY_KEY,
            r#"[{"text":"future","label":"Real","confidence":0.2,"model":"demo","time":5000}]"#,
        );
        let (controller, _) = demo_controller(backend).await;

        let state = controller.submit("now").await.unwrap();

        assert_eq!(state.record().unwrap().time(), 5_000);
    }

    #[tokio::test]
    async fn persistence_failure_is_a_warning() {
        let (controller, recorder) = demo_controller(MemoryStore::with_quota(10)).await;

        let state = controller.submit("plenty of text to overflow").await.unwrap();

        assert_eq!(state.status(), PredictionStatus::Settled);
        assert!(state.record().is_some());
        assert_eq!(controller.history().await.len(), 1);
        assert!(events(&recorder)
            .iter()
            .any(|event| matches!(event, Event::Warning(message) if message.contains("could not be saved"))));
    }

    #[tokio::test]
    async fn history_facade_emits_every_mutation() {
        let (controller, recorder) = demo_controller(MemoryStore::new()).await;
        for text in ["one", "two", "three"] {
            controller.submit(text).await.unwrap();
        }

        let remaining = controller.delete_history_item(0).await;
        let texts: Vec<_> = remaining.iter().map(|r| r.text().to_string()).collect();
        assert_eq!(texts, vec!["two", "one"]);

        let recalled = controller.recall_history_item(1).await.unwrap();
        assert_eq!(recalled.text(), "one");
        assert!(controller.recall_history_item(9).await.is_none());

        assert!(controller.clear_history().await.is_empty());
        assert!(controller.reload_history().await.is_empty());

        let tail: Vec<Event> = events(&recorder).into_iter().rev().take(4).collect();
        assert_eq!(
            tail,
            vec![
                Event::History(0),
                Event::History(0),
                Event::Result("one".into()),
                Event::History(2),
            ]
        );
    }
}
