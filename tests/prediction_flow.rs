use newslens_lib::{
    classifier::{demo::{MAX_CONFIDENCE, MIN_CONFIDENCE}, AnyClassifier},
    history::HistoryStore,
    prediction::{NoopEvents, PredictionController, PredictionState, SubmitError},
    Database,
};

#[tokio::test]
async fn demo_flow_without_endpoint_persists_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newslens.sqlite3");

    let classifier = AnyClassifier::resolve(None, None).unwrap();
    let history = HistoryStore::open(Database::new(path.clone()).unwrap()).await;
    let controller = PredictionController::new(classifier, history, NoopEvents);

    assert_eq!(controller.model(), "demo");
    assert_eq!(controller.snapshot().await, PredictionState::Idle);

    let state = controller.submit("BREAKING NEWS NOW").await.unwrap();
    let record = state.record().unwrap();
    assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&record.confidence()));
    assert!(record.label() == "Fake" || record.label() == "Real");

    assert_eq!(controller.submit("  ").await, Err(SubmitError::EmptyInput));
    controller.submit("calm reporting").await.unwrap();

    drop(controller);

    let reopened = HistoryStore::open(Database::new(path).unwrap()).await;
    let texts: Vec<&str> = reopened.records().iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["calm reporting", "BREAKING NEWS NOW"]);
    assert!(reopened.records()[0].time() >= reopened.records()[1].time());
}
