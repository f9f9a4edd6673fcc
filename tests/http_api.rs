use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use drone_bridge::collaborators::{CommandDataSource, NotificationSink};
use drone_bridge::{router, AppState, CollaboratorError, Dispatcher, LinkOutcome};
use drone_bridge_shared::{CompletionEvent, StatusEvent};
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tower::ServiceExt;

/// In-memory stand-in for the database lookups
#[derive(Default)]
struct FakeDatabase {
    missing_docs: bool,
    lookups: AtomicUsize,
}

#[async_trait]
impl CommandDataSource for FakeDatabase {
    async fn docs_setup(&self, demozone: &str) -> Result<Map<String, Value>, CollaboratorError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.missing_docs {
            return Err(CollaboratorError::NoDocsSetup);
        }
        let mut docs = Map::new();
        docs.insert("demozone".into(), json!(demozone));
        Ok(docs)
    }

    async fn zone_steps(&self, _demozone: &str, zone: &str) -> Result<Vec<Value>, CollaboratorError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(vec![json!({"command": "goto", "zone": zone})])
    }
}

#[derive(Debug, PartialEq)]
enum Sent {
    Completion(CompletionEvent),
    Status(StatusEvent),
}

struct RecordingSink(mpsc::UnboundedSender<Sent>);

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_completion(&self, event: &CompletionEvent) -> Result<(), CollaboratorError> {
        let _ = self.0.send(Sent::Completion(event.clone()));
        Ok(())
    }

    async fn send_status(&self, event: &StatusEvent) -> Result<(), CollaboratorError> {
        let _ = self.0.send(Sent::Status(event.clone()));
        Ok(())
    }
}

struct Harness {
    app: Router,
    dispatcher: Arc<Dispatcher>,
    database: Arc<FakeDatabase>,
    sent: mpsc::UnboundedReceiver<Sent>,
}

fn harness_with(database: FakeDatabase) -> Harness {
    let database = Arc::new(database);
    let (tx, sent) = mpsc::unbounded_channel();
    let dispatcher = Arc::new(Dispatcher::new(
        database.clone(),
        Arc::new(RecordingSink(tx)),
        Duration::from_millis(5000),
    ));
    let app = router(AppState::new(dispatcher.clone()));

    Harness {
        app,
        dispatcher,
        database,
        sent,
    }
}

fn harness() -> Harness {
    harness_with(FakeDatabase::default())
}

/// Attach a fake drone and return the receiving end of its link
async fn connect_drone(dispatcher: &Dispatcher) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    dispatcher.link_connected(tx).await;
    rx
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn next_sent(sent: &mut mpsc::UnboundedReceiver<Sent>) -> Sent {
    timeout(Duration::from_secs(1), sent.recv())
        .await
        .expect("notification not sent in time")
        .expect("sink closed")
}

#[tokio::test]
async fn test_usage() {
    let h = harness();

    for uri in ["/drone", "/drone/"] {
        let (status, body) = call(&h.app, "GET", uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("Usage: POST /drone/go/"));
    }
}

#[tokio::test]
async fn test_command_sent_over_link() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let (status, body) = call(&h.app, "POST", "/drone/go/MADRID/c-1/f-1/zone-7/ARM").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Command sent successfully"}));

    let frame: Value = serde_json::from_str(&link.try_recv().unwrap()).unwrap();
    assert_eq!(frame["source"], "ARM");
    assert_eq!(frame["corrId"], "c-1");
    assert_eq!(frame["demozone"], "MADRID");
    assert_eq!(frame["DOCS"]["folderId"], "f-1");
    assert_eq!(frame["steps"][0]["zone"], "zone-7");

    // Exactly one frame per command
    assert!(link.try_recv().is_err());
    assert_eq!(h.dispatcher.open_correlation().await.as_deref(), Some("c-1"));
}

#[tokio::test]
async fn test_command_defaults_source() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let (status, _) = call(&h.app, "POST", "/drone/go/MADRID/c-1/f-1/zone-7").await;
    assert_eq!(status, StatusCode::OK);

    let frame: Value = serde_json::from_str(&link.try_recv().unwrap()).unwrap();
    assert_eq!(frame["source"], "PCS");
}

#[tokio::test]
async fn test_command_without_link() {
    let h = harness();

    let (status, body) = call(&h.app, "POST", "/drone/go/MADRID/c-1/f-1/zone-7").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "WebSocket session not opened!");
}

#[tokio::test]
async fn test_command_lookup_failure() {
    let h = harness_with(FakeDatabase {
        missing_docs: true,
        ..Default::default()
    });
    let mut link = connect_drone(&h.dispatcher).await;

    let (status, body) = call(&h.app, "POST", "/drone/go/MADRID/c-1/f-1/zone-7").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "NO DOCS SETUP INFO FOUND IN THE DATABASE");
    assert!(link.try_recv().is_err());
    assert!(h.database.lookups.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_probe_without_link() {
    let h = harness();

    let (status, body) = call(&h.app, "GET", "/drone/ping").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"message": "WS session not opened"}));
    assert!(!h.dispatcher.probe_pending().await);
}

#[tokio::test(start_paused = true)]
async fn test_probe_reply() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let app = h.app.clone();
    let request = tokio::spawn(async move { call(&app, "GET", "/drone/ping").await });

    let frame = link.recv().await.unwrap();
    assert_eq!(frame, r#"{"steps":[{"command":"ping"}]}"#);

    let outcome = h.dispatcher.handle_link_text(r#"{"result":"PING"}"#).await;
    assert_eq!(outcome, LinkOutcome::ProbeResolved);

    let (status, body) = request.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "OK"}));

    // The canceled timer never resolves anything
    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert!(!h.dispatcher.probe_pending().await);
    assert!(link.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_probe_timeout() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let started = tokio::time::Instant::now();
    let (status, body) = call(&h.app, "GET", "/drone/ping").await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({"message": "TIMEOUT"}));
    assert!(started.elapsed() >= Duration::from_millis(5000));
    assert_eq!(link.try_recv().unwrap(), r#"{"steps":[{"command":"ping"}]}"#);

    // A late reply is ignored
    let outcome = h.dispatcher.handle_link_text(r#"{"result":"ping"}"#).await;
    assert_eq!(outcome, LinkOutcome::ProbeIgnored);
}

#[tokio::test(start_paused = true)]
async fn test_probe_survives_disconnect() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let app = h.app.clone();
    let request = tokio::spawn(async move { call(&app, "GET", "/drone/ping").await });
    link.recv().await.unwrap();

    assert!(h.dispatcher.link_disconnected(1).await);

    let (status, _) = request.await.unwrap();
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_probe_rejected() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let app = h.app.clone();
    let first = tokio::spawn(async move { call(&app, "GET", "/drone/ping").await });
    link.recv().await.unwrap();

    let (status, body) = call(&h.app, "GET", "/drone/ping").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "PING already in progress");

    h.dispatcher.handle_link_text(r#"{"result":"ping"}"#).await;
    assert_eq!(first.await.unwrap().0, StatusCode::OK);
}

#[tokio::test]
async fn test_mismatched_report_ignored() {
    let mut h = harness();
    let _link = connect_drone(&h.dispatcher).await;
    call(&h.app, "POST", "/drone/go/Z/X/f-1/zone-7").await;

    let outcome = h
        .dispatcher
        .handle_link_text(r#"{"id":"Y","demozone":"Z","result":"finish"}"#)
        .await;

    assert_eq!(outcome, LinkOutcome::Mismatch);
    assert_eq!(h.dispatcher.open_correlation().await.as_deref(), Some("X"));
    assert!(h.sent.try_recv().is_err());
}

#[tokio::test]
async fn test_finish_completes_correlation() {
    let mut h = harness();
    let _link = connect_drone(&h.dispatcher).await;
    let (status, _) = call(&h.app, "POST", "/drone/go/Z/X/f-1/zone-7/ARM").await;
    assert_eq!(status, StatusCode::OK);

    h.dispatcher
        .handle_link_text(r#"{"id":"X","demozone":"Z","result":"finish"}"#)
        .await;

    assert_eq!(
        next_sent(&mut h.sent).await,
        Sent::Completion(CompletionEvent::ok("ARM", "X", "Z"))
    );
    match next_sent(&mut h.sent).await {
        Sent::Status(event) => {
            assert_eq!(event.status(), "LANDED");
            assert_eq!(event.payload.data.data_demozone, "Z");
        }
        other => panic!("expected status event, got {:?}", other),
    }

    assert_eq!(h.dispatcher.open_correlation().await, None);

    let late = h
        .dispatcher
        .handle_link_text(r#"{"id":"X","demozone":"Z","result":"finish"}"#)
        .await;
    assert_eq!(late, LinkOutcome::NoCorrelation);
    assert!(h.sent.try_recv().is_err());
}

#[tokio::test]
async fn test_progress_reports() {
    let mut h = harness();
    let _link = connect_drone(&h.dispatcher).await;
    call(&h.app, "POST", "/drone/go/Z/X/f-1/zone-7").await;

    let cases = [
        ("go", "GOING"),
        ("picture", "TAKING PICTURE"),
        ("return", "RETURNING"),
        ("landing", "LANDING"),
        ("downloading", "DOWNLOADING"),
    ];

    for (code, expected) in cases {
        let frame = json!({"id": "X", "demozone": "Z", "result": code}).to_string();
        let outcome = h.dispatcher.handle_link_text(&frame).await;
        assert!(matches!(outcome, LinkOutcome::Reported { closed: false, .. }));

        match next_sent(&mut h.sent).await {
            Sent::Status(event) => assert_eq!(event.status(), expected),
            other => panic!("expected status event, got {:?}", other),
        }
        assert!(h.sent.try_recv().is_err(), "no completion for {}", code);
    }

    assert_eq!(h.dispatcher.open_correlation().await.as_deref(), Some("X"));
}

#[tokio::test]
async fn test_second_command_supersedes_first() {
    let mut h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    call(&h.app, "POST", "/drone/go/Z/first/f-1/zone-7/ARM").await;
    call(&h.app, "POST", "/drone/go/Z/second/f-1/zone-7/BOT").await;
    assert!(link.try_recv().is_ok());
    assert!(link.try_recv().is_ok());

    let stale = h
        .dispatcher
        .handle_link_text(r#"{"id":"first","demozone":"Z","result":"finish"}"#)
        .await;
    assert_eq!(stale, LinkOutcome::Mismatch);
    assert!(h.sent.try_recv().is_err());

    h.dispatcher
        .handle_link_text(r#"{"id":"second","demozone":"Z","result":"finish"}"#)
        .await;
    assert_eq!(
        next_sent(&mut h.sent).await,
        Sent::Completion(CompletionEvent::ok("BOT", "second", "Z"))
    );

    // The superseded command's tag stays behind
    assert_eq!(h.dispatcher.source_tag_count().await, 1);
}

#[tokio::test]
async fn test_command_trailing_slash_defaults_source() {
    let h = harness();
    let mut link = connect_drone(&h.dispatcher).await;

    let (status, body) = call(&h.app, "POST", "/drone/go/Z/X/f-1/zone-7/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Command sent successfully"}));

    let frame: Value = serde_json::from_str(&link.try_recv().unwrap()).unwrap();
    assert_eq!(frame["source"], "PCS");
    assert_eq!(frame["corrId"], "X");
}

#[tokio::test]
async fn test_correlation_survives_disconnect() {
    let mut h = harness();
    let (tx, _link) = mpsc::unbounded_channel();
    let link_id = h.dispatcher.link_connected(tx).await;

    let (status, _) = call(&h.app, "POST", "/drone/go/Z/X/f-1/zone-7").await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.dispatcher.link_disconnected(link_id).await);
    assert!(!h.dispatcher.is_link_connected().await);
    assert_eq!(h.dispatcher.open_correlation().await.as_deref(), Some("X"));

    let outcome = h
        .dispatcher
        .handle_link_text(r#"{"id":"X","demozone":"Z","result":"finish"}"#)
        .await;
    assert!(matches!(outcome, LinkOutcome::Reported { closed: true, .. }));

    assert_eq!(
        next_sent(&mut h.sent).await,
        Sent::Completion(CompletionEvent::ok("PCS", "X", "Z"))
    );
    match next_sent(&mut h.sent).await {
        Sent::Status(event) => assert_eq!(event.status(), "LANDED"),
        other => panic!("expected status event, got {:?}", other),
    }
    assert_eq!(h.dispatcher.open_correlation().await, None);
}
