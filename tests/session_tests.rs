//! Full editing session round trips against a mock metadata service.

use std::sync::{Arc, Mutex};

use photo_meta_batch::{
    BackendConfig, EditorSession, FieldData, HttpBackend, KeywordEntry, MetadataError, Notification,
    Notifier, SaveOutcome, Selection, SessionPhase, Severity,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Collected(Mutex<Vec<Notification>>);

impl Notifier for Collected {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

fn session(
    server: &MockServer,
) -> (EditorSession<HttpBackend, Arc<Collected>>, Arc<Collected>) {
    let notifier = Arc::new(Collected::default());
    let backend = HttpBackend::new(BackendConfig::with_base_url(server.uri())).unwrap();
    (EditorSession::new(backend, notifier.clone()), notifier)
}

/// Load, edit a title and a keyword, save, and reload.
#[tokio::test]
async fn test_edit_and_save_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .and(body_json(json!({ "files": ["/trip/a.jpg", "/trip/b.jpg"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "filename": "/trip/a.jpg",
                "metadata": {
                    "Title": { "value": "Day 1", "isConsolidated": true },
                    "Keywords": { "value": ["beach", "family"], "isConsolidated": true }
                }
            },
            {
                "filename": "/trip/b.jpg",
                "metadata": {
                    "Title": { "value": "Day 2", "isConsolidated": true },
                    "Keywords": { "value": ["beach"], "isConsolidated": true }
                }
            }
        ])))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/save_metadata"))
        .and(body_json(json!({
            "files_to_update": [
                {
                    "path": "/trip/a.jpg",
                    "original_metadata": {
                        "Title": { "value": "Day 1", "isConsolidated": true },
                        "Keywords": { "value": ["beach", "family"], "isConsolidated": true }
                    },
                    "new_metadata": { "Title": "Summer", "Keywords": ["family", "sea"] }
                },
                {
                    "path": "/trip/b.jpg",
                    "original_metadata": {
                        "Title": { "value": "Day 2", "isConsolidated": true },
                        "Keywords": { "value": ["beach"], "isConsolidated": true }
                    },
                    "new_metadata": { "Title": "Summer", "Keywords": ["sea"] }
                }
            ],
            "keywords_to_learn": ["sea"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Saved 2 files" })))
        .expect(1)
        .mount(&server)
        .await;

    let (mut session, notifier) = session(&server);
    session
        .select(Selection::new("/trip", ["a.jpg", "b.jpg", "notes.txt"]))
        .await
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.current().get("Title").unwrap().is_mixed());
    assert!(!session.is_saveable());

    session.edit("Title", "Summer").unwrap();
    session.remove_keyword("beach").unwrap();
    session.add_keyword("sea").unwrap();
    assert!(session.is_field_dirty("Title").unwrap());
    assert!(session.is_field_dirty("Keywords").unwrap());
    assert_eq!(
        session.current().keyword_entries(),
        &[KeywordEntry::partial("family"), KeywordEntry::common("sea")]
    );
    assert!(session.is_saveable());

    let outcome = session.save().await.unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            message: "Saved 2 files".to_string(),
            files: 2
        }
    );
    assert_eq!(session.phase(), SessionPhase::Ready);
    // reloaded from the backend, so no pending edits remain
    assert!(!session.is_saveable());

    let seen = notifier.0.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].severity, Severity::Success);
    assert_eq!(seen[0].message, "Saved 2 files");
}

#[tokio::test]
async fn test_load_failure_is_recoverable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "detail": "Backend busy" })))
        .mount(&server)
        .await;

    let (mut session, notifier) = session(&server);
    let err = session
        .select(Selection::new("/p", ["a.jpg"]))
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataError::Api { status: 503, .. }));
    assert_eq!(session.phase(), SessionPhase::Empty);
    assert!(session.current().is_empty());

    let seen = notifier.0.lock().unwrap();
    assert_eq!(seen[0].severity, Severity::Error);
    assert_eq!(seen[0].message, "Failed to load metadata: Backend busy");
}

#[tokio::test]
async fn test_save_failure_keeps_edits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "/p/a.jpg", "metadata": { "City": { "value": "Oslo" } } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/save_metadata"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "detail": "File changed on disk" })))
        .expect(1)
        .mount(&server)
        .await;

    let (mut session, notifier) = session(&server);
    session.select(Selection::new("/p", ["a.jpg"])).await.unwrap();
    session.edit("City", "Bergen").unwrap();

    let err = session.save().await.unwrap_err();
    assert_eq!(err.user_message(), "File changed on disk");
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.is_field_dirty("City").unwrap());
    assert!(session.is_saveable());

    let seen = notifier.0.lock().unwrap();
    assert_eq!(seen.last().unwrap().severity, Severity::Error);
}

#[tokio::test]
async fn test_new_selection_replaces_aggregate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .and(body_json(json!({ "files": ["/p/a.jpg"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "/p/a.jpg", "metadata": { "Title": { "value": "A" } } }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .and(body_json(json!({ "files": ["/p/b.jpg"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "/p/b.jpg", "metadata": {} }
        ])))
        .mount(&server)
        .await;

    let (mut session, _notifier) = session(&server);
    session.select(Selection::new("/p", ["a.jpg"])).await.unwrap();
    session.edit("Title", "edited").unwrap();

    session.select(Selection::new("/p", ["b.jpg"])).await.unwrap();
    assert_eq!(session.files().len(), 1);
    assert_eq!(session.files()[0].filename, "/p/b.jpg");
    assert!(!session.is_field_dirty("Title").unwrap());
    assert_eq!(
        session.current().get("Title").and_then(|f| f.value()),
        Some(&FieldData::from(""))
    );
}
