//! End to end: chat session -> forwarding proxy -> mocked backend.
//!
//! Exercises the full path a front end takes: the session posts through the
//! proxy, the proxy relays the backend's event stream, and the session decodes
//! it into the transcript.

use std::net::SocketAddr;

use civic_proxy::{AppState, ProxyConfig, router};
use civic_session::{
    ChatBackend, ChatConfig, ChatSession, Language, Role, TransportError, TurnOutcome,
};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_proxy(upstream: &str) -> String {
    let config = ProxyConfig::default()
        .upstream_url(upstream)
        .bind(SocketAddr::from(([127, 0, 0, 1], 0)));
    let listener = TcpListener::bind(config.bind).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(&config));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn session_via(proxy: &str, language: Language) -> ChatSession<ChatBackend> {
    let config = ChatConfig::default().base_url(proxy).language(language);
    ChatSession::new(ChatBackend::from_config(&config), config)
}

fn sse(body: &'static str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

#[tokio::test]
async fn two_turn_conversation_through_proxy() {
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({ "conversation_id": "conv-42" })))
        .respond_with(sse("data: {\"text\":\"Yes, on Saturdays too.\"}\n\ndata: [DONE]\n\n"))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(concat!(
            "data: {\"conversation_id\":\"conv-42\",\"department\":{\"name\":\"Library\",\"slug\":\"library\"}}\n\n",
            "data: {\"text\":\"The main branch opens \"}\n\n",
            "data: {\"text\":\"at 9am.\"}\n\n",
            "data: [DONE]\n\n",
        )))
        .expect(1)
        .mount(&backend)
        .await;

    let proxy = spawn_proxy(&backend.uri()).await;
    let mut session = session_via(&proxy, Language::En);

    let first = session.submit("When does the library open?").await.unwrap();
    assert!(first.is_completed(), "got {first:?}");
    assert_eq!(session.state().conversation_id.as_deref(), Some("conv-42"));
    assert_eq!(session.state().department.as_deref(), Some("Library"));

    let second = session.submit("Weekends too?").await.unwrap();
    assert!(second.is_completed(), "got {second:?}");

    let entries = session.transcript().to_vec();
    let roles: Vec<Role> = entries.iter().map(|e| e.role()).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(entries[1].content, "The main branch opens at 9am.");
    assert_eq!(entries[3].content, "Yes, on Saturdays too.");
    assert!(!session.state().is_streaming);
}

#[tokio::test]
async fn backend_failure_surfaces_as_localized_entry() {
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend)
        .await;

    let proxy = spawn_proxy(&backend.uri()).await;
    let mut session = session_via(&proxy, Language::Es);

    let outcome = session.submit("¿Dónde pago el agua?").await.unwrap();

    match outcome {
        TurnOutcome::Failed(TransportError::Status { status, body }) => {
            assert_eq!(status, 500);
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["error"], "Backend error");
        }
        other => panic!("expected Status failure, got {other:?}"),
    }
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(
        session.transcript().last().unwrap().content,
        "Lo siento, ocurrió un error. Por favor intente de nuevo."
    );
}

#[tokio::test]
async fn unreachable_backend_reports_bad_gateway() {
    let proxy = spawn_proxy("http://127.0.0.1:1").await;
    let mut session = session_via(&proxy, Language::En);

    let outcome = session.submit("hello").await.unwrap();

    assert!(
        matches!(
            outcome,
            TurnOutcome::Failed(TransportError::Status { status: 502, .. })
        ),
        "got {outcome:?}"
    );
    assert!(!session.state().is_streaming);
}
