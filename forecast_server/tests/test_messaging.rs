use axum::extract::{Form, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use forecast_server::messaging::{MessagingError, SmsSender, TwilioCredentials, TwilioSender};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;

fn credentials_with_token(token: &str) -> TwilioCredentials {
    TwilioCredentials {
        account_sid: "AC123".to_string(),
        auth_token: token.to_string(),
        from_number: "+15005550006".to_string(),
    }
}

fn credentials() -> TwilioCredentials {
    credentials_with_token("secret")
}

/// Minimal stand-in for the Twilio messages endpoint
async fn fake_messages(
    Path(account): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    // base64("AC123:secret")
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Basic QUMxMjM6c2VjcmV0")
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 20003, "message": "Authenticate", "status": 401})),
        );
    }

    if form.get("To").map(String::as_str) == Some("+10000000000") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": 21211, "message": "Invalid 'To' Phone Number", "status": 400})),
        );
    }

    let echo = format!(
        "{}|{}|{}|{}",
        account,
        form.get("To").cloned().unwrap_or_default(),
        form.get("From").cloned().unwrap_or_default(),
        form.get("Body").cloned().unwrap_or_default()
    );

    (
        StatusCode::CREATED,
        Json(json!({"sid": echo, "status": "queued"})),
    )
}

async fn spawn_fake_twilio() -> String {
    let app = Router::new().route(
        "/2010-04-01/Accounts/:account/Messages.json",
        post(fake_messages),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_send_posts_form_with_basic_auth() {
    let base = spawn_fake_twilio().await;
    let sender = TwilioSender::new(credentials()).unwrap().with_base_url(base);

    let receipt = sender.send("+919876543210", "Onions up 5%").await.unwrap();

    assert_eq!(receipt.sid, "AC123|+919876543210|+15005550006|Onions up 5%");
    assert_eq!(receipt.status.as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_send_surfaces_provider_rejection() {
    let base = spawn_fake_twilio().await;
    let sender = TwilioSender::new(credentials()).unwrap().with_base_url(base);

    let err = sender.send("+10000000000", "hello").await.unwrap_err();

    match err {
        MessagingError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid 'To' Phone Number (code 21211)");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_send_with_wrong_token_is_rejected() {
    let base = spawn_fake_twilio().await;
    let sender = TwilioSender::new(credentials_with_token("wrong"))
        .unwrap()
        .with_base_url(base);

    let err = sender.send("+919876543210", "hello").await.unwrap_err();
    assert!(matches!(err, MessagingError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_send_to_unreachable_host_fails() {
    // Nothing listens on the discard port locally
    let sender = TwilioSender::new(credentials())
        .unwrap()
        .with_base_url("http://127.0.0.1:9");

    let err = sender.send("+919876543210", "hello").await.unwrap_err();
    assert!(matches!(err, MessagingError::RequestFailed(_)));
}
