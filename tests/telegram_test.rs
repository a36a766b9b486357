//! Integration tests for Telegram delivery against a mock Bot API.

use std::time::Duration;

use diary_notifier::config::{Config, SinkConfig, TelegramConfig};
use diary_notifier::notify::{self, Notifier, TelegramNotifier};
use diary_notifier::post::Post;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:secret";

fn telegram_config(server: &MockServer) -> TelegramConfig {
    TelegramConfig {
        bot_token: TOKEN.to_string(),
        chat_id: -1_001_234,
        api_url: server.uri(),
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

fn post(url: &str) -> Post {
    Post {
        id: 42,
        author: "Alice".to_string(),
        preview: "Hello <world>...".to_string(),
        url: url.to_string(),
        ..Post::default()
    }
}

fn ok_message() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ok": true,
        "result": { "message_id": 1, "date": 0, "chat": { "id": -1_001_234, "type": "channel" } }
    }))
}

#[tokio::test]
async fn test_send_message_with_button() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": -1_001_234,
            "parse_mode": "HTML",
            "text": "<b>Alice:</b> Hello &lt;world&gt;...",
            "reply_markup": {
                "inline_keyboard": [[{ "text": "Read on site", "url": "https://forum.example.com/p/42" }]]
            }
        })))
        .respond_with(ok_message())
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = TelegramNotifier::new(client(), telegram_config(&mock_server));
    notifier
        .send(&post("https://forum.example.com/p/42"))
        .await
        .expect("send failed");
}

#[tokio::test]
async fn test_api_error_is_returned() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&mock_server)
        .await;

    let notifier = TelegramNotifier::new(client(), telegram_config(&mock_server));
    let err = notifier.send(&post("")).await.expect_err("should fail");
    assert!(format!("{err:#}").contains("chat not found"));
}

#[tokio::test]
async fn test_non_json_response_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let notifier = TelegramNotifier::new(client(), telegram_config(&mock_server));
    assert!(notifier.send(&post("")).await.is_err());
}

#[tokio::test]
async fn test_from_config_checks_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "id": 1, "is_bot": true, "first_name": "Diary", "username": "diary_bot" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        sink: SinkConfig::Telegram(telegram_config(&mock_server)),
        ..Config::for_testing()
    };
    let notifier = notify::from_config(&config, client())
        .await
        .expect("token should be accepted");
    assert_eq!(notifier.name(), "telegram");
}

#[tokio::test]
async fn test_from_config_rejects_bad_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&mock_server)
        .await;

    let config = Config {
        sink: SinkConfig::Telegram(telegram_config(&mock_server)),
        ..Config::for_testing()
    };
    assert!(notify::from_config(&config, client()).await.is_err());
}
