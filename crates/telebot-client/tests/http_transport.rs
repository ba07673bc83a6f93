//! HttpTransport and Client against a local mock Bot API server.

use mockito::{Matcher, Server};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telebot_client::requests::{MediaOptions, MessageOptions};
use telebot_client::transport::HttpTransport;
use telebot_client::{events, BotError, Client, ClientConfig, Event, InputFile};
use telebot_core::request::{Params, ReplyBody};
use telebot_core::traits::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TOKEN: &str = "123:TEST";

fn config_for(server: &Server) -> ClientConfig {
    let mut config = ClientConfig::new(TOKEN);
    config.base_url = server.url();
    config.interval_ms = 10;
    config
}

#[tokio::test]
async fn test_get_decodes_json_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/bot123:TEST/getMe")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"id":1,"is_bot":true,"first_name":"Bot"}}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let reply = transport.get("getMe", &Params::new(), None).await.unwrap();

    assert_eq!(reply.status, 200);
    let result = reply.into_result().unwrap();
    assert_eq!(result["first_name"], "Bot");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_sends_params_as_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/bot123:TEST/sendMessage")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("chat_id".into(), "42".into()),
            Matcher::UrlEncoded("text".into(), "hi & bye".into()),
            Matcher::UrlEncoded("reply_markup".into(), r#"{"force_reply":true}"#.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"message_id":1,"chat":{"id":42}}}"#)
        .create_async()
        .await;

    let client = Client::new(config_for(&server)).unwrap();
    let options = MessageOptions {
        reply_markup: Some(serde_json::json!({"force_reply": true})),
        ..Default::default()
    };
    let msg = client.send_message(42_i64, "hi & bye", options).await.unwrap();

    assert_eq!(msg.message_id, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_body_is_kept_raw() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/bot123:TEST/getMe")
        .with_status(502)
        .with_header("content-type", "text/html")
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let reply = transport.get("getMe", &Params::new(), None).await.unwrap();

    assert_eq!(reply.status, 502);
    assert_eq!(reply.body, ReplyBody::Raw("<html>Bad Gateway</html>".into()));
    assert!(matches!(reply.status_error(), Some(BotError::Gateway)));
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/bot123:TEST/getMe")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{not json")
        .create_async()
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let err = transport
        .get("getMe", &Params::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::Decode(_)));
}

#[tokio::test]
async fn test_upload_is_multipart() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:TEST/sendPhoto")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="photo"; filename="logo.png""#.into()),
            Matcher::Regex("(?i)content-type: image/png".into()),
            Matcher::Regex(r#"name="caption""#.into()),
            Matcher::Regex("PNGDATA".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"message_id":5,"chat":{"id":42}}}"#)
        .create_async()
        .await;

    let client = Client::new(config_for(&server)).unwrap();
    let msg = client
        .send_photo(
            42_i64,
            InputFile::bytes("logo.png", b"PNGDATA".to_vec()),
            MediaOptions::caption("Telegram Logo"),
        )
        .await
        .unwrap();

    assert_eq!(msg.message_id, 5);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_downloads_into_directory() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/bot123:TEST/getFile")
        .match_query(Matcher::UrlEncoded("file_id".into(), "F1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"file_id":"F1","file_path":"photos/file_1.jpg"}}"#)
        .create_async()
        .await;
    let download = server
        .mock("GET", "/file/bot123:TEST/photos/file_1.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body("JPEGDATA")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = Client::new(config_for(&server)).unwrap();
    let saved = client.get_file("F1", Some(dir.path())).await.unwrap();

    let path = saved.destination.unwrap();
    assert_eq!(path, dir.path().join("file_1.jpg"));
    assert_eq!(std::fs::read(&path).unwrap(), b"JPEGDATA");
    assert!(saved.url.ends_with("/file/bot123:TEST/photos/file_1.jpg"));
    assert_eq!(dir_entries(dir.path()), vec!["file_1.jpg"]);
    download.assert_async().await;
}

fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// One-shot HTTP server that promises 100 bytes and hangs up after 4.
async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: image/jpeg\r\ncontent-length: 100\r\n\r\nPART",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_interrupted_download_leaves_no_file() {
    let mut config = ClientConfig::new(TOKEN);
    config.base_url = truncating_server().await;
    let transport = HttpTransport::new(&config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = transport
        .download("photos/file_1.jpg", &dir.path().join("file_1.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::Network { .. }), "unexpected {err:?}");
    assert!(dir_entries(dir.path()).is_empty());
}

#[tokio::test]
async fn test_unknown_host_is_host_not_found() {
    let mut config = ClientConfig::new(TOKEN);
    config.base_url = "http://nonexistent.invalid/".into();

    let transport = HttpTransport::new(&config).unwrap();
    let err = transport
        .get("getMe", &Params::new(), Some(Duration::from_secs(10)))
        .await
        .unwrap_err();

    assert!(err.is_host_not_found(), "unexpected {err:?}");
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_client_retries_unknown_host_up_to_ceiling() {
    let mut config = ClientConfig::new(TOKEN);
    config.base_url = "http://nonexistent.invalid/".into();
    config.max_attempts = 3;

    let client = Client::new(config).unwrap();
    let retries = Arc::new(Mutex::new(Vec::new()));
    {
        let retries = retries.clone();
        client.on(events::RETRY, move |event| {
            if let Event::Retry { attempt } = event {
                retries.lock().unwrap().push(*attempt);
            }
        });
    }

    let err = client.get_me().await.unwrap_err();
    assert!(err.is_host_not_found());
    assert_eq!(*retries.lock().unwrap(), vec![2, 3]);
}

#[tokio::test]
async fn test_polling_end_to_end() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/bot123:TEST/getUpdates")
        .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"ok":true,"result":[{"update_id":1,"message":{"message_id":10,"chat":{"id":42,"type":"private"},"text":"/echo hello there"}}]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/bot123:TEST/getUpdates")
        .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":[]}"#)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.timeout_secs = 0;
    let client = Client::new(config).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in [events::MESSAGE, "echo", events::ERROR] {
        let seen = seen.clone();
        client.on(name, move |event: &Event| {
            let entry = match event {
                Event::Command { name, args, .. } => format!("{name} {args:?}"),
                Event::Message(m) => format!("message {}", m.text.clone().unwrap_or_default()),
                other => format!("{other:?}"),
            };
            seen.lock().unwrap().push(entry);
        });
    }

    client.start().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.offset() < 2 || seen.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("update not dispatched in time");
    client.stop();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            r#"echo Some(["hello", "there"])"#.to_string(),
            "message /echo hello there".to_string(),
        ]
    );
    assert!(!client.is_polling());
    first.assert_async().await;
}

#[tokio::test]
async fn test_webhook_roundtrip() {
    let mut server = Server::new_async().await;
    let set = server
        .mock("GET", "/bot123:TEST/setWebhook")
        .match_query(Matcher::UrlEncoded(
            "url".into(),
            "https://example.com/hook".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":true}"#)
        .create_async()
        .await;
    let delete = server
        .mock("GET", "/bot123:TEST/deleteWebhook")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":true}"#)
        .create_async()
        .await;

    let client = Client::new(config_for(&server)).unwrap();
    assert!(client.set_webhook("https://example.com/hook").await.unwrap());
    assert!(client.delete_webhook().await.unwrap());

    set.assert_async().await;
    delete.assert_async().await;
}
