//! End to end tests of the search client against a local HTTP responder.

use songbrowser::browser::{Browser, Outcome, ResponseOrdering, View};
use songbrowser::clients::SearchClient;
use songbrowser::clients::errors::FailureKind;
use songbrowser::config::ConfigBuilder;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const ONE_SONG: &str = r#"{"resultCount":1,"results":[{"wrapperType":"track","trackId":1440818839,"artistName":"Ariana Grande","trackName":"7 rings","previewUrl":"https://audio.example/7rings.m4a","artworkUrl100":"https://art.example/7rings/100x100bb.jpg"}]}"#;
const MISSING_TRACK_NAME: &str = r#"{"resultCount":1,"results":[{"trackId":1,"artistName":"A","previewUrl":"u1","artworkUrl100":"u2"}]}"#;

fn reply(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

// Serves raw `responses` in order, one per connection, and hands back the
// request heads it saw.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/search", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            requests.push(String::from_utf8_lossy(&head).into_owned());

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        requests
    });
    (url, handle)
}

fn client_for(url: &str) -> SearchClient {
    let config = ConfigBuilder::new().api_url(url).build().unwrap();
    SearchClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_search_sends_expected_request_and_decodes() {
    let (url, server) = serve(vec![reply("200 OK", ONE_SONG)]).await;

    let songs = client_for(&url).search("Ariana Grande").await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].track_id, 1_440_818_839);
    assert_eq!(songs[0].track_name, "7 rings");

    let requests = server.await.unwrap();
    let head = requests[0].to_lowercase();
    assert!(
        head.starts_with("get /search?term=ariana+grande&entity=song http/1.1\r\n"),
        "{head}"
    );
    assert!(head.contains("\r\naccept: application/json\r\n"), "{head}");
}

#[tokio::test]
async fn test_error_body_is_a_decode_failure() {
    let (url, server) = serve(vec![
        reply("200 OK", MISSING_TRACK_NAME),
        reply(
            "400 Bad Request",
            r#"{"errorMessage":"Invalid value(s) for key(s): [entity]"}"#,
        ),
    ])
    .await;
    let client = client_for(&url);

    let err = client.search("a").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
    let err = client.search("b").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);

    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/search", listener.local_addr().unwrap());
    drop(listener);

    let err = client_for(&url).search("adele").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);
}

#[tokio::test]
async fn test_truncated_body_is_a_network_failure() {
    // Promises 500 bytes, sends 12, then closes
    let truncated = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\nConnection: close\r\n\r\n{\"results\":[".to_string();
    let (url, server) = serve(vec![truncated]).await;

    let err = client_for(&url).search("adele").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);

    server.await.unwrap();
}

#[tokio::test]
async fn test_configured_timeout_turns_a_silent_server_into_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/search", listener.local_addr().unwrap());
    // Accepts the connection and never answers
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(socket);
    });

    let config = ConfigBuilder::new()
        .api_url(url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = SearchClient::new(&config).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), client.search("adele"))
        .await
        .expect("client timeout fires before the outer one")
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);

    server.abort();
}

#[tokio::test]
async fn test_browser_keeps_songs_after_failed_search() {
    let (url, server) = serve(vec![reply("200 OK", ONE_SONG), reply("200 OK", "not json")]).await;
    let mut browser = Browser::new(client_for(&url), ResponseOrdering::LatestRequest);

    assert!(browser.edit("ariana"));
    assert_eq!(
        browser.next_completion().await,
        Some(Outcome::Updated { count: 1 })
    );

    assert!(browser.edit("ariana grande"));
    assert_eq!(
        browser.next_completion().await,
        Some(Outcome::Failed(FailureKind::Decode))
    );

    let state = browser.state();
    assert_eq!(state.songs()[0].artist_name, "Ariana Grande");
    assert!(state.last_error().is_some());
    assert!(matches!(state.view(), View::Results(songs) if songs.len() == 1));

    browser.edit("");
    assert_eq!(browser.state().view(), View::Prompt);
    assert_eq!(browser.in_flight(), 0);

    server.await.unwrap();
}
