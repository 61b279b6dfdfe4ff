//! HTTP acquisition tests for the desktop backend.
//!
//! These use a mock server and never reach the point where an audio device
//! is opened: every request here is rejected during the connection phase.

use radyo_audio_desktop::{AudioError, DesktopStreamBackend, StreamConnection};
use radyo_core::{ErrorKind, NotificationSink, StreamBackend};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) -> Url {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

// =============================================================================
// Connection Tests
// =============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn test_audio_stream_is_accepted() {
        let server = MockServer::start().await;
        let url = mount(
            &server,
            "/rp1",
            ResponseTemplate::new(200)
                .set_body_raw(vec![0u8; 4096], "audio/mpeg")
                .insert_header("icy-name", "Radyo Pilipinas")
                .insert_header("icy-br", "128"),
        )
        .await;

        let connection = StreamConnection::open(&reqwest::Client::new(), &url)
            .await
            .unwrap();

        assert_eq!(connection.content_type(), Some("audio/mpeg"));
        assert_eq!(connection.station_name(), Some("Radyo Pilipinas"));
        assert_eq!(connection.bitrate_kbps(), Some(128));
    }

    #[tokio::test]
    async fn test_content_type_parameters_are_ignored() {
        let server = MockServer::start().await;
        let url = mount(
            &server,
            "/live.ogg",
            ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/ogg; charset=binary"),
        )
        .await;

        let connection = StreamConnection::open(&reqwest::Client::new(), &url)
            .await
            .unwrap();

        assert_eq!(connection.content_type(), Some("application/ogg"));
        assert_eq!(connection.station_name(), None);
    }

    #[tokio::test]
    async fn test_http_error_is_network_error() {
        let server = MockServer::start().await;
        let url = mount(&server, "/gone", ResponseTemplate::new(404)).await;

        let result = StreamConnection::open(&reqwest::Client::new(), &url).await;
        match result {
            Err(AudioError::Network(msg)) => assert!(msg.contains("404")),
            Err(other) => panic!("expected network error, got {other}"),
            Ok(_) => panic!("expected network error"),
        }
    }

    #[tokio::test]
    async fn test_html_page_is_rejected() {
        let server = MockServer::start().await;
        let url = mount(
            &server,
            "/player",
            ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
        )
        .await;

        let result = StreamConnection::open(&reqwest::Client::new(), &url).await;
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/rp1", server.uri())).unwrap();
        drop(server);

        let result = StreamConnection::open(&reqwest::Client::new(), &url).await;
        assert!(matches!(result, Err(AudioError::Network(_))));
    }
}

// =============================================================================
// Backend Acquisition Tests
// =============================================================================

mod acquisition {
    use super::*;

    #[tokio::test]
    async fn test_acquire_maps_http_failure_to_network_kind() {
        let server = MockServer::start().await;
        let url = mount(&server, "/rp1", ResponseTemplate::new(503)).await;

        let backend = DesktopStreamBackend::new().unwrap();
        let (sink, _notifications) = NotificationSink::channel();

        let err = backend.acquire(&url, sink).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_acquire_maps_wrong_content_to_decode_kind() {
        let server = MockServer::start().await;
        let url = mount(
            &server,
            "/rp1",
            ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        )
        .await;

        let backend = DesktopStreamBackend::with_client(reqwest::Client::new());
        let (sink, _notifications) = NotificationSink::channel();

        let err = backend.acquire(&url, sink).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
