// End-to-end checks of the HTTP transport against a throwaway local server.

use pixelstrip_cli::{ApiClient, ApiError, Config, UploadForm};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Raw request as seen by the server.
struct Captured {
    head: String,
    body: Vec<u8>,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Accept one connection, capture the request, answer with `status` and a
/// PNG-typed `body`.
async fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .expect("multipart body should have a known length");

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: image/png\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.ok();

        Captured {
            head,
            body: buf[header_end..header_end + content_length].to_vec(),
        }
    });

    (base_url, handle)
}

fn client(base_url: String) -> ApiClient {
    let config = Config {
        base_url,
        ..Config::default()
    };
    ApiClient::new(config).unwrap()
}

#[tokio::test]
async fn remove_background_sends_multipart_post() {
    let (base_url, server) = serve_once("200 OK", b"\x89PNG result").await;
    let api = client(base_url);

    let form = UploadForm::new("cat.png", "image/png", b"raw image bytes".to_vec());
    let res = api.submit_remove_background(form).await.unwrap();

    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("image/png"));
    assert_eq!(res.body, b"\x89PNG result");

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("POST /remove-bg HTTP/1.1\r\n"), "{}", captured.head);
    assert!(captured
        .head
        .to_ascii_lowercase()
        .contains("content-type: multipart/form-data; boundary="));
    let mut header_names: Vec<String> = captured
        .head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim().to_ascii_lowercase())
        .collect();
    header_names.sort();
    assert_eq!(
        header_names,
        vec!["accept", "content-length", "content-type", "host"],
        "{}",
        captured.head
    );

    let body = String::from_utf8_lossy(&captured.body);
    assert!(body.contains(r#"name="image"; filename="cat.png""#), "{body}");
    assert!(body.contains("Content-Type: image/png"), "{body}");
    assert!(body.contains("raw image bytes"));
}

#[tokio::test]
async fn color_field_reaches_the_backend() {
    let (base_url, server) = serve_once("200 OK", b"ok").await;
    let api = client(base_url);

    let form = UploadForm::new("cut.png", "image/png", vec![1, 2, 3])
        .with_color("#336699")
        .unwrap();
    api.submit_add_color_background(form).await.unwrap();

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("POST /add-color-background HTTP/1.1\r\n"));
    let body = String::from_utf8_lossy(&captured.body);
    assert!(body.contains(r#"name="color""#), "{body}");
    assert!(body.contains("#336699"));
}

#[tokio::test]
async fn enhance_original_hits_its_own_endpoint() {
    let (base_url, server) = serve_once("200 OK", b"ok").await;
    let api = client(base_url);

    let form = UploadForm::new("photo.jpg", "image/jpeg", vec![0xff, 0xd8]);
    api.submit_enhance(form, false).await.unwrap();

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("POST /enhance-only HTTP/1.1\r\n"));
}

#[tokio::test]
async fn error_status_is_reported() {
    let (base_url, server) = serve_once("400 Bad Request", b"No image uploaded").await;
    let api = client(base_url);

    let form = UploadForm::new("cat.png", "image/png", vec![0]);
    let err = api.submit_enhance(form, true).await.unwrap_err();
    server.await.unwrap();

    match err {
        ApiError::Status { status, body, url } => {
            assert_eq!(status, 400);
            assert_eq!(body, "No image uploaded");
            assert!(url.ends_with("/enhance-bg-removed"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = client(base_url);
    let form = UploadForm::new("cat.png", "image/png", vec![0]);
    let err = api.submit_remove_background(form).await.unwrap_err();

    assert!(err.is_transport(), "{err:?}");
    assert_eq!(err.status(), None);
}
