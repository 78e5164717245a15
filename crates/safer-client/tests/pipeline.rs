use std::time::Duration;

use safer_client::{JsonInput, JsonLinesSink, ReqwestFetcher, ScraperParser};
use safer_core::testutil::MockSink;
use safer_core::{AppError, OutputRecord, SnapshotPipeline};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const SNAPSHOT_PAGE: &str = r#"<html><body>
<a href="saferhelp.aspx#InspectionsCA">...</a>
<table><tr><td>A</td><td> 12.5% </td></tr></table>
</body></html>"#;

/// Serve exactly one HTTP response on loopback; the handle yields the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/query.asp"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8(buf).unwrap()
}

fn fetcher_for(endpoint: &str) -> ReqwestFetcher {
    ReqwestFetcher::with_timeout(Duration::from_secs(10))
        .unwrap()
        .with_endpoint(endpoint)
        .unwrap()
}

#[tokio::test]
async fn end_to_end_appends_one_record() {
    let (endpoint, server) = serve_once("200 OK", SNAPSHOT_PAGE).await;
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path().join("dataset.jsonl"));

    let pipeline = SnapshotPipeline::new(
        JsonInput::new(serde_json::json!({"query_string": "123456"})),
        fetcher_for(&endpoint),
        ScraperParser::new(),
        sink.clone(),
    );
    let record = pipeline.run().await.unwrap();

    assert_eq!(record, OutputRecord::new("12.5%"));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /query.asp "));
    let head = request.to_lowercase();
    assert!(head.contains("content-type: application/x-www-form-urlencoded"));
    assert!(head.contains("user-agent: safer-snapshot/"));
    assert!(request.ends_with(
        "\r\n\r\nsearchtype=ANY&query_type=queryCarrierSnapshot&query_param=USDOT&query_string=123456"
    ));

    let written = std::fs::read_to_string(sink.path()).unwrap();
    assert_eq!(written, "{\"driver_out_of_service_percentage\":\"12.5%\"}\n");
}

#[tokio::test]
async fn missing_query_string_posts_empty_value() {
    let (endpoint, server) = serve_once("200 OK", SNAPSHOT_PAGE).await;
    let dir = tempfile::tempdir().unwrap();

    let pipeline = SnapshotPipeline::new(
        JsonInput::new(serde_json::json!({})),
        fetcher_for(&endpoint),
        ScraperParser::new(),
        JsonLinesSink::new(dir.path().join("dataset.jsonl")),
    );
    let record = pipeline.run().await.unwrap();

    assert_eq!(record.driver_out_of_service_percentage, "12.5%");
    assert!(server.await.unwrap().ends_with("&query_param=USDOT&query_string="));
}

#[tokio::test]
async fn error_status_falls_through_to_structure_mismatch() {
    let (endpoint, server) =
        serve_once("500 Internal Server Error", "<html><body>Server Error</body></html>").await;
    let sink = MockSink::new();

    let pipeline = SnapshotPipeline::new(
        JsonInput::empty(),
        fetcher_for(&endpoint),
        ScraperParser::new(),
        sink.clone(),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, AppError::StructureMismatch(_)));
    server.await.unwrap();
    assert!(sink.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn record_not_found_page_produces_no_output() {
    let (endpoint, server) = serve_once(
        "200 OK",
        "<html><body><b>Record Not Found</b><table><tr><td>x</td></tr></table></body></html>",
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path().join("dataset.jsonl"));

    let pipeline = SnapshotPipeline::new(
        JsonInput::new(serde_json::json!({"query_string": "0"})),
        fetcher_for(&endpoint),
        ScraperParser::new(),
        sink.clone(),
    );
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.step(), "locate");
    server.await.unwrap();
    assert!(!sink.path().exists());
}
