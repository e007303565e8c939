use rask_log_shipper::app::{ShipMode, Shipper};
use rask_log_shipper::builder::DocumentBuilder;
use rask_log_shipper::transport::{ClientConfig, IndexClient};
use serde_json::Value;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INPUT: &str = r#"{"timestamp":"2024-05-01T12:00:00+02:00","message":"order placed","level":"info","logger":"shop.orders","properties":{"tenant":"acme"}}
{"timestamp":"2024-05-01T12:00:01+02:00","payload":{"order.id":17,"total.amount":"12.50"},"level":"debug"}

not json at all
{"timestamp":"2024-05-01T12:00:02+02:00","message":"charge failed","level":"error","exception":{"type":"TimeoutError","message":"db timed out","inner":{"type":"SocketError","message":"reset"}}}
"#;

fn shipper(server: &MockServer, endpoint: &str) -> Shipper<IndexClient> {
    let destination = Url::parse(&format!("{}{}", server.uri(), endpoint)).unwrap();
    Shipper::new(
        IndexClient::new(ClientConfig::default()).unwrap(),
        DocumentBuilder::new().with_host_name("shipper-test"),
        destination,
    )
}

#[tokio::test]
async fn test_ship_ndjson_in_bulk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs/_bulk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let report = shipper(&server, "/logs/_bulk")
        .with_bulk_size(2)
        .ship_reader(INPUT.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.records_read, 3);
    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.requests, 2);
    assert_eq!(report.documents_sent, 3);
    assert_eq!(report.documents_failed, 0);

    let requests = server.received_requests().await.unwrap();
    let first = String::from_utf8(requests[0].body.clone()).unwrap();
    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines.len(), 4);

    let structured: Value = serde_json::from_str(lines[3]).unwrap();
    let message: Value =
        serde_json::from_str(structured["serializedMessage"].as_str().unwrap()).unwrap();
    assert_eq!(message["order_id"], 17);
    assert_eq!(message["total_amount"], "12.50");
    assert_eq!(structured["level"], "DEBUG");
}

#[tokio::test]
async fn test_ship_single_mode_posts_each_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs/_doc"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let report = shipper(&server, "/logs/_doc")
        .with_mode(ShipMode::Single)
        .ship_reader(INPUT.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.requests, 3);
    assert_eq!(report.documents_sent, 3);

    let requests = server.received_requests().await.unwrap();
    let failed: Value = serde_json::from_slice(&requests[2].body).unwrap();
    assert_eq!(failed["message"], "charge failed");
    assert_eq!(failed["exception"]["className"], "TimeoutError");
    assert_eq!(failed["exception"]["innerException"]["message"], "reset");
    assert_eq!(failed["properties"]["@timestamp"], "2024-05-01T10:00:02.000000000Z");
}

#[tokio::test]
async fn test_rejected_requests_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = shipper(&server, "/logs/_bulk")
        .ship_reader(INPUT.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.requests, 1);
    assert_eq!(report.documents_sent, 0);
    assert_eq!(report.documents_failed, 3);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_invalid_utf8_line_does_not_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs/_bulk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut input = b"{\"timestamp\":\"2024-05-01T12:00:00Z\",\"message\":\"before\"}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe\n");
    input.extend_from_slice(b"{\"timestamp\":\"2024-05-01T12:00:01Z\",\"message\":\"after\"}\n");

    let report = shipper(&server, "/logs/_bulk")
        .ship_reader(input.as_slice())
        .await
        .unwrap();

    assert_eq!(report.records_read, 2);
    assert_eq!(report.malformed_lines, 1);
    assert_eq!(report.documents_sent, 2);
}
