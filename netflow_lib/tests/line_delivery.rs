use chrono::NaiveDate;
use netflow_lib::digest::{DigestReport, DigestSource};
use netflow_lib::{deliver_digest, DeliveryError, DeliverySink, LineClient, NetflowError, OverlapResult, SourceEntry};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn result(i: usize) -> OverlapResult {
    OverlapResult {
        code: format!("{}", 1100 + i),
        name: format!("測試股票{}", i),
        per_source: vec![
            SourceEntry {
                source_label: "台灣摩根士丹利".into(),
                buy_amt: 1_000_000.0,
                sell_amt: 10_000.0,
                diff: 990_000.0,
            },
            SourceEntry {
                source_label: "投信(估)-上市".into(),
                buy_amt: 500_000.0,
                sell_amt: 0.0,
                diff: 500_000.0,
            },
        ],
        sum_buy_amt: 1_500_000.0,
        sum_sell_amt: 10_000.0,
        sum_diff: 1_490_000.0,
    }
}

fn report(n: usize) -> DigestReport {
    DigestReport {
        title: "大摩 + 投信(估) 同步買超".into(),
        day: 1,
        sources: vec![
            DigestSource {
                label: "台灣摩根士丹利".into(),
                estimated: false,
            },
            DigestSource {
                label: "投信(估)-上市".into(),
                estimated: true,
            },
        ],
        date: NaiveDate::from_ymd_opt(2025, 8, 26),
        results: (0..n).map(result).collect(),
    }
}

#[tokio::test]
async fn push_sends_bearer_token_and_text_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let line = LineClient::new("test-token").with_base_url(&server.uri());
    line.deliver("C0123456789", "hello").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "to": "C0123456789",
            "messages": [{ "type": "text", "text": "hello" }]
        })
    );
}

#[tokio::test]
async fn long_digest_is_pushed_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let report = report(80);
    let line = LineClient::new("test-token").with_base_url(&server.uri());
    let sent = deliver_digest(&line, "C0123456789", &report).await.unwrap();
    assert!(sent >= 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), sent);

    let texts: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["messages"][0]["text"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(texts[0].starts_with("📊 大摩 + 投信(估) 同步買超"));
    assert!(texts.iter().all(|t| t.chars().count() <= 4800));
    // Blocks are never split across messages.
    for text in &texts[1..] {
        assert!(text.chars().next().unwrap().is_ascii_digit());
    }
    assert!(texts.last().unwrap().ends_with("估算"));
}

#[tokio::test]
async fn rejected_push_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"message":"Invalid reply token"}"#))
        .mount(&server)
        .await;

    let line = LineClient::new("test-token").with_base_url(&server.uri());
    let err = deliver_digest(&line, "C0123456789", &report(1)).await.unwrap_err();
    match err {
        NetflowError::Delivery(DeliveryError::HttpStatus { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid"));
        }
        other => panic!("expected HttpStatus delivery error, got {:?}", other),
    }
}

#[tokio::test]
async fn oversized_single_message_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let line = LineClient::new("test-token").with_base_url(&server.uri());
    let err = line.deliver("C0123456789", &"字".repeat(5001)).await.unwrap_err();
    assert!(matches!(err, DeliveryError::TooLong(5001)));
}
