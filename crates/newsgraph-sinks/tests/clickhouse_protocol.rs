//! Integration tests for `ClickHouseSink` against a wiremock HTTP interface.

use chrono::{TimeZone, Utc};
use newsgraph_sinks::{ArticleRow, ClickHouseSink, ColumnarSink, SinkError};
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn test_sink(base_url: &str) -> ClickHouseSink {
    ClickHouseSink::new(base_url, "default", Some("pw".to_string()), "news_articles", 30)
        .expect("sink construction should not fail")
}

fn row(url: &str) -> ArticleRow {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap();
    ArticleRow {
        title: "Markets rally".to_string(),
        description: "Stocks rose.".to_string(),
        content: "Stocks rose.".to_string(),
        published_at: at,
        url: url.to_string(),
        publisher: "Reuters".to_string(),
        category: "Business".to_string(),
        sentiment: 0.4,
        processed_at: at,
        topic_id: 1,
        topic_label: "Business".to_string(),
        locations: vec!["Paris".to_string()],
        coordinates: vec![(48.85, 2.35)],
        is_breaking: false,
    }
}

/// The statement a request carried: the `query` parameter for inserts,
/// otherwise the body.
fn statement(req: &Request) -> String {
    req.url
        .query_pairs()
        .find(|(k, _)| k == "query")
        .map_or_else(
            || String::from_utf8_lossy(&req.body).into_owned(),
            |(_, v)| v.into_owned(),
        )
}

async fn statements(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(statement)
        .collect()
}

#[tokio::test]
async fn replace_runs_staging_then_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-ClickHouse-User", "default"))
        .and(header("X-ClickHouse-Key", "pw"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sink = test_sink(&server.uri());
    let written = sink
        .replace_rows(&[row("u1"), row("u2")])
        .await
        .expect("replace should succeed");
    assert_eq!(written, 2);

    let sent = statements(&server).await;
    assert_eq!(sent.len(), 6, "unexpected statements: {sent:#?}");
    assert_eq!(sent[0], "DROP TABLE IF EXISTS news_articles_staging");
    assert!(sent[1].starts_with("CREATE TABLE news_articles_staging ("));
    assert!(sent[2].starts_with("INSERT INTO news_articles_staging ("));
    assert!(sent[2].ends_with("FORMAT JSONEachRow"));
    assert!(sent[3].starts_with("CREATE TABLE IF NOT EXISTS news_articles ("));
    assert_eq!(sent[4], "EXCHANGE TABLES news_articles_staging AND news_articles");
    assert_eq!(sent[5], "DROP TABLE IF EXISTS news_articles_staging");
}

#[tokio::test]
async fn insert_body_is_one_json_object_per_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    test_sink(&server.uri())
        .replace_rows(&[row("u1"), row("u2")])
        .await
        .expect("replace should succeed");

    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| statement(r).starts_with("INSERT"))
        .expect("insert request sent");
    let body = String::from_utf8_lossy(&insert.body);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["url"], "u1");
    assert_eq!(first["published_at"], "2026-03-01 07:30:00");
    assert_eq!(first["locations"][0], "Paris");
}

#[tokio::test]
async fn failure_before_exchange_leaves_main_table_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("CREATE TABLE news_articles_staging"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Code: 60. DB::Exception"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = test_sink(&server.uri())
        .replace_rows(&[row("u1")])
        .await
        .expect_err("staging create failure should surface");
    assert!(
        matches!(err, SinkError::ClickHouse { status: 500, ref message } if message.contains("Code: 60")),
        "unexpected error: {err:?}"
    );

    let sent = statements(&server).await;
    assert!(!sent.iter().any(|s| s.starts_with("EXCHANGE")));
    assert!(!sent.iter().any(|s| s.starts_with("INSERT")));
}

#[tokio::test]
async fn empty_rows_still_swap_in_an_empty_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let written = test_sink(&server.uri()).replace_rows(&[]).await.unwrap();
    assert_eq!(written, 0);

    let sent = statements(&server).await;
    assert_eq!(sent.len(), 5);
    assert!(!sent.iter().any(|s| s.starts_with("INSERT")));
}

#[tokio::test]
async fn fetch_rows_parses_json_each_row() {
    let server = MockServer::start().await;
    let body = concat!(
        r#"{"title":"a","description":"","content":"","published_at":"2026-03-01 07:30:00","url":"u1","publisher":"Reuters","category":"Business","sentiment":0.2,"processed_at":"2026-03-01 08:00:00","topic_id":1,"topic_label":"Business","locations":["Paris"],"coordinates":[[48.85,2.35]],"is_breaking":true}"#,
        "\n"
    );
    Mock::given(method("POST"))
        .and(body_string_contains("SELECT"))
        .and(body_string_contains("LIMIT 50"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let rows = test_sink(&server.uri()).fetch_rows(50).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url, "u1");
    assert!(rows[0].is_breaking);
    assert_eq!(rows[0].coordinates, vec![(48.85, 2.35)]);
}
