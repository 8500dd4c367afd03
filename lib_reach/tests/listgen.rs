mod common;

use std::time::Duration;

use common::{options, MockTransport, StreamScript};
use futures_util::{StreamExt, TryStreamExt};
use lib_reach::{input_record, ListgenRecord, ReachClient, ReachError};
use serde_json::{json, Value};

fn abm_outputs() -> Vec<String> {
    vec!["abm_email".to_string(), "abm_online_audience".to_string()]
}

#[tokio::test]
async fn records_stream_across_chunks() {
    let transport = MockTransport::ok().with_stream(StreamScript::ok(vec!["{\"a\":", "1}\n{\"b\"", ":2}\n"]));
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client
        .listgen("abm", input_record([("domain", "versium.com")]), &abm_outputs())
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.http_status, 200);
    assert_eq!(resp.inputs, input_record([("domain", "versium.com")]));

    let records: Vec<Value> = resp.records().try_collect().await.unwrap();
    assert_eq!(records, vec![json!({"a": 1}), json!({"b": 2})]);
}

#[tokio::test]
async fn final_line_without_newline_is_kept() {
    let transport = MockTransport::ok().with_stream(StreamScript::ok(vec!["{\"a\":1}\n{\"b\":2}"]));
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client.listgen("abm", input_record([("domain", "versium.com")]), &[]).await.unwrap();
    let records: Vec<Value> = resp.records().try_collect().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn typed_records_keep_unknown_fields() {
    let transport = MockTransport::ok().with_stream(StreamScript::ok(vec![
        "{\"contact_fields\":{\"first\":\"Ann\",\"email\":\"ann@versium.com\"},\"score\":3}\n",
    ]));
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client.listgen("abm", input_record([("domain", "versium.com")]), &[]).await.unwrap();
    let records: Vec<ListgenRecord> = resp.records().try_collect().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].contact_fields["first"], json!("Ann"));
    assert_eq!(records[0].extra["score"], json!(3));
}

#[tokio::test]
async fn malformed_line_is_an_error() {
    let transport = MockTransport::ok().with_stream(StreamScript::ok(vec!["{\"a\":1}\n{oops\n{\"b\":2}\n"]));
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client.listgen("abm", input_record([("domain", "versium.com")]), &[]).await.unwrap();
    let items: Vec<lib_reach::Result<Value>> = resp.records().collect().await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(&items[1], Err(ReachError::MalformedLine { line, .. }) if line == "{oops"));
}

#[tokio::test]
async fn failed_listgen_has_no_records() {
    let transport = MockTransport::ok().with_stream(StreamScript {
        status: 500,
        chunks: vec!["{\"error\":\"boom\"}\n"],
        head_delay: Duration::ZERO,
    });
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client.listgen("abm", input_record([("domain", "versium.com")]), &[]).await.unwrap();
    assert!(!resp.success);
    assert_eq!(resp.http_status, 500);
    assert_eq!(client.transport().calls().len(), 1);

    let records: Vec<Value> = resp.records().try_collect().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stream_timeout_covers_the_response_head() {
    let transport = MockTransport::ok().with_stream(StreamScript {
        status: 200,
        chunks: vec![],
        head_delay: Duration::from_secs(30),
    });
    let client = ReachClient::with_transport(
        options().stream_timeout(Some(Duration::from_secs(5))),
        transport,
    )
    .unwrap();

    let err = client
        .listgen("abm", input_record([("domain", "versium.com")]), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ReachError::Timeout(limit) if limit == Duration::from_secs(5)));
}

#[tokio::test]
async fn listgen_request_shape() {
    let transport = MockTransport::ok().with_stream(StreamScript::ok(vec![]));
    let client = ReachClient::with_transport(options(), transport).unwrap();

    let resp = client
        .listgen("abm", input_record([("domain", "versium.com")]), &abm_outputs())
        .await
        .unwrap();
    let records: Vec<Value> = resp.records().try_collect().await.unwrap();
    assert!(records.is_empty());

    let calls = client.transport().calls();
    let call = &calls[0];
    assert_eq!(call.request.url.path(), "/v2/abm");
    assert_eq!(call.query("domain"), vec!["versium.com"]);
    assert_eq!(call.query("output[]"), abm_outputs());
    assert!(call.query("rcfg_max_time").is_empty());
    assert_eq!(call.request.headers["x-versium-api-key"], "test-key");
    assert!(call.request.headers.get("accept").is_none());
}
