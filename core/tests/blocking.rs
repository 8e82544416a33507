//! Blocking verbs against the live mock server.
#![cfg(feature = "blocking")]

mod common;

use std::time::Duration;

use http_helper::{BlockingHttpHelper, FormData, HelperConfig, HelperError, HttpHelper, QueryParams, SharedTransport};
use mock_server::{Ack, Echo, Record};

fn blocking() -> BlockingHttpHelper {
    BlockingHttpHelper::new(HelperConfig::default()).unwrap()
}

#[test]
fn blocking_verbs_round_trip() {
    let base = common::spawn_server();
    let helper = blocking();

    let query = QueryParams::from([("id", "5")]);
    let record: Record = helper.get(&format!("{base}/api"), Some(&query), None).unwrap();
    assert_eq!(
        record,
        Record {
            id: 5,
            name: "a".to_string()
        }
    );

    let ack: Ack = helper
        .post(&format!("{base}/api"), r#"{"n":1}"#, None, None)
        .unwrap();
    assert!(ack.ok);

    let ack: Ack = helper.put(&format!("{base}/api"), "{}", None, None).unwrap();
    assert!(ack.ok);

    let form = FormData::from([("id", "7")]);
    let echo: Echo = helper.delete(&format!("{base}/echo"), Some(&form), None).unwrap();
    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.body, "id=7");

    let text = helper
        .post_string(&format!("{base}/api"), "{}", None, None)
        .unwrap();
    assert_eq!(text, r#"{"ok":true}"#);
}

#[test]
fn blocking_errors_propagate() {
    let base = common::spawn_server();
    let helper = blocking();

    let err = helper
        .get::<Record>(&format!("{base}/not-json"), None, None)
        .unwrap_err();
    assert!(matches!(err, HelperError::Deserialization(_)));

    let dead = common::dead_endpoint();
    let err = helper.get::<Record>(&format!("{dead}/api"), None, None).unwrap_err();
    assert!(matches!(err, HelperError::Transport(_)));
}

#[test]
fn blocking_private_transports_do_not_leak() {
    let base = common::spawn_server();
    let config = HelperConfig {
        use_shared_pool: false,
        ..HelperConfig::default()
    };
    let helper = BlockingHttpHelper::new(config).unwrap();

    for _ in 0..10 {
        let ack: Ack = helper.post(&format!("{base}/api"), "{}", None, None).unwrap();
        assert!(ack.ok);
    }
    assert_eq!(helper.transport().private_leases_in_flight(), 0);
    assert_eq!(helper.transport().shared_leases_issued(), 0);
}

#[test]
fn blocking_helper_owns_a_caller_private_transport() {
    let helper = blocking();
    assert!(!helper.transport().is_global());
    assert_ne!(helper.transport().id(), SharedTransport::global().id());
    assert_ne!(helper.transport().id(), blocking().transport().id());
}

#[test]
fn pooled_connections_survive_idle_gaps_between_calls() {
    let base = common::spawn_server();
    let helper = blocking();
    let url = format!("{base}/api");

    for i in 0..3u64 {
        let query = QueryParams::from([("id", i.to_string())]);
        let record: Record = helper.get(&url, Some(&query), None).unwrap();
        assert_eq!(record.id, i);
        // idle pooled connections are driven by the helper's worker meanwhile
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(helper.transport().shared_leases_issued(), 3);
}

#[tokio::test]
async fn blocking_helper_can_be_created_and_dropped_in_async_context() {
    let helper = blocking();
    assert!(!helper.transport().is_closed());
    drop(helper);
}

#[tokio::test]
async fn blocking_verb_completes_on_an_async_worker() {
    let base = common::spawn_server();
    let helper = blocking();

    let query = QueryParams::from([("id", "3")]);
    let record: Record = helper.get(&format!("{base}/api"), Some(&query), None).unwrap();
    assert_eq!(record.id, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_verbs_run_from_spawn_blocking() {
    let base = common::spawn_server();
    let url = format!("{base}/api");

    let record = tokio::task::spawn_blocking(move || {
        let helper = BlockingHttpHelper::new(HelperConfig::default())?;
        let query = QueryParams::from([("id", "5")]);
        helper.get::<Record>(&url, Some(&query), None)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(record.id, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_and_blocking_helpers_interleave() {
    let base = common::spawn_server();
    let async_helper = HttpHelper::new(SharedTransport::new(), HelperConfig::default());
    let blocking_helper = std::sync::Arc::new(blocking());

    for i in 0..4u64 {
        let url = format!("{base}/api");
        let query = QueryParams::from([("id", i.to_string())]);

        let shared = std::sync::Arc::clone(&blocking_helper);
        let (blocking_url, blocking_query) = (url.clone(), query.clone());
        let from_blocking = tokio::task::spawn_blocking(move || {
            shared.get::<Record>(&blocking_url, Some(&blocking_query), None)
        });

        let from_async: Record = tokio::time::timeout(
            Duration::from_secs(5),
            async_helper.get(&url, Some(&query), None),
        )
        .await
        .expect("async request stalled")
        .unwrap();

        assert_eq!(from_async.id, i);
        assert_eq!(from_blocking.await.unwrap().unwrap().id, i);
    }
    assert_ne!(async_helper.transport().id(), blocking_helper.transport().id());
}
