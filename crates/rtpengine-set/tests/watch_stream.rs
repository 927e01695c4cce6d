// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end: watch-event lines -> informer -> set -> watch.

use rtpengine_set::{stream, Endpoint, EndpointSet, LocalInformer, SetConfig, WatchError};
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

const NO_CHANGE: Duration = Duration::from_millis(30);

fn event(kind: &str, namespace: &str, name: &str, ports: &str, addresses: &[&str]) -> String {
    let addresses: Vec<String> = addresses.iter().map(|a| format!("\"{}\"", a)).collect();
    format!(
        r#"{{"type":"{}","object":{{"kind":"EndpointSlice","metadata":{{"name":"{}","namespace":"{}"}},"ports":{},"endpoints":[{{"addresses":[{}]}}]}}}}"#,
        kind,
        name,
        namespace,
        ports,
        addresses.join(",")
    )
}

fn start(informer: &Arc<LocalInformer>, port: &str) -> Arc<EndpointSet> {
    SetConfig::new("rtpengine", port)
        .with_namespace("voip")
        .builder()
        .informer(informer.clone())
        .logger(Span::none())
        .start()
        .unwrap()
}

#[tokio::test]
async fn test_numeric_port_scenario() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "5060");

    let line = event(
        "ADDED",
        "voip",
        "rtpengine",
        r#"[{"port":5060}]"#,
        &["10.0.0.1", "10.0.0.2"],
    );
    stream::apply_line(&informer, &line).unwrap();

    set.watch(std::future::pending()).await.unwrap();
    assert_eq!(
        set.endpoints(),
        vec![
            Endpoint::new("10.0.0.1", 5060),
            Endpoint::new("10.0.0.2", 5060)
        ]
    );
}

#[tokio::test]
async fn test_named_port_scenario() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "rtp");

    let line = event(
        "ADDED",
        "voip",
        "rtpengine",
        r#"[{"name":"sip","port":5060},{"name":"rtp","port":35000}]"#,
        &["10.0.0.5"],
    );
    stream::apply_line(&informer, &line).unwrap();

    set.watch(std::future::pending()).await.unwrap();
    assert_eq!(set.endpoints(), vec![Endpoint::new("10.0.0.5", 35000)]);
}

#[tokio::test]
async fn test_missing_named_port_scenario() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "missing");

    let line = event(
        "ADDED",
        "voip",
        "rtpengine",
        r#"[{"name":"sip","port":5060}]"#,
        &["10.0.0.5"],
    );
    stream::apply_line(&informer, &line).unwrap();

    assert!(set.is_empty());
    assert_eq!(
        set.watch_timeout(NO_CHANGE).await,
        Err(WatchError::DeadlineExceeded)
    );
}

#[tokio::test]
async fn test_removal_wakes_pending_watch() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "5060");

    let added = event("ADDED", "voip", "rtpengine", "[]", &["10.0.0.1"]);
    stream::apply_line(&informer, &added).unwrap();
    set.watch_timeout(NO_CHANGE).await.unwrap();
    assert_eq!(set.endpoints(), vec![Endpoint::new("10.0.0.1", 5060)]);

    let waiter = {
        let set = set.clone();
        tokio::spawn(async move { set.watch(std::future::pending()).await })
    };
    tokio::task::yield_now().await;

    let deleted = event("DELETED", "voip", "rtpengine", "[]", &["10.0.0.1"]);
    stream::apply_line(&informer, &deleted).unwrap();

    assert_eq!(waiter.await.unwrap(), Ok(()));
    assert!(set.endpoints().is_empty());
}

#[tokio::test]
async fn test_burst_coalesces_to_final_state() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "22222");

    let input = [
        event("ADDED", "voip", "rtpengine", "[]", &["10.0.0.1"]),
        event("MODIFIED", "voip", "rtpengine", "[]", &["10.0.0.1", "10.0.0.2"]),
        event("MODIFIED", "voip", "rtpengine", "[]", &["10.0.0.2", "10.0.0.3", "10.0.0.4"]),
    ]
    .join("\n");

    let applied = stream::run(input.as_bytes(), &informer).await.unwrap();
    assert_eq!(applied, 3);

    assert_eq!(set.watch_timeout(NO_CHANGE).await, Ok(()));
    assert_eq!(
        set.endpoints(),
        vec![
            Endpoint::new("10.0.0.2", 22222),
            Endpoint::new("10.0.0.3", 22222),
            Endpoint::new("10.0.0.4", 22222)
        ]
    );
    assert_eq!(
        set.watch_timeout(NO_CHANGE).await,
        Err(WatchError::DeadlineExceeded)
    );
}

#[tokio::test]
async fn test_other_service_ignored() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "5060");

    let input = [
        event("ADDED", "voip", "kamailio", "[]", &["10.0.1.1"]),
        event("ADDED", "default", "rtpengine", "[]", &["10.0.2.1"]),
        r#"{"type":"ADDED","object":{"kind":"Service","metadata":{"name":"rtpengine","namespace":"voip"}}}"#
            .to_string(),
    ]
    .join("\n");

    stream::run(input.as_bytes(), &informer).await.unwrap();

    assert_eq!(informer.len(), 3);
    assert!(set.endpoints().is_empty());
    assert_eq!(
        set.watch_timeout(NO_CHANGE).await,
        Err(WatchError::DeadlineExceeded)
    );
}

#[tokio::test]
async fn test_consumer_loop_observes_latest_state() {
    let informer = Arc::new(LocalInformer::new());
    let set = start(&informer, "22222");

    let consumer = {
        let set = set.clone();
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while set.watch_timeout(Duration::from_millis(200)).await.is_ok() {
                seen.push(set.endpoints());
            }
            seen
        })
    };

    for addrs in [&["10.0.0.1"][..], &["10.0.0.1", "10.0.0.2"][..], &["10.0.0.2"][..]] {
        let line = event("MODIFIED", "voip", "rtpengine", "[]", addrs);
        stream::apply_line(&informer, &line).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let seen = consumer.await.unwrap();
    assert!(!seen.is_empty());
    assert_eq!(seen.last().unwrap(), &vec![Endpoint::new("10.0.0.2", 22222)]);
}
