//! Result shapes and data semantics of each console operation.

use std::sync::Arc;

use valkey_console::client::ScanRequest;
use valkey_console::{ConsoleSettings, FailureKind};

use crate::common::ConnectionConfigBuilder;
use crate::{Faults, MockStore, UNREACHABLE_HOST, console_for, console_with};

fn local() -> valkey_console::ConnectionConfig {
    ConnectionConfigBuilder::new("localhost").build()
}

// ============================================================================
// test_connection
// ============================================================================

#[tokio::test]
async fn test_connection_succeeds_without_payload() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let result = console.test_connection(&local()).await;
    assert!(result.is_success());
    assert!(result.data().is_none());
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({ "success": true })
    );
}

#[tokio::test]
async fn test_connection_reports_unreachable_host() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let config = ConnectionConfigBuilder::new(UNREACHABLE_HOST).build();
    let result = console.test_connection(&config).await;

    assert!(!result.is_success());
    assert_eq!(result.kind(), Some(FailureKind::Connection));
    assert!(!result.error().unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_reports_auth_rejection() {
    let store = MockStore::new();
    store.set_faults(Faults {
        required_password: Some("hunter2".to_string()),
        ..Default::default()
    });
    let (console, _) = console_for(&store);

    let wrong = ConnectionConfigBuilder::new("localhost")
        .credentials("admin", "guess")
        .build();
    let result = console.test_connection(&wrong).await;
    assert_eq!(result.kind(), Some(FailureKind::Connection));
    assert!(result.error().unwrap().contains("WRONGPASS"));

    let right = ConnectionConfigBuilder::new("localhost")
        .credentials("admin", "hunter2")
        .build();
    assert!(console.test_connection(&right).await.is_success());
}

#[tokio::test]
async fn test_invalid_config_fails_before_connecting() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let cases = [
        ConnectionConfigBuilder::new("").build(),
        ConnectionConfigBuilder::new("   ").build(),
        ConnectionConfigBuilder::new("localhost").port("0").build(),
        ConnectionConfigBuilder::new("localhost").port("65536").build(),
        ConnectionConfigBuilder::new("localhost").port("redis").build(),
        ConnectionConfigBuilder::new("user@host").build(),
    ];

    for config in cases {
        let result = console.test_connection(&config).await;
        assert_eq!(
            result.kind(),
            Some(FailureKind::InvalidConfig),
            "{:?} should be rejected",
            config
        );
    }

    assert_eq!(
        store
            .stats
            .connect_attempts
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

// ============================================================================
// get_keys / scan_keys
// ============================================================================

#[tokio::test]
async fn test_get_keys_lists_everything() {
    let store = MockStore::new();
    store.fill("user:", 250);
    let (console, _) = console_for(&store);

    let mut keys = console.get_keys(&local()).await.into_result().unwrap().unwrap();
    keys.sort();
    assert_eq!(keys.len(), 250);
    assert!(keys.contains(&"user:0".to_string()));
    assert!(keys.contains(&"user:249".to_string()));

    // 100 per page
    assert_eq!(
        store
            .stats
            .scan_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

#[tokio::test]
async fn test_get_keys_on_empty_store() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let keys = console.get_keys(&local()).await.into_result().unwrap();
    assert_eq!(keys, Some(Vec::new()));
}

#[tokio::test]
async fn test_get_keys_removes_duplicates_across_pages() {
    let store = MockStore::new();
    store.fill("k", 30);
    store.set_faults(Faults {
        repeat_scan_keys: true,
        ..Default::default()
    });
    let settings = ConsoleSettings {
        scan_count: 7,
        ..Default::default()
    };
    let (console, _) = console_with(&store, settings);

    let keys = console.get_keys(&local()).await.into_result().unwrap().unwrap();
    let mut unique = keys.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(keys.len(), 30);
    assert_eq!(unique.len(), 30);
}

#[tokio::test]
async fn test_get_keys_stops_at_ceiling() {
    let store = MockStore::new();
    store.fill("bulk:", 500);
    let settings = ConsoleSettings {
        scan_count: 50,
        max_keys: 120,
        ..Default::default()
    };
    let (console, _) = console_with(&store, settings);

    let keys = console.get_keys(&local()).await.into_result().unwrap().unwrap();
    assert_eq!(keys.len(), 120);
    // Enough pages to reach the ceiling, and no more
    assert_eq!(
        store
            .stats
            .scan_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

#[tokio::test]
async fn test_scan_keys_pages_with_cursor() {
    let store = MockStore::new();
    store.fill("page:", 25);
    let (console, _) = console_for(&store);

    let mut request = ScanRequest::from_parts(None, None, Some(10)).unwrap();
    let mut seen = Vec::new();
    let mut pages = 0;
    loop {
        let page = console
            .scan_keys(&local(), request.clone())
            .await
            .into_result()
            .unwrap()
            .unwrap();
        pages += 1;
        seen.extend(page.keys.iter().cloned());
        if page.is_complete() {
            break;
        }
        request = request.next(page.cursor);
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 25);
    // One session per page
    assert_eq!(store.stats.opened(), 3);
    assert!(store.stats.balanced());
}

#[tokio::test]
async fn test_scan_keys_applies_pattern() {
    let store = MockStore::with_data(&[("user:1", "a"), ("user:2", "b"), ("session:1", "c")]);
    let (console, _) = console_for(&store);

    let request = ScanRequest::from_parts(None, Some("user:*".to_string()), None).unwrap();
    let page = console
        .scan_keys(&local(), request)
        .await
        .into_result()
        .unwrap()
        .unwrap();

    assert!(page.is_complete());
    assert_eq!(page.keys, vec!["user:1".to_string(), "user:2".to_string()]);
}

// ============================================================================
// get_value / set_value / delete_key
// ============================================================================

#[tokio::test]
async fn test_absent_key_reads_as_empty_string() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let result = console.get_value(&local(), "missing").await;
    assert!(result.is_success());
    assert_eq!(result.data().map(String::as_str), Some(""));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({ "success": true, "data": "" })
    );
}

#[tokio::test]
async fn test_set_then_get_roundtrip() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);
    let config = local();

    let values = [
        "plain",
        "",
        "line one\nline two\r\nline three",
        "quotes \" and 'single' and \\backslash\\",
        "resp-ish *3\r\n$3\r\nSET\r\n",
        "unicode ✓ ключ 键",
    ];

    for (n, value) in values.iter().enumerate() {
        let key = format!("roundtrip:{}", n);
        assert!(console.set_value(&config, &key, value).await.is_success());

        let read = console.get_value(&config, &key).await;
        assert_eq!(read.data().map(String::as_str), Some(*value));
    }
}

#[tokio::test]
async fn test_set_overwrites() {
    let store = MockStore::with_data(&[("greeting", "hello")]);
    let (console, _) = console_for(&store);

    assert!(console.set_value(&local(), "greeting", "bonjour").await.is_success());
    assert_eq!(store.value("greeting").as_deref(), Some("bonjour"));
}

#[tokio::test]
async fn test_delete_then_get_is_empty() {
    let store = MockStore::with_data(&[("doomed", "value")]);
    let (console, _) = console_for(&store);
    let config = local();

    assert!(console.delete_key(&config, "doomed").await.is_success());
    let read = console.get_value(&config, "doomed").await;
    assert_eq!(read.data().map(String::as_str), Some(""));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_delete_absent_key_succeeds() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);

    let result = console.delete_key(&local(), "never-existed").await;
    assert!(result.is_success());
    assert!(result.data().is_none());
}

#[tokio::test]
async fn test_command_failure_is_reported() {
    let store = MockStore::with_data(&[("list", "x")]);
    store.set_faults(Faults {
        command_error: Some(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        ),
        ..Default::default()
    });
    let (console, _) = console_for(&store);

    let result = console.get_value(&local(), "list").await;
    assert_eq!(result.kind(), Some(FailureKind::Command));
    assert!(result.error().unwrap().contains("WRONGTYPE"));
}

#[tokio::test]
async fn test_concurrent_writes_last_writer_wins() {
    let store = MockStore::new();
    let (console, _) = console_for(&store);
    let config = local();

    for _ in 0..20 {
        let (a, b) = tokio::join!(
            console.set_value(&config, "race", "A"),
            console.set_value(&config, "race", "B"),
        );
        assert!(a.is_success() && b.is_success());

        let value = store.value("race").unwrap();
        assert!(value == "A" || value == "B", "unexpected value {:?}", value);
    }

    assert!(store.stats.balanced());
}

#[tokio::test]
async fn test_concurrent_operations_use_separate_sessions() {
    let store = MockStore::new();
    store.fill("c", 10);
    let (console, _) = console_for(&store);
    let console = Arc::new(console);
    let config = local();

    let mut handles = Vec::new();
    for n in 0..8 {
        let console = console.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            console.get_value(&config, &format!("c{}", n)).await
        }));
    }

    for (n, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.data().cloned(), Some(n.to_string()));
    }
    assert_eq!(store.stats.opened(), 8);
    assert!(store.stats.balanced());
}

#[tokio::test]
async fn test_outcomes_are_recorded_in_metrics() {
    let store = MockStore::new();
    let (console, health) = console_for(&store);

    console.get_value(&local(), "k").await;
    console
        .get_value(&ConnectionConfigBuilder::new(UNREACHABLE_HOST).build(), "k")
        .await;

    let encoded = health.metrics.encode();
    assert!(encoded.contains("operation=\"get_value\""));
    assert!(encoded.contains("outcome=\"success\""));
    assert!(encoded.contains("outcome=\"connection\""));
    assert_eq!(health.metrics.operations_in_flight.get(), 0);
}
