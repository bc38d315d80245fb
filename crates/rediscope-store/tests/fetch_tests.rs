// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use rediscope_app::{ErrorKind, Ttl, ValuePayload};
use rediscope_store::{KeyValueStore, StoreError, fetch_value};
use rediscope_testkit::{MemoryStore, MemoryValue};

#[test]
fn string_values_lose_control_characters() -> Result<()> {
    let store = MemoryStore::new();
    store.insert_text("banner", "hello\r\n\tworld\u{7}")?;

    let (payload, ttl) = fetch_value(&store, "banner")?;
    assert_eq!(payload, ValuePayload::Text("helloworld".to_owned()));
    assert_eq!(ttl, Ttl::Persistent);
    Ok(())
}

#[test]
fn structured_values_keep_their_shape() -> Result<()> {
    let store = MemoryStore::new();
    store.insert(
        "user:1",
        MemoryValue::Hash(vec![("name".into(), "ada".into())]),
    )?;
    store.insert_with_ttl(
        "board",
        MemoryValue::SortedSet(vec![("ada".into(), 3.5), ("bob".into(), 1.0)]),
        90,
    )?;
    store.insert("queue", MemoryValue::List(vec!["a".into(), "b".into()]))?;

    let (hash, _) = fetch_value(&store, "user:1")?;
    assert_eq!(hash.to_plain_text(), r#"{"name":"ada"}"#);

    let (board, ttl) = fetch_value(&store, "board")?;
    assert_eq!(
        board,
        ValuePayload::SortedSet(vec![("ada".into(), 3.5), ("bob".into(), 1.0)])
    );
    assert_eq!(ttl, Ttl::Expires(90));

    let (queue, _) = fetch_value(&store, "queue")?;
    assert_eq!(queue.to_plain_text(), r#"["a","b"]"#);
    Ok(())
}

#[test]
fn missing_and_unsupported_keys_are_typed_errors() -> Result<()> {
    let store = MemoryStore::new();
    store.insert("events", MemoryValue::Other("stream".into()))?;

    let missing = fetch_value(&store, "gone").expect_err("missing key");
    assert!(matches!(missing, StoreError::MissingKey(ref key) if key == "gone"));
    assert_eq!(missing.kind(), ErrorKind::MissingKey);

    let unsupported = fetch_value(&store, "events").expect_err("stream unsupported");
    assert_eq!(unsupported.kind(), ErrorKind::UnsupportedType);
    assert!(unsupported.to_string().contains("stream"));
    Ok(())
}

#[test]
fn ttl_is_read_after_the_value() -> Result<()> {
    let store = MemoryStore::new();
    store.insert_text("k", "v")?;
    fetch_value(&store, "k")?;
    assert_eq!(
        store.calls()?,
        vec!["db0:key_type", "db0:get_string", "db0:ttl"]
    );
    Ok(())
}

#[test]
fn command_failures_propagate() -> Result<()> {
    let store = MemoryStore::new();
    store.insert_text("k", "v")?;
    store.fail_operation("get_string", "LOADING Redis is loading")?;
    let error = fetch_value(&store, "k").expect_err("injected failure");
    assert_eq!(error.kind(), ErrorKind::Operation);
    assert!(store.ping().is_ok());
    Ok(())
}
