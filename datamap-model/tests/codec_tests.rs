mod common;

use common::{Article, Discovery, Meta, Scientist, Status};
use datamap_model::codec::{decode, decode_value, encode, encode_value};
use datamap_model::{schema_of, FieldFlags, Json, MappingError, Relation};
use datamap_types::{Key, StoreValue, Value, LONG_TEXT_THRESHOLD, MAX_BLOB_BYTES};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn plain() -> FieldFlags {
    FieldFlags::default()
}

// ── Text ─────────────────────────────────────────────────────────

#[test]
fn short_text_is_a_scalar() {
    let text = "a".repeat(LONG_TEXT_THRESHOLD);
    assert_eq!(encode_value(Value::Text(text.clone())), StoreValue::Text(text));
}

#[test]
fn text_over_threshold_is_long_text() {
    let text = "a".repeat(LONG_TEXT_THRESHOLD + 1);
    assert_eq!(
        encode_value(Value::Text(text.clone())),
        StoreValue::LongText(text)
    );
}

#[test]
fn threshold_counts_characters_not_bytes() {
    let text = "é".repeat(LONG_TEXT_THRESHOLD);
    assert!(matches!(encode_value(Value::Text(text)), StoreValue::Text(_)));
}

#[test]
fn long_text_decodes_to_text() {
    let decoded = decode_value(plain(), StoreValue::LongText("x".repeat(900))).unwrap();
    assert_eq!(decoded, Value::Text("x".repeat(900)));
}

// ── Binary ───────────────────────────────────────────────────────

#[test]
fn small_bytes_are_kept_whole() {
    let bytes = vec![1u8, 2, 3];
    assert_eq!(encode_value(Value::Bytes(bytes.clone())), StoreValue::Blob(bytes));
}

#[test]
fn bytes_over_limit_are_truncated() {
    let bytes: Vec<u8> = (0..MAX_BLOB_BYTES + 4_321).map(|i| (i % 251) as u8).collect();
    let StoreValue::Blob(stored) = encode_value(Value::Bytes(bytes.clone())) else {
        panic!("expected blob");
    };
    assert_eq!(stored.len(), MAX_BLOB_BYTES);
    assert_eq!(stored[..], bytes[..MAX_BLOB_BYTES]);
    assert_eq!(decode_value(plain(), StoreValue::Blob(stored.clone())).unwrap(), Value::Bytes(stored));
}

#[test]
fn bytes_exactly_at_limit_are_kept() {
    let bytes = vec![9u8; MAX_BLOB_BYTES];
    let StoreValue::Blob(stored) = encode_value(Value::Bytes(bytes)) else {
        panic!("expected blob");
    };
    assert_eq!(stored.len(), MAX_BLOB_BYTES);
}

// ── Enumerations and documents ───────────────────────────────────

#[test]
fn enumerated_field_stores_label() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("status").unwrap();
    let article = Article {
        status: Status::Published,
        ..Article::default()
    };
    assert_eq!(
        encode(field, &article).unwrap(),
        StoreValue::Text("PUBLISHED".into())
    );

    let mut decoded = Article::default();
    decode(field, &mut decoded, StoreValue::Text("PUBLISHED".into())).unwrap();
    assert_eq!(decoded.status, Status::Published);
}

#[test]
fn unknown_label_is_an_access_error() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("status").unwrap();
    let err = decode(field, &mut Article::default(), StoreValue::Text("ARCHIVED".into())).unwrap_err();
    assert!(err.to_string().contains("status"));
}

#[test]
fn document_field_stores_json_text() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("meta").unwrap();
    let meta = Meta {
        tags: vec!["physics".into()],
        rating: 4,
    };
    let article = Article {
        meta: Some(Json(meta.clone())),
        ..Article::default()
    };
    let stored = encode(field, &article).unwrap();
    let StoreValue::Text(ref json) = stored else {
        panic!("expected text, got {stored:?}");
    };
    assert!(json.contains("physics"));

    let mut decoded = Article::default();
    decode(field, &mut decoded, stored).unwrap();
    assert_eq!(decoded.meta, Some(Json(meta)));
}

#[test]
fn large_document_becomes_long_text() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("meta").unwrap();
    let article = Article {
        meta: Some(Json(Meta {
            tags: vec!["t".repeat(600)],
            rating: 1,
        })),
        ..Article::default()
    };
    assert!(matches!(encode(field, &article).unwrap(), StoreValue::LongText(_)));
}

#[test]
fn malformed_document_is_an_access_error() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("meta").unwrap();
    let err = decode(field, &mut Article::default(), StoreValue::Text("{not json".into()))
        .unwrap_err();
    match err {
        MappingError::Access { field, reason } => {
            assert_eq!(field, "meta");
            assert!(reason.contains("invalid document"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn null_document_round_trips() {
    let schema = schema_of::<Article>().unwrap();
    let field = schema.field("meta").unwrap();
    assert_eq!(encode(field, &Article::default()).unwrap(), StoreValue::Null);
    let mut decoded = Article {
        meta: Some(Json(Meta::default())),
        ..Article::default()
    };
    decode(field, &mut decoded, StoreValue::Null).unwrap();
    assert_eq!(decoded.meta, None);
}

// ── Relationships ────────────────────────────────────────────────

#[test]
fn empty_relation_encodes_null() {
    let schema = schema_of::<Discovery>().unwrap();
    let field = schema.field("discoverer").unwrap();
    assert_eq!(encode(field, &Discovery::default()).unwrap(), StoreValue::Null);
}

#[test]
fn resolved_relation_encodes_target_key() {
    let schema = schema_of::<Discovery>().unwrap();
    let field = schema.field("discoverer").unwrap();
    let discovery = Discovery {
        discoverer: Some(Relation::new(Scientist {
            id: Some(3),
            name: "Marie".into(),
        })),
        ..Discovery::default()
    };
    assert_eq!(
        encode(field, &discovery).unwrap(),
        StoreValue::Reference(Key::with_id("scientists", 3).unwrap())
    );
}

#[test]
fn relation_to_unsaved_target_fails() {
    let schema = schema_of::<Discovery>().unwrap();
    let field = schema.field("discoverer").unwrap();
    let discovery = Discovery {
        discoverer: Some(Relation::new(Scientist::default())),
        ..Discovery::default()
    };
    assert!(encode(field, &discovery).is_err());
}

#[test]
fn reference_decodes_to_unresolved_stub() {
    let schema = schema_of::<Discovery>().unwrap();
    let field = schema.field("discoverer").unwrap();
    let key = Key::with_id("scientists", 3).unwrap();
    let mut discovery = Discovery::default();
    decode(field, &mut discovery, StoreValue::Reference(key.clone())).unwrap();

    let relation = discovery.discoverer.unwrap();
    assert!(!relation.is_resolved());
    assert_eq!(relation.key().unwrap(), key);
    assert_eq!(
        relation.to_stub().unwrap(),
        Scientist {
            id: Some(3),
            name: String::new(),
        }
    );
}

#[test]
fn reference_in_value_column_is_rejected() {
    let key = Key::with_id("scientists", 3).unwrap();
    assert!(decode_value(plain(), StoreValue::Reference(key)).is_err());
}

// ── Round-trip properties ────────────────────────────────────────

proptest! {
    #[test]
    fn text_round_trips(text in ".{0,1200}") {
        let stored = encode_value(Value::Text(text.clone()));
        prop_assert_eq!(
            matches!(stored, StoreValue::LongText(_)),
            text.chars().count() > LONG_TEXT_THRESHOLD
        );
        prop_assert_eq!(decode_value(plain(), stored).unwrap(), Value::Text(text));
    }

    #[test]
    fn bytes_under_limit_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let stored = encode_value(Value::Bytes(bytes.clone()));
        prop_assert_eq!(decode_value(plain(), stored).unwrap(), Value::Bytes(bytes));
    }

    #[test]
    fn scalars_round_trip(n in any::<i64>(), b in any::<bool>()) {
        prop_assert_eq!(decode_value(plain(), encode_value(Value::Int(n))).unwrap(), Value::Int(n));
        prop_assert_eq!(decode_value(plain(), encode_value(Value::Bool(b))).unwrap(), Value::Bool(b));
    }
}
