//! Decoding tests: error paths and accumulation rules.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use protomodel::codec::decoder::MAX_RECURSION_DEPTH;
use protomodel::codec::wire::encode_varint;
use protomodel::{decode, DecodeError, Error, ProtoEnum, ProtoMessage, WireType};

#[derive(Debug, PartialEq, ProtoMessage)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, PartialEq, ProtoMessage)]
struct Tagged {
    tags: Vec<String>,
    #[proto(number = 5)]
    counts: BTreeMap<String, u32>,
    note: Option<String>,
}

fn decode_err<T: ProtoMessage + std::fmt::Debug>(data: &[u8]) -> DecodeError {
    match decode::<T>(data) {
        Err(Error::Decode(err)) => err,
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[test]
fn test_decode_scalars() {
    let user: User = decode(b"\x08\x2a\x12\x05Alice").unwrap();
    assert_eq!(
        user,
        User {
            id: 42,
            name: "Alice".into(),
        }
    );
}

#[test]
fn test_decode_unknown_field() {
    let err = decode_err::<User>(b"\x08\x01\x18\x05\x12\x01a");
    assert_eq!(
        err,
        DecodeError::UnknownField {
            record: "User".into(),
            number: 3,
        }
    );
}

#[test]
fn test_decode_truncated_varint() {
    let err = decode_err::<User>(b"\x08\xff");
    assert!(matches!(err, DecodeError::TruncatedInput { .. }), "{:?}", err);
}

#[test]
fn test_decode_truncated_length_delimited() {
    let err = decode_err::<User>(b"\x08\x01\x12\x05Al");
    assert_eq!(err, DecodeError::TruncatedInput { need: 9, have: 6 });
}

#[test]
fn test_decode_wire_type_mismatch() {
    // Field 1 declared as varint but sent length-delimited.
    let err = decode_err::<User>(b"\x0a\x01x");
    assert_eq!(
        err,
        DecodeError::WireTypeMismatch {
            field: "id".into(),
            expected: WireType::Varint,
            actual: 2,
        }
    );
}

#[test]
fn test_decode_unsupported_wire_type() {
    // Wire type 5 (fixed32) is never accepted.
    let err = decode_err::<User>(b"\x0d\x00\x00\x00\x00");
    assert_eq!(
        err,
        DecodeError::WireTypeMismatch {
            field: "id".into(),
            expected: WireType::Varint,
            actual: 5,
        }
    );
}

#[test]
fn test_decode_missing_required() {
    let err = decode_err::<User>(b"\x08\x01");
    assert_eq!(
        err,
        DecodeError::MissingRequiredField {
            record: "User".into(),
            field: "name".into(),
        }
    );
}

#[test]
fn test_decode_invalid_utf8() {
    let err = decode_err::<User>(b"\x08\x01\x12\x02\xff\xfe");
    assert!(matches!(err, DecodeError::InvalidEncoding(_)), "{:?}", err);
}

#[test]
fn test_decode_last_singular_wins() {
    let user: User = decode(b"\x08\x01\x12\x01a\x08\x02").unwrap();
    assert_eq!(user.id, 2);
}

#[test]
fn test_decode_unseen_required_collections_are_empty() {
    let tagged: Tagged = decode(b"").unwrap();
    assert_eq!(
        tagged,
        Tagged {
            tags: vec![],
            counts: BTreeMap::new(),
            note: None,
        }
    );
}

#[test]
fn test_decode_repeated_accumulates_in_order() {
    let tagged: Tagged = decode(b"\x0a\x01b\x1a\x01n\x0a\x01a").unwrap();
    assert_eq!(tagged.tags, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(tagged.note.as_deref(), Some("n"));
}

#[test]
fn test_decode_map_repeated_key_overwrites() {
    let mut data = Vec::new();
    data.extend_from_slice(b"\x2a\x05\x0a\x01k\x10\x01");
    data.extend_from_slice(b"\x2a\x05\x0a\x01j\x10\x03");
    data.extend_from_slice(b"\x2a\x05\x0a\x01k\x10\x02");
    let tagged: Tagged = decode(&data).unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("k".to_string(), 2);
    expected.insert("j".to_string(), 3);
    assert_eq!(tagged.counts, expected);
}

#[test]
fn test_decode_map_entry_missing_value() {
    // Entry with only a key: the value takes its zero value.
    let tagged: Tagged = decode(b"\x2a\x03\x0a\x01k").unwrap();
    assert_eq!(tagged.counts.get("k"), Some(&0));
}

#[test]
fn test_decode_map_entry_unknown_subfield() {
    let err = decode_err::<Tagged>(b"\x2a\x02\x18\x01");
    assert!(
        matches!(err, DecodeError::UnknownField { number: 3, .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_decode_unknown_enum_ordinal() {
    #[derive(Debug, Clone, Copy, PartialEq, ProtoEnum)]
    enum Color {
        Red,
        Green,
    }

    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Paint {
        color: Color,
    }

    let paint: Paint = decode(b"\x08\x01").unwrap();
    assert_eq!(paint.color, Color::Green);
    assert_eq!(Color::from_ordinal(0), Some(Color::Red));

    let err = decode_err::<Paint>(b"\x08\x09");
    assert!(matches!(err, DecodeError::InvalidEncoding(_)), "{:?}", err);
}

#[test]
fn test_decode_integer_out_of_range() {
    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Small {
        v: u8,
    }

    let err = decode_err::<Small>(b"\x08\x80\x02");
    assert!(matches!(err, DecodeError::InvalidEncoding(_)), "{:?}", err);
}

#[test]
fn test_decode_fills_declared_defaults() {
    fn default_port() -> u16 {
        8080
    }

    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Server {
        host: String,
        #[proto(default = "default_port")]
        port: u16,
        #[proto(skip)]
        connections: usize,
    }

    let server: Server = decode(b"\x0a\x09localhost").unwrap();
    assert_eq!(
        server,
        Server {
            host: "localhost".into(),
            port: 8080,
            connections: 0,
        }
    );
}

#[test]
fn test_decode_nested_error_propagates() {
    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Wrapper {
        user: User,
    }

    // Nested User is missing its name.
    let err = decode_err::<Wrapper>(b"\x0a\x02\x08\x01");
    assert_eq!(
        err,
        DecodeError::MissingRequiredField {
            record: "User".into(),
            field: "name".into(),
        }
    );
}

#[derive(Debug, PartialEq, ProtoMessage)]
struct Link {
    next: Option<Box<Link>>,
}

/// `levels` copies of field 1 nested inside each other, innermost empty.
fn nested_links(levels: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for _ in 0..levels {
        let mut frame = vec![0x0a];
        encode_varint(data.len() as u64, &mut frame);
        frame.extend_from_slice(&data);
        data = frame;
    }
    data
}

fn link_depth(link: &Link) -> usize {
    let mut depth = 0;
    let mut cur = link;
    while let Some(next) = &cur.next {
        depth += 1;
        cur = next;
    }
    depth
}

#[test]
fn test_decode_nesting_up_to_limit() {
    let link: Link = decode(&nested_links(MAX_RECURSION_DEPTH)).unwrap();
    assert_eq!(link_depth(&link), MAX_RECURSION_DEPTH);
}

#[test]
fn test_decode_nesting_past_limit_rejected() {
    let expected = DecodeError::RecursionLimitExceeded {
        limit: MAX_RECURSION_DEPTH,
    };
    assert_eq!(decode_err::<Link>(&nested_links(MAX_RECURSION_DEPTH + 1)), expected);
    // Deep enough to exhaust the stack without the limit.
    assert_eq!(decode_err::<Link>(&nested_links(10_000)), expected);
}

#[test]
fn test_decode_map_entry_missing_message_value() {
    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Meta {
        note: Option<String>,
    }

    #[derive(Debug, PartialEq, ProtoMessage)]
    struct Catalog {
        items: BTreeMap<String, Meta>,
    }

    // One entry carrying only key "k".
    let catalog: Catalog = decode(b"\x0a\x03\x0a\x01k").unwrap();
    assert_eq!(catalog.items.get("k"), Some(&Meta { note: None }));
    assert_eq!(catalog.items.len(), 1);
}
