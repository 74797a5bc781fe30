use super::*;
use std::io::Cursor;

use crate::io::ByteWriter;
use crate::value::Scalar;
use crate::value_type::ValueType;
use crate::writer::{StreamWriter, WriterConfig};
use crate::ErrorKind;

fn write_doc(f: impl FnOnce(&mut StreamWriter<Vec<u8>>)) -> Vec<u8> {
    let mut w = StreamWriter::new(Vec::new(), EncodingOptions::default()).unwrap();
    w.write_start_document().unwrap();
    f(&mut w);
    w.into_inner().unwrap()
}

fn reader(bytes: &[u8]) -> StreamReader<&[u8]> {
    StreamReader::new(bytes).unwrap()
}

/// Header plus hand-written body.
fn raw_doc(body: impl FnOnce(&mut ByteWriter)) -> Vec<u8> {
    let mut bytes = Header::new(EncodingOptions::default(), false).encode().unwrap();
    let mut w = ByteWriter::with_base(bytes.len() as u64, ByteOrder::BigEndian, Charset::utf8());
    body(&mut w);
    Trailer::empty().encode(&mut w).unwrap();
    bytes.extend_from_slice(w.as_slice());
    bytes
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn initial_event_is_none() {
    let bytes = write_doc(|_| {});
    let r = reader(&bytes);
    assert_eq!(r.event_type(), EventType::None);
    assert!(r.has_next());
    assert_eq!(r.depth(), 0);
}

#[test]
fn end_document_is_final() {
    let bytes = write_doc(|_| {});
    let mut r = reader(&bytes);
    assert_eq!(r.next().unwrap(), EventType::StartDocument);
    assert_eq!(r.next().unwrap(), EventType::EndDocument);
    assert!(!r.has_next());
    assert_eq!(r.next(), Err(Error::NoMoreEvents));
}

#[test]
fn start_document_is_synthesized_without_declaration() {
    let bytes = raw_doc(|w| {
        w.write_token_type(TokenType::StringTable);
        w.write_count(1).unwrap();
        w.write_string("a").unwrap();
        w.write_token_type(TokenType::EmptyElement);
        w.write_count(0).unwrap();
    });
    let mut r = reader(&bytes);
    assert_eq!(r.next().unwrap(), EventType::StartDocument);
    assert_eq!(r.xml_version(), None);
    assert_eq!(r.next().unwrap(), EventType::StartElement);
    assert_eq!(r.local_name().unwrap(), "a");
    assert_eq!(r.next().unwrap(), EventType::EndElement);
    assert_eq!(r.local_name().unwrap(), "a");
    assert_eq!(r.next().unwrap(), EventType::EndDocument);
}

#[test]
fn depth_follows_elements() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_start_element("b").unwrap();
        w.write_end_element().unwrap();
        w.write_end_element().unwrap();
    });
    let mut r = reader(&bytes);
    r.next().unwrap();
    let mut depths = Vec::new();
    while r.next().unwrap() != EventType::EndDocument {
        depths.push((r.event_type(), r.depth()));
    }
    assert_eq!(
        depths,
        [
            (EventType::StartElement, 1),
            (EventType::StartElement, 2),
            (EventType::EndElement, 1),
            (EventType::EndElement, 0),
        ]
    );
}

#[test]
fn next_tag_skips_content() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_comment("c").unwrap();
        w.write_space(" ").unwrap();
        w.write_value(3i32).unwrap();
        w.write_start_element("b").unwrap();
    });
    let mut r = reader(&bytes);
    assert_eq!(r.next_tag().unwrap(), EventType::StartElement);
    assert_eq!(r.next_tag().unwrap(), EventType::StartElement);
    assert_eq!(r.local_name().unwrap(), "b");
    assert_eq!(r.next_tag().unwrap(), EventType::EndElement);
    assert_eq!(r.next_tag().unwrap(), EventType::EndElement);
    assert!(matches!(r.next_tag(), Err(Error::UnexpectedEvent { .. })));
}

#[test]
fn require_checks_current_event() {
    let bytes = write_doc(|w| w.write_start_element("a").unwrap());
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.require(EventType::StartElement).unwrap();
    let err = r.require(EventType::EndElement).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn element_accessors_outside_tags_fail() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_value(1i32).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.next().unwrap();
    assert!(matches!(r.name(), Err(Error::UnexpectedEvent { .. })));
    assert!(matches!(r.attribute_count(), Err(Error::UnexpectedEvent { .. })));
    r.next().unwrap();
    assert_eq!(r.local_name().unwrap(), "a");
    assert!(matches!(r.attribute_count(), Err(Error::UnexpectedEvent { .. })));
}

#[test]
fn attribute_index_out_of_bounds() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_attribute("k", "v").unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.attribute_value(1), Err(Error::IndexOutOfBounds { index: 1, len: 1 }));
    assert_eq!(r.attribute_value_by_name("", "missing").unwrap(), None);
}

// ============================================================================
// Werte
// ============================================================================

#[test]
fn unread_values_are_skipped() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_array(&[1.0f64; 100]).unwrap();
        w.write_string_value("skipped").unwrap();
        w.write_value(i64::MIN).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.next().unwrap(), EventType::ValueDouble);
    assert_eq!(r.read_value::<f64>().unwrap(), 1.0);
    assert_eq!(r.values_remaining().unwrap(), 99);
    assert_eq!(r.next().unwrap(), EventType::ValueString);
    assert_eq!(r.next().unwrap(), EventType::ValueLong);
    assert_eq!(r.read_value::<i64>().unwrap(), i64::MIN);
    assert_eq!(r.next().unwrap(), EventType::EndElement);
}

#[test]
fn reading_past_value_fails() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_value(5i32).unwrap();
        w.write_array(&[1i32, 2]).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.next().unwrap();
    assert_eq!(r.read_value::<i32>().unwrap(), 5);
    assert_eq!(r.read_value::<i32>(), Err(Error::ValueReadOverflow { length: 1, requested: 2 }));
    assert!(matches!(r.read_string_value(), Err(Error::ValueReadOverflow { .. })));

    r.next().unwrap();
    let mut three = [0i32; 3];
    assert_eq!(r.read_values(&mut three), Err(Error::ValueReadOverflow { length: 2, requested: 3 }));
    // Fehlgeschlagener Lesezugriff verbraucht nichts.
    let mut two = [0i32; 2];
    r.read_values(&mut two).unwrap();
    assert_eq!(two, [1, 2]);
    assert_eq!(r.next().unwrap(), EventType::EndElement);
}

#[test]
fn value_accessors_need_value_event() {
    let bytes = write_doc(|w| w.write_start_element("a").unwrap());
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.value_type(), Err(Error::NotAValueEvent("START_ELEMENT")));
    assert!(matches!(r.read_value::<i32>(), Err(Error::NotAValueEvent(_))));
}

#[test]
fn values_convert_between_types() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_value(300i32).unwrap();
        w.write_string_value("42").unwrap();
        w.write_value(2.5f64).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.next().unwrap();
    assert_eq!(r.value_type().unwrap(), ValueType::Short);
    assert_eq!(r.read_value::<f64>().unwrap(), 300.0);
    r.next().unwrap();
    assert_eq!(r.read_value::<i32>().unwrap(), 42);
    r.next().unwrap();
    assert!(matches!(r.read_value::<i32>(), Err(Error::ValueConversion { .. })));
}

#[test]
fn scalar_read_keeps_encoded_type() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_value(-1i32).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.next().unwrap();
    assert_eq!(r.read_scalar().unwrap(), Scalar::Short(-1));
}

#[test]
fn array_as_text() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_array(&[true, false]).unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.next().unwrap(), EventType::ValueBool);
    assert_eq!(r.value_length().unwrap(), 2);
    assert_eq!(r.read_string_value().unwrap(), "true false");
}

#[test]
fn content_string_reference() {
    let bytes = raw_doc(|w| {
        w.write_token_type(TokenType::StringTable);
        w.write_count(2).unwrap();
        w.write_string("a").unwrap();
        w.write_string("shared").unwrap();
        w.write_token_type(TokenType::ContentElement);
        w.write_count(0).unwrap();
        w.write_token_type(TokenType::CharContentRef);
        w.write_count(1).unwrap();
        w.write_token_type(TokenType::ElementEnd);
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.next().unwrap(), EventType::ValueString);
    assert_eq!(r.string_reference().unwrap().as_deref(), Some("shared"));
    assert_eq!(r.read_string_value().unwrap(), "shared");
    assert_eq!(r.next().unwrap(), EventType::EndElement);
}

// ============================================================================
// Namespaces
// ============================================================================

#[test]
fn namespace_unaware_mode_keeps_raw_names() {
    let bytes = write_doc(|w| {
        w.write_start_element("p:a").unwrap();
        w.write_namespace("p", "urn:p").unwrap();
        w.write_attribute("p:k", "v").unwrap();
    });
    let config = ReaderConfig::default().with_namespace_aware(false);
    let mut r = StreamReader::with_config(bytes.as_slice(), config).unwrap();
    r.next_tag().unwrap();
    assert_eq!(r.namespace_uri().unwrap(), "");
    assert_eq!(r.prefix().unwrap(), Some("p"));
    assert_eq!(r.namespace_count().unwrap(), 0);
    assert_eq!(r.attribute_count().unwrap(), 2);
    assert_eq!(r.attribute_name(0).unwrap().qualified_name(), "xmlns:p");
}

#[test]
fn unbound_prefix_is_format_error() {
    let bytes = write_doc(|w| w.write_start_element("q:a").unwrap());
    let mut r = reader(&bytes);
    let err = r.next_tag().unwrap_err();
    assert_eq!(err, Error::UnboundPrefix("q".into()));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn nested_scopes_resolve_innermost() {
    let bytes = write_doc(|w| {
        w.write_start_element("p:a").unwrap();
        w.write_namespace("p", "urn:outer").unwrap();
        w.write_start_element("p:b").unwrap();
        w.write_namespace("p", "urn:inner").unwrap();
        w.write_end_element().unwrap();
        w.write_start_element("p:c").unwrap();
    });
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.namespace_uri().unwrap(), "urn:outer");
    r.next_tag().unwrap();
    assert_eq!(r.namespace_uri().unwrap(), "urn:inner");
    assert_eq!(r.namespace_uri_for_prefix("p"), Some("urn:inner"));
    r.next_tag().unwrap();
    r.next_tag().unwrap();
    assert_eq!(r.local_name().unwrap(), "c");
    assert_eq!(r.namespace_uri().unwrap(), "urn:outer");
}

// ============================================================================
// Fehlerhafte Streams
// ============================================================================

#[test]
fn garbage_header_is_rejected() {
    let err = StreamReader::new(&b"<?xml version=\"1.0\"?><a/>"[..]).unwrap_err();
    assert!(matches!(err, Error::MalformedHeader(_)));
}

#[test]
fn truncated_body_is_io_error() {
    let bytes = write_doc(|w| {
        w.write_start_element("a").unwrap();
        w.write_array(&[0i64; 8]).unwrap();
    });
    let cut = &bytes[..bytes.len() - 40];
    let mut r = reader(cut);
    let err = loop {
        match r.next() {
            Ok(EventType::ValueLong) => {
                if let Err(e) = r.read_remaining::<i64>() {
                    break e;
                }
            }
            Ok(_) => {}
            Err(e) => break e,
        }
    };
    assert!(err.is_unexpected_eof());
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn element_end_without_open_element_fails() {
    let bytes = raw_doc(|w| w.write_token_type(TokenType::ElementEnd));
    let mut r = reader(&bytes);
    r.next().unwrap();
    assert!(matches!(r.next(), Err(Error::UnexpectedToken { .. })));
}

/// Element `a` with a Double array declaring `count` items but carrying only two.
fn oversized_array_doc(count: u64) -> Vec<u8> {
    raw_doc(|w| {
        w.write_token_type(TokenType::StringTable);
        w.write_count(1).unwrap();
        w.write_string("a").unwrap();
        w.write_token_type(TokenType::ContentElement);
        w.write_count(0).unwrap();
        w.write_token_type(TokenType::CharContent);
        w.write_u8(crate::value_type::ARRAY_CODE);
        w.write_u8(crate::value_type::DOUBLE_CODE);
        w.write_count(count).unwrap();
        w.write_bytes(&[0u8; 16]);
    })
}

#[test]
fn unread_array_with_overflowing_length_is_format_error() {
    let bytes = oversized_array_doc(i64::MAX as u64);
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    assert_eq!(r.next().unwrap(), EventType::ValueDouble);
    assert_eq!(r.value_length().unwrap(), i64::MAX as u64);
    let err = r.next().unwrap_err();
    assert!(matches!(err, Error::ValueLengthOverflow { value_type: "Double", .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn huge_declared_array_fails_on_missing_bytes() {
    let bytes = oversized_array_doc(1 << 45);
    assert!(bytes.len() < 100);
    let err = super::decode(&bytes).unwrap_err();
    assert!(err.is_unexpected_eof(), "{err:?}");

    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.next().unwrap();
    assert!(r.read_remaining::<f64>().unwrap_err().is_unexpected_eof());
}

// ============================================================================
// Lebenszyklus
// ============================================================================

#[test]
fn close_releases_source() {
    let bytes = write_doc(|w| w.write_start_element("a").unwrap());
    let mut r = reader(&bytes);
    r.next_tag().unwrap();
    r.close().unwrap();
    r.close().unwrap();
    assert!(r.is_closed());
    assert!(!r.has_next());
    assert_eq!(r.next(), Err(Error::StreamClosed));
    assert_eq!(r.name(), Err(Error::StreamClosed));
    assert_eq!(r.value_type(), Err(Error::StreamClosed));
}

// ============================================================================
// Random access
// ============================================================================

fn indexed_doc() -> (Vec<u8>, Vec<u64>) {
    let mut offsets = Vec::new();
    let bytes = write_doc(|w| {
        w.write_start_element("root").unwrap();
        for i in 0..5i32 {
            w.write_start_element("item").unwrap();
            w.write_attribute("n", &i.to_string()).unwrap();
            w.write_start_element("child").unwrap();
            w.write_value(i).unwrap();
            w.write_end_element().unwrap();
            w.write_end_element().unwrap();
        }
    });
    let mut r = reader(&bytes);
    while r.has_next() {
        if r.next().unwrap() == EventType::StartElement && r.local_name().unwrap() == "item" {
            offsets.push(r.token_position());
        }
    }
    (bytes, offsets)
}

#[test]
fn seek_to_recorded_element() {
    let (bytes, offsets) = indexed_doc();
    let mut r = StreamReader::with_random_access(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    assert!(r.supports_random_access());
    assert_eq!(r.string_table().len(), 4);

    for (i, &offset) in offsets.iter().enumerate().rev() {
        assert_eq!(r.set_position(offset).unwrap(), EventType::StartElement);
        assert_eq!(r.depth(), 1);
        assert_eq!(r.local_name().unwrap(), "item");
        assert_eq!(r.attribute_value(0).unwrap(), i.to_string());
        r.next_tag().unwrap();
        r.next().unwrap();
        assert_eq!(r.read_value::<i32>().unwrap(), i as i32);
    }
}

#[test]
fn seek_resyncs_to_next_tag() {
    let (bytes, offsets) = indexed_doc();
    let mut r = StreamReader::with_random_access(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    // Mitten im Element: zuerst kommt das Ende des Kindes.
    r.set_position(offsets[0]).unwrap();
    r.next_tag().unwrap();
    r.next().unwrap();
    let value_offset = r.token_position();
    assert_eq!(r.set_position(value_offset).unwrap(), EventType::EndElement);
    assert_eq!(r.name(), Err(Error::NoOpenElement));
    assert_eq!(r.depth(), 0);
    assert_eq!(r.next_tag().unwrap(), EventType::EndElement);
    assert_eq!(r.next_tag().unwrap(), EventType::StartElement);
    assert_eq!(r.attribute_value(0).unwrap(), "1");
}

#[test]
fn element_position_tracks_innermost_element() {
    let (bytes, offsets) = indexed_doc();
    let mut r = reader(&bytes);
    assert_eq!(r.element_position(), Err(Error::NoOpenElement));
    r.next_tag().unwrap();
    let root = r.element_position().unwrap();
    assert_eq!(root, r.token_position());
    r.next_tag().unwrap();
    assert_eq!(r.element_position().unwrap(), offsets[0]);
    r.next_tag().unwrap();
    assert_eq!(r.local_name().unwrap(), "child");
    assert_ne!(r.element_position().unwrap(), offsets[0]);
    assert_eq!(r.next_tag().unwrap(), EventType::EndElement);
    assert_eq!(r.element_position().unwrap(), offsets[0]);

    let mut ra = StreamReader::with_random_access(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    ra.set_position(offsets[3]).unwrap();
    assert_eq!(ra.element_position().unwrap(), offsets[3]);
}

#[test]
fn seek_to_root_keeps_strict_prefix_checks() {
    let bytes = write_doc(|w| {
        w.write_start_element("q:a").unwrap();
        w.write_start_element("q:b").unwrap();
    });
    let unaware = ReaderConfig::default().with_namespace_aware(false);
    let mut scan = StreamReader::with_config(bytes.as_slice(), unaware).unwrap();
    let mut offsets = Vec::new();
    while scan.has_next() {
        if scan.next().unwrap() == EventType::StartElement {
            offsets.push(scan.token_position());
        }
    }
    assert_eq!(offsets.len(), 2);

    let mut r = StreamReader::with_random_access(Cursor::new(bytes), ReaderConfig::default()).unwrap();
    // Unterhalb der Wurzel kann der Prefix von einem Vorfahren stammen.
    assert_eq!(r.set_position(offsets[1]).unwrap(), EventType::StartElement);
    assert_eq!(r.namespace_uri().unwrap(), "");
    // Die Wurzel hat keine Vorfahren: ungebundener Prefix ist ein Fehler.
    assert_eq!(r.set_position(offsets[0]), Err(Error::UnboundPrefix("q".into())));
}

#[test]
fn random_access_requires_index() {
    let config = WriterConfig::default().with_random_access_index(false);
    let mut w = StreamWriter::with_config(Vec::new(), EncodingOptions::default(), config).unwrap();
    w.write_start_element("a").unwrap();
    let bytes = w.into_inner().unwrap();
    let err = StreamReader::with_random_access(Cursor::new(bytes.clone()), ReaderConfig::default()).unwrap_err();
    assert_eq!(err, Error::RandomAccessUnsupported);

    let mut r = StreamReader::new(Cursor::new(bytes)).unwrap();
    assert!(!r.supports_random_access());
    assert_eq!(r.set_position(0), Err(Error::RandomAccessUnsupported));
}

#[test]
fn compressed_streams_are_not_seekable() {
    let options = EncodingOptions::default().with_compression();
    let mut w = StreamWriter::new(Vec::new(), options).unwrap();
    w.write_start_element("a").unwrap();
    let bytes = w.into_inner().unwrap();
    let err = StreamReader::with_random_access(Cursor::new(bytes), ReaderConfig::default()).unwrap_err();
    assert_eq!(err, Error::RandomAccessUnsupported);
}
