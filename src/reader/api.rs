//! Batch decoding into owned events.

use std::rc::Rc;

use super::{ReaderConfig, StreamReader};
use crate::event::{AtContent, Event, EventType, NsContent};
use crate::value::Value;
use crate::value_type::ValueType;
use crate::{Error, Result};

/// Decodes a complete BXML document (namespace-aware).
pub fn decode(data: &[u8]) -> Result<Vec<Event>> {
    decode_with_config(data, ReaderConfig::default())
}

/// Decodes a complete BXML document with an explicit reader configuration.
///
/// After each `StartElement` the element's namespace declarations and then
/// its attributes follow as separate events.
pub fn decode_with_config(data: &[u8], config: ReaderConfig) -> Result<Vec<Event>> {
    let mut reader = StreamReader::with_config(data, config)?;
    let mut events = Vec::new();
    while reader.has_next() {
        let event = match reader.next()? {
            EventType::StartDocument => Event::StartDocument,
            EventType::EndDocument => Event::EndDocument,
            EventType::StartElement => {
                events.push(Event::StartElement(Rc::clone(reader.name()?)));
                for i in 0..reader.namespace_count()? {
                    events.push(Event::Namespace(NsContent {
                        prefix: Rc::from(reader.namespace_prefix(i)?),
                        uri: Rc::from(reader.namespace_uri_at(i)?),
                    }));
                }
                for i in 0..reader.attribute_count()? {
                    events.push(Event::Attribute(AtContent {
                        qname: Rc::clone(reader.attribute_name(i)?),
                        value: Rc::from(reader.attribute_value(i)?),
                    }));
                }
                continue;
            }
            EventType::EndElement => Event::EndElement,
            EventType::Comment => Event::Comment(Rc::from(reader.read_string_value()?)),
            EventType::Space => Event::Space(Rc::from(reader.read_string_value()?)),
            EventType::ValueCdata => Event::CData(Rc::from(reader.read_string_value()?)),
            event if event.is_value() => Event::Value(read_owned_value(&mut reader)?),
            other => return Err(Error::unexpected_event("stream event", other.name())),
        };
        events.push(event);
    }
    Ok(events)
}

fn read_owned_value(reader: &mut StreamReader<&[u8]>) -> Result<Value> {
    let value_type = reader.value_type()?;
    if reader.is_array()? {
        return Ok(match value_type {
            ValueType::Bool => Value::BoolArray(reader.read_remaining()?),
            ValueType::Byte => Value::ByteArray(reader.read_remaining()?),
            ValueType::Long => Value::LongArray(reader.read_remaining()?),
            ValueType::Float => Value::FloatArray(reader.read_remaining()?),
            ValueType::Double => Value::DoubleArray(reader.read_remaining()?),
            _ => Value::IntArray(reader.read_remaining()?),
        });
    }
    Ok(match value_type {
        ValueType::Bool => Value::Bool(reader.read_value()?),
        ValueType::Byte => Value::Byte(reader.read_value()?),
        ValueType::Long => Value::Long(reader.read_value()?),
        ValueType::Float => Value::Float(reader.read_value()?),
        ValueType::Double => Value::Double(reader.read_value()?),
        ValueType::String => Value::String(Rc::from(reader.read_string_value()?)),
        _ => Value::Int(reader.read_value()?),
    })
}
