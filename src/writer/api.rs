//! Batch encoding of an event sequence.

use super::{StreamWriter, WriterConfig};
use crate::event::Event;
use crate::options::EncodingOptions;
use crate::value::Value;
use crate::Result;

/// Encodes `events` into a complete BXML document.
///
/// Names are written with their qualified text; `Namespace` events become
/// `xmlns` declarations of the preceding element. A missing `EndDocument`
/// is added.
///
/// # Beispiel
///
/// ```
/// use bxml::event::Event;
/// use bxml::options::EncodingOptions;
/// use bxml::reader::decode;
/// use bxml::writer::encode;
///
/// let events = vec![
///     Event::StartDocument,
///     Event::start("a"),
///     Event::attribute("id", "7"),
///     Event::EndElement,
///     Event::EndDocument,
/// ];
/// let bytes = encode(&events, &EncodingOptions::default()).unwrap();
/// assert_eq!(decode(&bytes).unwrap(), events);
/// ```
pub fn encode(events: &[Event], options: &EncodingOptions) -> Result<Vec<u8>> {
    let config = WriterConfig::default().with_namespace_aware(false);
    let mut writer = StreamWriter::with_config(Vec::new(), options.clone(), config)?;
    for event in events {
        match event {
            Event::StartDocument => writer.write_start_document()?,
            Event::EndDocument => writer.write_end_document()?,
            Event::StartElement(name) => writer.write_start_element(&name.qualified_name())?,
            Event::EndElement => writer.write_end_element()?,
            Event::Namespace(ns) => writer.write_namespace(&ns.prefix, &ns.uri)?,
            Event::Attribute(at) => writer.write_attribute(&at.qname.qualified_name(), &at.value)?,
            Event::Value(value) => write_owned_value(&mut writer, value)?,
            Event::CData(text) => writer.write_cdata(text)?,
            Event::Comment(text) => writer.write_comment(text)?,
            Event::Space(text) => writer.write_space(text)?,
        }
    }
    writer.into_inner()
}

fn write_owned_value(writer: &mut StreamWriter<Vec<u8>>, value: &Value) -> Result<()> {
    match value {
        Value::Bool(v) => writer.write_value(*v),
        Value::Byte(v) => writer.write_value(*v),
        Value::Int(v) => writer.write_value(*v),
        Value::Long(v) => writer.write_value(*v),
        Value::Float(v) => writer.write_value(*v),
        Value::Double(v) => writer.write_value(*v),
        Value::String(s) => writer.write_string_value(s),
        Value::BoolArray(v) => writer.write_array(v),
        Value::ByteArray(v) => writer.write_array(v),
        Value::IntArray(v) => writer.write_array(v),
        Value::LongArray(v) => writer.write_array(v),
        Value::FloatArray(v) => writer.write_array(v),
        Value::DoubleArray(v) => writer.write_array(v),
    }
}
