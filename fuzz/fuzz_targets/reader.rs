#![no_main]
use libfuzzer_sys::fuzz_target;

use bxml::{EventType, StreamReader};

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = StreamReader::new(data) else { return };
    while reader.has_next() {
        match reader.next() {
            Ok(event) if event.carries_value() => {
                let _ = reader.read_string_value();
            }
            Ok(EventType::StartElement) => {
                let _ = reader.attribute_count();
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    let _ = bxml::decode(data);
});
