#![no_main]
use libfuzzer_sys::fuzz_target;

use bxml::io::{ByteReader, ByteWriter};
use bxml::{ByteOrder, Charset};

fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data, ByteOrder::BigEndian, Charset::utf8());
    if let Ok(value) = bxml::count::read(&mut reader) {
        // Gelesene Counts muessen sich wieder schreiben lassen.
        let mut w = ByteWriter::new(ByteOrder::BigEndian, Charset::utf8());
        bxml::count::write(&mut w, value).unwrap();
        let mut back = ByteReader::new(w.as_slice(), ByteOrder::BigEndian, Charset::utf8());
        assert_eq!(bxml::count::read(&mut back).unwrap(), value);
    }
});
