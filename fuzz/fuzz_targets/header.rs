#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = bxml::io::ByteReader::new(data, bxml::ByteOrder::BigEndian, bxml::Charset::utf8());
    let _ = bxml::Header::decode(&mut reader);
});
