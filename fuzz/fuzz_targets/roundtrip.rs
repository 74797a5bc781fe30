#![no_main]
use libfuzzer_sys::fuzz_target;

use bxml::{decode, encode, EncodingOptions};

fuzz_target!(|data: &[u8]| {
    // Jedes dekodierbare Dokument muss sich identisch neu kodieren lassen.
    if let Ok(events) = decode(data) {
        if let Ok(bytes) = encode(&events, &EncodingOptions::default()) {
            let again = decode(&bytes).expect("re-encoded stream must decode");
            assert_eq!(again, events);
        }
    }
});
