//! Fuzz target: `decode_updates` (Telegram `getUpdates` body)
//!
//! The response body is untrusted network input.
//!
//! Invariants checked:
//! - No panics or unbounded allocation under any byte sequence
//! - A decoded batch never has more entries than the input has bytes
//!
//! cargo fuzz run fuzz_updates_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use linealarm::adapters::telegram::decode_updates;

fuzz_target!(|data: &[u8]| {
    if let Ok(batch) = decode_updates(data) {
        assert!(batch.len() <= data.len());
    }
});
