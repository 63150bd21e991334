#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_columnar::{ByteOrder, CompressedLongsReader};

/// Readers must reject arbitrary bytes with an error, never a panic.
const MAX_INPUT_BYTES: usize = 1 << 20;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > MAX_INPUT_BYTES {
        return;
    }
    let order = if data[0] & 1 == 0 {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };

    let Ok(reader) = CompressedLongsReader::from_bytes(&data[1..], order) else {
        return;
    };
    if let Ok(values) = reader.to_vec() {
        assert_eq!(values.len(), reader.len());
        if let Some(&last) = values.last() {
            assert_eq!(reader.get(values.len() - 1).ok(), Some(last));
        }
    }
    let _ = reader.get(reader.len());
});
