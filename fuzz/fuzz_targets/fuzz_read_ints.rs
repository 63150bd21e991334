#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_columnar::{ByteOrder, CompressedIntsReader};

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

    let Ok(reader) = CompressedIntsReader::from_bytes(&data[1..], order) else {
        return;
    };
    if let Ok(values) = reader.to_vec() {
        assert_eq!(values.len(), reader.len());
        for (idx, &v) in values.iter().enumerate().step_by(97) {
            assert_eq!(reader.get(idx).ok(), Some(v));
        }
    }
});
