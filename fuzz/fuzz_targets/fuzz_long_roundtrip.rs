#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_columnar::{
    ByteOrder, CompressedLongsReader, CompressionStrategy, IntermediateLongSerializer,
    LongSerializer, SerializerOptions,
};

/// Every sequence written through the adaptive serializer must decode back unchanged.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let compression = match selector & 0b11 {
        0 => CompressionStrategy::Lz4,
        1 => CompressionStrategy::Zstd,
        2 => CompressionStrategy::Uncompressed,
        _ => CompressionStrategy::None,
    };
    let byte_order = if selector & 0b100 == 0 {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };
    let table_cap = usize::from(selector >> 3);

    let values: Vec<i64> = rest
        .chunks(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            i64::from_le_bytes(buf)
        })
        .collect();

    let options = SerializerOptions {
        byte_order,
        compression,
    };
    let mut serializer = IntermediateLongSerializer::with_max_table_size(options, table_cap);
    serializer.open().expect("open");
    for &v in &values {
        serializer.add(v).expect("add");
    }
    let mut bytes = Vec::new();
    serializer.write_to(&mut bytes).expect("write");
    assert_eq!(serializer.serialized_size().expect("size"), bytes.len() as u64);

    let reader = CompressedLongsReader::from_bytes(&bytes, byte_order).expect("read back");
    assert_eq!(reader.to_vec().expect("decode"), values);
});
