use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tessera_columnar::{
    ByteOrder, ColumnarError, CompressedIntsReader, CompressedIntsWriter, CompressionStrategy,
    INTS_VERSION, MAX_INTS_IN_BUFFER,
};

fn write_column(
    values: &[i32],
    capacity: usize,
    order: ByteOrder,
    compression: CompressionStrategy,
) -> (CompressedIntsWriter, Vec<u8>) {
    let mut writer = CompressedIntsWriter::new(capacity, order, compression).expect("writer");
    writer.open();
    for &v in values {
        writer.add_value(v).expect("add value");
    }
    let mut out = Vec::new();
    writer.write_to(&mut out).expect("write column");
    (writer, out)
}

#[test]
fn header_layout_is_fixed() {
    let (_, bytes) = write_column(
        &[1, 2, 3, 4, 5],
        2,
        ByteOrder::BigEndian,
        CompressionStrategy::Uncompressed,
    );

    assert_eq!(bytes[0], INTS_VERSION);
    assert_eq!(&bytes[1..5], &5i32.to_be_bytes());
    assert_eq!(&bytes[5..9], &2i32.to_be_bytes());
    assert_eq!(bytes[9], CompressionStrategy::Uncompressed.id());

    // Block container: version, flags, three chunks, 20 payload bytes.
    assert_eq!(&bytes[10..12], &[0x01, 0x00]);
    assert_eq!(&bytes[12..16], &3i32.to_be_bytes());
    assert_eq!(&bytes[16..20], &20i32.to_be_bytes());
    assert_eq!(&bytes[20..24], &8i32.to_be_bytes());
    assert_eq!(&bytes[24..28], &16i32.to_be_bytes());
    assert_eq!(&bytes[28..32], &20i32.to_be_bytes());
    assert_eq!(&bytes[32..36], &1i32.to_be_bytes());
    assert_eq!(bytes.len(), 52);
}

#[test]
fn little_endian_header() {
    let (_, bytes) = write_column(&[7], 4, ByteOrder::LittleEndian, CompressionStrategy::Lz4);
    assert_eq!(&bytes[1..5], &1i32.to_le_bytes());
    assert_eq!(&bytes[5..9], &4i32.to_le_bytes());
    assert_eq!(bytes[9], CompressionStrategy::Lz4.id());
}

#[test]
fn chunk_count_follows_capacity() {
    for (count, capacity, expected) in [
        (0usize, 4usize, 0usize),
        (1, 4, 1),
        (4, 4, 1),
        (5, 4, 2),
        (8, 4, 2),
        (9, 4, 3),
        (10, 1, 10),
    ] {
        let values: Vec<i32> = (0..count as i32).collect();
        let (writer, bytes) = write_column(
            &values,
            capacity,
            ByteOrder::LittleEndian,
            CompressionStrategy::Zstd,
        );
        assert_eq!(writer.num_chunks(), expected, "{count} values at {capacity}");

        let reader = CompressedIntsReader::from_bytes(&bytes, ByteOrder::LittleEndian).unwrap();
        assert_eq!(reader.num_chunks(), expected);
        assert_eq!(reader.len(), count);
        assert_eq!(reader.to_vec().unwrap(), values);
    }
}

#[test]
fn serialized_size_flushes_once() {
    let mut writer =
        CompressedIntsWriter::new(3, ByteOrder::BigEndian, CompressionStrategy::Uncompressed)
            .unwrap();
    writer.open();
    for v in 0..7 {
        writer.add_value(v).unwrap();
    }
    let first = writer.serialized_size().unwrap();
    let second = writer.serialized_size().unwrap();
    assert_eq!(first, second);
    assert_eq!(writer.num_chunks(), 3);

    let mut a = Vec::new();
    writer.write_to(&mut a).unwrap();
    let mut b = Vec::new();
    writer.write_to(&mut b).unwrap();
    assert_eq!(a.len() as u64, first);
    assert_eq!(a, b);
    assert_eq!(writer.num_chunks(), 3);
}

#[test]
fn zero_chunk_capacity_is_rejected() {
    let err = CompressedIntsWriter::new(0, ByteOrder::LittleEndian, CompressionStrategy::Lz4)
        .unwrap_err();
    assert!(matches!(err, ColumnarError::ZeroChunkCapacity));
    assert_eq!(err.to_string(), "chunk capacity must be positive");
}

#[test]
fn lifecycle_misuse_is_reported() {
    let mut writer = CompressedIntsWriter::create(CompressionStrategy::Lz4);
    assert_eq!(writer.chunk_capacity(), MAX_INTS_IN_BUFFER);
    assert!(matches!(writer.add_value(1), Err(ColumnarError::NotOpen)));
    assert!(matches!(writer.serialized_size(), Err(ColumnarError::NotOpen)));

    writer.open();
    writer.add_value(1).unwrap();
    writer.serialized_size().unwrap();
    assert!(matches!(writer.add_value(2), Err(ColumnarError::Closed)));
    assert_eq!(writer.size(), 1);
}

#[test]
fn random_access_decodes_only_the_target_chunk() {
    let values: Vec<i32> = (0..50_000).map(|i| i * 31 - 700_000).collect();
    let (_, bytes) = write_column(
        &values,
        MAX_INTS_IN_BUFFER,
        ByteOrder::LittleEndian,
        CompressionStrategy::Lz4,
    );
    let reader = CompressedIntsReader::from_bytes(&bytes, ByteOrder::LittleEndian).unwrap();
    assert_eq!(reader.num_chunks(), 4);
    assert_eq!(reader.chunk_capacity(), MAX_INTS_IN_BUFFER);
    for index in [0, 16_383, 16_384, 32_768, 49_999] {
        assert_eq!(reader.get(index).unwrap(), values[index]);
    }
    assert!(reader.get(50_000).is_err());
}

#[test]
fn reader_rejects_foreign_versions_and_ids() {
    let (_, mut bytes) = write_column(
        &[1, 2, 3],
        2,
        ByteOrder::LittleEndian,
        CompressionStrategy::Uncompressed,
    );

    let mut wrong_version = bytes.clone();
    wrong_version[0] = 0x7F;
    assert!(matches!(
        CompressedIntsReader::from_bytes(&wrong_version, ByteOrder::LittleEndian),
        Err(ColumnarError::UnsupportedVersion { found: 0x7F, .. })
    ));

    bytes[9] = 0x42;
    assert!(matches!(
        CompressedIntsReader::from_bytes(&bytes, ByteOrder::LittleEndian),
        Err(ColumnarError::UnknownCompression(0x42))
    ));
}

proptest! {
    #[test]
    fn full_and_partial_chunks(
        values in prop::collection::vec(any::<i32>(), 0..400),
        capacity in 1usize..64,
        big_endian in any::<bool>(),
    ) {
        let order = if big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
        let (writer, bytes) = write_column(&values, capacity, order, CompressionStrategy::Lz4);

        let full = values.len() / capacity;
        let partial = usize::from(values.len() % capacity != 0);
        prop_assert_eq!(writer.num_chunks(), full + partial);

        let reader = CompressedIntsReader::from_bytes(&bytes, order).unwrap();
        prop_assert_eq!(reader.to_vec().unwrap(), values);
    }
}
