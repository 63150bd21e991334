use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;
use tessera_join::{
    ArrayRowAdapter, IndexedTable, JoinError, MapRowAdapter, RowBasedIndexedTable, RowSignature,
    Value, ValueType,
};

fn people() -> Vec<HashMap<String, Value>> {
    [(1i64, "a"), (2, "b"), (1, "c")]
        .into_iter()
        .map(|(id, name)| {
            HashMap::from([
                ("id".to_string(), Value::from(id)),
                ("name".to_string(), Value::from(name)),
            ])
        })
        .collect()
}

fn people_signature() -> RowSignature {
    RowSignature::new([("id", ValueType::Long), ("name", ValueType::String)]).unwrap()
}

fn position(table: &impl IndexedTable, name: &str) -> usize {
    table
        .column_position(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
}

#[test]
fn long_key_lookup_returns_positions_in_row_order() {
    let table =
        RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["id"]).unwrap();
    let index = table.column_index(position(&table, "id")).unwrap();

    assert_eq!(index.value_type(), ValueType::Long);
    assert_eq!(index.find(&Value::from(1i64)), &[0, 2]);
    assert_eq!(index.find(&Value::from(2i64)), &[1]);
    assert!(index.find(&Value::from(3i64)).is_empty());
    assert_eq!(index.distinct_keys(), 2);
}

#[test]
fn lookup_keys_are_converted_to_the_column_type() {
    let table =
        RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["id"]).unwrap();
    let index = table.column_index(position(&table, "id")).unwrap();

    assert_eq!(index.find(&Value::from("1")), &[0, 2]);
    assert_eq!(index.find(&Value::from(2.0f64)), &[1]);
    assert!(index.find(&Value::from("not a number")).is_empty());
    assert!(index.find(&Value::Null).is_empty());
}

#[test]
fn duplicate_key_columns_are_rejected() {
    let err = RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["x", "x"])
        .unwrap_err();
    assert_eq!(
        err,
        JoinError::DuplicateKeyColumns {
            key_columns: vec!["x".to_string(), "x".to_string()]
        }
    );
}

#[test]
fn key_columns_must_be_declared() {
    let err = RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["age"])
        .unwrap_err();
    assert_eq!(
        err,
        JoinError::UnknownKeyColumn {
            column: "age".to_string(),
            columns: vec!["id".to_string(), "name".to_string()]
        }
    );
    assert_eq!(
        err.to_string(),
        "key column age must be contained in row signature [id, name]"
    );
}

#[test]
fn non_key_column_has_no_index() {
    let table =
        RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["id"]).unwrap();
    let name = position(&table, "name");
    assert_eq!(
        table.column_index(name).unwrap_err(),
        JoinError::NotAKeyColumn { position: name }
    );
    assert_eq!(
        table.column_index(7).unwrap_err(),
        JoinError::InvalidColumn {
            position: 7,
            columns: 2
        }
    );
}

#[test]
fn accessors_expose_the_built_table() {
    let signature = RowSignature::new([
        ("zeta", ValueType::Double),
        ("alpha", ValueType::String),
        ("mid", ValueType::Long),
    ])
    .unwrap();
    let adapter = ArrayRowAdapter::new(["zeta", "alpha", "mid"]);
    let rows = vec![vec![Value::from(0.5f64), Value::from("x"), Value::from(3i64)]];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature.clone(), ["mid", "alpha"])
        .unwrap();

    assert_eq!(table.all_columns(), &["alpha", "mid", "zeta"]);
    assert_eq!(table.key_columns(), &["mid", "alpha"]);
    assert_eq!(table.row_signature(), &signature);
    assert_eq!(table.num_rows(), 1);
    assert_eq!(table.rows().len(), 1);
}

#[test]
fn column_reader_returns_raw_values_for_any_column() {
    let table =
        RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["id"]).unwrap();
    let names = table.column_reader(position(&table, "name")).unwrap();
    let values: Vec<Option<Value>> = (0..4).map(|row| names.read(row)).collect();
    assert_eq!(
        values,
        vec![
            Some(Value::from("a")),
            Some(Value::from("b")),
            Some(Value::from("c")),
            None
        ]
    );
}

#[test]
fn string_keys_skip_nulls_and_empty_strings() {
    let signature = RowSignature::new([("code", ValueType::String)]).unwrap();
    let adapter = ArrayRowAdapter::new(["code"]);
    let rows = vec![
        vec![Value::from("us")],
        vec![Value::Null],
        vec![Value::from("")],
        vec![],
        vec![Value::from("us")],
        vec![Value::from(44i64)],
    ];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["code"]).unwrap();
    let index = table.column_index(0).unwrap();

    assert_eq!(index.find(&Value::from("us")), &[0, 4]);
    assert_eq!(index.find(&Value::from(44i64)), &[5]);
    assert_eq!(index.find(&Value::from("44")), &[5]);
    assert!(index.find(&Value::from("")).is_empty());
    assert_eq!(index.distinct_keys(), 2);
}

#[test]
fn float_and_double_keys() {
    let signature =
        RowSignature::new([("f", ValueType::Float), ("d", ValueType::Double)]).unwrap();
    let adapter = ArrayRowAdapter::new(["f", "d"]);
    let rows = vec![
        vec![Value::from(1.5f32), Value::from(0.25f64)],
        vec![Value::from("1.5"), Value::from(2i64)],
        vec![Value::Null, Value::from("0.25")],
    ];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["f", "d"]).unwrap();

    let d = table.column_index(position(&table, "d")).unwrap();
    assert_eq!(d.find(&Value::from(0.25f64)), &[0, 2]);
    assert_eq!(d.find(&Value::from(2i64)), &[1]);

    let f = table.column_index(position(&table, "f")).unwrap();
    assert_eq!(f.value_type(), ValueType::Float);
    assert_eq!(f.find(&Value::from(1.5f64)), &[0, 1]);
    assert!(f.find(&Value::Null).is_empty());
}

#[test]
fn nan_and_signed_zero_are_ordinary_double_keys() {
    let signature = RowSignature::new([("d", ValueType::Double)]).unwrap();
    let adapter = ArrayRowAdapter::new(["d"]);
    let rows = vec![
        vec![Value::from(f64::NAN)],
        vec![Value::from(-0.0f64)],
        vec![Value::from("NaN")],
        vec![Value::from(1.0f64)],
    ];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["d"]).unwrap();
    let index = table.column_index(0).unwrap();

    assert_eq!(index.find(&Value::from(f64::NAN)), &[0, 2]);
    assert_eq!(index.find(&Value::from("NaN")), &[0, 2]);
    assert_eq!(index.find(&Value::from(0.0f64)), &[1]);
    assert_eq!(index.find(&Value::from(-0.0f64)), &[1]);
    assert_eq!(index.find(&Value::from(0i64)), &[1]);
    assert_eq!(index.distinct_keys(), 3);
}

#[test]
fn nan_is_a_float_key_too() {
    let signature = RowSignature::new([("f", ValueType::Float)]).unwrap();
    let adapter = ArrayRowAdapter::new(["f"]);
    let rows = vec![vec![Value::from(f32::NAN)], vec![Value::from(-0.0f32)]];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["f"]).unwrap();
    let index = table.column_index(0).unwrap();

    assert_eq!(index.find(&Value::from(f64::NAN)), &[0]);
    assert_eq!(index.find(&Value::from(0.0f32)), &[1]);
}

#[test]
fn unknown_adapter_column_reads_as_null() {
    let signature = RowSignature::new([("id", ValueType::Long)]).unwrap();
    let adapter = ArrayRowAdapter::new(["other"]);
    let rows = vec![vec![Value::from(1i64)]];
    let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["id"]).unwrap();

    assert_eq!(table.column_index(0).unwrap().distinct_keys(), 0);
    assert_eq!(table.column_reader(0).unwrap().read(0), Some(Value::Null));
}

#[test]
fn table_is_shareable_as_a_trait_object() {
    let table: Box<dyn IndexedTable> = Box::new(
        RowBasedIndexedTable::new(people(), &MapRowAdapter, people_signature(), ["id", "name"])
            .unwrap(),
    );
    let name = table.column_position("name").unwrap();
    let index = table.column_index(name).unwrap();
    assert_eq!(index.find(&Value::from("c")), &[2]);
}

proptest! {
    #[test]
    fn every_non_null_key_finds_its_row(keys in prop::collection::vec(prop::option::of(-20i64..20), 0..200)) {
        let signature = RowSignature::new([("k", ValueType::Long)]).unwrap();
        let adapter = ArrayRowAdapter::new(["k"]);
        let rows: Vec<Vec<Value>> = keys.iter().map(|k| vec![Value::from(*k)]).collect();
        let table = RowBasedIndexedTable::new(rows, &adapter, signature, ["k"]).unwrap();
        let index = table.column_index(0).unwrap();

        for (row, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                let found = index.find(&Value::from(*key));
                prop_assert!(found.contains(&row));
                prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
            }
        }
        prop_assert!(index.find(&Value::from(1_000i64)).is_empty());
    }
}
