pub type JoinResult<T> = Result<T, JoinError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("duplicate column in row signature: {column}")]
    DuplicateColumn { column: String },

    #[error("key columns [{}] must not contain duplicates", .key_columns.join(", "))]
    DuplicateKeyColumns { key_columns: Vec<String> },

    #[error(
        "key column {column} must be contained in row signature [{}]",
        .columns.join(", ")
    )]
    UnknownKeyColumn { column: String, columns: Vec<String> },

    #[error("column {position} is not a key column")]
    NotAKeyColumn { position: usize },

    #[error("column {position} is not a valid column (table has {columns} columns)")]
    InvalidColumn { position: usize, columns: usize },
}
