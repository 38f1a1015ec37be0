//! Error taxonomy.
//!
//! Every failure is a plain value with a stable `code`, a filled message and a
//! structured `details` payload. Serialized, an error looks like
//! `{"code": "SCHEMA_NAME_INVALID", "details": {"name": "ab", ...}}`.

use serde::{Deserialize, Serialize};

use crate::model::{Cardinality, ConstraintKind, RelationshipKind};
use crate::vendor::Vendor;

/// How a caller should treat a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    /// An id did not resolve.
    NotFound,
    /// Name, format, length or sequence violation; retry after correcting.
    InvalidShape,
    /// Uniqueness violation; refresh and retry with another value.
    Conflict,
    /// Rejected by domain policy.
    DomainIncompatibility,
}

/// Declares one error family: the enum, its wire codes and error classes.
macro_rules! error_family {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } = ($code:tt, $class:ident)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
        #[serde(tag = "code", content = "details", rename_all_fields = "camelCase")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $code)]
                $variant { $($field: $ty),* },
            )*
        }

        impl $name {
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => $code,)*
                }
            }

            pub fn class(&self) -> ErrorClass {
                match self {
                    $(Self::$variant { .. } => ErrorClass::$class,)*
                }
            }
        }
    };
}

error_family! {
    pub enum SchemaError {
        #[error("schema '{schema_id}' does not exist")]
        NotExist { schema_id: String } = ("SCHEMA_NOT_EXIST", NotFound),

        #[error("schema id '{schema_id}' is already in use")]
        AlreadyExist { schema_id: String } = ("SCHEMA_ALREADY_EXIST", Conflict),

        #[error("schema name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("SCHEMA_NAME_INVALID", InvalidShape),

        #[error("schema name '{name}' is already used by schema '{schema_id}'")]
        NameNotUnique { name: String, schema_id: String } = ("SCHEMA_NAME_NOT_UNIQUE", Conflict),

        #[error("schema '{schema_id}' is already named '{name}'")]
        NameUnchanged { schema_id: String, name: String } = ("SCHEMA_NAME_UNCHANGED", InvalidShape),

        #[error("schema '{schema_id}' still owns {table_count} table(s) and cannot be deleted")]
        InUse { schema_id: String, table_count: usize } = ("SCHEMA_IN_USE", Conflict),

        #[error("schema '{schema_id}' is the last schema of the database and cannot be deleted")]
        DatabaseEmptySchema { schema_id: String } = ("SCHEMA_DATABASE_EMPTY_SCHEMA", Conflict),

        #[error("vendor {vendor} of schema '{schema_id}' is not supported")]
        VendorUnsupported { schema_id: String, vendor: Vendor } = ("SCHEMA_VENDOR_UNSUPPORTED", DomainIncompatibility),
    }
}

error_family! {
    pub enum TableError {
        #[error("table '{table_id}' does not exist in schema '{schema_id}'")]
        NotExist { schema_id: String, table_id: String } = ("TABLE_NOT_EXIST", NotFound),

        #[error("table id '{table_id}' is already in use")]
        AlreadyExist { table_id: String } = ("TABLE_ALREADY_EXIST", Conflict),

        #[error("table name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("TABLE_NAME_INVALID", InvalidShape),

        #[error("table name '{name}' is already used by table '{table_id}'")]
        NameNotUnique { name: String, table_id: String } = ("TABLE_NAME_NOT_UNIQUE", Conflict),

        #[error("table '{table_id}' is referenced by relationship '{relationship_id}'")]
        InUse { table_id: String, relationship_id: String } = ("TABLE_IN_USE", Conflict),
    }
}

error_family! {
    pub enum ColumnError {
        #[error("column '{column_id}' does not exist in table '{table_id}'")]
        NotExist { table_id: String, column_id: String } = ("COLUMN_NOT_EXIST", NotFound),

        #[error("column id '{column_id}' is already in use")]
        AlreadyExist { column_id: String } = ("COLUMN_ALREADY_EXIST", Conflict),

        #[error("column name '{name}' is already used by column '{column_id}' in table '{table_id}'")]
        NameNotUnique { name: String, table_id: String, column_id: String } = ("COLUMN_NAME_NOT_UNIQUE", Conflict),

        #[error("column name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("COLUMN_NAME_INVALID", InvalidShape),

        #[error("column name '{name}' must start with a letter and contain only letters, digits and underscores")]
        NameInvalidFormat { name: String } = ("COLUMN_NAME_INVALID_FORMAT", InvalidShape),

        #[error("column name '{name}' is a reserved keyword in {vendor}")]
        ReservedKeyword { name: String, vendor: Vendor } = ("COLUMN_RESERVED_KEYWORD", InvalidShape),

        #[error("column '{column_id}' requires a data type")]
        DataTypeRequired { column_id: String } = ("COLUMN_DATA_TYPE_REQUIRED", InvalidShape),

        #[error("data type '{data_type}' is not supported by {vendor}")]
        DataTypeInvalid { data_type: String, vendor: Vendor } = ("COLUMN_DATA_TYPE_INVALID", InvalidShape),

        #[error("data type {data_type} requires a length")]
        LengthRequired { data_type: String } = ("COLUMN_LENGTH_REQUIRED", InvalidShape),

        #[error("data type {data_type} requires a precision")]
        PrecisionRequired { data_type: String } = ("COLUMN_PRECISION_REQUIRED", InvalidShape),

        #[error("'{length_scale}' is not a valid length for data type {data_type}")]
        LengthScaleInvalid { data_type: String, length_scale: String } = ("COLUMN_LENGTH_SCALE_INVALID", InvalidShape),

        #[error("table '{table_id}' already has an auto-increment column '{column_id}'")]
        MultipleAutoIncrement { table_id: String, column_id: String } = ("COLUMN_MULTIPLE_AUTO_INCREMENT", Conflict),

        #[error("column '{column_id}' of type {data_type} cannot be auto-increment")]
        AutoIncrementNotInteger { column_id: String, data_type: String } = ("COLUMN_AUTO_INCREMENT_NOT_INTEGER", DomainIncompatibility),

        #[error("cannot change column '{column_id}' from {from} to {to}: {reason}")]
        TypeIncompatible {
            column_id: String,
            from: String,
            to: String,
            reason: String,
        } = ("COLUMN_TYPE_INCOMPATIBLE", DomainIncompatibility),

        #[error("position {position} for column '{column_id}' is outside 1..={max}")]
        PositionOutOfRange { column_id: String, position: u32, max: u32 } = ("COLUMN_POSITION_OUT_OF_RANGE", InvalidShape),

        #[error("column '{column_id}' is referenced by '{referenced_by}'")]
        InUse { column_id: String, referenced_by: String } = ("COLUMN_IN_USE", Conflict),
    }
}

error_family! {
    pub enum IndexError {
        #[error("index '{index_id}' does not exist in table '{table_id}'")]
        NotExist { table_id: String, index_id: String } = ("INDEX_NOT_EXIST", NotFound),

        #[error("index id '{index_id}' is already in use")]
        AlreadyExist { index_id: String } = ("INDEX_ALREADY_EXIST", Conflict),

        #[error("index name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("INDEX_NAME_INVALID", InvalidShape),

        #[error("index name '{name}' is already used by index '{index_id}'")]
        NameNotUnique { name: String, index_id: String } = ("INDEX_NAME_NOT_UNIQUE", Conflict),

        #[error("index type '{index_type}' is not supported by {vendor}")]
        TypeInvalid { index_type: String, vendor: Vendor } = ("INDEX_TYPE_INVALID", InvalidShape),

        #[error("column '{column_id}' appears more than once in index '{index_id}'")]
        ColumnNotUniqueInIndex { index_id: String, column_id: String } = ("INDEX_COLUMN_NOT_UNIQUE_IN_INDEX", Conflict),

        #[error("index '{index_id}' duplicates the definition of index '{existing_index_id}'")]
        DuplicateIndexDefinition { index_id: String, existing_index_id: String } = ("INDEX_DUPLICATE_INDEX_DEFINITION", Conflict),

        #[error("index '{index_id}' references missing column '{column_id}'")]
        ColumnNotExist { index_id: String, column_id: String } = ("INDEX_COLUMN_NOT_EXIST", NotFound),

        #[error("index '{index_id}' has sequence number {seq_no} where {expected_seq_no} was expected")]
        ColumnSequenceError { index_id: String, seq_no: u32, expected_seq_no: u32 } = ("INDEX_COLUMN_SEQUENCE_ERROR", InvalidShape),

        #[error("'{sort_dir}' is not a valid sort direction for index '{index_id}'")]
        SortDirectionInvalid { index_id: String, sort_dir: String } = ("INDEX_SORT_DIRECTION_INVALID", InvalidShape),

        #[error("index column '{index_column_id}' does not exist in index '{index_id}'")]
        IndexColumnNotExist { index_id: String, index_column_id: String } = ("INDEX_INDEX_COLUMN_NOT_EXIST", NotFound),

        #[error("index column id '{index_column_id}' is already used in index '{index_id}'")]
        IndexColumnAlreadyExist { index_id: String, index_column_id: String } = ("INDEX_INDEX_COLUMN_ALREADY_EXIST", Conflict),
    }
}

error_family! {
    pub enum ConstraintError {
        #[error("constraint '{constraint_id}' does not exist in table '{table_id}'")]
        NotExist { table_id: String, constraint_id: String } = ("CONSTRAINT_NOT_EXIST", NotFound),

        #[error("constraint id '{constraint_id}' is already in use")]
        AlreadyExist { constraint_id: String } = ("CONSTRAINT_ALREADY_EXIST", Conflict),

        #[error("constraint name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("CONSTRAINT_NAME_INVALID", InvalidShape),

        #[error("constraint name '{name}' is already used by constraint '{constraint_id}'")]
        NameNotUnique { name: String, constraint_id: String } = ("CONSTRAINT_NAME_NOT_UNIQUE", Conflict),

        #[error("column '{column_id}' appears more than once in constraint '{constraint_id}'")]
        ColumnNotUniqueInConstraint { constraint_id: String, column_id: String } = ("CONSTRAINT_COLUMN_NOT_UNIQUE_IN_CONSTRAINT", Conflict),

        #[error("constraint '{constraint_id}' references missing column '{column_id}'")]
        ColumnNotExist { constraint_id: String, column_id: String } = ("CONSTRAINT_COLUMN_NOT_EXIST", NotFound),

        #[error("constraint '{constraint_id}' has sequence number {seq_no} where {expected_seq_no} was expected")]
        ColumnSequenceError { constraint_id: String, seq_no: u32, expected_seq_no: u32 } = ("CONSTRAINT_COLUMN_SEQUENCE_ERROR", InvalidShape),

        #[error("constraint column '{constraint_column_id}' does not exist in constraint '{constraint_id}'")]
        ConstraintColumnNotExist { constraint_id: String, constraint_column_id: String } = ("CONSTRAINT_CONSTRAINT_COLUMN_NOT_EXIST", NotFound),

        #[error("constraint column id '{constraint_column_id}' is already used in constraint '{constraint_id}'")]
        ConstraintColumnAlreadyExist { constraint_id: String, constraint_column_id: String } = ("CONSTRAINT_CONSTRAINT_COLUMN_ALREADY_EXIST", Conflict),

        #[error("{kind} constraint '{constraint_id}' requires an expression")]
        ExpressionRequired { constraint_id: String, kind: ConstraintKind } = ("CONSTRAINT_EXPRESSION_REQUIRED", InvalidShape),

        #[error("table '{table_id}' already has primary key '{existing_constraint_id}'")]
        MultiplePrimaryKey { table_id: String, existing_constraint_id: String } = ("CONSTRAINT_MULTIPLE_PRIMARY_KEY", Conflict),
    }
}

error_family! {
    pub enum RelationshipError {
        #[error("relationship '{relationship_id}' does not exist in schema '{schema_id}'")]
        NotExist { schema_id: String, relationship_id: String } = ("RELATIONSHIP_NOT_EXIST", NotFound),

        #[error("relationship id '{relationship_id}' is already in use")]
        AlreadyExist { relationship_id: String } = ("RELATIONSHIP_ALREADY_EXIST", Conflict),

        #[error("relationship name '{name}' must be between {min_length} and {max_length} characters, got {actual_length}")]
        NameInvalid {
            name: String,
            min_length: usize,
            max_length: usize,
            actual_length: usize,
        } = ("RELATIONSHIP_NAME_INVALID", InvalidShape),

        #[error("relationship name '{name}' is already used by relationship '{relationship_id}'")]
        NameNotUnique { name: String, relationship_id: String } = ("RELATIONSHIP_NAME_NOT_UNIQUE", Conflict),

        #[error("relationship '{relationship_id}' is already {cardinality}")]
        CardinalityUnchanged { relationship_id: String, cardinality: Cardinality } = ("RELATIONSHIP_CARDINALITY_UNCHANGED", InvalidShape),

        #[error("relationship '{relationship_id}' is already {kind}")]
        KindUnchanged { relationship_id: String, kind: RelationshipKind } = ("RELATIONSHIP_KIND_UNCHANGED", InvalidShape),

        #[error("relationship '{relationship_id}' cannot identify table '{table_id}' by itself")]
        SelfIdentifying { relationship_id: String, table_id: String } = ("RELATIONSHIP_SELF_IDENTIFYING", DomainIncompatibility),

        #[error("relationship '{relationship_id}' references column '{column_id}' missing from table '{table_id}'")]
        ColumnNotExist { relationship_id: String, table_id: String, column_id: String } = ("RELATIONSHIP_COLUMN_NOT_EXIST", NotFound),

        #[error("column '{column_id}' appears more than once in relationship '{relationship_id}'")]
        ColumnNotUniqueInRelationship { relationship_id: String, column_id: String } = ("RELATIONSHIP_COLUMN_NOT_UNIQUE_IN_RELATIONSHIP", Conflict),

        #[error("relationship '{relationship_id}' has sequence number {seq_no} where {expected_seq_no} was expected")]
        ColumnSequenceError { relationship_id: String, seq_no: u32, expected_seq_no: u32 } = ("RELATIONSHIP_COLUMN_SEQUENCE_ERROR", InvalidShape),

        #[error("relationship column '{relationship_column_id}' does not exist in relationship '{relationship_id}'")]
        RelationshipColumnNotExist { relationship_id: String, relationship_column_id: String } = ("RELATIONSHIP_RELATIONSHIP_COLUMN_NOT_EXIST", NotFound),

        #[error("relationship column id '{relationship_column_id}' is already used in relationship '{relationship_id}'")]
        RelationshipColumnAlreadyExist { relationship_id: String, relationship_column_id: String } = ("RELATIONSHIP_RELATIONSHIP_COLUMN_ALREADY_EXIST", Conflict),

        #[error("relationship '{relationship_id}' pairs '{fk_column_id}' with '{pk_column_id}' of a different data type")]
        ColumnTypeMismatch { relationship_id: String, fk_column_id: String, pk_column_id: String } = ("RELATIONSHIP_COLUMN_TYPE_MISMATCH", DomainIncompatibility),
    }
}

error_family! {
    /// Failures decoding a command payload before any rule runs.
    pub enum PayloadError {
        #[error("invalid payload: {reason}")]
        ParseInvalid { reason: String } = ("PARSE_INVALID", InvalidShape),
    }
}

/// Any rejection produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErdError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl ErdError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema(e) => e.code(),
            Self::Table(e) => e.code(),
            Self::Column(e) => e.code(),
            Self::Index(e) => e.code(),
            Self::Constraint(e) => e.code(),
            Self::Relationship(e) => e.code(),
            Self::Payload(e) => e.code(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Schema(e) => e.class(),
            Self::Table(e) => e.class(),
            Self::Column(e) => e.class(),
            Self::Index(e) => e.class(),
            Self::Constraint(e) => e.class(),
            Self::Relationship(e) => e.class(),
            Self::Payload(e) => e.class(),
        }
    }

    pub fn parse_invalid(reason: impl ToString) -> Self {
        PayloadError::ParseInvalid {
            reason: reason.to_string(),
        }
        .into()
    }

    pub fn payload(&self) -> ErrorPayload {
        let details = serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("details").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null);

        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// Wire shape relayed to clients: `{code, message, details}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<ErdError> for ErrorPayload {
    fn from(err: ErdError) -> Self {
        err.payload()
    }
}

impl ErrorPayload {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","message":"","details":null}}"#, self.code)
        })
    }
}
