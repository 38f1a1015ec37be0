//! Name length, format, reserved-word and sibling-uniqueness rules.
//!
//! Each `*_name` function validates a candidate in its scope and returns the
//! trimmed name to store.

use crate::config::{LengthBounds, NameRules};
use crate::error::{
    ColumnError, ConstraintError, ErdError, IndexError, RelationshipError, SchemaError, TableError,
};
use crate::model::{Column, Constraint, Database, Index, Relationship, Schema, Table};
use crate::vendor::{Vendor, VendorRules};

/// Anything with an id and a name among siblings.
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(Schema, Table, Column, Index, Constraint, Relationship);

/// First sibling (other than `exclude_id`) already using `candidate`.
pub fn find_conflict<'a, T: Named + 'a>(
    siblings: impl IntoIterator<Item = &'a T>,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Option<&'a T> {
    siblings
        .into_iter()
        .filter(|s| Some(s.id()) != exclude_id)
        .find(|s| s.name().trim() == candidate)
}

/// `Err(actual_length)` when the trimmed name is out of bounds.
fn check_length(name: &str, bounds: LengthBounds) -> Result<(), usize> {
    let len = name.chars().count();
    if bounds.contains(len) { Ok(()) } else { Err(len) }
}

/// Starts with an ASCII letter; only ASCII letters, digits and `_` follow.
pub fn is_valid_column_format(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn schema_name(
    names: &NameRules,
    db: &Database,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.schema).map_err(|actual_length| SchemaError::NameInvalid {
        name: name.to_string(),
        min_length: names.schema.min,
        max_length: names.schema.max,
        actual_length,
    })?;

    let siblings = db.schemas.iter().map(|s| s.as_ref());
    if let Some(other) = find_conflict(siblings, name, exclude_id) {
        return Err(SchemaError::NameNotUnique {
            name: name.to_string(),
            schema_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}

pub fn table_name(
    names: &NameRules,
    schema: &Schema,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.table).map_err(|actual_length| TableError::NameInvalid {
        name: name.to_string(),
        min_length: names.table.min,
        max_length: names.table.max,
        actual_length,
    })?;

    let siblings = schema.tables.iter().map(|t| t.as_ref());
    if let Some(other) = find_conflict(siblings, name, exclude_id) {
        return Err(TableError::NameNotUnique {
            name: name.to_string(),
            table_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}

pub fn column_name(
    names: &NameRules,
    rules: &VendorRules,
    vendor: Vendor,
    table: &Table,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.column).map_err(|actual_length| ColumnError::NameInvalid {
        name: name.to_string(),
        min_length: names.column.min,
        max_length: names.column.max,
        actual_length,
    })?;

    if !is_valid_column_format(name) {
        return Err(ColumnError::NameInvalidFormat {
            name: name.to_string(),
        }
        .into());
    }

    if rules.is_reserved(name) {
        return Err(ColumnError::ReservedKeyword {
            name: name.to_string(),
            vendor,
        }
        .into());
    }

    let siblings = table.columns.iter().map(|c| c.as_ref());
    if let Some(other) = find_conflict(siblings, name, exclude_id) {
        return Err(ColumnError::NameNotUnique {
            name: name.to_string(),
            table_id: table.id.clone(),
            column_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}

pub fn index_name(
    names: &NameRules,
    table: &Table,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.index).map_err(|actual_length| IndexError::NameInvalid {
        name: name.to_string(),
        min_length: names.index.min,
        max_length: names.index.max,
        actual_length,
    })?;

    let siblings = table.indexes.iter().map(|i| i.as_ref());
    if let Some(other) = find_conflict(siblings, name, exclude_id) {
        return Err(IndexError::NameNotUnique {
            name: name.to_string(),
            index_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}

pub fn constraint_name(
    names: &NameRules,
    table: &Table,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.constraint).map_err(|actual_length| {
        ConstraintError::NameInvalid {
            name: name.to_string(),
            min_length: names.constraint.min,
            max_length: names.constraint.max,
            actual_length,
        }
    })?;

    let siblings = table.constraints.iter().map(|c| c.as_ref());
    if let Some(other) = find_conflict(siblings, name, exclude_id) {
        return Err(ConstraintError::NameNotUnique {
            name: name.to_string(),
            constraint_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}

/// Relationship names are unique across the whole schema.
pub fn relationship_name(
    names: &NameRules,
    schema: &Schema,
    candidate: &str,
    exclude_id: Option<&str>,
) -> Result<String, ErdError> {
    let name = candidate.trim();
    check_length(name, names.relationship).map_err(|actual_length| {
        RelationshipError::NameInvalid {
            name: name.to_string(),
            min_length: names.relationship.min,
            max_length: names.relationship.max,
            actual_length,
        }
    })?;

    if let Some(other) = find_conflict(schema.relationships(), name, exclude_id) {
        return Err(RelationshipError::NameNotUnique {
            name: name.to_string(),
            relationship_id: other.id.clone(),
        }
        .into());
    }
    Ok(name.to_string())
}
