//! Referential existence: resolve ids against the snapshot or fail with `*NotExist`.

use crate::config::EngineConfig;
use crate::error::{
    ColumnError, ConstraintError, ErdError, IndexError, RelationshipError, SchemaError, TableError,
};
use crate::model::{Column, Constraint, Database, Index, Relationship, Schema, Table};
use crate::rules::sequence;
use crate::vendor::VendorRules;

pub fn schema<'a>(db: &'a Database, schema_id: &str) -> Result<(usize, &'a Schema), ErdError> {
    db.schemas
        .iter()
        .position(|s| s.id == schema_id)
        .map(|idx| (idx, db.schemas[idx].as_ref()))
        .ok_or_else(|| {
            SchemaError::NotExist {
                schema_id: schema_id.to_string(),
            }
            .into()
        })
}

pub fn table<'a>(schema: &'a Schema, table_id: &str) -> Result<(usize, &'a Table), ErdError> {
    schema
        .tables
        .iter()
        .position(|t| t.id == table_id)
        .map(|idx| (idx, schema.tables[idx].as_ref()))
        .ok_or_else(|| {
            TableError::NotExist {
                schema_id: schema.id.clone(),
                table_id: table_id.to_string(),
            }
            .into()
        })
}

pub fn column<'a>(table: &'a Table, column_id: &str) -> Result<(usize, &'a Column), ErdError> {
    table
        .columns
        .iter()
        .position(|c| c.id == column_id)
        .map(|idx| (idx, table.columns[idx].as_ref()))
        .ok_or_else(|| {
            ColumnError::NotExist {
                table_id: table.id.clone(),
                column_id: column_id.to_string(),
            }
            .into()
        })
}

pub fn index<'a>(table: &'a Table, index_id: &str) -> Result<(usize, &'a Index), ErdError> {
    table
        .indexes
        .iter()
        .position(|i| i.id == index_id)
        .map(|idx| (idx, table.indexes[idx].as_ref()))
        .ok_or_else(|| {
            IndexError::NotExist {
                table_id: table.id.clone(),
                index_id: index_id.to_string(),
            }
            .into()
        })
}

pub fn constraint<'a>(
    table: &'a Table,
    constraint_id: &str,
) -> Result<(usize, &'a Constraint), ErdError> {
    table
        .constraints
        .iter()
        .position(|c| c.id == constraint_id)
        .map(|idx| (idx, table.constraints[idx].as_ref()))
        .ok_or_else(|| {
            ConstraintError::NotExist {
                table_id: table.id.clone(),
                constraint_id: constraint_id.to_string(),
            }
            .into()
        })
}

/// Where a relationship lives: its owning (foreign-key) table and slot.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipAt<'a> {
    pub table_idx: usize,
    pub idx: usize,
    pub relationship: &'a Relationship,
}

pub fn relationship<'a>(
    schema: &'a Schema,
    relationship_id: &str,
) -> Result<RelationshipAt<'a>, ErdError> {
    schema
        .tables
        .iter()
        .enumerate()
        .find_map(|(table_idx, table)| {
            table
                .relationships
                .iter()
                .position(|r| r.id == relationship_id)
                .map(|idx| RelationshipAt {
                    table_idx,
                    idx,
                    relationship: table.relationships[idx].as_ref(),
                })
        })
        .ok_or_else(|| {
            RelationshipError::NotExist {
                schema_id: schema.id.clone(),
                relationship_id: relationship_id.to_string(),
            }
            .into()
        })
}

pub fn index_column(index: &Index, index_column_id: &str) -> Result<usize, ErdError> {
    index
        .columns
        .iter()
        .position(|c| c.id == index_column_id)
        .ok_or_else(|| {
            IndexError::IndexColumnNotExist {
                index_id: index.id.clone(),
                index_column_id: index_column_id.to_string(),
            }
            .into()
        })
}

pub fn constraint_column(
    constraint: &Constraint,
    constraint_column_id: &str,
) -> Result<usize, ErdError> {
    constraint
        .columns
        .iter()
        .position(|c| c.id == constraint_column_id)
        .ok_or_else(|| {
            ConstraintError::ConstraintColumnNotExist {
                constraint_id: constraint.id.clone(),
                constraint_column_id: constraint_column_id.to_string(),
            }
            .into()
        })
}

pub fn relationship_column(
    relationship: &Relationship,
    relationship_column_id: &str,
) -> Result<usize, ErdError> {
    relationship
        .columns
        .iter()
        .position(|c| c.id == relationship_column_id)
        .ok_or_else(|| {
            RelationshipError::RelationshipColumnNotExist {
                relationship_id: relationship.id.clone(),
                relationship_column_id: relationship_column_id.to_string(),
            }
            .into()
        })
}

/// Rule table for the schema's vendor.
pub fn vendor_rules<'a>(
    config: &'a EngineConfig,
    schema: &Schema,
) -> Result<&'a VendorRules, ErdError> {
    config.vendors.get(schema.vendor).ok_or_else(|| {
        SchemaError::VendorUnsupported {
            schema_id: schema.id.clone(),
            vendor: schema.vendor,
        }
        .into()
    })
}

// Id collisions on create. Ids are caller-generated, so a clash is a conflict.

pub fn ensure_schema_id_free(db: &Database, schema_id: &str) -> Result<(), ErdError> {
    if db.schemas.iter().any(|s| s.id == schema_id) {
        return Err(SchemaError::AlreadyExist {
            schema_id: schema_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn ensure_table_id_free(schema: &Schema, table_id: &str) -> Result<(), ErdError> {
    if schema.tables.iter().any(|t| t.id == table_id) {
        return Err(TableError::AlreadyExist {
            table_id: table_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn ensure_column_id_free(table: &Table, column_id: &str) -> Result<(), ErdError> {
    if table.columns.iter().any(|c| c.id == column_id) {
        return Err(ColumnError::AlreadyExist {
            column_id: column_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn ensure_index_id_free(table: &Table, index_id: &str) -> Result<(), ErdError> {
    if table.indexes.iter().any(|i| i.id == index_id) {
        return Err(IndexError::AlreadyExist {
            index_id: index_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn ensure_constraint_id_free(table: &Table, constraint_id: &str) -> Result<(), ErdError> {
    if table.constraints.iter().any(|c| c.id == constraint_id) {
        return Err(ConstraintError::AlreadyExist {
            constraint_id: constraint_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn ensure_relationship_id_free(schema: &Schema, relationship_id: &str) -> Result<(), ErdError> {
    if schema.relationships().any(|r| r.id == relationship_id) {
        return Err(RelationshipError::AlreadyExist {
            relationship_id: relationship_id.to_string(),
        }
        .into());
    }
    Ok(())
}

// Member ids are unique within their parent list. `ids` is the list after the edit.

pub fn ensure_index_column_ids_free<'a>(
    index_id: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ErdError> {
    match sequence::first_duplicate(ids) {
        Some(id) => Err(IndexError::IndexColumnAlreadyExist {
            index_id: index_id.to_string(),
            index_column_id: id.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

pub fn ensure_constraint_column_ids_free<'a>(
    constraint_id: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ErdError> {
    match sequence::first_duplicate(ids) {
        Some(id) => Err(ConstraintError::ConstraintColumnAlreadyExist {
            constraint_id: constraint_id.to_string(),
            constraint_column_id: id.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

pub fn ensure_relationship_column_ids_free<'a>(
    relationship_id: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ErdError> {
    match sequence::first_duplicate(ids) {
        Some(id) => Err(RelationshipError::RelationshipColumnAlreadyExist {
            relationship_id: relationship_id.to_string(),
            relationship_column_id: id.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
