use std::sync::Arc;

use crate::command::{CreateTable, DeleteTable, RenameTable};
use crate::config::EngineConfig;
use crate::error::{ErdError, TableError};
use crate::model::{Database, Table};
use crate::rules::{lookup, name, usage};

use super::{with_schema, with_table};

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateTable,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let draft = &cmd.table;
    lookup::ensure_table_id_free(schema, &draft.id)?;
    let name = name::table_name(&config.names, schema, &draft.name, None)?;

    let table = Table {
        comment: draft.comment.clone(),
        is_affected: true,
        ..Table::new(draft.id.clone(), name)
    };
    Ok(with_schema(db, schema_idx, |schema| {
        schema.tables.push(Arc::new(table))
    }))
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameTable,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let name = name::table_name(&config.names, schema, &cmd.new_name, Some(&table.id))?;

    Ok(with_table(db, schema_idx, table_idx, |table| table.name = name))
}

/// The table's own relationships go with it; it cannot be the parent of another table.
pub(super) fn delete(db: &Database, cmd: &DeleteTable) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    if let Some(relationship_id) = usage::table_referenced_by(schema, &table.id) {
        return Err(TableError::InUse {
            table_id: table.id.clone(),
            relationship_id: relationship_id.to_string(),
        }
        .into());
    }

    Ok(with_schema(db, schema_idx, |schema| {
        schema.tables.remove(table_idx);
    }))
}
