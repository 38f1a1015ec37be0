use std::sync::Arc;

use crate::command::{
    AddIndexColumn, ChangeIndexType, CreateIndex, DeleteIndex, NewIndexColumn, RemoveIndexColumn,
    RenameIndex,
};
use crate::config::EngineConfig;
use crate::error::{ErdError, IndexError};
use crate::model::{self, Database, Index, IndexColumn, Schema, SortDirection, Table};
use crate::rules::{index as index_rules, lookup, name, sequence};

use super::with_table;

fn canonical_type(
    config: &EngineConfig,
    schema: &Schema,
    index_type: &str,
) -> Result<String, ErdError> {
    let rules = lookup::vendor_rules(config, schema)?;
    rules
        .index_type(index_type)
        .map(str::to_string)
        .ok_or_else(|| {
            IndexError::TypeInvalid {
                index_type: index_type.trim().to_string(),
                vendor: schema.vendor,
            }
            .into()
        })
}

fn parse_column(index_id: &str, draft: &NewIndexColumn) -> Result<IndexColumn, ErdError> {
    let sort_dir: SortDirection =
        draft
            .sort_dir
            .trim()
            .parse()
            .map_err(|_| IndexError::SortDirectionInvalid {
                index_id: index_id.to_string(),
                sort_dir: draft.sort_dir.clone(),
            })?;
    Ok(IndexColumn {
        id: draft.id.clone(),
        column_id: draft.column_id.clone(),
        seq_no: draft.seq_no,
        sort_dir,
        is_affected: true,
    })
}

/// The full column list after an edit: columns exist, none repeats, `1..=n`.
fn check_columns(table: &Table, index_id: &str, columns: &[IndexColumn]) -> Result<(), ErdError> {
    if let Some(missing) = columns.iter().find(|c| table.column(&c.column_id).is_none()) {
        return Err(IndexError::ColumnNotExist {
            index_id: index_id.to_string(),
            column_id: missing.column_id.clone(),
        }
        .into());
    }
    if let Some(column_id) =
        sequence::first_duplicate(columns.iter().map(|c| c.column_id.as_str()))
    {
        return Err(IndexError::ColumnNotUniqueInIndex {
            index_id: index_id.to_string(),
            column_id: column_id.to_string(),
        }
        .into());
    }
    sequence::check_contiguous(columns.iter().map(|c| c.seq_no)).map_err(
        |(seq_no, expected_seq_no)| IndexError::ColumnSequenceError {
            index_id: index_id.to_string(),
            seq_no,
            expected_seq_no,
        },
    )?;
    Ok(())
}

fn check_not_duplicate(
    table: &Table,
    index_id: &str,
    index_type: &str,
    columns: &[IndexColumn],
) -> Result<(), ErdError> {
    match index_rules::duplicate_definition(table, index_id, index_type, columns) {
        Some(existing) => Err(IndexError::DuplicateIndexDefinition {
            index_id: index_id.to_string(),
            existing_index_id: existing.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

fn current_columns(index: &Index) -> Vec<IndexColumn> {
    index.columns.iter().map(|c| c.as_ref().clone()).collect()
}

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateIndex,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let draft = &cmd.index;
    lookup::ensure_index_id_free(table, &draft.id)?;
    lookup::ensure_index_column_ids_free(&draft.id, draft.columns.iter().map(|c| c.id.as_str()))?;
    let name = name::index_name(&config.names, table, &draft.name, None)?;
    let index_type = canonical_type(config, schema, &draft.index_type)?;

    let mut columns = draft
        .columns
        .iter()
        .map(|c| parse_column(&draft.id, c))
        .collect::<Result<Vec<_>, _>>()?;
    check_columns(table, &draft.id, &columns)?;
    check_not_duplicate(table, &draft.id, &index_type, &columns)?;
    columns.sort_by_key(|c| c.seq_no);

    let index = Index {
        id: draft.id.clone(),
        name,
        index_type,
        columns: columns.into_iter().map(Arc::new).collect(),
        is_affected: true,
    };
    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.indexes.push(Arc::new(index))
    }))
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameIndex,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (index_idx, index) = lookup::index(table, &cmd.index_id)?;
    let name = name::index_name(&config.names, table, &cmd.new_name, Some(&index.id))?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_index(index_idx).name = name
    }))
}

pub(super) fn change_type(
    config: &EngineConfig,
    db: &Database,
    cmd: &ChangeIndexType,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (index_idx, index) = lookup::index(table, &cmd.index_id)?;
    let index_type = canonical_type(config, schema, &cmd.index_type)?;
    check_not_duplicate(table, &index.id, &index_type, &current_columns(index))?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_index(index_idx).index_type = index_type
    }))
}

pub(super) fn delete(db: &Database, cmd: &DeleteIndex) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (index_idx, _) = lookup::index(table, &cmd.index_id)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.indexes.remove(index_idx);
    }))
}

pub(super) fn add_column(db: &Database, cmd: &AddIndexColumn) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (index_idx, index) = lookup::index(table, &cmd.index_id)?;
    lookup::ensure_index_column_ids_free(
        &index.id,
        index
            .columns
            .iter()
            .map(|c| c.id.as_str())
            .chain([cmd.index_column.id.as_str()]),
    )?;
    let added = parse_column(&index.id, &cmd.index_column)?;

    let mut columns = current_columns(index);
    columns.push(added.clone());
    check_columns(table, &index.id, &columns)?;
    check_not_duplicate(table, &index.id, &index.index_type, &columns)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        let index = table.touch_index(index_idx);
        index.columns.push(Arc::new(added));
        index.columns.sort_by_key(|c| c.seq_no);
    }))
}

pub(super) fn remove_column(db: &Database, cmd: &RemoveIndexColumn) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (index_idx, index) = lookup::index(table, &cmd.index_id)?;
    let column_idx = lookup::index_column(index, &cmd.index_column_id)?;

    let mut remaining = current_columns(index);
    remaining.remove(column_idx);
    remaining.sort_by_key(|c| c.seq_no);
    for (i, column) in remaining.iter_mut().enumerate() {
        column.seq_no = i as u32 + 1;
    }
    check_not_duplicate(table, &index.id, &index.index_type, &remaining)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        let index = table.touch_index(index_idx);
        index.columns.remove(column_idx);
        model::resequence(&mut index.columns);
    }))
}
