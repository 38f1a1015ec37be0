use std::sync::Arc;

use crate::command::{
    AddConstraintColumn, CreateConstraint, DeleteConstraint, RemoveConstraintColumn,
    RenameConstraint,
};
use crate::config::EngineConfig;
use crate::error::{ConstraintError, ErdError};
use crate::model::{self, Constraint, ConstraintColumn, ConstraintKind, Database, Table};
use crate::rules::{lookup, name, sequence};

use super::with_table;

fn check_columns(
    table: &Table,
    constraint_id: &str,
    columns: &[&ConstraintColumn],
) -> Result<(), ErdError> {
    if let Some(missing) = columns.iter().find(|c| table.column(&c.column_id).is_none()) {
        return Err(ConstraintError::ColumnNotExist {
            constraint_id: constraint_id.to_string(),
            column_id: missing.column_id.clone(),
        }
        .into());
    }
    if let Some(column_id) =
        sequence::first_duplicate(columns.iter().map(|c| c.column_id.as_str()))
    {
        return Err(ConstraintError::ColumnNotUniqueInConstraint {
            constraint_id: constraint_id.to_string(),
            column_id: column_id.to_string(),
        }
        .into());
    }
    sequence::check_contiguous(columns.iter().map(|c| c.seq_no)).map_err(
        |(seq_no, expected_seq_no)| ConstraintError::ColumnSequenceError {
            constraint_id: constraint_id.to_string(),
            seq_no,
            expected_seq_no,
        },
    )?;
    Ok(())
}

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateConstraint,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let draft = &cmd.constraint;
    lookup::ensure_constraint_id_free(table, &draft.id)?;
    lookup::ensure_constraint_column_ids_free(
        &draft.id,
        draft.columns.iter().map(|c| c.id.as_str()),
    )?;
    let name = name::constraint_name(&config.names, table, &draft.name, None)?;

    if draft.kind == ConstraintKind::PrimaryKey {
        if let Some(existing) = table.primary_key() {
            return Err(ConstraintError::MultiplePrimaryKey {
                table_id: table.id.clone(),
                existing_constraint_id: existing.id.clone(),
            }
            .into());
        }
    }

    let expression = draft
        .expression
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);
    if draft.kind.requires_expression() && expression.is_none() {
        return Err(ConstraintError::ExpressionRequired {
            constraint_id: draft.id.clone(),
            kind: draft.kind,
        }
        .into());
    }

    let mut columns: Vec<&ConstraintColumn> = draft.columns.iter().collect();
    check_columns(table, &draft.id, &columns)?;
    columns.sort_by_key(|c| c.seq_no);

    let constraint = Constraint {
        id: draft.id.clone(),
        name,
        kind: draft.kind,
        expression,
        columns: columns
            .into_iter()
            .map(|c| {
                Arc::new(ConstraintColumn {
                    is_affected: true,
                    ..c.clone()
                })
            })
            .collect(),
        is_affected: true,
    };
    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.constraints.push(Arc::new(constraint))
    }))
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameConstraint,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (constraint_idx, constraint) = lookup::constraint(table, &cmd.constraint_id)?;
    let name = name::constraint_name(&config.names, table, &cmd.new_name, Some(&constraint.id))?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_constraint(constraint_idx).name = name
    }))
}

pub(super) fn delete(db: &Database, cmd: &DeleteConstraint) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (constraint_idx, _) = lookup::constraint(table, &cmd.constraint_id)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.constraints.remove(constraint_idx);
    }))
}

pub(super) fn add_column(db: &Database, cmd: &AddConstraintColumn) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (constraint_idx, constraint) = lookup::constraint(table, &cmd.constraint_id)?;
    lookup::ensure_constraint_column_ids_free(
        &constraint.id,
        constraint
            .columns
            .iter()
            .map(|c| c.id.as_str())
            .chain([cmd.constraint_column.id.as_str()]),
    )?;

    let added = ConstraintColumn {
        is_affected: true,
        ..cmd.constraint_column.clone()
    };
    let mut columns: Vec<&ConstraintColumn> =
        constraint.columns.iter().map(|c| c.as_ref()).collect();
    columns.push(&added);
    check_columns(table, &constraint.id, &columns)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        let constraint = table.touch_constraint(constraint_idx);
        constraint.columns.push(Arc::new(added));
        constraint.columns.sort_by_key(|c| c.seq_no);
    }))
}

pub(super) fn remove_column(
    db: &Database,
    cmd: &RemoveConstraintColumn,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (constraint_idx, constraint) = lookup::constraint(table, &cmd.constraint_id)?;
    let column_idx = lookup::constraint_column(constraint, &cmd.constraint_column_id)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        let constraint = table.touch_constraint(constraint_idx);
        constraint.columns.remove(column_idx);
        model::resequence(&mut constraint.columns);
    }))
}
