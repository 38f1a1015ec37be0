use std::sync::Arc;

use crate::command::{
    AddRelationshipColumn, ChangeRelationshipCardinality, ChangeRelationshipKind,
    CreateRelationship, DeleteRelationship, RemoveRelationshipColumn, RenameRelationship,
};
use crate::config::EngineConfig;
use crate::error::{ErdError, RelationshipError};
use crate::model::{self, Database, Relationship, RelationshipColumn};
use crate::rules::relationship as rules;
use crate::rules::{lookup, name};

use super::with_table;

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateRelationship,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let draft = &cmd.relationship;
    let (fk_idx, fk_table) = lookup::table(schema, &draft.fk_table_id)?;
    let (_, pk_table) = lookup::table(schema, &draft.pk_table_id)?;
    lookup::ensure_relationship_id_free(schema, &draft.id)?;
    lookup::ensure_relationship_column_ids_free(
        &draft.id,
        draft.columns.iter().map(|c| c.id.as_str()),
    )?;
    let name = name::relationship_name(&config.names, schema, &draft.name, None)?;
    rules::check_not_self_identifying(&draft.id, draft.kind, &fk_table.id, &pk_table.id)?;

    let mut pairs: Vec<&RelationshipColumn> = draft.columns.iter().collect();
    rules::check_pairs(&draft.id, fk_table, pk_table, &pairs)?;
    pairs.sort_by_key(|p| p.seq_no);

    let relationship = Relationship {
        id: draft.id.clone(),
        name,
        fk_table_id: fk_table.id.clone(),
        pk_table_id: pk_table.id.clone(),
        kind: draft.kind,
        cardinality: draft.cardinality,
        on_delete: draft.on_delete,
        on_update: draft.on_update,
        columns: pairs
            .into_iter()
            .map(|p| {
                Arc::new(RelationshipColumn {
                    is_affected: true,
                    ..p.clone()
                })
            })
            .collect(),
        is_affected: true,
    };
    Ok(with_table(db, schema_idx, fk_idx, |table| {
        table.relationships.push(Arc::new(relationship))
    }))
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameRelationship,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;
    let name = name::relationship_name(
        &config.names,
        schema,
        &cmd.new_name,
        Some(&at.relationship.id),
    )?;

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        table.touch_relationship(at.idx).name = name
    }))
}

pub(super) fn change_cardinality(
    db: &Database,
    cmd: &ChangeRelationshipCardinality,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;
    if at.relationship.cardinality == cmd.cardinality {
        return Err(RelationshipError::CardinalityUnchanged {
            relationship_id: at.relationship.id.clone(),
            cardinality: cmd.cardinality,
        }
        .into());
    }

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        table.touch_relationship(at.idx).cardinality = cmd.cardinality
    }))
}

pub(super) fn change_kind(
    db: &Database,
    cmd: &ChangeRelationshipKind,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;
    let relationship = at.relationship;
    if relationship.kind == cmd.kind {
        return Err(RelationshipError::KindUnchanged {
            relationship_id: relationship.id.clone(),
            kind: cmd.kind,
        }
        .into());
    }
    rules::check_not_self_identifying(
        &relationship.id,
        cmd.kind,
        &relationship.fk_table_id,
        &relationship.pk_table_id,
    )?;

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        table.touch_relationship(at.idx).kind = cmd.kind
    }))
}

pub(super) fn delete(db: &Database, cmd: &DeleteRelationship) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        table.relationships.remove(at.idx);
    }))
}

pub(super) fn add_column(
    db: &Database,
    cmd: &AddRelationshipColumn,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;
    let relationship = at.relationship;
    let (_, fk_table) = lookup::table(schema, &relationship.fk_table_id)?;
    let (_, pk_table) = lookup::table(schema, &relationship.pk_table_id)?;
    lookup::ensure_relationship_column_ids_free(
        &relationship.id,
        relationship
            .columns
            .iter()
            .map(|c| c.id.as_str())
            .chain([cmd.relationship_column.id.as_str()]),
    )?;

    let added = RelationshipColumn {
        is_affected: true,
        ..cmd.relationship_column.clone()
    };
    let mut pairs: Vec<&RelationshipColumn> =
        relationship.columns.iter().map(|c| c.as_ref()).collect();
    pairs.push(&added);
    rules::check_pairs(&relationship.id, fk_table, pk_table, &pairs)?;

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        let relationship = table.touch_relationship(at.idx);
        relationship.columns.push(Arc::new(added));
        relationship.columns.sort_by_key(|c| c.seq_no);
    }))
}

pub(super) fn remove_column(
    db: &Database,
    cmd: &RemoveRelationshipColumn,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let at = lookup::relationship(schema, &cmd.relationship_id)?;
    let column_idx = lookup::relationship_column(at.relationship, &cmd.relationship_column_id)?;

    Ok(with_table(db, schema_idx, at.table_idx, |table| {
        let relationship = table.touch_relationship(at.idx);
        relationship.columns.remove(column_idx);
        model::resequence(&mut relationship.columns);
    }))
}
