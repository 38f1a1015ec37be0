//! Mutation handlers and the engine that dispatches commands to them.
//!
//! Every handler is a pure function `(config, snapshot, command) -> snapshot`.
//! Handlers resolve ids first, then check names and shapes, then domain rules,
//! and stop at the first violation. Only after all checks pass is the path from
//! the root to the edited entity copied and flagged `is_affected`.

mod column;
mod constraint;
mod index;
mod relationship;
mod schema;
mod table;

use crate::command::Command;
use crate::config::EngineConfig;
use crate::error::ErdError;
use crate::model::{Database, Schema, Table};

/// Stateless command executor; owns only immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply one command to a snapshot. `db` is never modified.
    pub fn apply(&self, db: &Database, command: &Command) -> Result<Database, ErdError> {
        let result = dispatch(&self.config, db, command);
        match &result {
            Ok(_) => tracing::debug!(kind = command.kind(), "command applied"),
            Err(err) => {
                tracing::debug!(kind = command.kind(), code = err.code(), "command rejected")
            }
        }
        result
    }
}

fn dispatch(config: &EngineConfig, db: &Database, command: &Command) -> Result<Database, ErdError> {
    match command {
        Command::CreateSchema(cmd) => schema::create(config, db, cmd),
        Command::RenameSchema(cmd) => schema::rename(config, db, cmd),
        Command::DeleteSchema(cmd) => schema::delete(db, cmd),

        Command::CreateTable(cmd) => table::create(config, db, cmd),
        Command::RenameTable(cmd) => table::rename(config, db, cmd),
        Command::DeleteTable(cmd) => table::delete(db, cmd),

        Command::CreateColumn(cmd) => column::create(config, db, cmd),
        Command::ChangeColumnType(cmd) => column::change_type(config, db, cmd),
        Command::ChangeColumnNullable(cmd) => column::change_nullable(db, cmd),
        Command::ChangeColumnAutoIncrement(cmd) => column::change_auto_increment(config, db, cmd),
        Command::ChangeColumnPosition(cmd) => column::change_position(db, cmd),
        Command::RenameColumn(cmd) => column::rename(config, db, cmd),
        Command::DeleteColumn(cmd) => column::delete(db, cmd),

        Command::CreateIndex(cmd) => index::create(config, db, cmd),
        Command::RenameIndex(cmd) => index::rename(config, db, cmd),
        Command::ChangeIndexType(cmd) => index::change_type(config, db, cmd),
        Command::DeleteIndex(cmd) => index::delete(db, cmd),
        Command::AddIndexColumn(cmd) => index::add_column(db, cmd),
        Command::RemoveIndexColumn(cmd) => index::remove_column(db, cmd),

        Command::CreateConstraint(cmd) => constraint::create(config, db, cmd),
        Command::RenameConstraint(cmd) => constraint::rename(config, db, cmd),
        Command::DeleteConstraint(cmd) => constraint::delete(db, cmd),
        Command::AddConstraintColumn(cmd) => constraint::add_column(db, cmd),
        Command::RemoveConstraintColumn(cmd) => constraint::remove_column(db, cmd),

        Command::CreateRelationship(cmd) => relationship::create(config, db, cmd),
        Command::RenameRelationship(cmd) => relationship::rename(config, db, cmd),
        Command::ChangeRelationshipCardinality(cmd) => relationship::change_cardinality(db, cmd),
        Command::ChangeRelationshipKind(cmd) => relationship::change_kind(db, cmd),
        Command::DeleteRelationship(cmd) => relationship::delete(db, cmd),
        Command::AddRelationshipColumn(cmd) => relationship::add_column(db, cmd),
        Command::RemoveRelationshipColumn(cmd) => relationship::remove_column(db, cmd),
    }
}

/// Copy the root and one schema, then edit the schema.
fn with_schema(db: &Database, schema_idx: usize, edit: impl FnOnce(&mut Schema)) -> Database {
    let mut next = db.clone();
    edit(next.touch_schema(schema_idx));
    next
}

/// Copy the root, one schema and one table, then edit the table.
fn with_table(
    db: &Database,
    schema_idx: usize,
    table_idx: usize,
    edit: impl FnOnce(&mut Table),
) -> Database {
    with_schema(db, schema_idx, |schema| edit(schema.touch_table(table_idx)))
}
