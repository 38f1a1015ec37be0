use std::sync::Arc;

use crate::command::{
    ChangeColumnAutoIncrement, ChangeColumnNullable, ChangeColumnPosition, ChangeColumnType,
    CreateColumn, DeleteColumn, RenameColumn,
};
use crate::config::EngineConfig;
use crate::error::{ColumnError, ErdError};
use crate::model::{self, Column, Database};
use crate::rules::data_type::{self as types, Binding, ChangeContext};
use crate::rules::{lookup, name, usage};

use super::with_table;

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateColumn,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let draft = &cmd.column;
    lookup::ensure_column_id_free(table, &draft.id)?;
    let rules = lookup::vendor_rules(config, schema)?;
    let name = name::column_name(&config.names, rules, schema.vendor, table, &draft.name, None)?;

    let has_length = draft
        .length_scale
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    let (data_type, length_scale) = match draft.data_type.as_deref() {
        Some(requested) => {
            let resolved = types::resolve(
                rules,
                schema.vendor,
                &draft.id,
                requested,
                draft.length_scale.as_deref(),
            )?;
            (Some(resolved.name().to_string()), resolved.length_scale_string())
        }
        None if has_length => {
            return Err(ColumnError::DataTypeRequired {
                column_id: draft.id.clone(),
            }
            .into());
        }
        None => (None, None),
    };

    if draft.is_auto_increment {
        types::check_auto_increment(table, &draft.id)?;
        types::check_auto_increment_type(rules, &draft.id, data_type.as_deref())?;
    }

    let column = Column {
        data_type,
        length_scale,
        is_nullable: draft.is_nullable,
        is_auto_increment: draft.is_auto_increment,
        charset: draft.charset.clone(),
        collation: draft.collation.clone(),
        comment: draft.comment.clone(),
        is_affected: true,
        ..Column::new(draft.id.clone(), name, table.columns.len() as u32 + 1)
    };
    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.columns.push(Arc::new(column))
    }))
}

pub(super) fn change_type(
    config: &EngineConfig,
    db: &Database,
    cmd: &ChangeColumnType,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (column_idx, column) = lookup::column(table, &cmd.column_id)?;
    let rules = lookup::vendor_rules(config, schema)?;

    let requested = types::resolve(
        rules,
        schema.vendor,
        &column.id,
        &cmd.data_type,
        cmd.length_scale.as_deref(),
    )?;
    // A stored type the vendor table no longer knows is treated as untyped.
    let current = column.data_type.as_deref().and_then(|stored| {
        types::resolve(
            rules,
            schema.vendor,
            &column.id,
            stored,
            column.length_scale.as_deref(),
        )
        .ok()
    });
    let bindings: Vec<Binding> = usage::column_partners(schema, &table.id, &column.id)
        .map(|(relationship_id, partner)| Binding {
            relationship_id,
            partner_type: partner.data_type.as_deref(),
        })
        .collect();
    let cx = ChangeContext {
        column_id: &column.id,
        is_auto_increment: column.is_auto_increment,
        bindings: &bindings,
    };
    types::check_compatible(current.as_ref(), &requested, &cx)?;

    let data_type = requested.name().to_string();
    let length_scale = requested.length_scale_string();
    Ok(with_table(db, schema_idx, table_idx, |table| {
        let column = table.touch_column(column_idx);
        column.data_type = Some(data_type);
        column.length_scale = length_scale;
    }))
}

pub(super) fn change_nullable(
    db: &Database,
    cmd: &ChangeColumnNullable,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (column_idx, _) = lookup::column(table, &cmd.column_id)?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_column(column_idx).is_nullable = cmd.is_nullable
    }))
}

pub(super) fn change_auto_increment(
    config: &EngineConfig,
    db: &Database,
    cmd: &ChangeColumnAutoIncrement,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (column_idx, column) = lookup::column(table, &cmd.column_id)?;
    if cmd.is_auto_increment {
        let rules = lookup::vendor_rules(config, schema)?;
        types::check_auto_increment(table, &column.id)?;
        types::check_auto_increment_type(rules, &column.id, column.data_type.as_deref())?;
    }

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_column(column_idx).is_auto_increment = cmd.is_auto_increment
    }))
}

/// Move a column to a 1-based position; the columns in between shift by one.
pub(super) fn change_position(
    db: &Database,
    cmd: &ChangeColumnPosition,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (_, column) = lookup::column(table, &cmd.column_id)?;
    let max = table.columns.len() as u32;
    if !(1..=max).contains(&cmd.position) {
        return Err(ColumnError::PositionOutOfRange {
            column_id: column.id.clone(),
            position: cmd.position,
            max,
        }
        .into());
    }

    let target = cmd.position as usize - 1;
    Ok(with_table(db, schema_idx, table_idx, |table| {
        model::resequence(&mut table.columns);
        if let Some(from) = table.columns.iter().position(|c| c.id == cmd.column_id) {
            let moved = table.columns.remove(from);
            table.columns.insert(target, moved);
        }
        model::renumber(&mut table.columns);
    }))
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameColumn,
) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (column_idx, column) = lookup::column(table, &cmd.column_id)?;
    let rules = lookup::vendor_rules(config, schema)?;
    let name = name::column_name(
        &config.names,
        rules,
        schema.vendor,
        table,
        &cmd.new_name,
        Some(&column.id),
    )?;

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.touch_column(column_idx).name = name
    }))
}

pub(super) fn delete(db: &Database, cmd: &DeleteColumn) -> Result<Database, ErdError> {
    let (schema_idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    let (table_idx, table) = lookup::table(schema, &cmd.table_id)?;
    let (column_idx, column) = lookup::column(table, &cmd.column_id)?;
    if let Some(referenced_by) = usage::column_referenced_by(schema, table, &column.id) {
        return Err(ColumnError::InUse {
            column_id: column.id.clone(),
            referenced_by: referenced_by.to_string(),
        }
        .into());
    }

    Ok(with_table(db, schema_idx, table_idx, |table| {
        table.columns.remove(column_idx);
        model::resequence(&mut table.columns);
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::command::{
        ChangeColumnAutoIncrement, ChangeColumnNullable, ChangeColumnPosition, ChangeColumnType,
        Command, CreateColumn, CreateRelationship, CreateTable, DeleteColumn, NewColumn,
        NewRelationship, NewTable, RenameColumn,
    };
    use crate::error::{ColumnError, ErdError};
    use crate::fixtures;
    use crate::handler::Engine;
    use crate::model::{
        Cardinality, Database, ReferentialAction, RelationshipColumn, RelationshipKind, Table,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn users(db: &Database) -> &Table {
        db.schema(fixtures::SCHEMA).unwrap().table(fixtures::USERS).unwrap()
    }

    fn create(table_id: &str, column: NewColumn) -> Command {
        Command::CreateColumn(CreateColumn {
            schema_id: fixtures::SCHEMA.into(),
            table_id: table_id.into(),
            column,
        })
    }

    fn typed(id: &str, name: &str, data_type: &str, length_scale: Option<&str>) -> NewColumn {
        NewColumn {
            data_type: Some(data_type.into()),
            length_scale: length_scale.map(Into::into),
            ..NewColumn::new(id, name)
        }
    }

    fn change_type(column_id: &str, data_type: &str, length_scale: Option<&str>) -> Command {
        Command::ChangeColumnType(ChangeColumnType {
            schema_id: fixtures::SCHEMA.into(),
            table_id: if column_id.starts_with("c-users") {
                fixtures::USERS.into()
            } else {
                fixtures::ORDERS.into()
            },
            column_id: column_id.into(),
            data_type: data_type.into(),
            length_scale: length_scale.map(Into::into),
        })
    }

    fn auto_increment(table_id: &str, column_id: &str, on: bool) -> Command {
        Command::ChangeColumnAutoIncrement(ChangeColumnAutoIncrement {
            schema_id: fixtures::SCHEMA.into(),
            table_id: table_id.into(),
            column_id: column_id.into(),
            is_auto_increment: on,
        })
    }

    #[test]
    fn test_create_column_appends_with_next_ordinal() {
        let db = fixtures::shop();
        let next = Engine::default()
            .apply(&db, &create(fixtures::USERS, typed("c-age", "age", "int", None)))
            .unwrap();

        let table = users(&next);
        let added = table.column("c-age").unwrap();
        assert_eq!(added.ordinal_position, 4);
        assert_eq!(added.data_type.as_deref(), Some("INT"));
        assert!(added.is_nullable && added.is_affected);
    }

    #[test]
    fn test_duplicate_column_name_is_rejected() {
        let engine = Engine::default();
        let db = fixtures::shop();
        let db = engine
            .apply(
                &db,
                &Command::CreateTable(CreateTable {
                    schema_id: fixtures::SCHEMA.into(),
                    table: NewTable {
                        id: "t-tags".into(),
                        name: "tags".into(),
                        comment: None,
                    },
                }),
            )
            .unwrap();

        let db = engine.apply(&db, &create("t-tags", NewColumn::new("c-1", "id"))).unwrap();
        let err = engine
            .apply(&db, &create("t-tags", NewColumn::new("c-2", "id")))
            .unwrap_err();
        assert_eq!(
            err,
            ErdError::from(ColumnError::NameNotUnique {
                name: "id".into(),
                table_id: "t-tags".into(),
                column_id: "c-1".into(),
            })
        );

        let tags = db.schema(fixtures::SCHEMA).unwrap().table("t-tags").unwrap();
        assert!(tags.column("c-1").is_some());
        assert!(tags.column("c-2").is_none());
    }

    #[rstest]
    #[case(NewColumn::new("c-x", "order"), "COLUMN_RESERVED_KEYWORD")]
    #[case(NewColumn::new("c-x", "2fa"), "COLUMN_NAME_INVALID_FORMAT")]
    #[case(NewColumn::new("c-x", ""), "COLUMN_NAME_INVALID")]
    #[case(NewColumn::new(fixtures::USERS_ID, "other"), "COLUMN_ALREADY_EXIST")]
    #[case(typed("c-x", "code", "VARCHAR", None), "COLUMN_LENGTH_REQUIRED")]
    #[case(typed("c-x", "price", "DECIMAL", None), "COLUMN_PRECISION_REQUIRED")]
    #[case(typed("c-x", "blob_ish", "BLOBBY", None), "COLUMN_DATA_TYPE_INVALID")]
    #[case(typed("c-x", "code", "VARCHAR", Some("abc")), "COLUMN_LENGTH_SCALE_INVALID")]
    #[case(NewColumn { length_scale: Some("10".into()), ..NewColumn::new("c-x", "code") }, "COLUMN_DATA_TYPE_REQUIRED")]
    #[case(NewColumn { is_auto_increment: true, ..typed("c-x", "seq", "INT", None) }, "COLUMN_MULTIPLE_AUTO_INCREMENT")]
    fn test_create_column_rejects(#[case] column: NewColumn, #[case] code: &str) {
        let err = Engine::default()
            .apply(&fixtures::shop(), &create(fixtures::USERS, column))
            .unwrap_err();
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_second_auto_increment_is_rejected() {
        let engine = Engine::default();
        let mut db = fixtures::shop();
        // Start from a table without an auto-increment column.
        db = engine
            .apply(&db, &auto_increment(fixtures::USERS, fixtures::USERS_ID, false))
            .unwrap();
        db = engine
            .apply(&db, &create(fixtures::USERS, typed("c-b", "legacy_id", "BIGINT", None)))
            .unwrap();

        db = engine
            .apply(&db, &auto_increment(fixtures::USERS, fixtures::USERS_ID, true))
            .unwrap();
        let err = engine
            .apply(&db, &auto_increment(fixtures::USERS, "c-b", true))
            .unwrap_err();
        assert_eq!(
            err,
            ErdError::from(ColumnError::MultipleAutoIncrement {
                table_id: fixtures::USERS.into(),
                column_id: fixtures::USERS_ID.into(),
            })
        );
        assert!(users(&db).column(fixtures::USERS_ID).unwrap().is_auto_increment);
        assert!(!users(&db).column("c-b").unwrap().is_auto_increment);
    }

    #[test]
    fn test_auto_increment_requires_integer() {
        let engine = Engine::default();
        let db = engine
            .apply(&fixtures::shop(), &auto_increment(fixtures::USERS, fixtures::USERS_ID, false))
            .unwrap();
        let err = engine
            .apply(&db, &auto_increment(fixtures::USERS, fixtures::USERS_EMAIL, true))
            .unwrap_err();
        assert_eq!(err.code(), "COLUMN_AUTO_INCREMENT_NOT_INTEGER");
    }

    #[rstest]
    #[case(fixtures::USERS_EMAIL, "VARCHAR", Some("500"), None)]
    #[case(fixtures::USERS_EMAIL, "TEXT", None, None)]
    #[case(fixtures::USERS_EMAIL, "VARCHAR", Some("64"), Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::USERS_EMAIL, "INT", None, Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::ORDERS_TOTAL, "DECIMAL", Some("12,2"), None)]
    #[case(fixtures::ORDERS_TOTAL, "DECIMAL", Some("8,2"), Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::USERS_ID, "VARCHAR", Some("36"), Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::ORDERS_USER_ID, "BIGINT", None, Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::ORDERS_ID, "INT", None, Some("COLUMN_TYPE_INCOMPATIBLE"))]
    #[case(fixtures::USERS_EMAIL, "CHAR", None, Some("COLUMN_TYPE_INCOMPATIBLE"))]
    fn test_change_column_type(
        #[case] column_id: &str,
        #[case] data_type: &str,
        #[case] length_scale: Option<&str>,
        #[case] rejected: Option<&str>,
    ) {
        let result = Engine::default().apply(
            &fixtures::shop(),
            &change_type(column_id, data_type, length_scale),
        );
        match rejected {
            Some(code) => assert_eq!(result.unwrap_err().code(), code),
            None => {
                let next = result.unwrap();
                let schema = next.schema(fixtures::SCHEMA).unwrap();
                let column = schema
                    .tables
                    .iter()
                    .find_map(|t| t.column(column_id))
                    .unwrap();
                assert_eq!(column.data_type.as_deref(), Some(data_type));
                assert_eq!(column.length_scale.as_deref(), length_scale);
            }
        }
    }

    #[test]
    fn test_narrowing_reports_reason() {
        let err = Engine::default()
            .apply(&fixtures::shop(), &change_type(fixtures::USERS_EMAIL, "VARCHAR", Some("64")))
            .unwrap_err();
        assert_eq!(
            err,
            ErdError::from(ColumnError::TypeIncompatible {
                column_id: fixtures::USERS_EMAIL.into(),
                from: "VARCHAR(255)".into(),
                to: "VARCHAR(64)".into(),
                reason: "narrowing length from 255 to 64".into(),
            })
        );
    }

    #[test]
    fn test_untyped_foreign_key_follows_primary_key_type() {
        let engine = Engine::default();
        let untyped = NewColumn::new("c-orders-ref", "ref_id");
        let db = engine
            .apply(&fixtures::shop(), &create(fixtures::ORDERS, untyped))
            .unwrap();
        let db = engine
            .apply(
                &db,
                &Command::CreateRelationship(CreateRelationship {
                    schema_id: fixtures::SCHEMA.into(),
                    relationship: NewRelationship {
                        id: "r-ref".into(),
                        name: "fk_orders_ref".into(),
                        fk_table_id: fixtures::ORDERS.into(),
                        pk_table_id: fixtures::USERS.into(),
                        kind: RelationshipKind::NonIdentifying,
                        cardinality: Cardinality::OneToMany,
                        on_delete: ReferentialAction::NoAction,
                        on_update: ReferentialAction::NoAction,
                        columns: vec![RelationshipColumn {
                            id: "rc-ref".into(),
                            fk_column_id: "c-orders-ref".into(),
                            pk_column_id: fixtures::USERS_ID.into(),
                            seq_no: 1,
                            is_affected: false,
                        }],
                    },
                }),
            )
            .unwrap();

        let err = engine
            .apply(&db, &change_type("c-orders-ref", "VARCHAR", Some("10")))
            .unwrap_err();
        assert_eq!(err.code(), "COLUMN_TYPE_INCOMPATIBLE");
        assert!(err.to_string().contains("relationship 'r-ref'"), "{err}");

        let next = engine.apply(&db, &change_type("c-orders-ref", "int", None)).unwrap();
        let orders = next.schema(fixtures::SCHEMA).unwrap().table(fixtures::ORDERS).unwrap();
        let column = orders.column("c-orders-ref").unwrap();
        assert_eq!(column.data_type.as_deref(), Some("INT"));
    }

    #[test]
    fn test_change_nullable_and_rename() {
        let engine = Engine::default();
        let db = fixtures::shop();

        let next = engine
            .apply(
                &db,
                &Command::ChangeColumnNullable(ChangeColumnNullable {
                    schema_id: fixtures::SCHEMA.into(),
                    table_id: fixtures::USERS.into(),
                    column_id: fixtures::USERS_EMAIL.into(),
                    is_nullable: false,
                }),
            )
            .unwrap();
        assert!(!users(&next).column(fixtures::USERS_EMAIL).unwrap().is_nullable);

        let rename = |name: &str| {
            Command::RenameColumn(RenameColumn {
                schema_id: fixtures::SCHEMA.into(),
                table_id: fixtures::USERS.into(),
                column_id: fixtures::USERS_EMAIL.into(),
                new_name: name.into(),
            })
        };
        let next = engine.apply(&db, &rename("email_address")).unwrap();
        assert_eq!(users(&next).column(fixtures::USERS_EMAIL).unwrap().name, "email_address");
        assert_eq!(engine.apply(&db, &rename("id")).unwrap_err().code(), "COLUMN_NAME_NOT_UNIQUE");
        assert_eq!(
            engine.apply(&db, &rename("table")).unwrap_err().code(),
            "COLUMN_RESERVED_KEYWORD"
        );
    }

    #[test]
    fn test_change_position_shifts_neighbours() {
        let db = fixtures::shop();
        let engine = Engine::default();
        let move_to = |position: u32| {
            Command::ChangeColumnPosition(ChangeColumnPosition {
                schema_id: fixtures::SCHEMA.into(),
                table_id: fixtures::USERS.into(),
                column_id: fixtures::USERS_NAME.into(),
                position,
            })
        };

        let next = engine.apply(&db, &move_to(1)).unwrap();
        let order: Vec<(&str, u32)> = users(&next)
            .columns
            .iter()
            .map(|c| (c.id.as_str(), c.ordinal_position))
            .collect();
        assert_eq!(
            order,
            vec![
                (fixtures::USERS_NAME, 1),
                (fixtures::USERS_ID, 2),
                (fixtures::USERS_EMAIL, 3),
            ]
        );

        // Same position is accepted and leaves every column shared.
        let same = engine.apply(&db, &move_to(3)).unwrap();
        for (old, new) in users(&db).columns.iter().zip(&users(&same).columns) {
            assert!(Arc::ptr_eq(old, new));
        }

        let err = engine.apply(&db, &move_to(4)).unwrap_err();
        assert_eq!(
            err,
            ErdError::from(ColumnError::PositionOutOfRange {
                column_id: fixtures::USERS_NAME.into(),
                position: 4,
                max: 3,
            })
        );
        assert_eq!(
            engine.apply(&db, &move_to(0)).unwrap_err().code(),
            "COLUMN_POSITION_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_delete_column() {
        let db = fixtures::shop();
        let engine = Engine::default();
        let delete = |table_id: &str, column_id: &str| {
            Command::DeleteColumn(DeleteColumn {
                schema_id: fixtures::SCHEMA.into(),
                table_id: table_id.into(),
                column_id: column_id.into(),
            })
        };

        let next = engine.apply(&db, &delete(fixtures::USERS, fixtures::USERS_NAME)).unwrap();
        assert_eq!(users(&next).columns.len(), 2);

        let next = engine.apply(&db, &delete(fixtures::ORDERS, fixtures::ORDERS_USER_ID));
        assert_eq!(
            next.unwrap_err(),
            ErdError::from(ColumnError::InUse {
                column_id: fixtures::ORDERS_USER_ID.into(),
                referenced_by: fixtures::REL_ORDERS_USERS.into(),
            })
        );

        let next = engine.apply(&db, &delete(fixtures::ORDERS, fixtures::ORDERS_TOTAL)).unwrap();
        let orders = next.schema(fixtures::SCHEMA).unwrap().table(fixtures::ORDERS).unwrap();
        let ordinals: Vec<u32> = orders.columns.iter().map(|c| c.ordinal_position).collect();
        assert_eq!(ordinals, vec![1, 2]);
    }

    #[test]
    fn test_delete_middle_column_resequences() {
        let engine = Engine::default();
        let db = engine
            .apply(
                &fixtures::shop(),
                &create(fixtures::USERS, typed("c-age", "age", "INT", None)),
            )
            .unwrap();
        let next = engine
            .apply(
                &db,
                &Command::DeleteColumn(DeleteColumn {
                    schema_id: fixtures::SCHEMA.into(),
                    table_id: fixtures::USERS.into(),
                    column_id: fixtures::USERS_NAME.into(),
                }),
            )
            .unwrap();

        let age = users(&next).column("c-age").unwrap();
        assert_eq!(age.ordinal_position, 3);
        assert!(age.is_affected);
    }
}
