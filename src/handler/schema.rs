use std::sync::Arc;

use crate::command::{CreateSchema, DeleteSchema, RenameSchema};
use crate::config::EngineConfig;
use crate::error::{ErdError, SchemaError};
use crate::model::{Database, Schema};
use crate::rules::{lookup, name};

use super::with_schema;

pub(super) fn create(
    config: &EngineConfig,
    db: &Database,
    cmd: &CreateSchema,
) -> Result<Database, ErdError> {
    let draft = &cmd.schema;
    lookup::ensure_schema_id_free(db, &draft.id)?;
    if config.vendors.get(draft.vendor).is_none() {
        return Err(SchemaError::VendorUnsupported {
            schema_id: draft.id.clone(),
            vendor: draft.vendor,
        }
        .into());
    }
    let name = name::schema_name(&config.names, db, &draft.name, None)?;

    let schema = Schema {
        charset: draft.charset.clone(),
        collation: draft.collation.clone(),
        is_affected: true,
        ..Schema::new(draft.id.clone(), name, draft.vendor)
    };
    let mut next = db.clone();
    next.schemas.push(Arc::new(schema));
    next.is_affected = true;
    Ok(next)
}

pub(super) fn rename(
    config: &EngineConfig,
    db: &Database,
    cmd: &RenameSchema,
) -> Result<Database, ErdError> {
    let (idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    if cmd.new_name.trim() == schema.name {
        return Err(SchemaError::NameUnchanged {
            schema_id: schema.id.clone(),
            name: schema.name.clone(),
        }
        .into());
    }
    let name = name::schema_name(&config.names, db, &cmd.new_name, Some(&schema.id))?;

    Ok(with_schema(db, idx, |schema| schema.name = name))
}

pub(super) fn delete(db: &Database, cmd: &DeleteSchema) -> Result<Database, ErdError> {
    let (idx, schema) = lookup::schema(db, &cmd.schema_id)?;
    if db.schemas.len() == 1 {
        return Err(SchemaError::DatabaseEmptySchema {
            schema_id: schema.id.clone(),
        }
        .into());
    }
    if !schema.tables.is_empty() {
        return Err(SchemaError::InUse {
            schema_id: schema.id.clone(),
            table_count: schema.tables.len(),
        }
        .into());
    }

    let mut next = db.clone();
    next.schemas.remove(idx);
    next.is_affected = true;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use crate::command::{Command, CreateSchema, DeleteSchema, NewSchema, RenameSchema};
    use crate::error::{ErdError, SchemaError};
    use crate::fixtures;
    use crate::handler::Engine;
    use crate::vendor::Vendor;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn create(id: &str, name: &str, vendor: Vendor) -> Command {
        Command::CreateSchema(CreateSchema {
            schema: NewSchema {
                id: id.into(),
                name: name.into(),
                vendor,
                charset: Some("utf8mb4".into()),
                collation: None,
            },
        })
    }

    fn rename(schema_id: &str, new_name: &str) -> Command {
        Command::RenameSchema(RenameSchema {
            schema_id: schema_id.into(),
            new_name: new_name.into(),
        })
    }

    #[test]
    fn test_create_schema_appends_and_flags() {
        let db = fixtures::shop();
        let next = Engine::default()
            .apply(&db, &create("s-sales", "  Sales ", Vendor::MySql))
            .unwrap();

        assert_eq!(next.schemas.len(), 3);
        let created = next.schema("s-sales").unwrap();
        assert_eq!(created.name, "Sales");
        assert_eq!(created.charset.as_deref(), Some("utf8mb4"));
        assert!(created.is_affected && next.is_affected);
        assert!(!next.schemas[0].is_affected);
    }

    #[rstest]
    #[case("ab", "SCHEMA_NAME_INVALID")]
    #[case("this-name-is-way-too-long", "SCHEMA_NAME_INVALID")]
    #[case("shop", "SCHEMA_NAME_NOT_UNIQUE")]
    fn test_create_schema_rejects_name(#[case] name: &str, #[case] code: &str) {
        let err = Engine::default()
            .apply(&fixtures::shop(), &create("s-new", name, Vendor::MySql))
            .unwrap_err();
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_create_schema_rejects_taken_id_and_unknown_vendor() {
        let db = fixtures::shop();
        let engine = Engine::default();

        let err = engine
            .apply(&db, &create(fixtures::SCHEMA, "other", Vendor::MySql))
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_ALREADY_EXIST");

        let err = engine
            .apply(&db, &create("s-pg", "reporting", Vendor::PostgreSql))
            .unwrap_err();
        assert_eq!(
            err,
            ErdError::from(SchemaError::VendorUnsupported {
                schema_id: "s-pg".into(),
                vendor: Vendor::PostgreSql,
            })
        );
    }

    #[test]
    fn test_rename_schema() {
        let db = fixtures::shop();
        let engine = Engine::default();

        let next = engine.apply(&db, &rename(fixtures::SCHEMA, "store")).unwrap();
        assert_eq!(next.schema(fixtures::SCHEMA).unwrap().name, "store");
        assert_eq!(db.schema(fixtures::SCHEMA).unwrap().name, "shop");

        let err = engine.apply(&db, &rename(fixtures::SCHEMA, " shop ")).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_NAME_UNCHANGED");

        let err = engine.apply(&db, &rename(fixtures::SCHEMA, "archive")).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_NAME_NOT_UNIQUE");

        let err = engine.apply(&db, &rename("missing", "store")).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_NOT_EXIST");
    }

    #[test]
    fn test_rename_then_rename_back() {
        let engine = Engine::default();
        let db = fixtures::shop();
        let renamed = engine.apply(&db, &rename(fixtures::SCHEMA, "Sales")).unwrap();

        let err = engine.apply(&renamed, &rename(fixtures::SCHEMA, "Sales")).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_NAME_UNCHANGED");
        assert!(engine.apply(&renamed, &rename(fixtures::SCHEMA, "shop")).is_ok());
    }

    #[test]
    fn test_delete_schema_guards() {
        let db = fixtures::shop();
        let engine = Engine::default();
        let delete = |id: &str| {
            Command::DeleteSchema(DeleteSchema {
                schema_id: id.into(),
            })
        };

        let err = engine.apply(&db, &delete(fixtures::SCHEMA)).unwrap_err();
        assert_eq!(
            err,
            ErdError::from(SchemaError::InUse {
                schema_id: fixtures::SCHEMA.into(),
                table_count: 2,
            })
        );

        let next = engine.apply(&db, &delete(fixtures::ARCHIVE)).unwrap();
        assert_eq!(next.schemas.len(), 1);
        assert!(next.is_affected);

        let err = engine.apply(&next, &delete(fixtures::SCHEMA)).unwrap_err();
        assert_eq!(err.code(), "SCHEMA_DATABASE_EMPTY_SCHEMA");
    }
}
