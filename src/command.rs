//! Command payloads: one strongly-typed struct per elementary edit.
//!
//! On the wire a command is an object tagged by `type`, e.g.
//! `{"type": "renameSchema", "schemaId": "s1", "newName": "sales"}`.

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::model::{
    Cardinality, ConstraintColumn, ConstraintKind, Database, ReferentialAction,
    RelationshipColumn, RelationshipKind,
};
use crate::vendor::Vendor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Command {
    CreateSchema(CreateSchema),
    RenameSchema(RenameSchema),
    DeleteSchema(DeleteSchema),

    CreateTable(CreateTable),
    RenameTable(RenameTable),
    DeleteTable(DeleteTable),

    CreateColumn(CreateColumn),
    ChangeColumnType(ChangeColumnType),
    ChangeColumnNullable(ChangeColumnNullable),
    ChangeColumnAutoIncrement(ChangeColumnAutoIncrement),
    ChangeColumnPosition(ChangeColumnPosition),
    RenameColumn(RenameColumn),
    DeleteColumn(DeleteColumn),

    CreateIndex(CreateIndex),
    RenameIndex(RenameIndex),
    ChangeIndexType(ChangeIndexType),
    DeleteIndex(DeleteIndex),
    AddIndexColumn(AddIndexColumn),
    RemoveIndexColumn(RemoveIndexColumn),

    CreateConstraint(CreateConstraint),
    RenameConstraint(RenameConstraint),
    DeleteConstraint(DeleteConstraint),
    AddConstraintColumn(AddConstraintColumn),
    RemoveConstraintColumn(RemoveConstraintColumn),

    CreateRelationship(CreateRelationship),
    RenameRelationship(RenameRelationship),
    ChangeRelationshipCardinality(ChangeRelationshipCardinality),
    ChangeRelationshipKind(ChangeRelationshipKind),
    DeleteRelationship(DeleteRelationship),
    AddRelationshipColumn(AddRelationshipColumn),
    RemoveRelationshipColumn(RemoveRelationshipColumn),
}

impl Command {
    /// Wire tag of the command, e.g. `"renameSchema"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Snapshot plus command, as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub database: Database,
    pub command: Command,
}

// Schema

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchema {
    pub id: String,
    pub name: String,
    pub vendor: Vendor,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchema {
    pub schema: NewSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSchema {
    pub schema_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSchema {
    pub schema_id: String,
}

// Table

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTable {
    pub schema_id: String,
    pub table: NewTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTable {
    pub schema_id: String,
    pub table_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTable {
    pub schema_id: String,
    pub table_id: String,
}

// Column

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColumn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub length_scale: Option<String>,
    #[serde(default = "yes")]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn yes() -> bool {
    true
}

impl NewColumn {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type: None,
            length_scale: None,
            is_nullable: true,
            is_auto_increment: false,
            charset: None,
            collation: None,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumn {
    pub schema_id: String,
    pub table_id: String,
    pub column: NewColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeColumnType {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
    pub data_type: String,
    #[serde(default)]
    pub length_scale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeColumnNullable {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeColumnAutoIncrement {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
    pub is_auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeColumnPosition {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
    /// Target 1-based ordinal position.
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameColumn {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteColumn {
    pub schema_id: String,
    pub table_id: String,
    pub column_id: String,
}

// Index

/// Index column as submitted; `sort_dir` is validated by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIndexColumn {
    pub id: String,
    pub column_id: String,
    pub seq_no: u32,
    #[serde(default = "ascending")]
    pub sort_dir: String,
}

fn ascending() -> String {
    "ASC".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIndex {
    pub id: String,
    pub name: String,
    pub index_type: String,
    #[serde(default)]
    pub columns: Vec<NewIndexColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndex {
    pub schema_id: String,
    pub table_id: String,
    pub index: NewIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameIndex {
    pub schema_id: String,
    pub table_id: String,
    pub index_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeIndexType {
    pub schema_id: String,
    pub table_id: String,
    pub index_id: String,
    pub index_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIndex {
    pub schema_id: String,
    pub table_id: String,
    pub index_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddIndexColumn {
    pub schema_id: String,
    pub table_id: String,
    pub index_id: String,
    pub index_column: NewIndexColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveIndexColumn {
    pub schema_id: String,
    pub table_id: String,
    pub index_id: String,
    pub index_column_id: String,
}

// Constraint

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConstraint {
    pub id: String,
    pub name: String,
    pub kind: ConstraintKind,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub columns: Vec<ConstraintColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConstraint {
    pub schema_id: String,
    pub table_id: String,
    pub constraint: NewConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameConstraint {
    pub schema_id: String,
    pub table_id: String,
    pub constraint_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConstraint {
    pub schema_id: String,
    pub table_id: String,
    pub constraint_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddConstraintColumn {
    pub schema_id: String,
    pub table_id: String,
    pub constraint_id: String,
    pub constraint_column: ConstraintColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveConstraintColumn {
    pub schema_id: String,
    pub table_id: String,
    pub constraint_id: String,
    pub constraint_column_id: String,
}

// Relationship

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelationship {
    pub id: String,
    pub name: String,
    pub fk_table_id: String,
    pub pk_table_id: String,
    pub kind: RelationshipKind,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default)]
    pub on_update: ReferentialAction,
    #[serde(default)]
    pub columns: Vec<RelationshipColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationship {
    pub schema_id: String,
    pub relationship: NewRelationship,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRelationship {
    pub schema_id: String,
    pub relationship_id: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRelationshipCardinality {
    pub schema_id: String,
    pub relationship_id: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRelationshipKind {
    pub schema_id: String,
    pub relationship_id: String,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRelationship {
    pub schema_id: String,
    pub relationship_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationshipColumn {
    pub schema_id: String,
    pub relationship_id: String,
    pub relationship_column: RelationshipColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRelationshipColumn {
    pub schema_id: String,
    pub relationship_id: String,
    pub relationship_column_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_tagged_command() {
        let json = r#"{ "type": "renameSchema", "schemaId": "s1", "newName": "sales" }"#;
        let command: Command = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            Command::RenameSchema(RenameSchema {
                schema_id: "s1".into(),
                new_name: "sales".into(),
            })
        );
        assert_eq!(command.kind(), "renameSchema");
    }

    #[test]
    fn test_decode_defaults() {
        let json = r#"{
            "type": "createColumn",
            "schemaId": "s1",
            "tableId": "t1",
            "column": { "id": "c1", "name": "id" }
        }"#;
        let Command::CreateColumn(cmd) = serde_json::from_str::<Command>(json).unwrap() else {
            panic!("wrong variant");
        };
        assert!(cmd.column.is_nullable);
        assert!(!cmd.column.is_auto_increment);
        assert_eq!(cmd.column.data_type, None);
    }

    #[test]
    fn test_index_column_defaults_to_ascending() {
        let column: NewIndexColumn =
            serde_json::from_str(r#"{ "id": "ic1", "columnId": "c1", "seqNo": 1 }"#).unwrap();
        assert_eq!(column.sort_dir, "ASC");
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let result = serde_json::from_str::<Command>(r#"{ "type": "dropEverything" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_kind_matches_serde_tag() {
        let command = Command::ChangeRelationshipCardinality(ChangeRelationshipCardinality {
            schema_id: "s".into(),
            relationship_id: "r".into(),
            cardinality: Cardinality::OneToOne,
        });
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["type"], command.kind());
    }
}
