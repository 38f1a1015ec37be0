//! Snapshot types for the schema model.
//!
//! Every child list holds `Arc`s so a mutation can copy only the path it
//! touches; untouched siblings stay pointer-identical to the input snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::vendor::Vendor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub id: String,
    pub schemas: Vec<Arc<Schema>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: String,
    pub name: String,
    pub vendor: Vendor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default)]
    pub tables: Vec<Arc<Table>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: Vec<Arc<Column>>,
    #[serde(default)]
    pub indexes: Vec<Arc<Index>>,
    #[serde(default)]
    pub constraints: Vec<Arc<Constraint>>,
    /// Relationships whose foreign-key side is this table.
    #[serde(default)]
    pub relationships: Vec<Arc<Relationship>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    /// 1-based, dense within the owning table.
    pub ordinal_position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// `"255"` or `"10,2"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_scale: Option<String>,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_affected: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub id: String,
    pub name: String,
    pub index_type: String,
    #[serde(default)]
    pub columns: Vec<Arc<IndexColumn>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub id: String,
    pub column_id: String,
    pub seq_no: u32,
    pub sort_dir: SortDirection,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub id: String,
    pub name: String,
    pub kind: ConstraintKind,
    /// Check or default expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default)]
    pub columns: Vec<Arc<ConstraintColumn>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    Default,
    NotNull,
}

impl ConstraintKind {
    pub fn requires_expression(self) -> bool {
        matches!(self, Self::Check | Self::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintColumn {
    pub id: String,
    pub column_id: String,
    pub seq_no: u32,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
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
    pub columns: Vec<Arc<RelationshipColumn>>,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipColumn {
    pub id: String,
    pub fk_column_id: String,
    pub pk_column_id: String,
    pub seq_no: u32,
    #[serde(default)]
    pub is_affected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    Identifying,
    NonIdentifying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// Members of an ordered, 1-based list.
pub trait Sequenced: Clone {
    fn seq_no(&self) -> u32;
    fn set_seq_no(&mut self, seq_no: u32);
    fn mark_affected(&mut self);
}

macro_rules! impl_sequenced {
    ($ty:ty, $field:ident) => {
        impl Sequenced for $ty {
            fn seq_no(&self) -> u32 {
                self.$field
            }

            fn set_seq_no(&mut self, seq_no: u32) {
                self.$field = seq_no;
            }

            fn mark_affected(&mut self) {
                self.is_affected = true;
            }
        }
    };
}

impl_sequenced!(Column, ordinal_position);
impl_sequenced!(IndexColumn, seq_no);
impl_sequenced!(ConstraintColumn, seq_no);
impl_sequenced!(RelationshipColumn, seq_no);

/// Sort by sequence number and renumber to `1..=n`.
pub fn resequence<T: Sequenced>(items: &mut [Arc<T>]) {
    items.sort_by_key(|item| item.seq_no());
    renumber(items);
}

/// Renumber to `1..=n` in slice order.
///
/// Only members whose number actually changes are copied and flagged.
pub fn renumber<T: Sequenced>(items: &mut [Arc<T>]) {
    for (i, item) in items.iter_mut().enumerate() {
        let expected = i as u32 + 1;
        if item.seq_no() != expected {
            let item = Arc::make_mut(item);
            item.set_seq_no(expected);
            item.mark_affected();
        }
    }
}

impl Database {
    pub fn new(id: impl Into<String>, schemas: Vec<Schema>) -> Self {
        Self {
            id: id.into(),
            schemas: schemas.into_iter().map(Arc::new).collect(),
            is_affected: false,
        }
    }

    pub fn schema(&self, schema_id: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.id == schema_id).map(|s| s.as_ref())
    }

    /// Copy-on-write access to a schema; flags the root and the schema.
    pub fn touch_schema(&mut self, idx: usize) -> &mut Schema {
        self.is_affected = true;
        let schema = Arc::make_mut(&mut self.schemas[idx]);
        schema.is_affected = true;
        schema
    }

    /// A copy of the snapshot with every `is_affected` flag reset.
    ///
    /// Subtrees that carry no flag are shared with `self`.
    pub fn clear_affected(&self) -> Self {
        let mut next = self.clone();
        next.is_affected = false;
        for schema in &mut next.schemas {
            if schema.has_affected() {
                let schema = Arc::make_mut(schema);
                schema.is_affected = false;
                for table in &mut schema.tables {
                    if table.has_affected() {
                        Arc::make_mut(table).clear_affected();
                    }
                }
            }
        }
        next
    }
}

impl Schema {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor,
            charset: None,
            collation: None,
            tables: Vec::new(),
            is_affected: false,
        }
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id).map(|t| t.as_ref())
    }

    pub fn touch_table(&mut self, idx: usize) -> &mut Table {
        let table = Arc::make_mut(&mut self.tables[idx]);
        table.is_affected = true;
        table
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.tables
            .iter()
            .flat_map(|t| t.relationships.iter().map(|r| r.as_ref()))
    }

    /// Relationships where `table_id` is either the foreign-key or the primary-key side.
    pub fn relationships_touching<'a>(
        &'a self,
        table_id: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships()
            .filter(move |r| r.fk_table_id == table_id || r.pk_table_id == table_id)
    }

    fn has_affected(&self) -> bool {
        self.is_affected || self.tables.iter().any(|t| t.has_affected())
    }
}

impl Table {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            comment: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            relationships: Vec::new(),
            is_affected: false,
        }
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id).map(|c| c.as_ref())
    }

    pub fn auto_increment_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.is_auto_increment)
            .map(|c| c.as_ref())
    }

    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
            .map(|c| c.as_ref())
    }

    pub fn touch_column(&mut self, idx: usize) -> &mut Column {
        let column = Arc::make_mut(&mut self.columns[idx]);
        column.is_affected = true;
        column
    }

    pub fn touch_index(&mut self, idx: usize) -> &mut Index {
        let index = Arc::make_mut(&mut self.indexes[idx]);
        index.is_affected = true;
        index
    }

    pub fn touch_constraint(&mut self, idx: usize) -> &mut Constraint {
        let constraint = Arc::make_mut(&mut self.constraints[idx]);
        constraint.is_affected = true;
        constraint
    }

    pub fn touch_relationship(&mut self, idx: usize) -> &mut Relationship {
        let relationship = Arc::make_mut(&mut self.relationships[idx]);
        relationship.is_affected = true;
        relationship
    }

    fn has_affected(&self) -> bool {
        self.is_affected
            || self.columns.iter().any(|c| c.is_affected)
            || self
                .indexes
                .iter()
                .any(|i| i.is_affected || i.columns.iter().any(|c| c.is_affected))
            || self
                .constraints
                .iter()
                .any(|c| c.is_affected || c.columns.iter().any(|cc| cc.is_affected))
            || self
                .relationships
                .iter()
                .any(|r| r.is_affected || r.columns.iter().any(|rc| rc.is_affected))
    }

    fn clear_affected(&mut self) {
        self.is_affected = false;
        for column in &mut self.columns {
            if column.is_affected {
                Arc::make_mut(column).is_affected = false;
            }
        }
        for index in &mut self.indexes {
            if index.is_affected || index.columns.iter().any(|c| c.is_affected) {
                let index = Arc::make_mut(index);
                index.is_affected = false;
                clear_members(&mut index.columns);
            }
        }
        for constraint in &mut self.constraints {
            if constraint.is_affected || constraint.columns.iter().any(|c| c.is_affected) {
                let constraint = Arc::make_mut(constraint);
                constraint.is_affected = false;
                clear_members(&mut constraint.columns);
            }
        }
        for relationship in &mut self.relationships {
            if relationship.is_affected || relationship.columns.iter().any(|c| c.is_affected) {
                let relationship = Arc::make_mut(relationship);
                relationship.is_affected = false;
                clear_members(&mut relationship.columns);
            }
        }
    }
}

fn clear_members<T: Sequenced + HasAffected>(items: &mut [Arc<T>]) {
    for item in items {
        if item.is_affected() {
            Arc::make_mut(item).clear();
        }
    }
}

trait HasAffected {
    fn is_affected(&self) -> bool;
    fn clear(&mut self);
}

macro_rules! impl_has_affected {
    ($($ty:ty),*) => {
        $(impl HasAffected for $ty {
            fn is_affected(&self) -> bool {
                self.is_affected
            }

            fn clear(&mut self) {
                self.is_affected = false;
            }
        })*
    };
}

impl_has_affected!(IndexColumn, ConstraintColumn, RelationshipColumn);

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>, ordinal_position: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ordinal_position,
            data_type: None,
            length_scale: None,
            is_nullable: true,
            is_auto_increment: false,
            charset: None,
            collation: None,
            comment: None,
            is_affected: false,
        }
    }
}

impl Index {
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column_id.as_str())
    }
}
