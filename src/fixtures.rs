//! Shared snapshots for unit tests.
//!
//! `shop` holds two schemas: `shop` with `users` and `orders`, and an empty
//! `archive`. `orders.user_id` references `users.id`.

use std::sync::Arc;

use crate::model::{
    Cardinality, Column, Constraint, ConstraintColumn, ConstraintKind, Database, Index,
    IndexColumn, ReferentialAction, Relationship, RelationshipColumn, RelationshipKind, Schema,
    SortDirection, Table,
};
use crate::vendor::Vendor;

pub const DATABASE: &str = "db-1";
pub const SCHEMA: &str = "s-shop";
pub const ARCHIVE: &str = "s-archive";

pub const USERS: &str = "t-users";
pub const USERS_ID: &str = "c-users-id";
pub const USERS_EMAIL: &str = "c-users-email";
pub const USERS_NAME: &str = "c-users-name";
pub const IDX_USERS_EMAIL: &str = "i-users-email";
pub const IDX_USERS_EMAIL_COL: &str = "ic-users-email";
pub const PK_USERS: &str = "k-users-pk";

pub const ORDERS: &str = "t-orders";
pub const ORDERS_ID: &str = "c-orders-id";
pub const ORDERS_USER_ID: &str = "c-orders-user-id";
pub const ORDERS_TOTAL: &str = "c-orders-total";
pub const PK_ORDERS: &str = "k-orders-pk";
pub const REL_ORDERS_USERS: &str = "r-orders-users";
pub const REL_ORDERS_USERS_COL: &str = "rc-orders-users";

fn column(
    id: &str,
    name: &str,
    ordinal: u32,
    data_type: &str,
    length_scale: Option<&str>,
) -> Column {
    Column {
        data_type: Some(data_type.to_string()),
        length_scale: length_scale.map(str::to_string),
        ..Column::new(id, name, ordinal)
    }
}

fn auto_id(id: &str, data_type: &str) -> Column {
    Column {
        is_nullable: false,
        is_auto_increment: true,
        ..column(id, "id", 1, data_type, None)
    }
}

fn primary_key(id: &str, name: &str, column_id: &str) -> Constraint {
    Constraint {
        id: id.to_string(),
        name: name.to_string(),
        kind: ConstraintKind::PrimaryKey,
        expression: None,
        columns: vec![Arc::new(ConstraintColumn {
            id: format!("{id}-1"),
            column_id: column_id.to_string(),
            seq_no: 1,
            is_affected: false,
        })],
        is_affected: false,
    }
}

fn users() -> Table {
    let mut table = Table::new(USERS, "users");
    table.columns = vec![
        Arc::new(auto_id(USERS_ID, "INT")),
        Arc::new(column(USERS_EMAIL, "email", 2, "VARCHAR", Some("255"))),
        Arc::new(column(USERS_NAME, "display_name", 3, "VARCHAR", Some("100"))),
    ];
    table.indexes = vec![Arc::new(Index {
        id: IDX_USERS_EMAIL.to_string(),
        name: "idx_users_email".to_string(),
        index_type: "BTREE".to_string(),
        columns: vec![Arc::new(IndexColumn {
            id: IDX_USERS_EMAIL_COL.to_string(),
            column_id: USERS_EMAIL.to_string(),
            seq_no: 1,
            sort_dir: SortDirection::Asc,
            is_affected: false,
        })],
        is_affected: false,
    })];
    table.constraints = vec![Arc::new(primary_key(PK_USERS, "pk_users", USERS_ID))];
    table
}

fn orders() -> Table {
    let mut table = Table::new(ORDERS, "orders");
    table.columns = vec![
        Arc::new(auto_id(ORDERS_ID, "BIGINT")),
        Arc::new(column(ORDERS_USER_ID, "user_id", 2, "INT", None)),
        Arc::new(column(ORDERS_TOTAL, "total", 3, "DECIMAL", Some("10,2"))),
    ];
    table.constraints = vec![Arc::new(primary_key(PK_ORDERS, "pk_orders", ORDERS_ID))];
    table.relationships = vec![Arc::new(Relationship {
        id: REL_ORDERS_USERS.to_string(),
        name: "fk_orders_users".to_string(),
        fk_table_id: ORDERS.to_string(),
        pk_table_id: USERS.to_string(),
        kind: RelationshipKind::NonIdentifying,
        cardinality: Cardinality::OneToMany,
        on_delete: ReferentialAction::Cascade,
        on_update: ReferentialAction::NoAction,
        columns: vec![Arc::new(RelationshipColumn {
            id: REL_ORDERS_USERS_COL.to_string(),
            fk_column_id: ORDERS_USER_ID.to_string(),
            pk_column_id: USERS_ID.to_string(),
            seq_no: 1,
            is_affected: false,
        })],
        is_affected: false,
    })];
    table
}

fn shop_schema() -> Schema {
    let mut schema = Schema::new(SCHEMA, "shop", Vendor::MySql);
    schema.tables = vec![Arc::new(users()), Arc::new(orders())];
    schema
}

pub fn shop() -> Database {
    Database::new(
        DATABASE,
        vec![shop_schema(), Schema::new(ARCHIVE, "archive", Vendor::MySql)],
    )
}

/// Only the `shop` schema.
pub fn single_schema() -> Database {
    Database::new(DATABASE, vec![shop_schema()])
}
