//! Who depends on a table or column. Deletion is refused while dependents exist.

use crate::model::{Column, Schema, Table};

/// A relationship on another table that uses `table_id` as its primary-key side.
pub fn table_referenced_by<'a>(schema: &'a Schema, table_id: &str) -> Option<&'a str> {
    schema
        .relationships()
        .find(|r| r.pk_table_id == table_id && r.fk_table_id != table_id)
        .map(|r| r.id.as_str())
}

/// First index, constraint or relationship that references the column.
pub fn column_referenced_by<'a>(
    schema: &'a Schema,
    table: &'a Table,
    column_id: &str,
) -> Option<&'a str> {
    if let Some(index) = table
        .indexes
        .iter()
        .find(|i| i.columns.iter().any(|c| c.column_id == column_id))
    {
        return Some(&index.id);
    }

    if let Some(constraint) = table
        .constraints
        .iter()
        .find(|k| k.columns.iter().any(|c| c.column_id == column_id))
    {
        return Some(&constraint.id);
    }

    column_bound_by(schema, &table.id, column_id)
}

/// A relationship pairing the column on either side.
pub fn column_bound_by<'a>(
    schema: &'a Schema,
    table_id: &str,
    column_id: &str,
) -> Option<&'a str> {
    schema
        .relationships()
        .find(|r| {
            r.columns.iter().any(|rc| {
                (r.fk_table_id == table_id && rc.fk_column_id == column_id)
                    || (r.pk_table_id == table_id && rc.pk_column_id == column_id)
            })
        })
        .map(|r| r.id.as_str())
}

/// Every relationship pairing the column, with the column on the other side.
pub fn column_partners<'a>(
    schema: &'a Schema,
    table_id: &'a str,
    column_id: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Column)> + 'a {
    schema.relationships().flat_map(move |r| {
        r.columns.iter().filter_map(move |rc| {
            let (partner_table, partner_column) =
                if r.fk_table_id == table_id && rc.fk_column_id == column_id {
                    (&r.pk_table_id, &rc.pk_column_id)
                } else if r.pk_table_id == table_id && rc.pk_column_id == column_id {
                    (&r.fk_table_id, &rc.fk_column_id)
                } else {
                    return None;
                };
            if partner_table == table_id && partner_column == column_id {
                return None;
            }
            let partner = schema.table(partner_table)?.column(partner_column)?;
            Some((r.id.as_str(), partner))
        })
    })
}
