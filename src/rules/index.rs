//! Index definition rules.

use crate::model::{IndexColumn, SortDirection, Table};

/// Another index in the table with the same type and the same ordered column list.
///
/// Indexes without columns never count as duplicates.
pub fn duplicate_definition<'a>(
    table: &'a Table,
    index_id: &str,
    index_type: &str,
    columns: &[IndexColumn],
) -> Option<&'a str> {
    if columns.is_empty() {
        return None;
    }
    let key = definition_key(columns.iter());
    table
        .indexes
        .iter()
        .filter(|other| other.id != index_id)
        .filter(|other| other.index_type.eq_ignore_ascii_case(index_type))
        .find(|other| definition_key(other.columns.iter().map(|c| c.as_ref())) == key)
        .map(|other| other.id.as_str())
}

fn definition_key<'a>(
    columns: impl Iterator<Item = &'a IndexColumn>,
) -> Vec<(&'a str, SortDirection)> {
    let mut sorted: Vec<&IndexColumn> = columns.collect();
    sorted.sort_by_key(|c| c.seq_no);
    sorted
        .into_iter()
        .map(|c| (c.column_id.as_str(), c.sort_dir))
        .collect()
}
