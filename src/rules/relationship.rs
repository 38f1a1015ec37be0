//! Relationship rules: identifying relationships, column pairing and type agreement.

use crate::error::{ErdError, RelationshipError};
use crate::model::{Column, RelationshipColumn, RelationshipKind, Table};
use crate::rules::sequence;

/// A table cannot identify itself.
pub fn check_not_self_identifying(
    relationship_id: &str,
    kind: RelationshipKind,
    fk_table_id: &str,
    pk_table_id: &str,
) -> Result<(), ErdError> {
    if kind == RelationshipKind::Identifying && fk_table_id == pk_table_id {
        return Err(RelationshipError::SelfIdentifying {
            relationship_id: relationship_id.to_string(),
            table_id: fk_table_id.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Resolve both sides of a column pair and require matching data types when both are set.
pub fn check_pair<'a>(
    relationship_id: &str,
    fk_table: &'a Table,
    pk_table: &'a Table,
    pair: &RelationshipColumn,
) -> Result<(&'a Column, &'a Column), ErdError> {
    let missing = |table: &Table, column_id: &str| -> ErdError {
        RelationshipError::ColumnNotExist {
            relationship_id: relationship_id.to_string(),
            table_id: table.id.clone(),
            column_id: column_id.to_string(),
        }
        .into()
    };

    let fk = fk_table
        .column(&pair.fk_column_id)
        .ok_or_else(|| missing(fk_table, &pair.fk_column_id))?;
    let pk = pk_table
        .column(&pair.pk_column_id)
        .ok_or_else(|| missing(pk_table, &pair.pk_column_id))?;

    if let (Some(fk_type), Some(pk_type)) = (&fk.data_type, &pk.data_type) {
        if !fk_type.eq_ignore_ascii_case(pk_type) {
            return Err(RelationshipError::ColumnTypeMismatch {
                relationship_id: relationship_id.to_string(),
                fk_column_id: fk.id.clone(),
                pk_column_id: pk.id.clone(),
            }
            .into());
        }
    }
    Ok((fk, pk))
}

/// Validate a complete pair list: every pair resolves, no column repeats
/// on either side, and sequence numbers are `1..=n`.
pub fn check_pairs(
    relationship_id: &str,
    fk_table: &Table,
    pk_table: &Table,
    pairs: &[&RelationshipColumn],
) -> Result<(), ErdError> {
    for pair in pairs {
        check_pair(relationship_id, fk_table, pk_table, pair)?;
    }

    let duplicate = sequence::first_duplicate(pairs.iter().map(|p| p.fk_column_id.as_str()))
        .or_else(|| sequence::first_duplicate(pairs.iter().map(|p| p.pk_column_id.as_str())));
    if let Some(column_id) = duplicate {
        return Err(RelationshipError::ColumnNotUniqueInRelationship {
            relationship_id: relationship_id.to_string(),
            column_id: column_id.to_string(),
        }
        .into());
    }

    sequence::check_contiguous(pairs.iter().map(|p| p.seq_no)).map_err(
        |(seq_no, expected_seq_no)| RelationshipError::ColumnSequenceError {
            relationship_id: relationship_id.to_string(),
            seq_no,
            expected_seq_no,
        },
    )?;
    Ok(())
}
