//! Data type validation and the type-change compatibility policy.

use std::fmt;

use crate::error::{ColumnError, ErdError};
use crate::model::Table;
use crate::vendor::{DataTypeSpec, LengthRule, TypeFamily, Vendor, VendorRules};

/// Parsed `lengthScale`: `"255"` or `"10,2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthScale {
    pub length: u32,
    pub scale: Option<u32>,
}

impl LengthScale {
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split(',').map(str::trim);
        let length: u32 = parts.next()?.parse().ok()?;
        let scale = match parts.next() {
            Some(s) => Some(s.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() || length == 0 {
            return None;
        }
        Some(Self { length, scale })
    }
}

impl fmt::Display for LengthScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Some(scale) => write!(f, "{},{}", self.length, scale),
            None => write!(f, "{}", self.length),
        }
    }
}

/// A data type checked against the vendor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType<'a> {
    pub spec: &'a DataTypeSpec,
    pub length_scale: Option<LengthScale>,
}

impl ResolvedType<'_> {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Canonical `lengthScale` string to store on the column.
    pub fn length_scale_string(&self) -> Option<String> {
        self.length_scale.map(|ls| ls.to_string())
    }
}

impl fmt::Display for ResolvedType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length_scale {
            Some(ls) => write!(f, "{}({})", self.spec.name, ls),
            None => f.write_str(&self.spec.name),
        }
    }
}

/// Resolve a requested data type, enforcing the vendor's length/precision rules.
pub fn resolve<'a>(
    rules: &'a VendorRules,
    vendor: Vendor,
    column_id: &str,
    data_type: &str,
    length_scale: Option<&str>,
) -> Result<ResolvedType<'a>, ErdError> {
    let data_type = data_type.trim();
    if data_type.is_empty() {
        return Err(ColumnError::DataTypeRequired {
            column_id: column_id.to_string(),
        }
        .into());
    }

    let spec = rules
        .data_type(data_type)
        .ok_or_else(|| ColumnError::DataTypeInvalid {
            data_type: data_type.to_string(),
            vendor,
        })?;

    let raw = length_scale.map(str::trim).filter(|s| !s.is_empty());
    let invalid = |raw: &str| ColumnError::LengthScaleInvalid {
        data_type: spec.name.clone(),
        length_scale: raw.to_string(),
    };

    let parsed = match raw {
        Some(raw) => Some(LengthScale::parse(raw).ok_or_else(|| invalid(raw))?),
        None => None,
    };

    match (spec.length, parsed) {
        (LengthRule::None, Some(_)) => {
            return Err(invalid(raw.unwrap_or_default()).into());
        }
        (LengthRule::LengthRequired, None) => {
            return Err(ColumnError::LengthRequired {
                data_type: spec.name.clone(),
            }
            .into());
        }
        (LengthRule::PrecisionRequired, None) => {
            return Err(ColumnError::PrecisionRequired {
                data_type: spec.name.clone(),
            }
            .into());
        }
        (LengthRule::Optional | LengthRule::LengthRequired, Some(ls))
            if ls.scale.is_some() && spec.family != TypeFamily::Float =>
        {
            return Err(invalid(raw.unwrap_or_default()).into());
        }
        (_, Some(LengthScale { length, scale: Some(scale) })) if scale > length => {
            return Err(invalid(raw.unwrap_or_default()).into());
        }
        _ => {}
    }

    Ok(ResolvedType {
        spec,
        length_scale: parsed,
    })
}

/// A relationship pairing the column with a column on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub relationship_id: &'a str,
    /// Stored data type of the paired column, if it has one.
    pub partner_type: Option<&'a str>,
}

/// What the policy needs to know about the column being changed.
#[derive(Debug, Clone, Copy)]
pub struct ChangeContext<'a> {
    pub column_id: &'a str,
    pub is_auto_increment: bool,
    pub bindings: &'a [Binding<'a>],
}

/// Whether changing `current` to `requested` is safe.
///
/// `current` is `None` when the column has no type yet, or its stored type
/// is unknown to the vendor table. Such a column takes any valid type unless
/// a relationship pairs it with a typed column.
pub fn check_compatible(
    current: Option<&ResolvedType<'_>>,
    requested: &ResolvedType<'_>,
    cx: &ChangeContext<'_>,
) -> Result<(), ErdError> {
    let incompatible = |from: String, reason: String| -> ErdError {
        ColumnError::TypeIncompatible {
            column_id: cx.column_id.to_string(),
            from,
            to: requested.to_string(),
            reason,
        }
        .into()
    };

    if cx.is_auto_increment && requested.spec.family != TypeFamily::Integer {
        let from = current.map(|c| c.to_string()).unwrap_or_default();
        return Err(incompatible(
            from,
            "auto-increment column must keep an integer type".to_string(),
        ));
    }

    for binding in cx.bindings {
        let agrees = match (binding.partner_type, current) {
            (Some(partner), _) => partner.trim().eq_ignore_ascii_case(requested.name()),
            (None, Some(current)) => current.spec.name == requested.spec.name,
            (None, None) => true,
        };
        if !agrees {
            let from = current.map(|c| c.to_string()).unwrap_or_default();
            let reason = match binding.partner_type {
                Some(partner) => format!(
                    "column is bound by relationship '{}' to a column of type {}",
                    binding.relationship_id,
                    partner.trim().to_uppercase()
                ),
                None => format!("column is bound by relationship '{}'", binding.relationship_id),
            };
            return Err(incompatible(from, reason));
        }
    }

    let Some(current) = current else {
        return Ok(());
    };

    let (from, to) = (current.spec, requested.spec);
    if from.family != to.family {
        return if widens_across_families(from.family, to.family) {
            Ok(())
        } else {
            Err(incompatible(
                current.to_string(),
                format!("changing family from {} to {}", from.family, to.family),
            ))
        };
    }

    if to.rank < from.rank {
        return Err(incompatible(
            current.to_string(),
            format!(
                "narrowing {} width from {} to {}",
                from.family, from.name, to.name
            ),
        ));
    }

    if to.rank == from.rank {
        let old = current.length_scale.or_else(|| implied_length(from));
        let new = requested.length_scale.or_else(|| implied_length(to));
        if let (Some(old), Some(new)) = (old, new) {
            if let Some(reason) = narrowing_length(from.family, old, new) {
                return Err(incompatible(current.to_string(), reason));
            }
        }
    }

    Ok(())
}

fn implied_length(spec: &DataTypeSpec) -> Option<LengthScale> {
    spec.default_length.map(|length| LengthScale {
        length,
        scale: None,
    })
}

fn widens_across_families(from: TypeFamily, to: TypeFamily) -> bool {
    use TypeFamily as F;
    matches!(
        (from, to),
        (F::Integer, F::Fixed | F::Float | F::String)
            | (F::Fixed, F::String)
            | (F::Float, F::String)
            | (F::Boolean, F::Integer | F::String)
            | (F::Temporal | F::Time, F::String)
            | (F::Enum, F::String)
    )
}

fn narrowing_length(family: TypeFamily, old: LengthScale, new: LengthScale) -> Option<String> {
    if family == TypeFamily::Fixed {
        let old_scale = old.scale.unwrap_or(0);
        let new_scale = new.scale.unwrap_or(0);
        let old_digits = old.length.saturating_sub(old_scale);
        let new_digits = new.length.saturating_sub(new_scale);
        if new_scale < old_scale || new_digits < old_digits {
            return Some(format!("narrowing precision from {old} to {new}"));
        }
        return None;
    }
    if new.length < old.length {
        return Some(format!(
            "narrowing length from {} to {}",
            old.length, new.length
        ));
    }
    None
}

/// At most one auto-increment column per table; `column_id` is the candidate.
pub fn check_auto_increment(table: &Table, column_id: &str) -> Result<(), ErdError> {
    match table.auto_increment_column() {
        Some(existing) if existing.id != column_id => Err(ColumnError::MultipleAutoIncrement {
            table_id: table.id.clone(),
            column_id: existing.id.clone(),
        }
        .into()),
        _ => Ok(()),
    }
}

/// Auto-increment needs an integer column; an untyped column is accepted.
pub fn check_auto_increment_type(
    rules: &VendorRules,
    column_id: &str,
    data_type: Option<&str>,
) -> Result<(), ErdError> {
    let Some(data_type) = data_type else {
        return Ok(());
    };
    match rules.data_type(data_type) {
        Some(spec) if spec.family == TypeFamily::Integer => Ok(()),
        _ => Err(ColumnError::AutoIncrementNotInteger {
            column_id: column_id.to_string(),
            data_type: data_type.to_string(),
        }
        .into()),
    }
}
