//! # Reference Mapper
//!
//! Converts between what a multi-select holds (a list of identifiers as
//! strings or numbers) and what the wire expects (a list of `{id}` objects).
//!
//! ```text
//! form   ["1", "2", ""]  ── to_reference_list ──►  [{id:1}, {id:2}]   wire
//! form   ["1", "2"]      ◄──── to_form_ids ──────  [{id:1}, {id:2}]   wire
//! ```
//!
//! Absent input and empty input are the same thing in both directions: the
//! result is an empty list, never an error.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::form::FieldValue;
use crate::types::{EntityId, Reference};

/// Parses a single identifier.
///
/// Accepts integers, integral decimals (`3.0`) and text holding either.
/// Blank text is rejected here; list conversion skips it before calling.
pub fn parse_id(value: &FieldValue) -> CoreResult<EntityId> {
    match value {
        FieldValue::Integer(n) => Ok(*n),
        FieldValue::Decimal(f) => integral(*f).ok_or_else(|| {
            CoreError::invalid_reference(value.to_string(), "not a finite integer")
        }),
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(CoreError::invalid_reference(s.as_str(), "empty identifier"));
            }
            trimmed
                .parse::<EntityId>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                .ok_or_else(|| CoreError::invalid_reference(s.as_str(), "not a finite integer"))
        }
    }
}

/// 2^63, the first integral `f64` above `EntityId::MAX`.
const ID_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integral(f: f64) -> Option<EntityId> {
    if f.is_finite() && f.fract() == 0.0 && f >= EntityId::MIN as f64 && f < ID_UPPER_BOUND {
        Some(f as EntityId)
    } else {
        None
    }
}

/// Form selection → wire references.
///
/// ## Rules
/// - `None` and an empty list both yield `[]`
/// - Blank entries (the select's placeholder option) are skipped
/// - Duplicates are collapsed, first occurrence wins the position
/// - Any other unparseable entry fails the whole conversion
///
/// ## Example
/// ```rust
/// use sale_core::reference::to_reference_list;
/// use sale_core::types::Reference;
///
/// let refs = to_reference_list(Some(vec!["2", "", "1", "2"])).unwrap();
/// assert_eq!(refs, vec![Reference::new(2), Reference::new(1)]);
///
/// assert!(to_reference_list(None::<Vec<&str>>).unwrap().is_empty());
/// assert!(to_reference_list(Some(["x"])).is_err());
/// ```
pub fn to_reference_list<I>(ids: Option<I>) -> CoreResult<Vec<Reference>>
where
    I: IntoIterator,
    I::Item: Into<FieldValue>,
{
    let Some(ids) = ids else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for value in ids {
        let value: FieldValue = value.into();
        if value.is_blank() {
            continue;
        }
        let id = parse_id(&value)?;
        if seen.insert(id) {
            references.push(Reference::new(id));
        }
    }
    Ok(references)
}

/// Wire references → form selection (stringified ids).
///
/// Tolerates an absent list by returning `[]`.
pub fn to_form_ids<'a, I>(references: Option<I>) -> Vec<String>
where
    I: IntoIterator<Item = &'a Reference>,
{
    references
        .map(|refs| refs.into_iter().map(|r| r.id.to_string()).collect())
        .unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================
