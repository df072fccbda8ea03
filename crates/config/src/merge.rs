//! Merge primitives shared by normalization and mutation.

use crate::document::{SecurityValues, UsecaseDefaults, UsecaseDefaultsMap};
use serde_json::{Map, Value};

/// Deep-merge `overlay` into `base`; overlay wins on conflicting leaves.
///
/// Nested records merge field by field; every other value (arrays included)
/// is replaced wholesale.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            },
            _ => {
                base.insert(key.clone(), value.clone());
            },
        }
    }
}

/// Deep-merge two optional records into a new one.
#[must_use]
pub fn merged_input(
    base: Option<&Map<String, Value>>,
    overlay: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overlay) = overlay {
        deep_merge(&mut merged, overlay);
    }
    merged
}

/// Merge security values by id.
///
/// Entries of `right` replace same-id entries of `left` in place; the rest of
/// `right` is appended in order.
#[must_use]
pub fn merge_security(left: &[SecurityValues], right: &[SecurityValues]) -> Vec<SecurityValues> {
    let mut merged = left.to_vec();
    for incoming in right {
        match merged.iter_mut().find(|existing| existing.id() == incoming.id()) {
            Some(existing) => existing.clone_from(incoming),
            None => merged.push(incoming.clone()),
        }
    }
    merged
}

/// Merge raw use-case defaults; `overlay` wins per field, inputs deep-merge.
#[must_use]
pub fn merge_usecase_defaults(
    base: Option<&UsecaseDefaultsMap>,
    overlay: Option<&UsecaseDefaultsMap>,
) -> Option<UsecaseDefaultsMap> {
    let (base, overlay) = match (base, overlay) {
        (None, None) => return None,
        (Some(base), None) => return Some(base.clone()),
        (None, Some(overlay)) => return Some(overlay.clone()),
        (Some(base), Some(overlay)) => (base, overlay),
    };

    let mut merged = base.clone();
    for (usecase, incoming) in overlay {
        let combined = match merged.get(usecase) {
            Some(existing) => UsecaseDefaults {
                input: match (&existing.input, &incoming.input) {
                    (None, None) => None,
                    (existing_input, incoming_input) => Some(merged_input(
                        existing_input.as_ref(),
                        incoming_input.as_ref(),
                    )),
                },
                provider_failover: incoming.provider_failover.or(existing.provider_failover),
                retry_policy: incoming
                    .retry_policy
                    .clone()
                    .or_else(|| existing.retry_policy.clone()),
            },
            None => incoming.clone(),
        };
        merged.insert(usecase.clone(), combined);
    }
    Some(merged)
}
