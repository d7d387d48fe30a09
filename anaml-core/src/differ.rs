//! Differ - Compare desired state with current state
//!
//! Compares the attributes declared in configuration with the attributes
//! read back from the backend. Null, a missing key and an empty collection
//! all mean "not set" and never produce a change on their own.

use std::collections::{BTreeSet, HashMap};

use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state, sorted by name
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let keys: BTreeSet<&String> = desired.keys().chain(current.keys()).collect();

    keys.into_iter()
        .filter(|key| !key.starts_with('_'))
        .filter(|key| !equivalent(desired.get(*key), current.get(*key)))
        .cloned()
        .collect()
}

/// Equality that treats unset values as equal to a missing key, recursively
pub fn equivalent(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.filter(|v| !v.is_unset());
    let b = b.filter(|v| !v.is_unset());
    match (a, b) {
        (None, None) => true,
        (Some(Value::List(a)), Some(Value::List(b))) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equivalent(Some(x), Some(y)))
        }
        (Some(Value::Map(a)), Some(Value::Map(b))) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            keys.into_iter().all(|k| equivalent(a.get(k), b.get(k)))
        }
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
