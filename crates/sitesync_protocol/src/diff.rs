//! Structural diff with exact inverses, and the draft mechanism.

use crate::patch::{Patch, PathSegment};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// Forward patches plus the patches that undo them.
///
/// The round-trip law: applying `patches` to the pre-diff value yields
/// the post-diff value, and applying `revise_patches` to that result
/// restores the pre-diff value exactly. `revise_patches` is ordered so
/// it is valid as a plain list application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchSet {
    /// Patches that carry the value forward.
    pub patches: Vec<Patch>,
    /// Patches that revert the forward patches.
    pub revise_patches: Vec<Patch>,
}

impl PatchSet {
    /// Returns true if the diff found no changes.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Computes the minimal structural diff between two documents.
///
/// Objects are diffed by key, arrays by index with inserts and removes
/// confined to the tail, and any scalar or type change becomes a
/// replace of the whole subtree.
pub fn diff(before: &Value, after: &Value) -> PatchSet {
    let mut forward = Vec::new();
    let mut inverse = Vec::new();
    let mut path = Vec::new();
    diff_values(before, after, &mut path, &mut forward, &mut inverse);
    // Inverses are collected alongside their forward patches; reversing
    // the list makes the whole set valid as an ordered application.
    inverse.reverse();
    PatchSet {
        patches: forward,
        revise_patches: inverse,
    }
}

fn diff_values(
    before: &Value,
    after: &Value,
    path: &mut Vec<PathSegment>,
    forward: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    if before == after {
        return;
    }

    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            for (key, before_value) in b {
                path.push(PathSegment::key(key));
                match a.get(key) {
                    Some(after_value) => {
                        diff_values(before_value, after_value, path, forward, inverse);
                    }
                    None => {
                        forward.push(Patch::remove(path.clone()));
                        inverse.push(Patch::add(path.clone(), before_value.clone()));
                    }
                }
                path.pop();
            }
            for (key, after_value) in a {
                if b.contains_key(key) {
                    continue;
                }
                path.push(PathSegment::key(key));
                forward.push(Patch::add(path.clone(), after_value.clone()));
                inverse.push(Patch::remove(path.clone()));
                path.pop();
            }
        }
        (Value::Array(b), Value::Array(a)) => {
            let shared = b.len().min(a.len());
            for index in 0..shared {
                path.push(PathSegment::Index(index));
                diff_values(&b[index], &a[index], path, forward, inverse);
                path.pop();
            }
            // Grew: append in ascending order.
            for (index, after_value) in a.iter().enumerate().skip(shared) {
                path.push(PathSegment::Index(index));
                forward.push(Patch::add(path.clone(), after_value.clone()));
                inverse.push(Patch::remove(path.clone()));
                path.pop();
            }
            // Shrank: trim from the end so every remove index is valid.
            for index in (shared..b.len()).rev() {
                path.push(PathSegment::Index(index));
                forward.push(Patch::remove(path.clone()));
                inverse.push(Patch::add(path.clone(), b[index].clone()));
                path.pop();
            }
        }
        _ => {
            forward.push(Patch::replace(path.clone(), after.clone()));
            inverse.push(Patch::replace(path.clone(), before.clone()));
        }
    }
}

/// Result of finishing a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutcome {
    /// The post-mutation value to republish.
    pub value: Value,
    /// Forward patches relative to the pre-draft value.
    pub patches: Vec<Patch>,
    /// Inverse patches restoring the pre-draft value.
    pub revise_patches: Vec<Patch>,
}

/// A mutation-tracking working copy of a document value.
///
/// The draft dereferences to [`Value`], so a recipe mutates it
/// directly. [`Draft::finish`] diffs the working copy against the
/// base and yields the value together with its patch pair.
#[derive(Debug, Clone)]
pub struct Draft {
    base: Value,
    working: Value,
}

impl Draft {
    /// Opens a draft over the given base value.
    pub fn new(base: Value) -> Self {
        Self {
            working: base.clone(),
            base,
        }
    }

    /// Returns the pre-draft value.
    pub fn base(&self) -> &Value {
        &self.base
    }

    /// Finalizes the draft into a value and its patch pair.
    pub fn finish(self) -> DraftOutcome {
        let set = diff(&self.base, &self.working);
        DraftOutcome {
            value: self.working,
            patches: set.patches,
            revise_patches: set.revise_patches,
        }
    }
}

impl Deref for Draft {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.working
    }
}

impl DerefMut for Draft {
    fn deref_mut(&mut self) -> &mut Value {
        &mut self.working
    }
}
