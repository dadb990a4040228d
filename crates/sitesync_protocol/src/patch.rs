//! The patch unit and its application semantics.

use crate::error::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of structural change a patch describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert a new key or array element.
    Add,
    /// Overwrite an existing key or array element.
    Replace,
    /// Delete an existing key or array element.
    Remove,
}

/// One step of a patch path: an object key or an array index.
///
/// Serialized untagged, so a path is `(string|number)[]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl PathSegment {
    /// Creates a key segment.
    pub fn key(key: impl Into<String>) -> Self {
        PathSegment::Key(key.into())
    }

    /// Creates an index segment.
    pub fn index(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Renders a path as a `/`-separated string for error messages.
pub fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// A minimal structural diff unit; the transport and persistence atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// The kind of change.
    pub op: PatchOp,
    /// Where in the document the change applies.
    pub path: Vec<PathSegment>,
    /// The value to add or replace with. Absent for removes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Patch {
    /// Creates an add patch.
    pub fn add(path: Vec<PathSegment>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path,
            value: Some(value),
        }
    }

    /// Creates a replace patch.
    pub fn replace(path: Vec<PathSegment>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path,
            value: Some(value),
        }
    }

    /// Creates a remove patch.
    pub fn remove(path: Vec<PathSegment>) -> Self {
        Self {
            op: PatchOp::Remove,
            path,
            value: None,
        }
    }

    fn required_value(&self) -> PatchResult<&Value> {
        self.value.as_ref().ok_or_else(|| PatchError::MissingValue {
            path: render_path(&self.path),
        })
    }
}

/// Applies one patch to a document in place.
///
/// An empty path addresses the document root: `add` and `replace` swap
/// the whole document, `remove` is rejected.
pub fn apply_patch(target: &mut Value, patch: &Patch) -> PatchResult<()> {
    let Some((last, parents)) = patch.path.split_last() else {
        return match patch.op {
            PatchOp::Add | PatchOp::Replace => {
                *target = patch.required_value()?.clone();
                Ok(())
            }
            PatchOp::Remove => Err(PatchError::RootRemove),
        };
    };

    let parent = resolve(target, parents, &patch.path)?;
    let parent_path = || render_path(parents);
    let full_path = || render_path(&patch.path);

    match (patch.op, last) {
        (PatchOp::Add, PathSegment::Key(key)) => {
            let value = patch.required_value()?.clone();
            let map = parent.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
                path: parent_path(),
            })?;
            map.insert(key.clone(), value);
        }
        (PatchOp::Add, PathSegment::Index(index)) => {
            let value = patch.required_value()?.clone();
            let array = parent.as_array_mut().ok_or_else(|| PatchError::NotAnArray {
                path: parent_path(),
            })?;
            if *index > array.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: parent_path(),
                    index: *index,
                    len: array.len(),
                });
            }
            array.insert(*index, value);
        }
        (PatchOp::Replace, PathSegment::Key(key)) => {
            let value = patch.required_value()?.clone();
            let map = parent.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
                path: parent_path(),
            })?;
            let slot = map.get_mut(key).ok_or_else(|| PatchError::PathNotFound {
                path: full_path(),
            })?;
            *slot = value;
        }
        (PatchOp::Replace, PathSegment::Index(index)) => {
            let value = patch.required_value()?.clone();
            let array = parent.as_array_mut().ok_or_else(|| PatchError::NotAnArray {
                path: parent_path(),
            })?;
            let len = array.len();
            let slot = array
                .get_mut(*index)
                .ok_or(PatchError::IndexOutOfBounds {
                    path: parent_path(),
                    index: *index,
                    len,
                })?;
            *slot = value;
        }
        (PatchOp::Remove, PathSegment::Key(key)) => {
            let map = parent.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
                path: parent_path(),
            })?;
            map.remove(key).ok_or_else(|| PatchError::PathNotFound {
                path: full_path(),
            })?;
        }
        (PatchOp::Remove, PathSegment::Index(index)) => {
            let array = parent.as_array_mut().ok_or_else(|| PatchError::NotAnArray {
                path: parent_path(),
            })?;
            if *index >= array.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: parent_path(),
                    index: *index,
                    len: array.len(),
                });
            }
            array.remove(*index);
        }
    }

    Ok(())
}

/// Applies a list of patches in order, stopping at the first failure.
pub fn apply_all(target: &mut Value, patches: &[Patch]) -> PatchResult<()> {
    for patch in patches {
        apply_patch(target, patch)?;
    }
    Ok(())
}

fn resolve<'a>(
    target: &'a mut Value,
    segments: &[PathSegment],
    full: &[PathSegment],
) -> PatchResult<&'a mut Value> {
    let mut current = target;
    for (depth, segment) in segments.iter().enumerate() {
        current = match segment {
            PathSegment::Key(key) => {
                let map = current.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
                    path: render_path(&full[..depth]),
                })?;
                map.get_mut(key).ok_or_else(|| PatchError::PathNotFound {
                    path: render_path(&full[..=depth]),
                })?
            }
            PathSegment::Index(index) => {
                let array = current.as_array_mut().ok_or_else(|| PatchError::NotAnArray {
                    path: render_path(&full[..depth]),
                })?;
                let len = array.len();
                array.get_mut(*index).ok_or(PatchError::IndexOutOfBounds {
                    path: render_path(&full[..depth]),
                    index: *index,
                    len,
                })?
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format() {
        let patch = Patch::add(
            vec![PathSegment::key("children"), PathSegment::index(0)],
            json!({"id": "x"}),
        );
        let encoded = serde_json::to_string(&patch).unwrap();
        assert_eq!(
            encoded,
            r#"{"op":"add","path":["children",0],"value":{"id":"x"}}"#
        );

        let decoded: Patch = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, patch);
    }

    #[test]
    fn remove_omits_value() {
        let patch = Patch::remove(vec![PathSegment::key("title")]);
        let encoded = serde_json::to_string(&patch).unwrap();
        assert_eq!(encoded, r#"{"op":"remove","path":["title"]}"#);
    }

    #[test]
    fn add_to_object_and_array() {
        let mut doc = json!({"items": []});

        apply_patch(
            &mut doc,
            &Patch::add(vec!["items".into(), 0.into()], json!("a")),
        )
        .unwrap();
        apply_patch(
            &mut doc,
            &Patch::add(vec!["items".into(), 1.into()], json!("b")),
        )
        .unwrap();
        apply_patch(&mut doc, &Patch::add(vec!["name".into()], json!("list"))).unwrap();

        assert_eq!(doc, json!({"items": ["a", "b"], "name": "list"}));
    }

    #[test]
    fn replace_requires_existing_slot() {
        let mut doc = json!({"a": 1});

        apply_patch(&mut doc, &Patch::replace(vec!["a".into()], json!(2))).unwrap();
        assert_eq!(doc, json!({"a": 2}));

        let err = apply_patch(&mut doc, &Patch::replace(vec!["b".into()], json!(3))).unwrap_err();
        assert_eq!(
            err,
            PatchError::PathNotFound {
                path: "b".to_string()
            }
        );
    }

    #[test]
    fn remove_from_object_and_array() {
        let mut doc = json!({"a": 1, "items": ["x", "y"]});

        apply_patch(&mut doc, &Patch::remove(vec!["a".into()])).unwrap();
        apply_patch(&mut doc, &Patch::remove(vec!["items".into(), 0.into()])).unwrap();

        assert_eq!(doc, json!({"items": ["y"]}));
    }

    #[test]
    fn root_replace_and_remove() {
        let mut doc = json!({"a": 1});

        apply_patch(&mut doc, &Patch::replace(vec![], json!([1, 2]))).unwrap();
        assert_eq!(doc, json!([1, 2]));

        let err = apply_patch(&mut doc, &Patch::remove(vec![])).unwrap_err();
        assert_eq!(err, PatchError::RootRemove);
    }

    #[test]
    fn index_out_of_bounds() {
        let mut doc = json!({"items": ["a"]});

        let err = apply_patch(
            &mut doc,
            &Patch::add(vec!["items".into(), 5.into()], json!("b")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::IndexOutOfBounds {
                path: "items".to_string(),
                index: 5,
                len: 1
            }
        );
    }

    #[test]
    fn type_mismatch_errors() {
        let mut doc = json!({"a": 1});

        let err = apply_patch(
            &mut doc,
            &Patch::add(vec!["a".into(), "b".into()], json!(2)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::NotAnObject {
                path: "a".to_string()
            }
        );

        let err = apply_patch(
            &mut doc,
            &Patch::add(vec!["a".into(), 0.into()], json!(2)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::NotAnArray {
                path: "a".to_string()
            }
        );
    }

    #[test]
    fn nested_navigation() {
        let mut doc = json!({"root": {"children": [{"id": "x"}]}});

        apply_patch(
            &mut doc,
            &Patch::replace(
                vec!["root".into(), "children".into(), 0.into(), "id".into()],
                json!("y"),
            ),
        )
        .unwrap();

        assert_eq!(doc, json!({"root": {"children": [{"id": "y"}]}}));
    }
}
