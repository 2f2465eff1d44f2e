use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::NodeId;
use crate::error::StanzaError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub id: String,
    pub parent: String,
    pub children: String,
    pub label: String,
    pub value: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            parent: "parent".to_string(),
            children: "children".to_string(),
            label: "label".to_string(),
            value: "value".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl TreeNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: Vec::new(),
            label: None,
            value: None,
        }
    }
}

/// Reconciles the `parent` and `children` declarations of a flat node list.
///
/// Explicit parent fields are recorded first and every children list is
/// applied afterwards, so a children declaration overrides a conflicting
/// parent field; between two children lists naming the same id, the later
/// node in input order wins. Each output node's `children` holds every id
/// whose resolved parent is that node, ordered by first appearance.
pub fn normalize_tree(nodes: &[Value], fields: &FieldNames) -> Result<Vec<TreeNode>, StanzaError> {
    let objects = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            node.as_object().ok_or_else(|| StanzaError::InvalidNode {
                index,
                message: "expected a JSON object".to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ids = objects
        .iter()
        .enumerate()
        .map(|(index, object)| {
            object
                .get(&fields.id)
                .and_then(NodeId::from_value)
                .ok_or_else(|| StanzaError::InvalidNode {
                    index,
                    message: format!("missing string or integer `{}`", fields.id),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut relations = ParentMap::new(&ids);
    for (index, (object, id)) in objects.iter().zip(&ids).enumerate() {
        if let Some(parent) = read_id(object, &fields.parent, index)? {
            relations.set(id.clone(), parent);
        }
    }
    for (index, (object, id)) in objects.iter().zip(&ids).enumerate() {
        for child in read_children(object, &fields.children, index)? {
            relations.set(child, id.clone());
        }
    }

    let mut children_by_parent = relations.children_index();
    let mut emitted = HashSet::new();
    Ok(objects
        .iter()
        .zip(ids)
        .map(|(object, id)| {
            // Duplicate ids share one child list; only the first copy gets it.
            let children = if emitted.insert(id.clone()) {
                children_by_parent.remove(&id).unwrap_or_default()
            } else {
                Vec::new()
            };
            TreeNode {
                parent: relations.parent_of(&id).cloned(),
                children,
                label: read_value(object, &fields.label),
                value: read_value(object, &fields.value),
                id,
            }
        })
        .collect())
}

struct ParentMap {
    parents: HashMap<NodeId, NodeId>,
    order: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl ParentMap {
    fn new(ids: &[NodeId]) -> Self {
        let mut map = Self {
            parents: HashMap::new(),
            order: Vec::with_capacity(ids.len()),
            seen: HashSet::new(),
        };
        for id in ids {
            map.remember(id);
        }
        map
    }

    fn remember(&mut self, id: &NodeId) {
        if self.seen.insert(id.clone()) {
            self.order.push(id.clone());
        }
    }

    fn set(&mut self, child: NodeId, parent: NodeId) {
        self.remember(&child);
        self.parents.insert(child, parent);
    }

    fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    fn children_index(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut index: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for id in &self.order {
            if let Some(parent) = self.parents.get(id) {
                index.entry(parent.clone()).or_default().push(id.clone());
            }
        }
        index
    }
}

fn read_id(
    object: &Map<String, Value>,
    key: &str,
    index: usize,
) -> Result<Option<NodeId>, StanzaError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => NodeId::from_value(value)
            .map(Some)
            .ok_or_else(|| StanzaError::InvalidNode {
                index,
                message: format!("`{key}` must be a string or integer id"),
            }),
    }
}

fn read_children(
    object: &Map<String, Value>,
    key: &str,
    index: usize,
) -> Result<Vec<NodeId>, StanzaError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                NodeId::from_value(item).ok_or_else(|| StanzaError::InvalidNode {
                    index,
                    message: format!("`{key}` entries must be string or integer ids"),
                })
            })
            .collect(),
        Some(_) => Err(StanzaError::InvalidNode {
            index,
            message: format!("`{key}` must be an array"),
        }),
    }
}

fn read_value(object: &Map<String, Value>, key: &str) -> Option<Value> {
    object.get(key).filter(|value| !value.is_null()).cloned()
}
