use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::NodeId;
use crate::error::StanzaError;
use crate::tree::TreeNode;

pub const DEFAULT_PSEUDO_ROOT_ID: &str = "PSEUDO_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyOptions {
    pub root_id: Option<NodeId>,
    pub pseudo_root_id: NodeId,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            root_id: None,
            pseudo_root_id: NodeId::from(DEFAULT_PSEUDO_ROOT_ID),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub data: TreeNode,
    pub depth: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn id(&self) -> &NodeId {
        &self.data.id
    }

    pub fn descendants(&self) -> Vec<&HierarchyNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn leaves(&self) -> Vec<&HierarchyNode> {
        self.descendants()
            .into_iter()
            .filter(|node| node.children.is_empty())
            .collect()
    }

    pub fn find(&self, id: &NodeId) -> Option<&HierarchyNode> {
        self.descendants().into_iter().find(|node| node.id() == id)
    }
}

// Unlinks children level by level so deep chains never recurse on drop.
impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

pub fn select_sub_tree(tree: &[TreeNode], root_id: &NodeId) -> Result<Vec<TreeNode>, StanzaError> {
    let mut by_id: HashMap<&NodeId, &TreeNode> = HashMap::new();
    for node in tree {
        by_id.entry(&node.id).or_insert(node);
    }

    let root = by_id
        .get(root_id)
        .copied()
        .ok_or_else(|| StanzaError::NodeNotFound(root_id.to_string()))?;

    let mut selected = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !visited.insert(&node.id) {
            return Err(StanzaError::Structural(format!(
                "node {} is reachable twice below {root_id}",
                node.id
            )));
        }
        selected.push(node.clone());
        for child in node.children.iter().rev() {
            let child_node = by_id.get(child).copied().ok_or_else(|| {
                StanzaError::Structural(format!(
                    "node {child} listed as a child of {} is missing",
                    node.id
                ))
            })?;
            stack.push(child_node);
        }
    }
    Ok(selected)
}

/// Builds a single-rooted hierarchy from a normalized tree.
///
/// The input is never modified. With a `root_id` only that subtree is used
/// and its root is treated as parentless. Several parentless nodes are
/// gathered under a synthesized pseudo-root.
pub fn build_hierarchy(
    tree: &[TreeNode],
    options: &HierarchyOptions,
) -> Result<HierarchyNode, StanzaError> {
    let mut nodes = match &options.root_id {
        Some(root_id) => {
            let mut sub_tree = select_sub_tree(tree, root_id)?;
            if let Some(root) = sub_tree.first_mut() {
                root.parent = None;
            }
            sub_tree
        }
        None => tree.to_vec(),
    };

    let candidates = nodes
        .iter()
        .filter(|node| node.parent.is_none())
        .map(|node| node.id.clone())
        .collect::<Vec<_>>();

    if candidates.len() > 1 {
        let pseudo_root_id = &options.pseudo_root_id;
        if nodes.iter().any(|node| &node.id == pseudo_root_id) {
            return Err(StanzaError::Structural(format!(
                "pseudo-root id {pseudo_root_id} is already used by a node"
            )));
        }
        for node in nodes.iter_mut().filter(|node| node.parent.is_none()) {
            node.parent = Some(pseudo_root_id.clone());
        }
        let mut pseudo_root = TreeNode::new(pseudo_root_id.clone());
        pseudo_root.children = candidates;
        nodes.push(pseudo_root);
    }

    stratify(&nodes)
}

fn stratify(nodes: &[TreeNode]) -> Result<HierarchyNode, StanzaError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        if index.insert(node.id.clone(), position).is_some() {
            return Err(StanzaError::Structural(format!(
                "duplicate node id {}",
                node.id
            )));
        }
    }

    let mut root = None;
    let mut child_positions = vec![Vec::new(); nodes.len()];
    for (position, node) in nodes.iter().enumerate() {
        match &node.parent {
            None => {
                if root.replace(position).is_some() {
                    return Err(StanzaError::Structural("multiple roots".to_string()));
                }
            }
            Some(parent) => {
                let parent_position = index.get(parent).ok_or_else(|| {
                    StanzaError::Structural(format!(
                        "node {} references missing parent {parent}",
                        node.id
                    ))
                })?;
                child_positions[*parent_position].push(position);
            }
        }
    }
    let root = root.ok_or_else(|| {
        StanzaError::Structural("no root node; the parent relation is cyclic".to_string())
    })?;

    let order = pre_order(root, &child_positions);
    if order.len() != nodes.len() {
        return Err(StanzaError::Structural(format!(
            "{} node(s) are not connected to root {}",
            nodes.len() - order.len(),
            nodes[root].id
        )));
    }
    assemble(root, &order, nodes, &child_positions)
}

fn pre_order(root: usize, child_positions: &[Vec<usize>]) -> Vec<usize> {
    let mut order = Vec::with_capacity(child_positions.len());
    let mut stack = vec![root];
    while let Some(position) = stack.pop() {
        order.push(position);
        stack.extend(child_positions[position].iter().rev());
    }
    order
}

// Children always follow their parent in `order`, so walking it backwards
// finishes every subtree before the node that owns it.
fn assemble(
    root: usize,
    order: &[usize],
    nodes: &[TreeNode],
    child_positions: &[Vec<usize>],
) -> Result<HierarchyNode, StanzaError> {
    let mut depths = vec![0; nodes.len()];
    for &position in order {
        for &child in &child_positions[position] {
            depths[child] = depths[position] + 1;
        }
    }

    let mut built: Vec<Option<HierarchyNode>> = std::iter::repeat_with(|| None)
        .take(nodes.len())
        .collect();
    for &position in order.iter().rev() {
        let children = child_positions[position]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect::<Vec<_>>();
        let height = children
            .iter()
            .map(|child| child.height + 1)
            .max()
            .unwrap_or(0);
        built[position] = Some(HierarchyNode {
            data: nodes[position].clone(),
            depth: depths[position],
            height,
            children,
        });
    }

    built[root].take().ok_or_else(|| {
        StanzaError::Structural(format!("root {} was not assembled", nodes[root].id))
    })
}
