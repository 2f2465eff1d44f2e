use assert_matches::assert_matches;
use serde_json::json;

use stanza_loader::domain::NodeId;
use stanza_loader::error::StanzaError;
use stanza_loader::hierarchy::{HierarchyOptions, build_hierarchy, select_sub_tree};
use stanza_loader::tree::{FieldNames, TreeNode, normalize_tree};

fn ids(nodes: &[TreeNode]) -> Vec<NodeId> {
    nodes.iter().map(|node| node.id.clone()).collect()
}

fn text_ids(values: &[&str]) -> Vec<NodeId> {
    values.iter().map(|value| NodeId::from(*value)).collect()
}

fn node(id: &str, parent: Option<&str>, children: &[&str]) -> TreeNode {
    TreeNode {
        parent: parent.map(NodeId::from),
        children: text_ids(children),
        ..TreeNode::new(id)
    }
}

#[test]
fn normalizes_parent_and_children_fields() {
    let nodes = vec![
        json!({"id": 1, "children": [2, 3]}),
        json!({"id": 2}),
        json!({"id": 3, "parent": 1}),
    ];
    let tree = normalize_tree(&nodes, &FieldNames::default()).unwrap();

    assert_eq!(tree[0].parent, None);
    assert_eq!(tree[0].children, vec![NodeId::Int(2), NodeId::Int(3)]);
    assert_eq!(tree[1].parent, Some(NodeId::Int(1)));
    assert_eq!(tree[2].parent, Some(NodeId::Int(1)));
    assert!(tree[2].children.is_empty());
}

#[test]
fn custom_field_names_and_payload() {
    let nodes = vec![
        json!({"key": "root", "name": "Root", "size": 10}),
        json!({"key": "leaf", "up": "root", "name": "Leaf"}),
    ];
    let fields = FieldNames {
        id: "key".to_string(),
        parent: "up".to_string(),
        children: "kids".to_string(),
        label: "name".to_string(),
        value: "size".to_string(),
    };
    let tree = normalize_tree(&nodes, &fields).unwrap();

    assert_eq!(tree[0].label, Some(json!("Root")));
    assert_eq!(tree[0].value, Some(json!(10)));
    assert_eq!(tree[0].children, text_ids(&["leaf"]));
    assert_eq!(tree[1].parent, Some(NodeId::from("root")));
    assert_eq!(tree[1].value, None);
}

#[test]
fn node_without_id_is_rejected() {
    let nodes = vec![json!({"id": "a"}), json!({"label": "orphan"})];
    let err = normalize_tree(&nodes, &FieldNames::default()).unwrap_err();
    assert_matches!(err, StanzaError::InvalidNode { index: 1, .. });
}

#[test]
fn single_root_hierarchy() {
    let tree = vec![
        node("r", None, &["c1", "c2"]),
        node("c1", Some("r"), &["c1a"]),
        node("c2", Some("r"), &[]),
        node("c1a", Some("c1"), &[]),
    ];
    let hierarchy = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap();

    assert_eq!(hierarchy.id(), &NodeId::from("r"));
    assert_eq!(hierarchy.height, 2);
    let c1a = hierarchy.find(&NodeId::from("c1a")).unwrap();
    assert_eq!(c1a.depth, 2);
    let leaves = hierarchy
        .leaves()
        .into_iter()
        .map(|leaf| leaf.id().clone())
        .collect::<Vec<_>>();
    assert_eq!(leaves, text_ids(&["c1a", "c2"]));
}

#[test]
fn multiple_roots_get_pseudo_root() {
    let tree = vec![node("A", None, &[]), node("B", None, &["B1"]), node("B1", Some("B"), &[])];
    let hierarchy = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap();

    assert_eq!(hierarchy.id(), &NodeId::from("PSEUDO_ROOT"));
    let children = hierarchy
        .children
        .iter()
        .map(|child| child.id().clone())
        .collect::<Vec<_>>();
    assert_eq!(children, text_ids(&["A", "B"]));
    assert_eq!(hierarchy.data.children, text_ids(&["A", "B"]));
    assert_eq!(hierarchy.children[0].data.parent, Some(NodeId::from("PSEUDO_ROOT")));
    assert_eq!(hierarchy.descendants().len(), 4);
}

#[test]
fn caller_tree_is_not_modified() {
    let tree = vec![node("A", None, &[]), node("B", None, &[])];
    let before = tree.clone();
    build_hierarchy(&tree, &HierarchyOptions::default()).unwrap();
    assert_eq!(tree, before);
}

#[test]
fn custom_pseudo_root_id() {
    let tree = vec![node("A", None, &[]), node("B", None, &[])];
    let options = HierarchyOptions {
        pseudo_root_id: NodeId::from("top"),
        ..HierarchyOptions::default()
    };
    let hierarchy = build_hierarchy(&tree, &options).unwrap();
    assert_eq!(hierarchy.id(), &NodeId::from("top"));
}

#[test]
fn pseudo_root_collision_fails() {
    let tree = vec![
        node("A", None, &[]),
        node("B", None, &[]),
        node("PSEUDO_ROOT", Some("A"), &[]),
    ];
    let err = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap_err();
    assert_matches!(err, StanzaError::Structural(_));
}

#[test]
fn select_sub_tree_ignores_input_order() {
    let tree = vec![
        node("C1a", Some("C1"), &[]),
        node("other", None, &[]),
        node("C2", Some("R"), &[]),
        node("R", None, &["C1", "C2"]),
        node("C1", Some("R"), &["C1a"]),
    ];
    let sub_tree = select_sub_tree(&tree, &NodeId::from("R")).unwrap();
    assert_eq!(ids(&sub_tree), text_ids(&["R", "C1", "C1a", "C2"]));
}

#[test]
fn root_selection_builds_subtree_hierarchy() {
    let tree = vec![
        node("top", None, &["mid"]),
        node("mid", Some("top"), &["leaf"]),
        node("leaf", Some("mid"), &[]),
    ];
    let options = HierarchyOptions {
        root_id: Some(NodeId::from("mid")),
        ..HierarchyOptions::default()
    };
    let hierarchy = build_hierarchy(&tree, &options).unwrap();

    assert_eq!(hierarchy.id(), &NodeId::from("mid"));
    assert_eq!(hierarchy.data.parent, None);
    assert_eq!(hierarchy.descendants().len(), 2);
}

#[test]
fn unknown_root_is_not_found() {
    let tree = vec![node("A", None, &[])];
    let options = HierarchyOptions {
        root_id: Some(NodeId::from("missing")),
        ..HierarchyOptions::default()
    };
    let err = build_hierarchy(&tree, &options).unwrap_err();
    assert_matches!(err, StanzaError::NodeNotFound(id) if id == "missing");
}

#[test]
fn dangling_parent_is_structural_error() {
    let tree = vec![node("A", None, &[]), node("B", Some("ghost"), &[])];
    let err = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap_err();
    assert_matches!(err, StanzaError::Structural(_));
}

#[test]
fn cycle_is_structural_error() {
    let tree = vec![
        node("root", None, &[]),
        node("x", Some("y"), &["y"]),
        node("y", Some("x"), &["x"]),
    ];
    let err = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap_err();
    assert_matches!(err, StanzaError::Structural(_));
}

#[test]
fn normalized_flat_nodes_build_end_to_end() {
    let nodes = vec![
        json!({"id": "animals", "children": ["cat", "dog"]}),
        json!({"id": "cat", "label": "Cat"}),
        json!({"id": "dog", "label": "Dog"}),
        json!({"id": "plants"}),
    ];
    let tree = normalize_tree(&nodes, &FieldNames::default()).unwrap();
    let hierarchy = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap();

    assert_eq!(hierarchy.id(), &NodeId::from("PSEUDO_ROOT"));
    assert_eq!(hierarchy.height, 2);
    let cat = hierarchy.find(&NodeId::from("cat")).unwrap();
    assert_eq!(cat.data.label, Some(json!("Cat")));
}

#[test]
fn deep_chain_builds_and_drops() {
    const DEPTH: usize = 20_000;
    let flat = (0..DEPTH as i64)
        .map(|id| match id {
            0 => json!({"id": id}),
            _ => json!({"id": id, "parent": id - 1}),
        })
        .collect::<Vec<_>>();
    let tree = normalize_tree(&flat, &FieldNames::default()).unwrap();

    let hierarchy = build_hierarchy(&tree, &HierarchyOptions::default()).unwrap();
    assert_eq!(hierarchy.id(), &NodeId::Int(0));
    assert_eq!(hierarchy.height, DEPTH - 1);
    assert_eq!(hierarchy.descendants().len(), DEPTH);
    let leaves = hierarchy.leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].id(), &NodeId::Int(DEPTH as i64 - 1));
    assert_eq!(leaves[0].depth, DEPTH - 1);
    drop(hierarchy);

    let options = HierarchyOptions {
        root_id: Some(NodeId::Int(5_000)),
        ..HierarchyOptions::default()
    };
    let sub_tree = build_hierarchy(&tree, &options).unwrap();
    assert_eq!(sub_tree.depth, 0);
    assert_eq!(sub_tree.height, DEPTH - 5_001);
    assert_eq!(sub_tree.descendants().len(), DEPTH - 5_000);
}
