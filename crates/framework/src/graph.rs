//! Scene-state-to-visualization-node converters.
//!
//! Debug tooling that flattens framework and scene objects into generic
//! attribute-map nodes (`id`, `type`, `label`, `group`, `data`) plus an
//! adjacency list, serialized as JSON for external graph viewers.

use std::path::Path;

use serde_json::{json, Map, Value};

use vks_scene::{Camera, Transform};

/// The node categories the converters know about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Scene,
    Node,
    Transform,
    Camera,
    Mesh,
}

impl NodeKind {
    /// The type string written into the node attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "Text",
            NodeKind::Scene => "Scene",
            NodeKind::Node => "Node",
            NodeKind::Transform => "Transform",
            NodeKind::Camera => "Camera",
            NodeKind::Mesh => "Mesh",
        }
    }
}

/// Node label: the type string alone for unnamed objects, `Type: name`
/// otherwise.
fn label(kind: NodeKind, name: &str) -> String {
    if name.is_empty() {
        kind.as_str().to_string()
    } else {
        format!("{}: {}", kind.as_str(), name)
    }
}

/// A generic visualization node: a flat attribute map.
#[derive(Debug, Clone)]
pub struct GraphNode {
    attributes: Map<String, Value>,
}

impl GraphNode {
    fn with_kind(kind: NodeKind, name: &str) -> Self {
        let mut attributes = Map::new();
        attributes.insert("type".to_string(), json!(kind.as_str()));
        attributes.insert("label".to_string(), json!(label(kind, name)));
        attributes.insert("group".to_string(), json!(kind.as_str()));
        Self { attributes }
    }

    /// A free-text node.
    pub fn text(text: &str) -> Self {
        let mut attributes = Map::new();
        attributes.insert("label".to_string(), json!(text));
        Self { attributes }
    }

    /// A scene root node.
    pub fn scene(name: &str, child_count: usize) -> Self {
        let mut node = Self::with_kind(NodeKind::Scene, name);
        node.attributes
            .insert("data".to_string(), json!({ "children_count": child_count }));
        node
    }

    /// A plain scene node.
    pub fn node(name: &str) -> Self {
        Self::with_kind(NodeKind::Node, name)
    }

    /// A camera node carrying projection parameters.
    pub fn camera(camera: &Camera) -> Self {
        let mut node = Self::with_kind(NodeKind::Camera, "");
        node.attributes.insert(
            "data".to_string(),
            json!({
                "fov_degrees": camera.fov_y().to_degrees(),
                "aspect": camera.aspect(),
                "position": [camera.position.x, camera.position.y, camera.position.z],
            }),
        );
        node
    }

    /// A transform node carrying TRS components.
    pub fn transform(name: &str, transform: &Transform) -> Self {
        let mut node = Self::with_kind(NodeKind::Transform, name);
        let t = transform.translation;
        let r = transform.rotation;
        let s = transform.scale;
        node.attributes.insert(
            "data".to_string(),
            json!({
                "translation": [t.x, t.y, t.z],
                "rotation": [r.x, r.y, r.z, r.w],
                "scale": [s.x, s.y, s.z],
            }),
        );
        node
    }

    /// A mesh node carrying geometry counts.
    pub fn mesh(name: &str, vertex_count: usize, index_count: usize) -> Self {
        let mut node = Self::with_kind(NodeKind::Mesh, name);
        node.attributes.insert(
            "data".to_string(),
            json!({ "vertices": vertex_count, "indices": index_count }),
        );
        node
    }

    /// The node's attribute map.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// A visualization graph: nodes plus directed edges.
#[derive(Debug, Default)]
pub struct Graph {
    name: String,
    nodes: Vec<GraphNode>,
    edges: Vec<[usize; 2]>,
}

impl Graph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Adds a node, assigning and returning its id.
    pub fn add_node(&mut self, mut node: GraphNode) -> usize {
        let id = self.nodes.len();
        node.attributes.insert("id".to_string(), json!(id));
        self.nodes.push(node);
        id
    }

    /// Adds a directed edge between two node ids.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        self.edges.push([from, to]);
    }

    /// Serializes the graph to a JSON value.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "nodes": self.nodes.iter().map(|n| Value::Object(n.attributes.clone())).collect::<Vec<_>>(),
            "edges": self.edges.iter().map(|[from, to]| json!({ "from": from, "to": to })).collect::<Vec<_>>(),
        })
    }

    /// Writes the graph as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn write_to_file(&self, path: &Path) -> vks_core::Result<()> {
        let text = serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| vks_core::Error::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn nodes_carry_type_label_and_group() {
        let node = GraphNode::node("root");
        let attributes = node.attributes();
        assert_eq!(attributes["type"], "Node");
        assert_eq!(attributes["label"], "Node: root");
        assert_eq!(attributes["group"], "Node");
    }

    #[test]
    fn unnamed_nodes_use_the_bare_type_as_label() {
        let camera = Camera::default();
        let node = GraphNode::camera(&camera);
        assert_eq!(node.attributes()["label"], "Camera");
        assert!(node.attributes()["data"]["aspect"].is_number());
    }

    #[test]
    fn transform_node_includes_trs_data() {
        let transform = Transform {
            translation: Vec3::new(1.0, 0.0, -2.0),
            ..Transform::IDENTITY
        };
        let node = GraphNode::transform("cube", &transform);
        let data = &node.attributes()["data"];
        assert_eq!(data["translation"][0], 1.0);
        assert_eq!(data["scale"][1], 1.0);
    }

    #[test]
    fn graph_assigns_sequential_ids_and_keeps_edges() {
        let mut graph = Graph::new("scene");
        let root = graph.add_node(GraphNode::scene("demo", 1));
        let child = graph.add_node(GraphNode::node("cube"));
        graph.add_edge(root, child);

        let value = graph.to_json();
        assert_eq!(value["name"], "scene");
        assert_eq!(value["nodes"][0]["id"], 0);
        assert_eq!(value["nodes"][1]["id"], 1);
        assert_eq!(value["edges"][0]["from"], 0);
        assert_eq!(value["edges"][0]["to"], 1);
        assert_eq!(value["nodes"][0]["data"]["children_count"], 1);
    }
}
