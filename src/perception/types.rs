use serde::{Deserialize, Serialize};

use crate::errors::DonnaResult;

/// Index of a node inside one [`UiTree`] snapshot. Only meaningful for the
/// snapshot that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Opaque platform reference the bridge uses to act on the live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiNode {
    pub id: NodeId,
    pub handle: NodeHandle,
    pub text: Option<String>,
    /// Content description / accessibility label.
    pub label: Option<String>,
    /// Resource id, e.g. `com.whatsapp:id/menu_search`.
    pub element_id: Option<String>,
    /// Foreign-app-defined class or role, e.g. `androidx.recyclerview.widget.RecyclerView`.
    pub class_name: Option<String>,
    pub clickable: bool,
    pub editable: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Read-only snapshot of the foreground window's accessibility tree.
///
/// Nodes are stored in depth-first pre-order, so iterating `nodes` is a
/// document-order traversal. The root is always `NodeId(0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiTree {
    pub(crate) nodes: Vec<UiNode>,
    pub(crate) input_focus: Option<NodeId>,
}

/// Nested description of a node, as produced by a platform shim's JSON dump
/// or written by hand in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub handle: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(mut self, handle: u64) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn element_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

impl UiTree {
    /// Flatten a nested spec into a pre-order arena. Nodes without an explicit
    /// handle get their arena index as handle.
    pub fn from_spec(root: NodeSpec) -> Self {
        let mut tree = UiTree {
            nodes: Vec::new(),
            input_focus: None,
        };
        tree.push_spec(root, None);
        tree
    }

    pub fn from_json(json: &str) -> DonnaResult<Self> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(spec))
    }

    fn push_spec(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(UiNode {
            id,
            handle: NodeHandle(spec.handle.unwrap_or(id.0 as u64)),
            text: spec.text,
            label: spec.label,
            element_id: spec.element_id,
            class_name: spec.class_name,
            clickable: spec.clickable,
            editable: spec.editable,
            parent,
            children: Vec::new(),
        });
        if spec.focused && self.input_focus.is_none() {
            self.input_focus = Some(id);
        }
        for child in spec.children {
            let child_id = self.push_spec(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }
}
