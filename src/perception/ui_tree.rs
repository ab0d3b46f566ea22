//! Read-only queries over a [`UiTree`] snapshot.
//!
//! Every search walks the arena in depth-first pre-order (document order) and
//! returns matches in that order. Matching is case-insensitive. An empty
//! needle matches nothing. Results may be empty at any time; the tree is
//! whatever the foreign app happened to have rendered when it was captured.
use crate::perception::types::{NodeId, UiNode, UiTree};

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle_lower))
}

fn needle(s: &str) -> Option<String> {
    let n = s.trim().to_lowercase();
    (!n.is_empty()).then_some(n)
}

impl UiTree {
    pub fn root(&self) -> Option<&UiNode> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&UiNode> {
        self.nodes.get(id.0)
    }

    /// Document-order iterator over every node.
    pub fn iter(&self) -> impl Iterator<Item = &UiNode> {
        self.nodes.iter()
    }

    pub fn parent(&self, node: &UiNode) -> Option<&UiNode> {
        node.parent.and_then(|p| self.node(p))
    }

    pub fn children<'a>(&'a self, node: &'a UiNode) -> impl Iterator<Item = &'a UiNode> + 'a {
        node.children.iter().filter_map(move |c| self.node(*c))
    }

    /// Parent chain from the node's parent up to the root.
    pub fn ancestors<'a>(&'a self, node: &UiNode) -> impl Iterator<Item = &'a UiNode> + 'a {
        let mut next = node.parent;
        std::iter::from_fn(move || {
            let current = self.node(next?)?;
            next = current.parent;
            Some(current)
        })
    }

    /// Node the platform reports as holding input focus.
    pub fn focused_input(&self) -> Option<&UiNode> {
        self.input_focus.and_then(|id| self.node(id))
    }

    /// Nodes whose visible text equals `s` (case-insensitive, trimmed).
    pub fn find_by_text(&self, s: &str) -> Vec<&UiNode> {
        let Some(n) = needle(s) else { return Vec::new() };
        self.nodes
            .iter()
            .filter(|node| {
                node.text
                    .as_deref()
                    .is_some_and(|t| t.trim().to_lowercase() == n)
            })
            .collect()
    }

    /// Nodes whose visible text contains `s`.
    pub fn find_by_text_substring(&self, s: &str) -> Vec<&UiNode> {
        let Some(n) = needle(s) else { return Vec::new() };
        self.nodes
            .iter()
            .filter(|node| contains_ci(node.text.as_deref(), &n))
            .collect()
    }

    pub fn find_by_label_substring(&self, s: &str) -> Vec<&UiNode> {
        let Some(n) = needle(s) else { return Vec::new() };
        self.nodes
            .iter()
            .filter(|node| contains_ci(node.label.as_deref(), &n))
            .collect()
    }

    pub fn find_by_id_substring(&self, s: &str) -> Vec<&UiNode> {
        let Some(n) = needle(s) else { return Vec::new() };
        self.nodes
            .iter()
            .filter(|node| contains_ci(node.element_id.as_deref(), &n))
            .collect()
    }

    pub fn find_by_class_substring(&self, s: &str) -> Vec<&UiNode> {
        let Some(n) = needle(s) else { return Vec::new() };
        self.nodes
            .iter()
            .filter(|node| contains_ci(node.class_name.as_deref(), &n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::perception::types::{NodeSpec, UiTree};

    fn chat_list() -> UiTree {
        UiTree::from_spec(
            NodeSpec::new()
                .class_name("android.widget.FrameLayout")
                .child(
                    NodeSpec::new()
                        .label("Search")
                        .element_id("com.whatsapp:id/menu_search")
                        .clickable(),
                )
                .child(
                    NodeSpec::new()
                        .class_name("androidx.recyclerview.widget.RecyclerView")
                        .child(NodeSpec::new().clickable().child(NodeSpec::new().text("Ramesh Kumar")))
                        .child(NodeSpec::new().clickable().child(NodeSpec::new().text("ramesh"))),
                )
                .child(NodeSpec::new().text("Type a message").editable().focused()),
        )
    }

    #[test]
    fn pre_order_layout() {
        let tree = chat_list();
        let texts: Vec<_> = tree.iter().filter_map(|n| n.text.as_deref()).collect();
        assert_eq!(texts, vec!["Ramesh Kumar", "ramesh", "Type a message"]);
        assert_eq!(tree.root().unwrap().children.len(), 3);
    }

    #[test]
    fn text_equality_versus_substring() {
        let tree = chat_list();
        let exact = tree.find_by_text("RAMESH");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].text.as_deref(), Some("ramesh"));

        let fuzzy = tree.find_by_text_substring("ramesh");
        assert_eq!(fuzzy.len(), 2);
        assert_eq!(fuzzy[0].text.as_deref(), Some("Ramesh Kumar"));
    }

    #[test]
    fn label_id_and_class_substring() {
        let tree = chat_list();
        assert_eq!(tree.find_by_label_substring("sear").len(), 1);
        assert_eq!(tree.find_by_id_substring("id/menu_search").len(), 1);
        assert_eq!(tree.find_by_class_substring("recyclerview").len(), 1);
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let tree = chat_list();
        assert!(tree.find_by_text("").is_empty());
        assert!(tree.find_by_label_substring("  ").is_empty());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = chat_list();
        let leaf = tree.find_by_text("ramesh")[0];
        let chain: Vec<_> = tree.ancestors(leaf).map(|n| n.id.0).collect();
        assert_eq!(chain.len(), 3);
        assert_eq!(*chain.last().unwrap(), 0);
    }

    #[test]
    fn focus_is_recorded() {
        let tree = chat_list();
        assert_eq!(tree.focused_input().unwrap().text.as_deref(), Some("Type a message"));
    }

    #[test]
    fn parses_shim_json_dump() {
        let tree = UiTree::from_json(
            r#"{"class_name":"FrameLayout","children":[{"handle":42,"text":"Send","clickable":true}]}"#,
        )
        .unwrap();
        let send = tree.find_by_text("send")[0];
        assert_eq!(send.handle.0, 42);
        assert!(tree.parent(send).is_some());
    }
}
