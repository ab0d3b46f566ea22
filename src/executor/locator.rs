//! Composite search strategies over a fresh tree snapshot.
//!
//! Candidates are tried in document order and the first successful click
//! wins; there is no ranking by match quality.
use serde::{Deserialize, Serialize};

use crate::executor::input::ActionExecutor;
use crate::perception::traits::AccessibilityBridge;
use crate::perception::types::{NodeId, UiNode, UiTree};

/// Class-name fragments that mark a list / collection container.
const LIST_CLASS_HINTS: &[&str] = &["recyclerview", "listview", "gridview", "list", "collection"];

/// Child positions tried inside a list container. Position 0 is often a
/// non-interactive header.
const LIST_ITEM_POSITIONS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateCriteria {
    pub text: Option<String>,
    pub label: Option<String>,
    pub id_substring: Option<String>,
    /// Leave input fields out, e.g. a search box still holding the query.
    pub skip_editable: bool,
}

impl LocateCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same string for text and label, the common "find this name" case.
    pub fn named(name: &str) -> Self {
        Self::new().text(name).label(name)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn id(mut self, id_substring: &str) -> Self {
        self.id_substring = Some(id_substring.to_string());
        self
    }

    pub fn skip_editable(mut self) -> Self {
        self.skip_editable = true;
        self
    }

    /// Candidate lists in strategy order: exact text, then text substring
    /// (minus nodes already listed), then label, then id.
    fn candidates<'t>(&self, tree: &'t UiTree) -> Vec<Vec<&'t UiNode>> {
        let mut lists = Vec::new();
        if let Some(text) = self.text.as_deref() {
            let exact = tree.find_by_text(text);
            let fuzzy: Vec<_> = tree
                .find_by_text_substring(text)
                .into_iter()
                .filter(|n| !exact.iter().any(|e| e.id == n.id))
                .collect();
            lists.push(exact);
            lists.push(fuzzy);
        }
        if let Some(label) = self.label.as_deref() {
            lists.push(tree.find_by_label_substring(label));
        }
        if let Some(id) = self.id_substring.as_deref() {
            lists.push(tree.find_by_id_substring(id));
        }
        if self.skip_editable {
            for list in &mut lists {
                list.retain(|n| !n.editable);
            }
        }
        lists
    }
}

pub struct Locator<'a> {
    exec: ActionExecutor<'a>,
}

impl<'a> Locator<'a> {
    pub fn new(bridge: &'a mut dyn AccessibilityBridge) -> Self {
        Self {
            exec: ActionExecutor::new(bridge),
        }
    }

    pub fn executor(&mut self) -> &mut ActionExecutor<'a> {
        &mut self.exec
    }

    /// True when any strategy finds at least one node. No side effects.
    pub fn is_visible(&self, criteria: &LocateCriteria) -> bool {
        self.exec
            .snapshot()
            .is_some_and(|tree| criteria.candidates(&tree).iter().any(|l| !l.is_empty()))
    }

    pub fn locate_and_click(&mut self, criteria: &LocateCriteria) -> bool {
        let Some(tree) = self.exec.snapshot() else {
            tracing::debug!(?criteria, "locate_and_click: no accessible window");
            return false;
        };
        for list in criteria.candidates(&tree) {
            for node in list {
                if self.click_with_ancestor_fallback(&tree, node) {
                    tracing::debug!(?criteria, node = node.id.0, "locate_and_click: hit");
                    return true;
                }
            }
        }
        tracing::debug!(?criteria, "locate_and_click: exhausted");
        false
    }

    /// Click the node, or its nearest clickable ancestor when the node itself
    /// is a label nested inside the real tap target.
    pub fn click_with_ancestor_fallback(&mut self, tree: &UiTree, node: &UiNode) -> bool {
        if node.clickable {
            return self.exec.click(node);
        }
        match tree.ancestors(node).find(|a| a.clickable) {
            Some(target) => self.exec.click(target),
            None => false,
        }
    }

    /// Click one of the first few children of a list-like container. Keeps
    /// searching the rest of the tree when a container yields no click.
    pub fn locate_first_list_item(&mut self) -> bool {
        let Some(tree) = self.exec.snapshot() else {
            return false;
        };
        let mut containers: Vec<NodeId> = LIST_CLASS_HINTS
            .iter()
            .flat_map(|hint| tree.find_by_class_substring(hint))
            .filter(|n| !n.children.is_empty())
            .map(|n| n.id)
            .collect();
        // Document order, each container once.
        containers.sort();
        containers.dedup();

        for container in containers {
            let Some(node) = tree.node(container) else { continue };
            for child in tree.children(node).take(LIST_ITEM_POSITIONS) {
                if child.clickable && self.exec.click(child) {
                    tracing::debug!(container = container.0, child = child.id.0, "first list item clicked");
                    return true;
                }
            }
        }
        false
    }

    /// Input-focused node if the platform reports one, else the first
    /// editable node in document order.
    pub fn locate_editable(&self) -> Option<UiNode> {
        let tree = self.exec.snapshot()?;
        tree.focused_input()
            .or_else(|| tree.iter().find(|n| n.editable))
            .cloned()
    }

    pub fn type_into_editable(&mut self, text: &str) -> bool {
        let target = self.locate_editable();
        self.exec.set_text(target.as_ref(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::types::NodeSpec;
    use crate::testing::FakeBridge;

    #[test]
    fn nothing_matches_no_side_effect() {
        let mut bridge = FakeBridge::showing(UiTree::from_spec(
            NodeSpec::new().child(NodeSpec::new().label("Menu").clickable()),
        ));
        let mut locator = Locator::new(&mut bridge);
        assert!(!locator.locate_and_click(&LocateCriteria::named("Search").id("search")));
        drop(locator);
        assert!(bridge.with(|s| s.actions.is_empty()));
    }

    #[test]
    fn no_window_is_not_found() {
        let mut bridge = FakeBridge::default();
        let mut locator = Locator::new(&mut bridge);
        assert!(!locator.locate_and_click(&LocateCriteria::named("Search")));
        assert!(!locator.locate_first_list_item());
        assert!(locator.locate_editable().is_none());
    }

    #[test]
    fn ancestor_fallback_reaches_clickable_root_once() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .handle(100)
                .clickable()
                .child(NodeSpec::new().handle(101).child(NodeSpec::new().handle(102).text("Ramesh"))),
        );
        let mut bridge = FakeBridge::showing(tree.clone());
        let mut locator = Locator::new(&mut bridge);
        let leaf = tree.find_by_text("ramesh")[0];
        assert!(locator.click_with_ancestor_fallback(&tree, leaf));
        drop(locator);
        assert_eq!(bridge.with(|s| s.clicks()), vec![100]);
    }

    #[test]
    fn ancestor_fallback_without_clickable_chain() {
        let tree = UiTree::from_spec(
            NodeSpec::new().child(NodeSpec::new().child(NodeSpec::new().text("Ramesh"))),
        );
        let mut bridge = FakeBridge::showing(tree.clone());
        let mut locator = Locator::new(&mut bridge);
        let leaf = tree.find_by_text("ramesh")[0];
        assert!(!locator.click_with_ancestor_fallback(&tree, leaf));
        drop(locator);
        assert!(bridge.with(|s| s.actions.is_empty()));
    }

    #[test]
    fn text_beats_label_beats_id() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(NodeSpec::new().handle(1).element_id("app:id/search").clickable())
                .child(NodeSpec::new().handle(2).label("Search chats").clickable())
                .child(NodeSpec::new().handle(3).text("Search").clickable()),
        );
        let mut bridge = FakeBridge::showing(tree);
        let mut locator = Locator::new(&mut bridge);
        assert!(locator.locate_and_click(&LocateCriteria::named("search").id("search")));
        drop(locator);
        assert_eq!(bridge.with(|s| s.clicks()), vec![3]);
    }

    #[test]
    fn skip_editable_passes_over_the_search_box() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(NodeSpec::new().handle(2).text("ramesh").editable().focused().clickable())
                .child(NodeSpec::new().handle(3).clickable().child(NodeSpec::new().handle(4).text("Ramesh"))),
        );
        let mut bridge = FakeBridge::showing(tree);
        let mut locator = Locator::new(&mut bridge);
        assert!(locator.locate_and_click(&LocateCriteria::named("ramesh").skip_editable()));
        drop(locator);
        assert_eq!(bridge.with(|s| s.clicks()), vec![3]);
    }

    #[test]
    fn rejected_candidate_falls_through_to_next() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(NodeSpec::new().handle(1).text("Ramesh").clickable())
                .child(NodeSpec::new().handle(2).text("Ramesh Kumar").clickable()),
        );
        let mut bridge = FakeBridge::showing(tree);
        bridge.with(|s| s.rejected.insert(1));
        let mut locator = Locator::new(&mut bridge);
        assert!(locator.locate_and_click(&LocateCriteria::named("ramesh")));
        drop(locator);
        assert_eq!(bridge.with(|s| s.clicks()), vec![2]);
    }

    #[test]
    fn first_list_item_skips_header_and_unclickable_lists() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(
                    NodeSpec::new()
                        .class_name("android.widget.ListView")
                        .child(NodeSpec::new().handle(10).text("Header"))
                        .child(NodeSpec::new().handle(11).text("Also static")),
                )
                .child(
                    NodeSpec::new()
                        .class_name("androidx.recyclerview.widget.RecyclerView")
                        .child(NodeSpec::new().handle(20).text("Suggestions"))
                        .child(NodeSpec::new().handle(21).text("test song").clickable())
                        .child(NodeSpec::new().handle(22).text("test song lyrics").clickable()),
                ),
        );
        let mut bridge = FakeBridge::showing(tree);
        let mut locator = Locator::new(&mut bridge);
        assert!(locator.locate_first_list_item());
        drop(locator);
        assert_eq!(bridge.with(|s| s.clicks()), vec![21]);
    }

    #[test]
    fn list_item_beyond_third_position_is_ignored() {
        let tree = UiTree::from_spec(
            NodeSpec::new().class_name("ListView")
                .child(NodeSpec::new())
                .child(NodeSpec::new())
                .child(NodeSpec::new())
                .child(NodeSpec::new().handle(9).clickable()),
        );
        let mut bridge = FakeBridge::showing(tree);
        let mut locator = Locator::new(&mut bridge);
        assert!(!locator.locate_first_list_item());
    }

    #[test]
    fn editable_prefers_focus() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(NodeSpec::new().handle(1).editable())
                .child(NodeSpec::new().handle(2).editable().focused()),
        );
        let mut bridge = FakeBridge::showing(tree);
        let locator = Locator::new(&mut bridge);
        assert_eq!(locator.locate_editable().unwrap().handle.0, 2);
    }

    #[test]
    fn editable_falls_back_to_first_in_document_order() {
        let tree = UiTree::from_spec(
            NodeSpec::new()
                .child(NodeSpec::new().handle(1).text("label"))
                .child(NodeSpec::new().handle(2).editable())
                .child(NodeSpec::new().handle(3).editable()),
        );
        let mut bridge = FakeBridge::showing(tree);
        let mut locator = Locator::new(&mut bridge);
        assert!(locator.type_into_editable("ramesh"));
        drop(locator);
        assert_eq!(bridge.with(|s| s.typed()), vec!["ramesh".to_string()]);
    }

    #[test]
    fn visibility_check_has_no_side_effect() {
        let mut bridge = FakeBridge::showing(UiTree::from_spec(
            NodeSpec::new().child(NodeSpec::new().label("Search").clickable()),
        ));
        let locator = Locator::new(&mut bridge);
        assert!(locator.is_visible(&LocateCriteria::named("search")));
        assert!(!locator.is_visible(&LocateCriteria::new().id("menu_search")));
        drop(locator);
        assert!(bridge.with(|s| s.actions.is_empty()));
    }
}
