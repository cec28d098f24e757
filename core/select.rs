use crate::tree::{FileTree, NodeId};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use thiserror::Error;

/// Non-fatal outcomes of [`apply_search_filter`]. Neither variant invalidates
/// the tree: `InvalidPattern` means the caller keeps its previous list,
/// `NoMatches` means it shows an empty one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("no results")]
    NoMatches,
}

/// Flip a node's selection; for a directory, overwrite the whole subtree
/// with the directory's new value rather than toggling each child.
pub fn toggle_selection(tree: &mut FileTree, id: NodeId) {
    let value = !tree.node(id).selected;
    set_selected(tree, id, value);
}

fn set_selected(tree: &mut FileTree, id: NodeId, value: bool) {
    tree.node_mut(id).selected = value;
    let children = tree.node(id).children.clone();
    for child in children {
        set_selected(tree, child, value);
    }
}

/// Overwrite `selected` across the entire tree, root included.
pub fn select_all(tree: &mut FileTree, value: bool) {
    let root = tree.root();
    set_selected(tree, root, value);
}

/// Overwrite `expanded` for every directory, root included.
pub fn expand_all(tree: &mut FileTree, value: bool) {
    let root = tree.root();
    set_expanded(tree, root, value);
}

fn set_expanded(tree: &mut FileTree, id: NodeId, value: bool) {
    if !tree.node(id).is_dir {
        return;
    }
    tree.node_mut(id).expanded = value;
    let children = tree.node(id).children.clone();
    for child in children {
        set_expanded(tree, child, value);
    }
}

/// Flip `expanded` for a directory; a no-op for files.
pub fn toggle_expand(tree: &mut FileTree, id: NodeId) {
    if tree.node(id).is_dir {
        let node = tree.node_mut(id);
        node.expanded = !node.expanded;
    }
}

/// Majority toggle over a directory's immediate children (descendants are
/// untouched): if at most half are selected, select them all, otherwise
/// deselect them all. A tie selects. For a file (or an empty directory)
/// this is a plain toggle of the node itself.
pub fn toggle_current_dir_only(tree: &mut FileTree, id: NodeId) {
    let node = tree.node(id);
    if node.is_dir && !node.children.is_empty() {
        let children = node.children.clone();
        let selected_count = children
            .iter()
            .filter(|&&child| tree.node(child).selected)
            .count();
        let select = selected_count * 2 <= children.len();
        for child in children {
            tree.node_mut(child).selected = select;
        }
    } else {
        let node = tree.node_mut(id);
        node.selected = !node.selected;
    }
}

/// Filter the tree view down to files whose *name* matches any of the glob
/// `queries` (OR semantics), plus their ancestor directories for context.
///
/// - An empty or all-blank query list clears the filter: the result is
///   `original` unchanged.
/// - A structurally invalid query fails with [`FilterError::InvalidPattern`]
///   before anything is matched or mutated.
/// - Zero matches fail with [`FilterError::NoMatches`]; the caller is
///   expected to display an empty list, not to restore the old one.
///
/// Every directory left visible with a visible child is forced
/// `expanded = true` so the caller's next redraw shows the matches.
/// The returned sequence preserves the tree's pre-order, not match order.
pub fn apply_search_filter(
    tree: &mut FileTree,
    queries: &[String],
    case_sensitive: bool,
    original: &[(NodeId, usize)],
) -> Result<Vec<(NodeId, usize)>, FilterError> {
    let live: Vec<&str> = queries
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();
    if live.is_empty() {
        return Ok(original.to_vec());
    }

    let mut matchers: Vec<GlobMatcher> = Vec::with_capacity(live.len());
    for &query in &live {
        let glob = GlobBuilder::new(query)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|_| FilterError::InvalidPattern(query.to_string()))?;
        matchers.push(glob.compile_matcher());
    }

    let all_nodes = tree.flatten(false);

    let mut visible: HashSet<NodeId> = HashSet::new();
    for &(id, _) in &all_nodes {
        let node = tree.node(id);
        if node.is_dir {
            continue;
        }
        if matchers.iter().any(|m| m.is_match(node.name.as_str())) {
            visible.insert(id);
            // Keep the ancestor chain so the match stays in tree context.
            let mut current = node.parent;
            while let Some(parent) = current {
                visible.insert(parent);
                current = tree.node(parent).parent;
            }
        }
    }

    if visible.is_empty() {
        return Err(FilterError::NoMatches);
    }

    let mut filtered = Vec::new();
    for &(id, depth) in &all_nodes {
        if !visible.contains(&id) {
            continue;
        }
        filtered.push((id, depth));
        let node = tree.node(id);
        if node.is_dir && node.children.iter().any(|child| visible.contains(child)) {
            tree.node_mut(id).expanded = true;
        }
    }
    Ok(filtered)
}
