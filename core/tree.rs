use crate::error::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Index of a node within its [`FileTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One file-or-directory entry.
///
/// Parent and child links are arena indices rather than owning references:
/// the tree owns every node through a single `Vec`, and dropping the tree
/// drops the whole subtree. A file node never has children.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub is_dir: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub selected: bool,
    pub expanded: bool,
}

impl Node {
    fn new(name: String, is_dir: bool, parent: Option<NodeId>) -> Self {
        Node {
            name,
            is_dir,
            parent,
            children: Vec::new(),
            selected: true,
            expanded: true,
        }
    }
}

/// Arena-backed file tree with per-node selection and expansion state.
///
/// The root node is excluded from flattened listings; its direct children
/// sit at depth 0.
#[derive(Debug)]
pub struct FileTree {
    nodes: Vec<Node>,
    root: NodeId,
    root_path: PathBuf,
}

impl FileTree {
    pub fn new(root_path: &Path) -> Self {
        // The root node carries the directory's own name; a nameless root
        // (filesystem root) falls back to the full path string.
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.to_string_lossy().into_owned());
        let root = Node::new(name, true, None);
        FileTree {
            nodes: vec![root],
            root: NodeId(0),
            root_path: root_path.to_path_buf(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attach a new node under `parent`. The parent must be a directory.
    pub fn add_child(&mut self, parent: NodeId, name: String, is_dir: bool) -> NodeId {
        debug_assert!(self.nodes[parent.0].is_dir, "files cannot have children");
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, is_dir, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Children ordered for display: directories first, then files, each
    /// group case-insensitively by name. Applied at flatten time so build
    /// order never matters.
    pub fn sorted_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.nodes[id.0].children.clone();
        children.sort_by_cached_key(|&child| {
            let node = &self.nodes[child.0];
            (!node.is_dir, node.name.to_lowercase())
        });
        children
    }

    /// Display path from the root's name down to this node, `/`-joined.
    pub fn display_path(&self, id: NodeId) -> String {
        let mut parts = vec![self.nodes[id.0].name.as_str()];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            parts.push(self.nodes[parent.0].name.as_str());
            current = parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Absolute filesystem path of this node.
    pub fn absolute_path(&self, id: NodeId) -> PathBuf {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            parts.push(self.nodes[current.0].name.clone());
            current = parent;
        }
        let mut path = self.root_path.clone();
        for part in parts.iter().rev() {
            path.push(part);
        }
        path
    }

    /// Pre-order `(node, depth)` sequence, root excluded, children sorted for
    /// display. With `visible_only`, a collapsed directory contributes none
    /// of its descendants.
    pub fn flatten(&self, visible_only: bool) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        self.flatten_into(self.root, 0, visible_only, &mut out);
        out
    }

    fn flatten_into(
        &self,
        id: NodeId,
        depth: usize,
        visible_only: bool,
        out: &mut Vec<(NodeId, usize)>,
    ) {
        let node = &self.nodes[id.0];
        if !node.is_dir || node.children.is_empty() {
            return;
        }
        if visible_only && !node.expanded {
            return;
        }
        for child in self.sorted_children(id) {
            out.push((child, depth));
            self.flatten_into(child, depth + 1, visible_only, out);
        }
    }

    /// Number of selected files. Directories never count.
    pub fn count_selected(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| !node.is_dir && node.selected)
            .count()
    }

    /// Contents of every selected file, in flattened tree order. Unreadable
    /// or non-UTF-8 files are reported and skipped; the batch always
    /// completes.
    pub fn collect_selected(&self) -> Vec<(String, String)> {
        self.collect_files(true)
    }

    /// Contents of every file regardless of selection, silently skipping
    /// unreadable ones. This is the dependency-analysis corpus, so files the
    /// user deselected stay valid resolution targets.
    pub fn collect_all(&self) -> Vec<(String, String)> {
        self.collect_files(false)
    }

    fn collect_files(&self, selected_only: bool) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (id, _) in self.flatten(false) {
            let node = &self.nodes[id.0];
            if node.is_dir || (selected_only && !node.selected) {
                continue;
            }
            let abs = self.absolute_path(id);
            match read_file(&abs) {
                Ok(content) => out.push((self.display_path(id), content)),
                Err(AppError::DataLoading(_)) if selected_only => {
                    log::warn!("Ignoring binary file: {}", self.display_path(id));
                }
                Err(err) if selected_only => {
                    log::warn!("Error reading {}: {}", abs.display(), err);
                }
                Err(err) => {
                    log::trace!("Skipping unreadable file {}: {}", abs.display(), err);
                }
            }
        }
        out
    }
}

/// One file read as an explicit result, so batch collectors decide what a
/// failure means instead of unwinding.
fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| AppError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes)
        .map_err(|_| AppError::DataLoading(format!("non-UTF-8 content in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// root/ { src/ { b.rs, a.rs }, zeta.txt, Alpha.txt }
    fn sample_tree() -> FileTree {
        let mut tree = FileTree::new(Path::new("/project"));
        let root = tree.root();
        tree.add_child(root, "zeta.txt".to_string(), false);
        let src = tree.add_child(root, "src".to_string(), true);
        tree.add_child(src, "b.rs".to_string(), false);
        tree.add_child(src, "a.rs".to_string(), false);
        tree.add_child(root, "Alpha.txt".to_string(), false);
        tree
    }

    fn names(tree: &FileTree, flat: &[(NodeId, usize)]) -> Vec<(String, usize)> {
        flat.iter()
            .map(|&(id, depth)| (tree.node(id).name.clone(), depth))
            .collect()
    }

    #[test]
    fn test_flatten_sorts_dirs_first_then_case_insensitive() {
        let tree = sample_tree();
        let flat = names(&tree, &tree.flatten(false));
        assert_eq!(
            flat,
            vec![
                ("src".to_string(), 0),
                ("a.rs".to_string(), 1),
                ("b.rs".to_string(), 1),
                ("Alpha.txt".to_string(), 0),
                ("zeta.txt".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_flatten_emits_every_non_root_node_once() {
        let tree = sample_tree();
        let flat = tree.flatten(false);
        assert_eq!(flat.len(), tree.len() - 1);
    }

    #[test]
    fn test_flatten_visible_skips_collapsed_subtrees() {
        let mut tree = sample_tree();
        let src = tree.flatten(false)[0].0;
        assert!(tree.node(src).is_dir);
        tree.node_mut(src).expanded = false;

        let flat = names(&tree, &tree.flatten(true));
        // The collapsed directory itself stays visible; its children vanish.
        assert_eq!(
            flat,
            vec![
                ("src".to_string(), 0),
                ("Alpha.txt".to_string(), 0),
                ("zeta.txt".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_flatten_depth_grows_by_one_per_level() {
        let tree = sample_tree();
        let flat = tree.flatten(false);
        for &(id, depth) in &flat {
            if let Some(parent) = tree.node(id).parent {
                if parent != tree.root() {
                    let parent_depth = flat
                        .iter()
                        .find(|&&(fid, _)| fid == parent)
                        .map(|&(_, d)| d)
                        .unwrap();
                    assert_eq!(depth, parent_depth + 1);
                } else {
                    assert_eq!(depth, 0);
                }
            }
        }
    }

    #[test]
    fn test_display_and_absolute_paths() {
        let tree = sample_tree();
        let src = tree.flatten(false)[0].0;
        let a_rs = tree.sorted_children(src)[0];
        assert_eq!(tree.display_path(a_rs), "project/src/a.rs");
        assert_eq!(tree.absolute_path(a_rs), PathBuf::from("/project/src/a.rs"));
        assert_eq!(tree.display_path(tree.root()), "project");
    }

    #[test]
    fn test_count_selected_ignores_directories() {
        let mut tree = sample_tree();
        assert_eq!(tree.count_selected(), 4);
        let src = tree.flatten(false)[0].0;
        tree.node_mut(src).selected = false;
        // Deselecting only the directory node changes nothing.
        assert_eq!(tree.count_selected(), 4);
    }

    #[test]
    fn test_collect_selected_matches_count_when_all_readable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("one.txt"), "first").unwrap();
        fs::write(dir.path().join("sub/two.txt"), "second").unwrap();

        let mut tree = FileTree::new(dir.path());
        let root = tree.root();
        tree.add_child(root, "one.txt".to_string(), false);
        let sub = tree.add_child(root, "sub".to_string(), true);
        let two = tree.add_child(sub, "two.txt".to_string(), false);

        let collected = tree.collect_selected();
        assert_eq!(collected.len(), tree.count_selected());
        assert!(collected.iter().any(|(_, c)| c == "first"));

        tree.node_mut(two).selected = false;
        let collected = tree.collect_selected();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.len(), tree.count_selected());
    }

    #[test]
    fn test_collect_skips_binary_files_without_aborting() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.txt"), "text").unwrap();
        fs::write(dir.path().join("bad.bin"), [0u8, 159, 146, 150]).unwrap();

        let mut tree = FileTree::new(dir.path());
        let root = tree.root();
        tree.add_child(root, "good.txt".to_string(), false);
        tree.add_child(root, "bad.bin".to_string(), false);

        let collected = tree.collect_all();
        assert_eq!(collected.len(), 1);
        assert!(collected[0].0.ends_with("good.txt"));
    }

    #[test]
    fn test_collect_all_includes_unselected_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kept.txt"), "kept").unwrap();
        fs::write(dir.path().join("dropped.txt"), "dropped").unwrap();

        let mut tree = FileTree::new(dir.path());
        let root = tree.root();
        tree.add_child(root, "kept.txt".to_string(), false);
        let dropped = tree.add_child(root, "dropped.txt".to_string(), false);
        tree.node_mut(dropped).selected = false;

        assert_eq!(tree.collect_selected().len(), 1);
        assert_eq!(tree.collect_all().len(), 2);
    }
}
