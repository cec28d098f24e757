use crate::ignores::IgnoreSet;
use crate::tree::{FileTree, NodeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Build the in-memory tree for `root_path`, pruning ignored directories
/// before descending into them and always pruning symlinks (cycle guard).
///
/// The root is assumed to exist and be a directory; callers validate that.
/// Unreadable subdirectories are skipped with a warning and simply contribute
/// no nodes.
pub fn build_tree(root_path: &Path, ignores: &IgnoreSet) -> FileTree {
    log::debug!("Scanning directory: {}", root_path.display());
    let mut tree = FileTree::new(root_path);
    let mut dir_ids: HashMap<PathBuf, NodeId> = HashMap::new();
    dir_ids.insert(root_path.to_path_buf(), tree.root());

    let walker = WalkDir::new(root_path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.path_is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                return false;
            }
            let rel = relative_str(entry.path(), root_path);
            !ignores.should_ignore(&rel, entry.file_type().is_dir())
        });

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable path: {}", err);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        // The parent directory is always created before its entries; if it
        // is missing it was pruned, and this entry goes with it.
        let Some(&parent) = entry.path().parent().and_then(|p| dir_ids.get(p)) else {
            continue;
        };
        let is_dir = entry.file_type().is_dir();
        let name = entry.file_name().to_string_lossy().into_owned();
        let id = tree.add_child(parent, name, is_dir);
        if is_dir {
            dir_ids.insert(entry.path().to_path_buf(), id);
        }
    }

    log::debug!("Scan complete: {} nodes", tree.len());
    tree
}

/// Path relative to the scan root, `/`-normalized for pattern matching.
fn relative_str(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, "content").unwrap();
    }

    fn flat_names(tree: &FileTree) -> Vec<String> {
        tree.flatten(false)
            .iter()
            .map(|&(id, _)| tree.display_path(id))
            .collect()
    }

    #[test]
    fn test_build_includes_files_and_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        touch(&dir.path().join("src/main.rs"));
        touch(&dir.path().join("README.md"));

        let tree = build_tree(dir.path(), &IgnoreSet::default());
        let names = flat_names(&tree);
        assert_eq!(names.len(), 3);
        assert!(names.iter().any(|n| n.ends_with("src/main.rs")));
        assert!(names.iter().any(|n| n.ends_with("README.md")));
    }

    #[test]
    fn test_ignored_directories_are_pruned_entirely() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        touch(&dir.path().join("node_modules/dep.js"));
        touch(&dir.path().join("app.js"));

        let ignores = IgnoreSet::from_lines(&["node_modules"]);
        let tree = build_tree(dir.path(), &ignores);
        let names = flat_names(&tree);
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("app.js"));
    }

    #[test]
    fn test_negated_pattern_keeps_file_inside_scan() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("error.log"));
        touch(&dir.path().join("important.log"));
        touch(&dir.path().join("readme.md"));

        let ignores = IgnoreSet::from_lines(&["*.log", "!important.log"]);
        let tree = build_tree(dir.path(), &ignores);
        let names = flat_names(&tree);
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("important.log")));
        assert!(names.iter().any(|n| n.ends_with("readme.md")));
        assert!(!names.iter().any(|n| n.ends_with("error.log")));
    }

    #[test]
    fn test_nested_ignores_apply_to_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        touch(&dir.path().join("a/b/keep.rs"));
        touch(&dir.path().join("a/b/skip.tmp"));

        let ignores = IgnoreSet::from_lines(&["*.tmp"]);
        let tree = build_tree(dir.path(), &ignores);
        let names = flat_names(&tree);
        assert!(names.iter().any(|n| n.ends_with("keep.rs")));
        assert!(!names.iter().any(|n| n.ends_with("skip.tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_always_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("real.txt"));
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let tree = build_tree(dir.path(), &IgnoreSet::default());
        let names = flat_names(&tree);
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("real.txt"));
    }

    #[test]
    fn test_every_relative_path_gets_exactly_one_node() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        touch(&dir.path().join("x/y/z.txt"));

        let tree = build_tree(dir.path(), &IgnoreSet::default());
        let mut names = flat_names(&tree);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tree.flatten(false).len());
    }
}
