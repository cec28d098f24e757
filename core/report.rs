use crate::deps::DependencyMap;
use crate::error::{AppError, Result};
use crate::lang;
use crate::tree::{FileTree, NodeId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Txt,
    Md,
    Llm,
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "txt",
            ReportFormat::Md => "md",
            ReportFormat::Llm => "llm",
            ReportFormat::Json => "json",
        }
    }

    /// Whether this format embeds the dependency analysis.
    pub fn wants_dependencies(&self) -> bool {
        matches!(self, ReportFormat::Llm | ReportFormat::Json)
    }
}

impl FromStr for ReportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "txt" => Ok(ReportFormat::Txt),
            "md" => Ok(ReportFormat::Md),
            "llm" => Ok(ReportFormat::Llm),
            "json" => Ok(ReportFormat::Json),
            other => Err(AppError::InvalidArgument(format!(
                "unknown output format \"{}\" (expected txt, md, llm or json)",
                other
            ))),
        }
    }
}

/// Render the consolidated document for the selected files.
///
/// `contents` is the selected-file collection; `dependencies` feeds the llm
/// and json formats and may be empty for the others.
pub fn render(
    format: ReportFormat,
    tree: &FileTree,
    contents: &[(String, String)],
    dependencies: &DependencyMap,
) -> Result<String> {
    match format {
        ReportFormat::Txt => Ok(render_txt(tree, contents)),
        ReportFormat::Md => Ok(render_markdown(tree, contents)),
        ReportFormat::Llm => Ok(render_llm(tree, contents, dependencies)),
        ReportFormat::Json => render_json(tree, contents, dependencies, true),
    }
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| AppError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// `<dirname>.<ext>`, or `<dirname>(N).<ext>` until the name is unused in
/// the current working directory.
pub fn generate_output_filename(directory_path: &Path, extension: &str) -> String {
    let base = directory_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let mut name = format!("{}.{}", base, extension);
    let mut counter = 1;
    while Path::new(&name).exists() {
        name = format!("{}({}).{}", base, counter, extension);
        counter += 1;
    }
    name
}

/// Box-drawing rendering of the tree, root excluded (callers print the root
/// path themselves), directories before files.
pub fn tree_to_string(tree: &FileTree) -> String {
    let mut out = String::new();
    write_subtree(tree, tree.root(), "", &mut out);
    out
}

fn write_subtree(tree: &FileTree, id: NodeId, prefix: &str, out: &mut String) {
    let children = tree.sorted_children(id);
    let count = children.len();
    for (i, &child) in children.iter().enumerate() {
        let is_last = i + 1 == count;
        let branch = if is_last { "└── " } else { "├── " };
        let node = tree.node(child);
        let _ = writeln!(out, "{}{}{}", prefix, branch, node.name);
        if node.is_dir {
            let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            write_subtree(tree, child, &next_prefix, out);
        }
    }
}

fn fence_tag(path: &str) -> String {
    lang::extension_of(path.rsplit('/').next().unwrap_or(path))
        .map(|ext| ext[1..].to_lowercase())
        .unwrap_or_default()
}

fn push_fenced(out: &mut String, path: &str, content: &str) {
    let _ = writeln!(out, "```{}", fence_tag(path));
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n\n");
}

fn render_txt(tree: &FileTree, contents: &[(String, String)]) -> String {
    let mut out = String::new();
    out.push_str("<file_map>\n");
    let _ = writeln!(out, "{}", tree.root_path().display());
    out.push_str(&tree_to_string(tree));
    out.push_str("</file_map>\n\n");

    out.push_str("<file_contents>\n");
    for (path, content) in contents {
        let _ = writeln!(out, "File: {}", path);
        push_fenced(&mut out, path, content);
    }
    out.push_str("</file_contents>\n");
    out
}

fn render_markdown(tree: &FileTree, contents: &[(String, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Project Files: `{}`\n", tree.root_path().display());

    out.push_str("## 📁 File Structure\n\n```\n");
    let _ = writeln!(out, "{}", tree.root_path().display());
    out.push_str(&tree_to_string(tree));
    out.push_str("```\n\n");

    out.push_str("## 📄 File Contents\n\n");
    for (path, content) in contents {
        let _ = writeln!(out, "### {}\n", path);
        push_fenced(&mut out, path, content);
    }
    out
}

/// Split one file's targets into internal (a known path, recognizable by its
/// separator) and external references.
fn split_targets<'a>(
    targets: &'a std::collections::BTreeSet<String>,
) -> (Vec<&'a String>, Vec<&'a String>) {
    targets.iter().partition(|t| t.contains('/'))
}

fn list_truncated(items: &[&String], limit: usize) -> String {
    let mut text = items
        .iter()
        .take(limit)
        .map(|d| format!("`{}`", d))
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > limit {
        let _ = write!(text, " and {} more", items.len() - limit);
    }
    text
}

fn render_llm(tree: &FileTree, contents: &[(String, String)], dependencies: &DependencyMap) -> String {
    let mut out = String::new();
    out.push_str("# PROJECT ANALYSIS FOR AI ASSISTANT\n\n");

    // General project information.
    let all_flat = tree.flatten(false);
    let total_files = all_flat
        .iter()
        .filter(|&&(id, _)| !tree.node(id).is_dir)
        .count();
    out.push_str("## 📦 GENERAL INFORMATION\n\n");
    let _ = writeln!(out, "- **Project path**: `{}`", tree.root_path().display());
    let _ = writeln!(out, "- **Total files**: {}", total_files);
    let _ = writeln!(
        out,
        "- **Files included in this analysis**: {}",
        tree.count_selected()
    );
    let _ = writeln!(
        out,
        "- **Generated**: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let languages = language_histogram(contents);
    if !languages.is_empty() {
        out.push_str("- **Main languages used**:\n");
        for (ext, count) in top_counts(&languages, 5) {
            let _ = writeln!(out, "  - {} ({} files)", lang::language_name(&ext), count);
        }
    }
    out.push('\n');

    // Project structure.
    out.push_str("## 🗂️ PROJECT STRUCTURE\n\n```\n");
    let _ = writeln!(out, "{}", tree.root_path().display());
    out.push_str(&tree_to_string(tree));
    out.push_str("```\n\n");

    // Main top-level components.
    let root_name = tree.node(tree.root()).name.clone();
    let main_dirs: Vec<NodeId> = all_flat
        .iter()
        .filter(|&&(id, depth)| depth == 0 && tree.node(id).is_dir)
        .map(|&(id, _)| id)
        .collect();
    if !main_dirs.is_empty() {
        out.push_str("### 📂 Main Components\n\n");
        for dir in main_dirs {
            let dir_name = &tree.node(dir).name;
            let dir_prefix = format!("{}/{}/", root_name, dir_name);
            let dir_files: Vec<&String> = contents
                .iter()
                .map(|(p, _)| p)
                .filter(|p| p.starts_with(&dir_prefix))
                .collect();
            let _ = write!(out, "- **`{}/`** - ", dir_name);
            if !dir_files.is_empty() {
                let _ = write!(out, "Contains {} files", dir_files.len());
                let dir_langs = language_histogram(
                    &dir_files
                        .iter()
                        .map(|p| ((*p).clone(), String::new()))
                        .collect::<Vec<_>>(),
                );
                let names: Vec<String> = top_counts(&dir_langs, 2)
                    .into_iter()
                    .map(|(ext, _)| lang::language_name(&ext))
                    .collect();
                if !names.is_empty() {
                    let _ = write!(out, " mainly in {}", names.join(", "));
                }
            }
            out.push('\n');
        }
        out.push('\n');
    }

    // File relationships.
    out.push_str("## 🔄 FILE RELATIONSHIPS\n\n");

    let mut referenced_by: HashMap<&String, Vec<&String>> = HashMap::new();
    for (file, targets) in dependencies {
        for target in targets {
            if target.contains('/') {
                referenced_by.entry(target).or_default().push(file);
            }
        }
    }
    if !referenced_by.is_empty() {
        out.push_str("### Core Files (most referenced)\n\n");
        let mut ranked: Vec<(&String, usize)> = referenced_by
            .iter()
            .map(|(target, refs)| (*target, refs.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (target, count) in ranked.into_iter().take(10) {
            if count > 1 {
                let _ = writeln!(out, "- **`{}`** is imported by {} files", target, count);
            }
        }
        out.push('\n');
    }

    out.push_str("### Dependencies by File\n\n");
    let mut sorted_files: Vec<&String> = dependencies.keys().collect();
    sorted_files.sort();
    for file in sorted_files {
        let targets = &dependencies[file];
        if targets.is_empty() {
            continue;
        }
        let (internal, external) = split_targets(targets);
        let _ = writeln!(out, "- **`{}`**:", file);
        if !internal.is_empty() {
            let _ = writeln!(
                out,
                "  - *Internal dependencies*: {}",
                list_truncated(&internal, 5)
            );
        }
        if !external.is_empty() {
            let _ = writeln!(
                out,
                "  - *External dependencies*: {}",
                list_truncated(&external, 5)
            );
        }
    }
    out.push('\n');

    // Selected file contents.
    out.push_str("## 📄 FILE CONTENTS\n\n");
    out.push_str("*Note: The content below includes only selected files.*\n\n");
    for (path, content) in contents {
        let _ = writeln!(out, "### {}\n", path);
        if let Some(targets) = dependencies.get(path) {
            let (internal, external) = split_targets(targets);
            if !internal.is_empty() || !external.is_empty() {
                out.push_str("**Dependencies:**\n");
                if !internal.is_empty() {
                    let _ = writeln!(out, "- Internal: {}", list_truncated(&internal, 3));
                }
                if !external.is_empty() {
                    let _ = writeln!(out, "- External: {}", list_truncated(&external, 3));
                }
                out.push('\n');
            }
        }
        push_fenced(&mut out, path, content);
    }
    out
}

/// Extension (dot-less, lowercased) → file count over the given paths.
fn language_histogram(contents: &[(String, String)]) -> HashMap<String, usize> {
    let mut histogram = HashMap::new();
    for (path, _) in contents {
        let basename = path.rsplit('/').next().unwrap_or(path);
        if let Some(ext) = lang::extension_of(basename) {
            *histogram.entry(ext[1..].to_lowercase()).or_insert(0) += 1;
        }
    }
    histogram
}

fn top_counts(histogram: &HashMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = histogram
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

#[derive(Debug, Serialize)]
struct JsonNode {
    name: String,
    #[serde(rename = "type")]
    node_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<JsonNode>>,
}

#[derive(Debug, Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    root: String,
    generated_at: DateTime<Utc>,
    tree: Vec<JsonNode>,
    files: Vec<JsonFile<'a>>,
    dependencies: IndexMap<&'a str, Vec<&'a str>>,
}

fn json_subtree(tree: &FileTree, id: NodeId) -> Vec<JsonNode> {
    tree.sorted_children(id)
        .into_iter()
        .map(|child| {
            let node = tree.node(child);
            if node.is_dir {
                JsonNode {
                    name: node.name.clone(),
                    node_type: "directory",
                    children: Some(json_subtree(tree, child)),
                }
            } else {
                JsonNode {
                    name: node.name.clone(),
                    node_type: "file",
                    children: None,
                }
            }
        })
        .collect()
}

fn render_json(
    tree: &FileTree,
    contents: &[(String, String)],
    dependencies: &DependencyMap,
    pretty: bool,
) -> Result<String> {
    let report = JsonReport {
        root: tree.root_path().display().to_string(),
        generated_at: Utc::now(),
        tree: json_subtree(tree, tree.root()),
        files: contents
            .iter()
            .map(|(path, content)| JsonFile {
                path: path.as_str(),
                content: content.as_str(),
            })
            .collect(),
        dependencies: dependencies
            .iter()
            .map(|(path, targets)| {
                (path.as_str(), targets.iter().map(String::as_str).collect())
            })
            .collect(),
    };
    if pretty {
        serde_json::to_string_pretty(&report).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(&report).map_err(AppError::JsonSerialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;

    fn sample() -> (FileTree, Vec<(String, String)>) {
        let mut tree = FileTree::new(Path::new("/project"));
        let root = tree.root();
        let src = tree.add_child(root, "src".to_string(), true);
        tree.add_child(src, "a.py".to_string(), false);
        tree.add_child(src, "b.py".to_string(), false);
        tree.add_child(root, "README.md".to_string(), false);
        let contents = vec![
            ("project/src/a.py".to_string(), "import b\n".to_string()),
            ("project/src/b.py".to_string(), "x = 1\n".to_string()),
            ("project/README.md".to_string(), "# Readme".to_string()),
        ];
        (tree, contents)
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("llm".parse::<ReportFormat>().unwrap(), ReportFormat::Llm);
        assert_eq!("txt".parse::<ReportFormat>().unwrap(), ReportFormat::Txt);
        assert!("html".parse::<ReportFormat>().is_err());
        assert!(ReportFormat::Json.wants_dependencies());
        assert!(!ReportFormat::Md.wants_dependencies());
    }

    #[test]
    fn test_tree_string_draws_branches() {
        let (tree, _) = sample();
        let drawn = tree_to_string(&tree);
        let drawn = drawn.as_str();
        assert!(drawn.contains("├── src"));
        assert!(drawn.contains("│   ├── a.py"));
        assert!(drawn.contains("│   └── b.py"));
        assert!(drawn.contains("└── README.md"));
    }

    #[test]
    fn test_txt_report_sections() {
        let (tree, contents) = sample();
        let out = render(ReportFormat::Txt, &tree, &contents, &DependencyMap::new()).unwrap();
        assert!(out.starts_with("<file_map>\n/project\n"));
        assert!(out.contains("</file_map>"));
        assert!(out.contains("<file_contents>\nFile: project/src/a.py\n```py\nimport b\n```"));
        // Missing trailing newline gets added inside the fence.
        assert!(out.contains("# Readme\n```"));
        assert!(out.ends_with("</file_contents>\n"));
    }

    #[test]
    fn test_markdown_report_sections() {
        let (tree, contents) = sample();
        let out = render(ReportFormat::Md, &tree, &contents, &DependencyMap::new()).unwrap();
        assert!(out.starts_with("# Project Files: `/project`"));
        assert!(out.contains("## 📁 File Structure"));
        assert!(out.contains("### project/src/b.py"));
        assert!(out.contains("```md\n# Readme\n```"));
    }

    #[test]
    fn test_llm_report_resolves_and_splits_dependencies() {
        let (tree, contents) = sample();
        let dependencies = deps::analyze(&contents);
        let out = render(ReportFormat::Llm, &tree, &contents, &dependencies).unwrap();

        assert!(out.contains("# PROJECT ANALYSIS FOR AI ASSISTANT"));
        assert!(out.contains("- **Total files**: 3"));
        assert!(out.contains("- **Files included in this analysis**: 3"));
        assert!(out.contains("Python (2 files)"));
        assert!(out.contains("### 📂 Main Components"));
        assert!(out.contains("- **`src/`** - Contains 2 files mainly in Python"));
        assert!(out.contains("*Internal dependencies*: `project/src/b.py`"));
        assert!(out.contains("*Note: The content below includes only selected files.*"));
    }

    #[test]
    fn test_llm_report_lists_external_targets() {
        let mut tree = FileTree::new(Path::new("/p"));
        let root = tree.root();
        tree.add_child(root, "a.py".to_string(), false);
        let contents = vec![("p/a.py".to_string(), "import requests\n".to_string())];
        let dependencies = deps::analyze(&contents);

        let out = render(ReportFormat::Llm, &tree, &contents, &dependencies).unwrap();
        assert!(out.contains("*External dependencies*: `requests`"));
    }

    #[test]
    fn test_json_report_roundtrips() {
        let (tree, contents) = sample();
        let dependencies = deps::analyze(&contents);
        let out = render(ReportFormat::Json, &tree, &contents, &dependencies).unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["root"], "/project");
        assert_eq!(value["tree"][0]["name"], "src");
        assert_eq!(value["tree"][0]["type"], "directory");
        assert_eq!(value["files"][0]["path"], "project/src/a.py");
        let targets = value["dependencies"]["project/src/a.py"].as_array().unwrap();
        assert!(targets.iter().any(|t| t == "project/src/b.py"));
    }

    #[test]
    fn test_output_filename_uses_directory_basename() {
        let name = generate_output_filename(Path::new("/tmp/someproj"), "llm");
        assert!(name.starts_with("someproj"));
        assert!(name.ends_with(".llm"));
    }
}
