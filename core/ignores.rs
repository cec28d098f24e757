use crate::pattern::Pattern;
use std::fs;
use std::path::Path;

/// Built-in rules: version-control metadata, bytecode caches, OS metadata
/// files, editor directories.
pub const DEFAULT_PATTERNS: &[&str] = &[
    ".git",
    "__pycache__",
    "*.pyc",
    ".DS_Store",
    ".idea",
    ".vscode",
];

/// Global ignore files consulted in addition to the project's own.
const GLOBAL_IGNORE_FILES: &[&str] = &[
    "~/.gitignore_global",
    "~/.config/git/ignore",
    "~/.gitignore",
];

pub const PROJECT_IGNORE_FILE: &str = ".projectignore";

/// An ordered list of ignore rules with gitignore precedence: every rule is
/// consulted and the last one that matches decides, so a later `!pattern` can
/// un-ignore what an earlier rule excluded. A path no rule matches is kept.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Assemble the rule list for a project root: built-in defaults, then the
    /// user's global ignore files, then `<root>/.projectignore`, then
    /// `<root>/.gitignore`, then any extra patterns from configuration.
    ///
    /// `use_gitignore = false` skips the global files and the root
    /// `.gitignore` but keeps defaults, `.projectignore` and extras.
    pub fn for_root(root: &Path, extra: &[String], use_gitignore: bool) -> Self {
        let mut lines: Vec<String> = DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect();

        if use_gitignore {
            for raw in GLOBAL_IGNORE_FILES {
                let expanded = shellexpand::tilde(raw);
                lines.extend(read_pattern_lines(Path::new(expanded.as_ref())));
            }
        }
        lines.extend(read_pattern_lines(&root.join(PROJECT_IGNORE_FILE)));
        if use_gitignore {
            lines.extend(read_pattern_lines(&root.join(".gitignore")));
        }
        lines.extend(extra.iter().cloned());

        Self::from_lines(&lines)
    }

    /// Build a set from raw pattern lines. Unparseable lines are dropped with
    /// a warning rather than failing the whole set.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut patterns = Vec::with_capacity(lines.len());
        for line in lines {
            match Pattern::parse(line.as_ref()) {
                Ok(pattern) => patterns.push(pattern),
                Err(err) => {
                    log::warn!("Ignoring bad pattern \"{}\": {}", line.as_ref(), err);
                }
            }
        }
        log::debug!("Ignore set built with {} patterns", patterns.len());
        IgnoreSet { patterns }
    }

    /// Last-match-wins over the whole rule list. Must scan every rule: a
    /// first-match shortcut would break negation overrides.
    pub fn should_ignore(&self, rel_path: &str, is_dir: bool) -> bool {
        if rel_path.is_empty() || rel_path == "." {
            return false;
        }
        let mut decision = None;
        for pattern in &self.patterns {
            if pattern.matches_path(rel_path, is_dir) {
                decision = Some(!pattern.is_negated());
            }
        }
        decision.unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Non-empty, non-comment lines of an ignore file. A missing or unreadable
/// file contributes nothing; lines duplicating the built-in defaults are
/// skipped.
fn read_pattern_lines(path: &Path) -> Vec<String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            if path.exists() {
                log::warn!("Could not read ignore file {}: {}", path.display(), err);
            }
            return Vec::new();
        }
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !DEFAULT_PATTERNS.contains(line))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unmatched_path_is_kept() {
        let set = IgnoreSet::from_lines(&["*.log"]);
        assert!(!set.should_ignore("readme.md", false));
    }

    #[test]
    fn test_negation_overrides_earlier_block() {
        let set = IgnoreSet::from_lines(&["*.log", "!important.log"]);
        assert!(set.should_ignore("error.log", false));
        assert!(!set.should_ignore("important.log", false));
        assert!(!set.should_ignore("readme.md", false));
    }

    #[test]
    fn test_last_match_wins_even_when_reblocked() {
        let set = IgnoreSet::from_lines(&["*.log", "!important.log", "important.*"]);
        assert!(set.should_ignore("important.log", false));
    }

    #[test]
    fn test_appending_negation_unignores() {
        let blocked = IgnoreSet::from_lines(&["docs"]);
        assert!(blocked.should_ignore("docs/guide.md", false));

        let reopened = IgnoreSet::from_lines(&["docs", "!guide.md"]);
        assert!(!reopened.should_ignore("docs/guide.md", false));
    }

    #[test]
    fn test_directory_only_rule_spares_files() {
        let set = IgnoreSet::from_lines(&["cache/"]);
        assert!(set.should_ignore("cache", true));
        assert!(!set.should_ignore("cache", false));
    }

    #[test]
    fn test_root_is_never_ignored() {
        let set = IgnoreSet::from_lines(&["*"]);
        assert!(!set.should_ignore(".", true));
        assert!(!set.should_ignore("", true));
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_IGNORE_FILE),
            "# a comment\n\n*.tmp\n   \n!keep.tmp\n",
        )
        .unwrap();

        let set = IgnoreSet::for_root(dir.path(), &[], false);
        assert!(set.should_ignore("scratch.tmp", false));
        assert!(!set.should_ignore("keep.tmp", false));
        assert!(!set.should_ignore("# a comment", false));
    }

    #[test]
    fn test_missing_ignore_files_contribute_nothing() {
        let dir = TempDir::new().unwrap();
        let set = IgnoreSet::for_root(dir.path(), &[], false);
        assert_eq!(set.len(), DEFAULT_PATTERNS.len());
    }

    #[test]
    fn test_extra_config_patterns_apply_last() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_IGNORE_FILE), "!special.bak\n").unwrap();

        let set = IgnoreSet::for_root(dir.path(), &["*.bak".to_string()], false);
        // Config extras come after file-sourced rules, so the block wins.
        assert!(set.should_ignore("special.bak", false));
    }

    #[test]
    fn test_defaults_cover_common_noise() {
        let set = IgnoreSet::from_lines(DEFAULT_PATTERNS);
        assert!(set.should_ignore(".git", true));
        assert!(set.should_ignore("pkg/__pycache__", true));
        assert!(set.should_ignore("mod.pyc", false));
        assert!(!set.should_ignore("src/app.py", false));
    }
}
