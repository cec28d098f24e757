use crate::error::{AppError, Result};
use globset::{Glob, GlobMatcher};
use regex::Regex;

/// A single gitignore-style ignore rule.
///
/// Parsing splits off the `!` (negation), trailing `/` (directory-only) and
/// leading `/` (anchored) markers; what remains is the glob body. Matchers
/// are compiled once at parse time, never per lookup.
///
/// Anchored patterns are matched against the path's basename only. This is a
/// deliberate simplification of git's root-relative anchoring, kept because
/// the common `/Makefile`-style rules behave identically under it.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Plain glob, checked against the full path, its basename and every
    /// single path segment.
    Glob(GlobMatcher),
    /// Exactly one `**`: ordered substring containment of the two halves.
    Split { prefix: String, suffix: String },
    /// Two or more `**`: translated regular expression over the whole path.
    Regex(Regex),
}

impl Pattern {
    pub fn parse(line: &str) -> Result<Self> {
        let raw = line.trim().to_string();
        let mut rest = raw.as_str();

        let negated = rest.starts_with('!');
        if negated {
            rest = &rest[1..];
        }

        let dir_only = rest.ends_with('/');
        let rest = rest.trim_end_matches('/');

        let normalized = rest.replace('\\', "/");
        let mut body = normalized.as_str();

        let anchored = body.starts_with('/');
        if anchored {
            body = &body[1..];
        }

        let matcher = if anchored || !body.contains("**") {
            Matcher::Glob(compile_glob(body)?)
        } else {
            let halves: Vec<&str> = body.split("**").collect();
            if halves.len() == 2 {
                Matcher::Split {
                    prefix: halves[0].to_string(),
                    suffix: halves[1].to_string(),
                }
            } else {
                Matcher::Regex(translate_multi_star(body)?)
            }
        };

        Ok(Pattern {
            raw,
            negated,
            dir_only,
            anchored,
            matcher,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether this rule's body matches the given relative path. Negation is
    /// NOT applied here; precedence between rules is the caller's business
    /// (see [`crate::ignores::IgnoreSet`]).
    pub fn matches_path(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }

        let path = rel_path.replace('\\', "/");
        let basename = path.rsplit('/').next().unwrap_or(path.as_str());

        match &self.matcher {
            Matcher::Glob(glob) => {
                if self.anchored {
                    glob.is_match(basename)
                } else {
                    glob.is_match(path.as_str())
                        || glob.is_match(basename)
                        || path.split('/').any(|segment| glob.is_match(segment))
                }
            }
            Matcher::Split { prefix, suffix } => {
                if prefix.is_empty() {
                    path.ends_with(suffix.as_str())
                } else if suffix.is_empty() {
                    path.starts_with(prefix.as_str())
                } else {
                    match (path.find(prefix.as_str()), path.find(suffix.as_str())) {
                        (Some(p), Some(s)) => p < s,
                        _ => false,
                    }
                }
            }
            Matcher::Regex(re) => re.is_match(&path),
        }
    }
}

/// Evaluate one raw gitignore-style pattern against a relative path,
/// negation included: `!p` inverts the result of the stripped pattern.
///
/// Unparseable patterns never match.
pub fn matches(rel_path: &str, is_dir: bool, pattern: &str) -> bool {
    match Pattern::parse(pattern) {
        Ok(p) => p.matches_path(rel_path, is_dir) != p.is_negated(),
        Err(err) => {
            log::trace!("Unparseable pattern \"{}\": {}", pattern, err);
            false
        }
    }
}

fn compile_glob(body: &str) -> Result<GlobMatcher> {
    // Default globset semantics: `*` and `?` cross path separators, which is
    // what the basename/segment checks above expect.
    Ok(Glob::new(body)?.compile_matcher())
}

/// Regex translation for patterns carrying more than one `**`: each `**`
/// crosses separators, while `*` and `?` stay within a single segment.
fn translate_multi_star(body: &str) -> Result<Regex> {
    let mut regex = String::with_capacity(body.len() + 8);
    regex.push('^');
    let mut rest = body;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix("**/") {
            regex.push_str(".*");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("**") {
            regex.push_str(".*");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('*') {
            regex.push_str("[^/]*");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('?') {
            regex.push_str("[^/]");
            rest = stripped;
        } else {
            let ch = rest.chars().next().expect("non-empty rest");
            let mut buf = [0u8; 4];
            regex.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
            rest = &rest[ch.len_utf8()..];
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(AppError::from)
}
