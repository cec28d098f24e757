use crate::lang;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// File path → resolved targets. A target equal to some other entry's key is
/// an internal dependency; anything else is an external or unresolved
/// reference kept verbatim.
pub type DependencyMap = IndexMap<String, BTreeSet<String>>;

/// Heuristic cross-file dependency analysis over `(path, content)` pairs.
///
/// Pass one extracts raw import-like references per file from the
/// per-language pattern registry; pass two resolves each reference against a
/// name-form lookup of every known file, trying progressively looser
/// variants. No parsing, no symbol resolution: false positives and negatives
/// are expected and acceptable.
pub fn analyze(files: &[(String, String)]) -> DependencyMap {
    log::debug!("Analyzing dependencies across {} files", files.len());

    let mut imports: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    for (path, content) in files {
        let refs = extract_references(path, content);
        imports.insert(path.clone(), refs);
    }

    let name_forms = build_name_forms(files);

    let mut dependencies = DependencyMap::new();
    for (path, refs) in imports {
        let mut targets = BTreeSet::new();
        for reference in refs {
            match resolve_reference(&reference, &name_forms) {
                Some(target) => {
                    targets.insert(target);
                }
                None => {
                    // Unresolved references are kept verbatim so the report
                    // can list them as external dependencies.
                    targets.insert(reference);
                }
            }
        }
        dependencies.insert(path, targets);
    }
    dependencies
}

/// Raw reference strings found in one file, deduplicated.
fn extract_references(path: &str, content: &str) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    let Some(patterns) = lang::import_patterns_for(path) else {
        return refs;
    };
    for pattern in patterns {
        for caps in pattern.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                if !m.as_str().is_empty() {
                    refs.insert(m.as_str().to_string());
                }
            }
        }
    }
    refs
}

/// Every plausible name form of every known file, mapped to its canonical
/// path: the full path, the path minus extension, the basename, the basename
/// minus extension, and every trailing subpath produced by stripping one
/// leading segment at a time. Collisions are overwritten by later files —
/// the accepted ambiguous-match fallback.
fn build_name_forms(files: &[(String, String)]) -> HashMap<String, String> {
    let mut forms = HashMap::new();
    for (path, _) in files {
        let basename = path.rsplit('/').next().unwrap_or(path);
        forms.insert(basename.to_string(), path.clone());
        forms.insert(strip_extension(basename).to_string(), path.clone());
        forms.insert(path.clone(), path.clone());
        forms.insert(strip_extension(path).to_string(), path.clone());

        let mut rest = path.as_str();
        while let Some(pos) = rest.find('/') {
            rest = &rest[pos + 1..];
            forms.insert(rest.to_string(), path.clone());
            forms.insert(strip_extension(rest).to_string(), path.clone());
        }
    }
    forms
}

/// First name-form variant of `reference` that names a known file.
fn resolve_reference(reference: &str, name_forms: &HashMap<String, String>) -> Option<String> {
    for variant in reference_variants(reference) {
        if let Some(path) = name_forms.get(&variant) {
            return Some(path.clone());
        }
    }
    None
}

/// Candidate spellings tried in order of decreasing confidence: the literal
/// text, its basename, the text minus extension, dotted-package → slashed
/// path (with and without per-language extensions), the raw text plus each
/// extension, explicit relative prefixes, dotted partial prefixes for
/// submodule imports, and conventional index/init files.
fn reference_variants(reference: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let mut seen = BTreeSet::new();
    let mut push = |variants: &mut Vec<String>, seen: &mut BTreeSet<String>, v: String| {
        if seen.insert(v.clone()) {
            variants.push(v);
        }
    };

    let dotted = reference.replace('.', "/");
    let basename = reference.rsplit('/').next().unwrap_or(reference);

    push(&mut variants, &mut seen, reference.to_string());
    push(&mut variants, &mut seen, basename.to_string());
    push(&mut variants, &mut seen, strip_extension(reference).to_string());
    push(&mut variants, &mut seen, dotted.clone());
    push(&mut variants, &mut seen, format!("{}.py", dotted));
    for ext in lang::RESOLVE_EXTENSIONS {
        push(&mut variants, &mut seen, format!("{}{}", reference, ext));
    }
    if reference.contains('.') && !reference.contains('/') {
        for ext in lang::RESOLVE_EXTENSIONS {
            push(&mut variants, &mut seen, format!("{}{}", dotted, ext));
        }
    }
    push(&mut variants, &mut seen, format!("./{}", reference));
    push(&mut variants, &mut seen, format!("../{}", reference));

    let parts: Vec<&str> = reference.split('.').collect();
    if parts.len() > 1 {
        for i in 1..parts.len() {
            push(&mut variants, &mut seen, parts[..i].join("/"));
        }
        for index in lang::INDEX_FILES {
            push(&mut variants, &mut seen, format!("{}/{}", dotted, index));
        }
    }

    variants
}

/// Path minus its extension; the basename's leading dot never counts as one.
fn strip_extension(path: &str) -> &str {
    let base_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[base_start..].rfind('.') {
        Some(i) if i > 0 => &path[..base_start + i],
        _ => path,
    }
}
