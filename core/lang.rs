use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Import-extraction patterns keyed by file extension (with the leading dot)
/// or exact basename for extensionless build files. Compiled once at first
/// use; every pattern's first capture group is the raw reference text.
static IMPORT_PATTERNS: Lazy<HashMap<&'static str, Vec<Regex>>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Vec<Regex>> = HashMap::new();
    let mut add = |key: &'static str, patterns: &[&str]| {
        table.insert(
            key,
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("builtin import pattern"))
                .collect(),
        );
    };

    add(
        ".py",
        &[
            r"(?m)^from\s+([\w.]+)\s+import",
            r"(?m)^import\s+([\w.]+)",
            r"import\s+([\w.]+)",
        ],
    );

    let c_include = &[r#"#include\s+[<"]([^>"]+)[>"]"#];
    add(".c", c_include);
    add(".h", c_include);
    add(".cpp", c_include);
    add(".hpp", c_include);

    let js_family = &[
        r#"(?:import|require)\s*\(?['"]([@\w\-./]+)['"]"#,
        r#"from\s+['"]([@\w\-./]+)['"]"#,
        r#"import\s*\{[^}]*\}\s*from\s*['"]([^'")]+)['"]"#,
    ];
    add(".js", js_family);
    add(".jsx", js_family);
    let ts_family = &[
        r#"(?:import|require)\s*\(?['"]([@\w\-./]+)['"]"#,
        r#"from\s+['"]([@\w\-./]+)['"]"#,
        r#"import\s*\{[^}]*\}\s*from\s*['"]([^'")]+)['"]"#,
        r#"import\s+type\s+\{[^}]*\}\s*from\s*['"]([^'")]+)['"]"#,
    ];
    add(".ts", ts_family);
    add(".tsx", ts_family);

    add(
        ".java",
        &[r"import\s+([\w.]+)", r"import\s+static\s+([\w.]+)"],
    );
    add(".kt", &[r"import\s+([\w.]+)", r"package\s+([\w.]+)"]);
    add(
        ".dart",
        &[
            r#"import\s+['"]([^'"]+)['"]"#,
            r#"part\s+['"]([^'"]+)['"]"#,
            r#"export\s+['"]([^'"]+)['"]"#,
        ],
    );
    add(
        ".go",
        &[
            r#"import\s+\(\s*(?:[_\w]*\s+)?"([^"]+)""#,
            r#"import\s+(?:[_\w]*\s+)?"([^"]+)""#,
        ],
    );
    add(
        ".rb",
        &[
            r#"require\s+['"]([^'"]+)['"]"#,
            r#"require_relative\s+['"]([^'"]+)['"]"#,
            r#"load\s+['"]([^'"]+)['"]"#,
        ],
    );
    add(
        ".php",
        &[
            r#"(?:require|include|require_once|include_once)\s*\(?['"]([^'"]+)['"]"#,
            r"use\s+([\w\\]+)",
            r"namespace\s+([\w\\]+)",
        ],
    );
    add(
        ".rs",
        &[
            r"use\s+([\w:]+)",
            r"extern\s+crate\s+(\w+)",
            r"mod\s+(\w+)",
        ],
    );
    add(
        ".swift",
        &[r"import\s+(\w+)", r"@testable\s+import\s+(\w+)"],
    );
    add(
        ".sh",
        &[
            r#"source\s+['"]?([^'"\s]+)['"]?"#,
            r#"\.\s+['"]?([^'"\s]+)['"]?"#,
        ],
    );
    add("Makefile", &[r"include\s+([^\s]+)"]);

    table
});

/// Extension suffixes tried when resolving a bare reference to a known file.
pub const RESOLVE_EXTENSIONS: &[&str] = &[
    ".py", ".h", ".hpp", ".js", ".jsx", ".ts", ".tsx", ".java", ".kt", ".dart", ".go", ".rb",
    ".php", ".rs", ".swift", ".sh",
];

/// Conventional directory entry points tried for dotted package references.
pub const INDEX_FILES: &[&str] = &[
    "index.js",
    "index.ts",
    "index.jsx",
    "index.tsx",
    "__init__.py",
];

/// Patterns for a file, by lowercased extension first, exact basename second.
pub fn import_patterns_for(path: &str) -> Option<&'static [Regex]> {
    let basename = path.rsplit('/').next().unwrap_or(path);
    if let Some(ext) = extension_of(basename) {
        if let Some(patterns) = IMPORT_PATTERNS.get(ext.to_lowercase().as_str()) {
            return Some(patterns.as_slice());
        }
    }
    IMPORT_PATTERNS.get(basename).map(|p| p.as_slice())
}

/// The `.ext` suffix of a basename, if any. A leading dot alone does not
/// count (`.gitignore` has no extension).
pub fn extension_of(basename: &str) -> Option<&str> {
    basename.rfind('.').filter(|&i| i > 0).map(|i| &basename[i..])
}

/// Human-readable language name for a dot-less extension; unknown extensions
/// come back uppercased.
pub fn language_name(extension: &str) -> String {
    static NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
        HashMap::from([
            ("py", "Python"),
            ("c", "C"),
            ("cpp", "C++"),
            ("h", "C/C++ Header"),
            ("hpp", "C++ Header"),
            ("js", "JavaScript"),
            ("jsx", "React"),
            ("ts", "TypeScript"),
            ("tsx", "React TypeScript"),
            ("java", "Java"),
            ("html", "HTML"),
            ("css", "CSS"),
            ("scss", "SCSS"),
            ("sass", "Sass"),
            ("less", "Less"),
            ("php", "PHP"),
            ("rb", "Ruby"),
            ("go", "Go"),
            ("rs", "Rust"),
            ("swift", "Swift"),
            ("kt", "Kotlin"),
            ("dart", "Dart"),
            ("sh", "Shell"),
            ("md", "Markdown"),
            ("json", "JSON"),
            ("xml", "XML"),
            ("yaml", "YAML"),
            ("yml", "YAML"),
            ("sql", "SQL"),
            ("r", "R"),
            ("vue", "Vue"),
            ("svelte", "Svelte"),
        ])
    });
    NAMES
        .get(extension)
        .map(|name| name.to_string())
        .unwrap_or_else(|| extension.to_uppercase())
}
