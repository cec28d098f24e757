pub mod config;
pub mod deps;
pub mod error;
pub mod ignores;
pub mod lang;
pub mod pattern;
pub mod report;
pub mod scan;
pub mod select;
pub mod tree;

pub use config::Config;
pub use deps::{DependencyMap, analyze};
pub use error::{AppError, Result};
pub use ignores::IgnoreSet;
pub use pattern::Pattern;
pub use report::{ReportFormat, generate_output_filename, render, write_to_file};
pub use scan::build_tree;
pub use select::{
    FilterError, apply_search_filter, expand_all, select_all, toggle_current_dir_only,
    toggle_expand, toggle_selection,
};
pub use tree::{FileTree, Node, NodeId};
