use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "codepick",
    version,
    about = "Select files to share with AI assistants",
    long_about = "Scans a directory tree, lets you pick files interactively and emits a \
                  consolidated document (tree, contents, dependency analysis) ready to paste \
                  into an AI assistant's context window."
)]
pub struct Cli {
    /// Directory to scan (default: current directory)
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Output file path (default: based on the directory name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: llm - optimized for LLMs)
    #[arg(long, value_parser = ["txt", "md", "llm", "json"])]
    pub format: Option<String>,

    /// Skip the selection interface and include all files
    #[arg(long)]
    pub skip_selection: bool,

    /// Disable automatic copy to clipboard
    #[arg(long)]
    pub no_clipboard: bool,

    /// Copy to clipboard only (don't create a file)
    #[arg(long)]
    pub clipboard_only: bool,

    /// Ignore .gitignore and the global ignore files while scanning
    #[arg(long)]
    pub no_gitignore: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output and warnings
    #[arg(short, long)]
    pub quiet: bool,
}
