mod cli_args;
mod clipboard;
mod selector;

use anyhow::{Context, Result};
use clap::Parser;
use cli_args::Cli;
use codepick_core::report::{self, ReportFormat};
use codepick_core::{AppError, Config, DependencyMap, IgnoreSet};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::process;

fn main() {
    let args = Cli::parse();
    setup_logging(args.quiet, args.verbose);
    let quiet = args.quiet;
    log::debug!("CLI args parsed: {:?}", args);

    let exit_code = match run_app(args) {
        Ok(()) => {
            log::info!("Finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_))
                | Some(AppError::TomlParse(_))
                | Some(AppError::InvalidArgument(_)) => 1,
                Some(AppError::Io(_))
                | Some(AppError::FileRead { .. })
                | Some(AppError::FileWrite { .. })
                | Some(AppError::Walk(_)) => 2,
                Some(_) | None => 1,
            };
            if !quiet {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn run_app(args: Cli) -> Result<()> {
    let root = fs::canonicalize(&args.directory)
        .with_context(|| format!("Cannot access {}", args.directory.display()))?;
    if !root.is_dir() {
        return Err(AppError::InvalidArgument(format!(
            "{} is not a valid directory",
            root.display()
        ))
        .into());
    }

    let config = Config::load(&root).context("Failed to load configuration")?;
    let format: ReportFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.output.format)
        .parse()?;
    let use_gitignore = config.scan.use_gitignore && !args.no_gitignore;
    let mut copy_enabled = config.output.clipboard && !args.no_clipboard;
    let quiet = args.quiet;

    if !quiet {
        println!("Scanning directory: {}", root.display());
    }
    let ignores = IgnoreSet::for_root(&root, &config.scan.ignore, use_gitignore);
    let mut tree = codepick_core::build_tree(&root, &ignores);

    if !args.skip_selection {
        match selector::run(&mut tree).context("Error in selection interface")? {
            selector::SelectorOutcome::Cancelled => {
                if !quiet {
                    println!("Selection cancelled. Exiting without saving.");
                }
                return Ok(());
            }
            selector::SelectorOutcome::Done { copy_to_clipboard } => {
                copy_enabled = copy_to_clipboard && !args.no_clipboard;
            }
        }
    }

    let selected = tree.count_selected();
    if !quiet {
        println!("\nSelected files: {}", selected);
    }
    if selected == 0 {
        if !quiet {
            println!("No files selected. Exiting.");
        }
        return Ok(());
    }

    let contents = tree.collect_selected();
    if !quiet {
        println!("Collected content from {} files.", contents.len());
    }

    let dependencies = if format.wants_dependencies() {
        if !quiet {
            println!("Analyzing file relationships...");
        }
        codepick_core::analyze(&tree.collect_all())
    } else {
        DependencyMap::new()
    };

    let rendered = report::render(format, &tree, &contents, &dependencies)?;

    if args.clipboard_only {
        if !quiet {
            println!("Copying content to clipboard ({} bytes)...", rendered.len());
        }
        if clipboard::copy_to_clipboard(&rendered) {
            if !quiet {
                println!("{}", "Content copied to clipboard.".green());
            }
        } else if !quiet {
            println!("{}", "Failed to copy to clipboard.".yellow());
        }
        return Ok(());
    }

    let output_path = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(report::generate_output_filename(&root, format.as_str()))
    });
    report::write_to_file(&output_path, &rendered)?;
    if !quiet {
        println!(
            "\nOutput written to: {}",
            output_path.display().to_string().green()
        );
    }

    if copy_enabled {
        if clipboard::copy_to_clipboard(&rendered) {
            if !quiet {
                println!("Content copied to clipboard.");
            }
        } else if !quiet {
            println!("{}", "Could not copy to clipboard.".yellow());
        }
    }
    Ok(())
}
