//! MangaPDF desktop application and CLI
//!
//! Without a subcommand the GUI starts. `merge` and `info` work headless.

// Release builds of the desktop app should not open a console window on Windows
#![cfg_attr(
    all(not(debug_assertions), feature = "gui"),
    windows_subsystem = "windows"
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use manga_pdf::format::{format_file_size, sort_naturally};
use manga_pdf::layout::PageSize;
use manga_pdf::pdf::{
    assemble_pdf, extract_metadata, AssembleOptions, AssemblyProgress, AssemblyReport,
    DEFAULT_QUALITY,
};
use manga_pdf::system::open_path;

/// MangaPDF - Merge images into PDF files
#[derive(Parser)]
#[command(name = "manga-pdf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Start the desktop application
    manga-pdf

    # Start the application with images preloaded
    manga-pdf gui page01.jpg page02.jpg

    # Merge numbered scans in natural order with a tail page
    manga-pdf merge -o chapter.pdf --tail credits.png \"scans/*.jpg\"

    # Fit every page onto A4 with a 10mm margin and open the result
    manga-pdf merge -o chapter.pdf --page-size a4 --margin 10 --open *.png")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the desktop application (default)
    Gui {
        /// Images to load into the first sequence
        files: Vec<PathBuf>,
    },

    /// Merge images into one PDF without opening a window
    Merge {
        /// Input images (in order). Supports glob patterns like "*.jpg"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Image appended as the last page
        #[arg(long)]
        tail: Option<PathBuf>,

        /// Page size: original, a4 or letter
        #[arg(long, default_value = "original", value_parser = parse_page_size)]
        page_size: PageSize,

        /// JPEG quality (10-100)
        #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(10..=100))]
        quality: u8,

        /// Margin in millimeters (a4/letter only)
        #[arg(long, default_value_t = 0.0)]
        margin: f32,

        /// Skip images that cannot be read instead of failing
        #[arg(long)]
        skip_unreadable: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if is_headless(&cli.command) {
        attach_parent_console();
    }
    init_logging(cli.verbose);

    let result = match cli.command {
        None => cmd_gui(Vec::new()),
        Some(Commands::Gui { files }) => cmd_gui(files),
        Some(Commands::Merge {
            inputs,
            output,
            tail,
            page_size,
            quality,
            margin,
            skip_unreadable,
            title,
            open,
        }) => cmd_merge(MergeArgs {
            inputs,
            output,
            tail,
            page_size,
            quality,
            margin,
            skip_unreadable,
            title,
            open,
        }),
        Some(Commands::Info { input }) => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Subcommands that print to the terminal instead of opening a window
fn is_headless(command: &Option<Commands>) -> bool {
    matches!(command, Some(Commands::Merge { .. } | Commands::Info { .. }))
}

/// Reconnect stdout and stderr to the terminal that started a GUI-subsystem build
#[cfg(all(windows, not(debug_assertions), feature = "gui"))]
fn attach_parent_console() {
    use windows_sys::Win32::System::Console::{AttachConsole, ATTACH_PARENT_PROCESS};

    // Fails when started from Explorer, where there is no console to attach to
    // SAFETY: plain Win32 call with no pointers involved
    unsafe {
        AttachConsole(ATTACH_PARENT_PROCESS);
    }
}

#[cfg(not(all(windows, not(debug_assertions), feature = "gui")))]
fn attach_parent_console() {}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "manga_pdf=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn parse_page_size(value: &str) -> std::result::Result<PageSize, String> {
    PageSize::parse(value).ok_or_else(|| format!("unknown page size '{value}' (expected original, a4 or letter)"))
}

#[cfg(feature = "gui")]
fn cmd_gui(files: Vec<PathBuf>) -> Result<()> {
    manga_pdf::ui::run(manga_pdf::ui::Flags { files }).context("GUI exited with an error")
}

#[cfg(not(feature = "gui"))]
fn cmd_gui(_files: Vec<PathBuf>) -> Result<()> {
    bail!("this build has no GUI; use the `merge` or `info` subcommands")
}

/// Expand glob patterns in input paths
///
/// The whole list is ordered naturally ("2.jpg" before "10.jpg"), whether the
/// paths came from a quoted pattern or were already expanded by the shell.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {pattern}"))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    sort_naturally(&mut paths);
    Ok(paths)
}

struct MergeArgs {
    inputs: Vec<String>,
    output: PathBuf,
    tail: Option<PathBuf>,
    page_size: PageSize,
    quality: u8,
    margin: f32,
    skip_unreadable: bool,
    title: Option<String>,
    open: bool,
}

/// Prints one line per page to stderr
struct CliProgress;

impl AssemblyProgress for CliProgress {
    fn on_page(&self, current: usize, total: usize, path: &Path) {
        eprintln!("[{current}/{total}] {}", path.display());
    }

    fn on_skipped(&self, path: &Path, reason: &str) {
        eprintln!("Skipped {}: {}", path.display(), reason);
    }

    fn on_writing(&self, output: &Path) {
        eprintln!("Writing {}...", output.display());
    }

    fn on_complete(&self, report: &AssemblyReport) {
        eprintln!(
            "Created {} ({} pages, {})",
            report.output_path.display(),
            report.page_count,
            format_file_size(report.bytes_written)
        );
    }
}

/// Merge images into one PDF
fn cmd_merge(args: MergeArgs) -> Result<()> {
    let mut image_paths = expand_globs(args.inputs)?;

    if !args.skip_unreadable {
        for path in &image_paths {
            if !path.exists() {
                bail!("Input file not found: {}", path.display());
            }
        }
    }

    if let Some(tail) = args.tail {
        if !tail.exists() {
            bail!("Tail page not found: {}", tail.display());
        }
        image_paths.push(tail);
    }

    eprintln!("Merging {} images...", image_paths.len());

    let options = AssembleOptions {
        image_paths,
        output_path: args.output.clone(),
        page_size: args.page_size,
        quality: args.quality,
        margin_mm: args.margin.clamp(0.0, manga_pdf::settings::MAX_MARGIN_MM),
        skip_unreadable: args.skip_unreadable,
        title: args.title,
    };

    assemble_pdf(&options, &CliProgress)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    if args.open {
        open_path(&args.output).context("Failed to open output")?;
    }

    Ok(())
}

/// Show information about a PDF file
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }
    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }

    Ok(())
}
