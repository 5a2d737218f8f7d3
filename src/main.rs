//! fileworks - background file search, mutation and archive tasks.
//!
//! Usage:
//!   fileworks search QUERY [ROOT]        Find files and folders by name
//!   fileworks size PATH...               Measure files and folders
//!   fileworks info PATH                  Show path properties
//!   fileworks delete PATH...             Delete (or trash) paths
//!   fileworks copy SRC... --to DIR       Copy into a folder
//!   fileworks move SRC... --to DIR       Move into a folder
//!   fileworks compress SRC... [-o OUT]   Write an archive
//!   fileworks extract ARCHIVE [-C DIR]   Unpack an archive
//!   fileworks mkdir PARENT NAME          Create a folder
//!   fileworks rename PATH NEW_NAME       Rename in place
//!   fileworks formats                    List archive formats
//!
//! Ctrl-C cancels the running task.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use itertools::Itertools;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fileworks_archive::{
    ArchiveFormat, ArchiveSpec, CompressionLevel, ExtractSpec, PathStorage, suggest_archive_name,
};
use fileworks_core::{
    ConflictPolicy, EngineConfig, Shell, TaskEvent, TaskHandle, TaskOutcome, TaskOutput,
    TaskReport,
};
use fileworks_ops::{TaskEngine, TaskRequest, create_folder, rename};
use fileworks_scan::{FolderSizes, SearchRequest, properties};

#[derive(Parser)]
#[command(
    name = "fileworks",
    version,
    about = "Background file search, mutation and archive tasks",
    long_about = "fileworks runs searches, batch file operations and archive jobs as \
                  cancellable background tasks with progress reporting.\n\n\
                  Settings are read from $CONFIG_DIR/fileworks/config.toml unless \
                  --config is given."
)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Print task results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find files and folders whose name contains QUERY
    Search {
        query: String,

        /// Folder to search in
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Only look at the folder's direct children
        #[arg(long)]
        no_recursive: bool,

        /// Glob of entries to leave out (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },

    /// Measure files and folders
    Size {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the properties of a path
    Info { path: PathBuf },

    /// Delete files and folders
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Move to the trash instead of deleting
        #[arg(long)]
        trash: bool,
    },

    /// Copy files and folders into a folder
    Copy {
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination folder
        #[arg(short = 't', long = "to")]
        destination: PathBuf,

        /// What to do when a name is taken
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictArg>,
    },

    /// Move files and folders into a folder
    Move {
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination folder
        #[arg(short = 't', long = "to")]
        destination: PathBuf,

        /// What to do when a name is taken
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictArg>,
    },

    /// Write an archive
    Compress {
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Archive to write (defaults to a name derived from the sources)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Archive format (zip, tar, tar.gz, tar.bz2, tar.xz, tar.lzma, gz, bz2, xz, ...)
        #[arg(short, long)]
        format: Option<ArchiveFormat>,

        /// Compression level (store, fast, normal, best)
        #[arg(short, long, default_value = "normal")]
        level: CompressionLevel,

        /// Ask for a password to encrypt the archive
        #[arg(short, long)]
        password: bool,

        /// Glob of entries to leave out (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,

        /// Archive comment
        #[arg(long)]
        comment: Option<String>,

        /// Add to the archive if it exists
        #[arg(long)]
        append: bool,

        /// Store file names only, without folders
        #[arg(long)]
        flat: bool,

        /// Volume size in MiB
        #[arg(long)]
        split_mb: Option<u64>,
    },

    /// Unpack an archive
    Extract {
        archive: PathBuf,

        /// Destination folder (asked for if omitted)
        #[arg(short = 'C', long)]
        destination: Option<PathBuf>,

        /// Format override
        #[arg(short, long)]
        format: Option<ArchiveFormat>,
    },

    /// Create a folder
    Mkdir { parent: PathBuf, name: String },

    /// Rename a file or folder in place
    Rename { path: PathBuf, new_name: String },

    /// List archive formats and what they support
    Formats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictArg {
    Fail,
    Overwrite,
    Rename,
    Skip,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Fail => Self::Fail,
            ConflictArg::Overwrite => Self::Overwrite,
            ConflictArg::Rename => Self::AutoRename,
            ConflictArg::Skip => Self::Skip,
        }
    }
}

/// Prompts on the controlling terminal.
struct TerminalShell {
    assume_yes: bool,
}

impl TerminalShell {
    fn read_line(prompt: &str) -> Option<String> {
        eprint!("{prompt}");
        io::stderr().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Shell for TerminalShell {
    fn prompt_password(&self) -> Option<String> {
        rpassword::prompt_password("Password (empty for none): ").ok()
    }

    fn prompt_destination_directory(&self, initial: &Path) -> Option<PathBuf> {
        let answer = Self::read_line(&format!("Extract to [{}]: ", initial.display()))?;
        if answer.is_empty() {
            Some(initial.to_path_buf())
        } else {
            Some(PathBuf::from(answer))
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Self::read_line(&format!("{message} [y/N] "))
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    let shell = TerminalShell {
        assume_yes: cli.yes,
    };

    let request = match cli.command {
        Command::Search {
            query,
            root,
            no_recursive,
            exclude,
        } => TaskRequest::Search(
            SearchRequest::new(root, query)
                .recursive(!no_recursive)
                .exclude(exclude),
        ),
        Command::Size { paths } => TaskRequest::Measure { paths },
        Command::Info { path } => return run_info(&path, cli.json),
        Command::Delete { paths, trash } => TaskRequest::Delete {
            paths,
            use_trash: trash.then_some(true),
        },
        Command::Copy {
            sources,
            destination,
            on_conflict,
        } => {
            if let Some(policy) = on_conflict {
                config.conflict_policy = policy.into();
            }
            TaskRequest::Copy {
                sources,
                destination,
            }
        }
        Command::Move {
            sources,
            destination,
            on_conflict,
        } => {
            if let Some(policy) = on_conflict {
                config.conflict_policy = policy.into();
            }
            TaskRequest::Move {
                sources,
                destination,
            }
        }
        Command::Compress {
            sources,
            output,
            format,
            level,
            password,
            exclude,
            comment,
            append,
            flat,
            split_mb,
        } => {
            let format = format
                .or_else(|| output.as_deref().and_then(ArchiveFormat::from_path))
                .unwrap_or(ArchiveFormat::Zip);
            let target =
                output.unwrap_or_else(|| PathBuf::from(suggest_archive_name(&sources, format)));

            let mut builder = ArchiveSpec::builder();
            builder
                .target(target)
                .format(format)
                .sources(sources)
                .level(level)
                .exclude_patterns(exclude)
                .append(append)
                .path_storage(if flat {
                    PathStorage::BasenameOnly
                } else {
                    PathStorage::Relative
                });
            if password {
                if let Some(password) = shell.prompt_password().filter(|p| !p.is_empty()) {
                    builder.password(password);
                }
            }
            if let Some(comment) = comment {
                builder.comment(comment);
            }
            if let Some(split) = split_mb {
                builder.split_size_mb(split);
            }
            TaskRequest::Compress(builder.build().context("Invalid archive options")?)
        }
        Command::Extract {
            archive,
            destination,
            format,
        } => {
            let mut spec = ExtractSpec::new(archive);
            spec.destination = destination;
            spec.format = format;
            TaskRequest::Extract(spec)
        }
        Command::Mkdir { parent, name } => {
            let path = create_folder(&parent, &name)?;
            println!("Created {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Rename { path, new_name } => {
            let path = rename(&path, &new_name)?;
            println!("Renamed to {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Formats => {
            print_formats(&TaskEngine::new(config));
            return Ok(ExitCode::SUCCESS);
        }
    };

    let engine = TaskEngine::new(config);
    let Some(handle) = engine.start_interactive(request, &shell)? else {
        eprintln!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    };

    let report = drive(&engine, handle).await;
    print_report(&report, cli.json)
}

/// Follow a task to its end, rendering progress on stderr.
async fn drive(engine: &TaskEngine, mut handle: TaskHandle) -> TaskReport {
    let show_progress = io::stderr().is_terminal();
    let kind = handle.kind();

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(TaskEvent::Progress(percent)) if show_progress => {
                    eprint!("\r{kind} {percent:>3}%");
                    let _ = io::stderr().flush();
                }
                Some(TaskEvent::Finished(report)) => {
                    if show_progress {
                        eprintln!();
                    }
                    return report;
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !handle.is_cancelled() => {
                eprintln!("\nCancelling...");
                engine.cancel(&handle);
            }
        }
    }

    handle.wait().await
}

fn print_report(report: &TaskReport, json: bool) -> Result<ExitCode> {
    if json {
        match &report.outcome {
            TaskOutcome::Completed(output) | TaskOutcome::Cancelled(output) => {
                println!("{}", serde_json::to_string_pretty(output)?);
            }
            TaskOutcome::Failed(_) => {}
        }
    } else if let Some(output) = report.outcome.output() {
        print_output(report, output);
    }

    if !report.errors.is_empty() {
        eprintln!();
        eprintln!("{} item(s) failed:", report.errors.len());
        for error in &report.errors {
            eprintln!("  {error}");
        }
    }

    match &report.outcome {
        TaskOutcome::Completed(_) => Ok(ExitCode::SUCCESS),
        TaskOutcome::Cancelled(_) => {
            eprintln!("{} {} was cancelled.", report.kind, report.id);
            Ok(ExitCode::from(130))
        }
        TaskOutcome::Failed(err) => Err(eyre!("{} failed: {err}", report.kind)),
    }
}

fn print_output(report: &TaskReport, output: &TaskOutput) {
    match output {
        TaskOutput::Search(matches) => {
            for path in &matches.paths {
                println!("{}", path.display());
            }
            eprintln!("{}", matches.message());
        }
        TaskOutput::Batch(summary) => {
            println!(
                "{} ({})",
                summary.summary(report.kind),
                format_size(summary.bytes_processed)
            );
            if summary.skipped > 0 {
                println!("{} item(s) skipped", summary.skipped);
            }
        }
        TaskOutput::Archive { path, members } => {
            println!("Wrote {} ({members} members)", path.display());
        }
        TaskOutput::Extracted {
            destination,
            members,
        } => {
            println!("Extracted {members} members to {}", destination.display());
        }
        TaskOutput::Sizes(sizes) => {
            for (path, size) in sizes {
                println!("{:>10}  {}", format_size(*size), path.display());
            }
        }
    }
}

fn run_info(path: &Path, json: bool) -> Result<ExitCode> {
    let props = properties(path, &mut FolderSizes::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&props)?);
        return Ok(ExitCode::SUCCESS);
    }

    let time = |t: Option<chrono::DateTime<chrono::Local>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    println!("{}", "─".repeat(60));
    println!(" {}", props.path.display());
    println!("{}", "─".repeat(60));
    println!(" Type:      {}", props.kind);
    println!(
        " Size:      {} ({} bytes)",
        format_size(props.size),
        props.size
    );
    if let Some(location) = &props.location {
        println!(" Location:  {}", location.display());
    }
    println!(" Modified:  {}", time(props.modified));
    println!(" Accessed:  {}", time(props.accessed));
    println!(" Created:   {}", time(props.created));
    println!(" Read-only: {}", if props.readonly { "yes" } else { "no" });
    if let Some(mode) = props.mode_string() {
        println!(" Mode:      {mode}");
    }

    Ok(ExitCode::SUCCESS)
}

fn print_formats(engine: &TaskEngine) {
    let registry = engine.archives().registry();

    println!(" {:<10} {:<10} options", "format", "available");
    println!("{}", "─".repeat(60));
    for format in ArchiveFormat::all() {
        let caps = format.capabilities();
        let options = [
            (caps.password, "password"),
            (caps.comment, "comment"),
            (caps.append, "append"),
            (caps.split, "split"),
            (caps.encrypt_names, "encrypt-names"),
            (caps.compression_level, "level"),
            (!caps.multiple_members, "single-file"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .join(", ");
        let available = if registry.supports(format) { "yes" } else { "no" };
        println!(" {:<10} {:<10} {}", format.to_string(), available, options);
    }
}

fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(EngineConfig::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: EngineConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate().map_err(|e| eyre!(e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// `$CONFIG_DIR/fileworks/config.toml`.
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fileworks").join("config.toml"))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
