//! sharefs CLI - file share filesystem adapter
//!
//! Command-line interface driving the share adapter against a local,
//! disk-backed share, so every filesystem operation can be exercised from a
//! shell.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use sharefs_core::{FilesystemAdapter, ShareConfig, ShareFileAdapter, WriteOptions};
use sharefs_remote::{ByteStream, LocalShare, ShareClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

/// Container used when neither the config file nor `--container` names one.
const DEFAULT_CONTAINER: &str = "default";

/// sharefs - filesystem operations on a file share
///
/// Runs generic filesystem operations through the share adapter, on a share
/// stored in a local directory.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the shares (overrides `endpoint`)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Share (container) name
    #[arg(long, global = true)]
    container: Option<String>,

    /// Path prefix to confine all operations to
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Fail instead of deleting non-empty directories
    #[arg(long, global = true)]
    no_recursive_delete: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available sharefs commands
#[derive(Subcommand)]
enum Commands {
    /// Print whether a file or directory exists
    Has {
        /// Logical path
        path: String,
    },

    /// Print a file's content
    Cat {
        /// Logical path
        path: String,
    },

    /// Create a new file; fails if it exists
    ///
    /// Missing parent directories are created. Content is read from stdin
    /// when not given.
    Write {
        /// Logical path
        path: String,
        /// File content
        content: Option<String>,
        /// Content type to store with the file
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Replace an existing file's content; fails if it does not exist
    Update {
        /// Logical path
        path: String,
        /// File content
        content: Option<String>,
    },

    /// Write a file, creating or replacing it
    Put {
        /// Logical path
        path: String,
        /// File content
        content: Option<String>,
    },

    /// Delete a file
    Rm {
        /// Logical path
        path: String,
    },

    /// Create a directory and its parents
    Mkdir {
        /// Logical path
        path: String,
    },

    /// Delete a directory
    Rmdir {
        /// Logical path
        path: String,
    },

    /// List directory contents as JSON
    Ls {
        /// Logical path (the root when omitted)
        #[arg(default_value = "")]
        path: String,
        /// Include all descendants
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move a file
    Mv {
        /// Source path
        src: String,
        /// Destination path; must not exist
        dst: String,
    },

    /// Copy a file
    Cp {
        /// Source path
        src: String,
        /// Destination path; must not exist
        dst: String,
    },

    /// Print metadata as JSON
    Stat {
        /// Logical path
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing subscriber
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber for structured logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("sharefs=debug,sharefs_core=debug,sharefs_remote=debug")
    } else {
        EnvFilter::new("sharefs=info,sharefs_core=info,sharefs_remote=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let fs = open_adapter(cli.root.as_deref(), &config).await?;
    run_command(&fs, cli.command).await
}

/// Builds the effective configuration: file first, then flags.
fn resolve_config(cli: &Cli) -> Result<ShareConfig> {
    let mut config = match &cli.config {
        Some(path) => ShareConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ShareConfig::default(),
    };

    if let Some(container) = &cli.container {
        config.container = container.clone();
    }
    if config.container.is_empty() {
        config.container = DEFAULT_CONTAINER.to_string();
    }
    if let Some(prefix) = &cli.prefix {
        config.prefix = Some(prefix.clone());
    }
    if cli.no_recursive_delete {
        config.disable_recursive_delete = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Opens the container directory under the share root, creating it if missing.
async fn open_adapter(root: Option<&Path>, config: &ShareConfig) -> Result<ShareFileAdapter> {
    let root = match (root, &config.endpoint) {
        (Some(root), _) => root.to_path_buf(),
        (None, Some(endpoint)) => PathBuf::from(endpoint),
        (None, None) => std::env::current_dir().context("Failed to get current directory")?,
    };

    let share_dir = root.join(&config.container);
    tokio::fs::create_dir_all(&share_dir)
        .await
        .with_context(|| format!("Failed to create share directory {}", share_dir.display()))?;

    let share = LocalShare::open(&share_dir)
        .await
        .with_context(|| format!("Failed to open share at {}", share_dir.display()))?;
    info!(share = %share_dir.display(), "opened share");

    let client: Arc<dyn ShareClient> = Arc::new(share);
    ShareFileAdapter::new(client, config).context("Failed to create adapter")
}

/// Streams stdin.
fn stdin_stream() -> ByteStream {
    ReaderStream::new(tokio::io::stdin()).boxed()
}

/// Execute the specified command
async fn run_command(fs: &ShareFileAdapter, command: Commands) -> Result<()> {
    match command {
        Commands::Has { path } => {
            let exists = fs
                .has(&path)
                .await
                .with_context(|| format!("Failed to check {path}"))?;
            println!("{exists}");
        }
        Commands::Cat { path } => {
            let mut body = fs
                .read_stream(&path)
                .await
                .with_context(|| format!("Failed to read {path}"))?;
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.with_context(|| format!("Failed to read {path}"))?;
                stdout.write_all(&chunk).await?;
            }
            stdout.flush().await?;
        }
        Commands::Write {
            path,
            content,
            content_type,
        } => {
            let options = WriteOptions {
                visibility: None,
                content_type,
            };
            let record = match content {
                Some(content) => fs.write(&path, Bytes::from(content), &options).await,
                None => fs.write_stream(&path, stdin_stream(), &options).await,
            }
            .with_context(|| format!("Failed to write {path}"))?;
            println!("✔ Wrote {} ({} bytes)", record.path, record.size);
        }
        Commands::Update { path, content } => {
            let record = match content {
                Some(content) => fs.update(&path, Bytes::from(content)).await,
                None => fs.update_stream(&path, stdin_stream()).await,
            }
            .with_context(|| format!("Failed to update {path}"))?;
            println!("✔ Updated {} ({} bytes)", record.path, record.size);
        }
        Commands::Put { path, content } => {
            let contents = match content {
                Some(content) => Bytes::from(content),
                None => read_stdin().await?,
            };
            let record = fs
                .put(&path, contents, &WriteOptions::default())
                .await
                .with_context(|| format!("Failed to put {path}"))?;
            println!("✔ Stored {} ({} bytes)", record.path, record.size);
        }
        Commands::Rm { path } => {
            fs.delete(&path)
                .await
                .with_context(|| format!("Failed to delete {path}"))?;
            println!("✔ Deleted {path}");
        }
        Commands::Mkdir { path } => {
            let record = fs
                .create_dir(&path)
                .await
                .with_context(|| format!("Failed to create directory {path}"))?;
            println!("✔ Created directory {}", record.path);
        }
        Commands::Rmdir { path } => {
            fs.delete_dir(&path)
                .await
                .with_context(|| format!("Failed to delete directory {path}"))?;
            println!("✔ Deleted directory {path}");
        }
        Commands::Ls { path, recursive } => {
            let records = fs
                .list_contents(&path, recursive)
                .await
                .with_context(|| format!("Failed to list {path}"))?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Mv { src, dst } => {
            fs.rename(&src, &dst)
                .await
                .with_context(|| format!("Failed to move {src} to {dst}"))?;
            println!("✔ Moved {src} -> {dst}");
        }
        Commands::Cp { src, dst } => {
            fs.copy(&src, &dst)
                .await
                .with_context(|| format!("Failed to copy {src} to {dst}"))?;
            println!("✔ Copied {src} -> {dst}");
        }
        Commands::Stat { path } => {
            let record = fs
                .get_metadata(&path)
                .await
                .with_context(|| format!("Failed to stat {path}"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

/// Reads all of stdin.
async fn read_stdin() -> Result<Bytes> {
    let mut stream = stdin_stream();
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk.context("Failed to read stdin")?);
    }
    Ok(Bytes::from(buffer))
}
