//! hoard: browse and edit a hoard archive from the shell.
//!
//! Usage:
//!   hoard --archive repo.hoard ls objects
//!   hoard --archive repo.hoard put notes/todo < todo.txt
//!   hoard --archive repo.hoard cat notes/todo
//!   RUST_LOG=hoard_vfs=debug hoard --archive repo.hoard rm notes/todo

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hoard_vfs::{ArchiveFs, ArchiveFsConfig, FileInfo, Filesystem, LocalBacking};

/// Hierarchical filesystem in a single append-only archive.
#[derive(Parser, Debug)]
#[command(name = "hoard", version)]
struct Args {
    /// Archive file to operate on
    #[arg(short, long)]
    archive: PathBuf,

    /// RON config file (file/dir modes, create-if-missing, sync-on-close)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show metadata for a file or directory
    Stat { path: String },
    /// Write a file's contents to stdout
    Cat { path: String },
    /// Store a file, reading its contents from stdin or --from
    Put {
        path: String,
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Delete a file
    Rm { path: String },
    /// Check that a directory path is usable
    Mkdir { path: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ArchiveFsConfig::load(path)?,
        None => ArchiveFsConfig::default(),
    };
    let fs = open_archive(&args.archive, config)?;

    let result = run(&fs, args.command);
    let closed = fs.close().context("closing archive");
    result.and(closed)
}

fn open_archive(archive: &Path, config: ArchiveFsConfig) -> Result<ArchiveFs> {
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not an archive file name: {}", archive.display()))?;
    let dir = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tracing::debug!(dir = %dir.display(), name, "opening archive");
    Ok(ArchiveFs::with_config(
        Arc::new(LocalBacking::new(dir)),
        name,
        config,
    ))
}

fn run(fs: &ArchiveFs, command: Command) -> Result<()> {
    let mut out = io::stdout().lock();
    match command {
        Command::Ls { path } => {
            for info in fs.read_dir(&path)? {
                print_info(&mut out, &info, info.name())?;
            }
        }
        Command::Stat { path } => {
            let info = fs.stat(&path)?;
            let shown = if info.path.is_empty() { "/" } else { info.path.as_str() };
            print_info(&mut out, &info, shown)?;
        }
        Command::Cat { path } => {
            let mut handle = fs.open(&path)?;
            io::copy(&mut handle, &mut out)?;
            handle.close()?;
        }
        Command::Put { path, from } => {
            let mut src: Box<dyn io::Read> = match from {
                Some(file) => Box::new(
                    std::fs::File::open(&file)
                        .with_context(|| format!("opening {}", file.display()))?,
                ),
                None => Box::new(io::stdin().lock()),
            };
            let mut handle = fs.create(&path)?;
            let copied = io::copy(&mut src, &mut handle);
            handle.close()?;
            let bytes = copied?;
            tracing::info!(path = %path, bytes, "stored");
        }
        Command::Rm { path } => fs.remove(&path)?,
        Command::Mkdir { path } => fs.mkdir_all(&path, fs.config().dir_mode)?,
    }
    out.flush()?;
    Ok(())
}

fn print_info(out: &mut impl Write, info: &FileInfo, name: &str) -> io::Result<()> {
    let kind = if info.is_dir() { 'd' } else { '-' };
    let secs = info
        .mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    writeln!(
        out,
        "{kind} {:04o} {:>10} {:>12} {name}",
        info.perm & 0o7777,
        info.size,
        secs
    )
}
