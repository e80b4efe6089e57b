//! tardir - Stream a directory tree as a tar archive.
//!
//! The archive is written block by block to stdout or a file while the tree
//! is walked, so memory use does not depend on the size of the tree.

use std::{
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use tardir::{fs::append_tree, Source, TarDirConfig, TarWriter};

/// Stream a directory tree as a USTAR archive.
#[derive(Debug, Parser)]
#[command(name = "tardir", version, about)]
struct Args {
    /// Directory to archive, relative to the working directory.
    ///
    /// Every `.`, `/` and `\` is removed from the name. Without this option
    /// the working directory itself is archived.
    #[arg(long)]
    dir: Option<String>,

    /// Refuse to archive the working directory when --dir is not given.
    #[arg(long)]
    no_root: bool,

    /// Also store entries for directories, not just regular files.
    #[arg(long)]
    include_dirs: bool,

    /// Write the archive to this path (`-` for stdout, the default).
    #[arg(short, long, conflicts_with = "auto_name")]
    output: Option<PathBuf>,

    /// Write the archive next to the archived directory, in a file named
    /// after it.
    #[arg(long)]
    auto_name: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let config = TarDirConfig {
        directory: args.dir,
        allow_root: !args.no_root,
        include_directories: args.include_dirs,
    };
    let source = config
        .resolve()
        .context("Failed to resolve the directory to archive")?;

    let output = if args.auto_name {
        let parent = source.path.parent().unwrap_or(Path::new("."));
        Some(parent.join(&source.archive_name))
    } else {
        args.output.filter(|path| path.as_os_str() != "-")
    };

    match output {
        None => {
            let stdout = io::stdout();
            if stdout.is_terminal() {
                bail!("Refusing to write a tar archive to a terminal. Redirect stdout or use --output.");
            }
            write_archive(TarWriter::stdout(), &source, &config)
        }
        Some(path) => {
            ensure_outside(&path, &source)?;
            let tar = TarWriter::create(&path)
                .with_context(|| format!("Failed to create archive file: {path:?}"))?;
            write_archive(tar, &source, &config)
        }
    }
}

fn write_archive<W: Write>(
    mut tar: TarWriter<W>,
    source: &Source,
    config: &TarDirConfig,
) -> Result<()> {
    let summary = append_tree(&mut tar, source, config.include_directories)
        .with_context(|| format!("Failed to archive {:?}", source.path))?;
    tar.close().context("Failed to finish the archive")?;

    info!(
        "{}: {} files, {} directories, {} skipped, {} payload bytes, {} archive bytes",
        source.archive_name,
        summary.files,
        summary.directories,
        summary.skipped,
        summary.bytes,
        tar.bytes_written()
    );
    Ok(())
}

/// An archive written inside the tree it archives would end up reading itself.
fn ensure_outside(output: &Path, source: &Source) -> Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = parent
        .canonicalize()
        .with_context(|| format!("Failed to access output directory: {parent:?}"))?;
    let root = source
        .path
        .canonicalize()
        .with_context(|| format!("Failed to access source directory: {:?}", source.path))?;

    if parent.starts_with(&root) {
        bail!(
            "Output {output:?} lies inside the archived directory {:?}",
            source.path
        );
    }
    Ok(())
}
