//! Streaming USTAR archive writer.
//!
//! `tardir` writes a filesystem tree as a tar archive directly to an output
//! sink, one 512-byte block at a time, without ever holding the archive in
//! memory. Names that do not fit the USTAR `name`/`prefix` fields fall back to
//! a GNU `././@LongLink` entry.
//!
//! # Example
//!
//! ```
//! use tardir::{archive::TarWriter, entry::{EntryKind, Stat}};
//!
//! let mut out = Vec::new();
//! let mut tar = TarWriter::new(&mut out);
//! let stat = Stat { st_mode: 0o644, st_uid: 0, st_gid: 0, st_mtim_sec: 0 };
//! tar.append_bytes(b"hello\n", "hello.txt", &stat, EntryKind::File)?;
//! tar.close()?;
//! drop(tar);
//!
//! assert_eq!(out.len(), 4 * tardir::BLOCK_SIZE);
//! # Ok::<(), tardir::error::ArchiveError>(())
//! ```

pub mod archive;
pub mod blocks;
pub mod config;
pub mod entry;
pub mod error;
pub mod fs;
pub mod header;
pub mod longname;
mod util;

pub use archive::TarWriter;
pub use config::{Source, TarDirConfig};
pub use entry::{ArchiveEntry, EntryKind, Stat};
pub use error::{ArchiveError, ConfigError, Result};

/// Every header and every payload chunk occupies exactly one block of this size.
pub const BLOCK_SIZE: usize = 512;

/// Number of zero blocks that terminate an archive.
pub const TERMINATOR_BLOCKS: usize = 2;
