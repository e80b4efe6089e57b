//! The archive writer.
//!
//! A [`TarWriter`] is created open, owning its output sink. Each append writes
//! the entry's header (preceded by a GNU long-link entry when the name needs
//! one) followed by its payload blocks, in call order. [`TarWriter::close`]
//! writes the two zero blocks that end the archive, flushes, and releases the
//! sink. Closing again does nothing; appending after close fails with
//! [`ArchiveError::EntryAfterClose`].

use std::{
    fs::File,
    io::{self, Read, Write},
    os::unix::fs::MetadataExt,
    path::Path,
};

use log::{debug, warn};

use crate::{
    blocks::BlockWriter,
    entry::{ArchiveEntry, EntryKind, Stat},
    error::{ArchiveError, Result},
    header::encode_header,
    longname::{plan_name, NamePlan},
    TERMINATOR_BLOCKS,
};

/// Streaming USTAR writer.
#[derive(Debug)]
pub struct TarWriter<W: Write> {
    /// `None` once the archive is closed.
    sink: Option<BlockWriter<W>>,
    /// Bytes written by the sink released on close.
    final_size: u64,
}

impl TarWriter<io::Stdout> {
    /// Archive to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl TarWriter<File> {
    /// Create (or truncate) `path` and archive into it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ArchiveError::OpenSink {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> TarWriter<W> {
    /// Start an archive on an already open sink.
    pub fn new(sink: W) -> Self {
        TarWriter {
            sink: Some(BlockWriter::new(sink)),
            final_size: 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Bytes emitted so far, terminator included once closed.
    pub fn bytes_written(&self) -> u64 {
        self.sink
            .as_ref()
            .map_or(self.final_size, BlockWriter::bytes_written)
    }

    /// Append the regular file at `path`, stored under `name`.
    ///
    /// Metadata is taken from the opened file, so it describes the same object
    /// whose content is streamed. The file is closed before this returns.
    pub fn append_path(&mut self, name: impl AsRef<[u8]>, path: impl AsRef<Path>) -> Result<()> {
        if self.is_closed() {
            return Err(ArchiveError::EntryAfterClose);
        }

        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArchiveError::OpenSource {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = file.metadata()?;
        let stat = Stat {
            st_mode: meta.mode() & 0o7777,
            st_uid: meta.uid(),
            st_gid: meta.gid(),
            st_mtim_sec: meta.mtime(),
        };
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        self.append_reader(name, &stat, meta.len(), kind, file)
    }

    /// Append an entry whose content is read from `reader`.
    ///
    /// Exactly `size` bytes must be available. If the reader yields fewer or
    /// more, the archive is closed and [`ArchiveError::Corruption`] returned.
    /// Directories are written with size zero and `reader` is not touched.
    pub fn append_reader(
        &mut self,
        name: impl AsRef<[u8]>,
        stat: &Stat,
        size: u64,
        kind: EntryKind,
        mut reader: impl Read,
    ) -> Result<()> {
        // header-only kinds record size zero, whatever the caller passed
        let size = if kind.has_payload() { size } else { 0 };
        let entry = ArchiveEntry {
            name: name.as_ref().to_vec(),
            stat: *stat,
            size,
            kind,
        };

        let sink = self.open_sink()?;
        write_header(sink, &entry)?;
        if !kind.has_payload() {
            return Ok(());
        }

        let read = sink.write_payload(&mut reader, size)?;
        if read != size {
            if let Err(err) = self.close() {
                warn!("failed to terminate archive after size mismatch: {err}");
            }
            return Err(ArchiveError::Corruption {
                name: entry.name_lossy(),
                expected: size,
                read,
            });
        }
        Ok(())
    }

    /// Append an entry whose content is `data`. The size is `data.len()`, or
    /// zero for a directory, whose `data` is ignored.
    pub fn append_bytes(
        &mut self,
        data: &[u8],
        name: impl AsRef<[u8]>,
        stat: &Stat,
        kind: EntryKind,
    ) -> Result<()> {
        let data: &[u8] = if kind.has_payload() { data } else { &[] };
        let entry = ArchiveEntry {
            name: name.as_ref().to_vec(),
            stat: *stat,
            size: data.len() as u64,
            kind,
        };

        let sink = self.open_sink()?;
        write_header(sink, &entry)?;
        sink.write_padded(data)?;
        Ok(())
    }

    /// Append a directory entry: a header with no payload.
    pub fn append_dir(&mut self, name: impl AsRef<[u8]>, stat: &Stat) -> Result<()> {
        self.append_bytes(&[], name, stat, EntryKind::Directory)
    }

    /// Terminate the archive and release the sink.
    ///
    /// The first call writes two zero blocks and flushes; later calls return
    /// `Ok(())` without touching anything.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };

        // the sink is released whether or not the terminator made it out
        let result = sink
            .write_zero_blocks(TERMINATOR_BLOCKS)
            .and_then(|()| sink.flush());
        self.final_size = sink.bytes_written();
        debug!("archive closed after {} bytes", self.final_size);
        result
    }

    fn open_sink(&mut self) -> Result<&mut BlockWriter<W>> {
        self.sink.as_mut().ok_or(ArchiveError::EntryAfterClose)
    }
}

impl<W: Write> Drop for TarWriter<W> {
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!("closing archive on drop");
            if let Err(err) = self.close() {
                warn!("failed to close archive on drop: {err}");
            }
        }
    }
}

/// Write the header block(s) for `entry`, including any long-link entry.
///
/// Both headers are encoded before anything is written, so an encoding error
/// leaves the sink untouched.
fn write_header<W: Write>(sink: &mut BlockWriter<W>, entry: &ArchiveEntry) -> Result<()> {
    let plan = plan_name(&entry.name);
    let (name, prefix) = match plan {
        NamePlan::Plain { name, prefix } => (name, prefix),
        NamePlan::LongLink { truncated, .. } => (truncated, &b""[..]),
    };
    let header = encode_header(name, prefix, &entry.stat, entry.size, entry.kind)?;

    if let NamePlan::LongLink { full, .. } = plan {
        debug!("{}: using GNU long-link name", entry.name_lossy());
        let marker = ArchiveEntry::long_link(full);
        let marker_header = encode_header(
            &marker.name,
            b"",
            &marker.stat,
            marker.size,
            marker.kind,
        )?;
        sink.write_block(marker_header.as_block())?;
        sink.write_padded(full)?;
    }

    debug!(
        "{}: {} bytes, type {}",
        entry.name_lossy(),
        entry.size,
        char::from(entry.kind.typeflag())
    );
    sink.write_block(header.as_block())
}
