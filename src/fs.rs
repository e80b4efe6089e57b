//! Walking a directory tree into an archive.
//!
//! Directories are visited self-first and in byte order of their entry names,
//! so the same tree always produces the same archive. Regular files are opened
//! one at a time; the handle lives only while its content is streamed.
//! Symlinks to regular files are archived as the file they point to, symlinks
//! to directories are not followed, and other file types are skipped.

use std::{ffi::OsStr, fs::File, io, io::Write, os::unix::ffi::OsStrExt};

use log::debug;
use rustix::{
    fd::OwnedFd,
    fs::{fstat, openat, statat, AtFlags, Dir, FileType, Mode, OFlags, CWD},
};

use crate::{
    archive::TarWriter,
    config::Source,
    entry::{EntryKind, Stat},
    error::{ArchiveError, Result},
};

/// Counts of what a walk put into the archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub files: u64,
    pub directories: u64,
    /// Entries that were neither regular files nor directories.
    pub skipped: u64,
    /// Payload bytes of all archived files.
    pub bytes: u64,
}

/// Append everything below `source.path` to `tar`.
///
/// With `include_directories`, each directory (and the source directory
/// itself, when it has a name prefix) gets a header-only entry ahead of its
/// contents. The archive is left open.
pub fn append_tree<W: Write>(
    tar: &mut TarWriter<W>,
    source: &Source,
    include_directories: bool,
) -> Result<TreeSummary> {
    let fd = openat(
        CWD,
        &source.path,
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .map_err(|errno| ArchiveError::OpenSource {
        path: source.path.clone(),
        source: errno.into(),
    })?;

    let mut walker = TreeWalker {
        tar,
        include_directories,
        summary: TreeSummary::default(),
    };

    let prefix = source.name_prefix.as_bytes();
    if include_directories && !prefix.is_empty() {
        walker.append_directory(&fd, prefix)?;
    }
    walker.walk_directory(&fd, prefix)?;

    debug!("walked {:?}: {:?}", source.path, walker.summary);
    Ok(walker.summary)
}

struct TreeWalker<'a, W: Write> {
    tar: &'a mut TarWriter<W>,
    include_directories: bool,
    summary: TreeSummary,
}

impl<W: Write> TreeWalker<'_, W> {
    fn stat(buf: &rustix::fs::Stat) -> Stat {
        Stat {
            st_mode: buf.st_mode & 0o7777,
            st_uid: buf.st_uid,
            st_gid: buf.st_gid,
            st_mtim_sec: buf.st_mtime as i64,
        }
    }

    fn walk_directory(&mut self, dirfd: &OwnedFd, prefix: &[u8]) -> Result<()> {
        let mut names = Vec::new();
        for item in Dir::read_from(dirfd).map_err(io::Error::from)? {
            let entry = item.map_err(io::Error::from)?;
            let name = entry.file_name().to_bytes();
            if name == b"." || name == b".." {
                continue;
            }
            names.push(name.to_vec());
        }
        names.sort();

        for name in names {
            let entry_name = join_name(prefix, &name);
            let name = OsStr::from_bytes(&name);

            let buf = statat(dirfd, name, AtFlags::SYMLINK_NOFOLLOW).map_err(io::Error::from)?;
            match FileType::from_raw_mode(buf.st_mode) {
                FileType::Directory => {
                    let fd = openat(
                        dirfd,
                        name,
                        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::NOFOLLOW | OFlags::CLOEXEC,
                        Mode::empty(),
                    )
                    .map_err(io::Error::from)?;
                    if self.include_directories {
                        self.append_directory(&fd, &entry_name)?;
                    }
                    self.walk_directory(&fd, &entry_name)?;
                }
                FileType::RegularFile | FileType::Symlink => {
                    self.append_file(dirfd, name, &entry_name)?;
                }
                other => self.skip(&entry_name, other),
            }
        }

        Ok(())
    }

    fn append_directory(&mut self, fd: &OwnedFd, entry_name: &[u8]) -> Result<()> {
        let buf = fstat(fd).map_err(io::Error::from)?;
        self.tar.append_dir(entry_name, &Self::stat(&buf))?;
        self.summary.directories += 1;
        Ok(())
    }

    fn append_file(&mut self, dirfd: &OwnedFd, name: &OsStr, entry_name: &[u8]) -> Result<()> {
        // resolve symlinks before opening so fifos behind them are never opened
        let target = match statat(dirfd, name, AtFlags::empty()) {
            Ok(buf) => FileType::from_raw_mode(buf.st_mode),
            Err(rustix::io::Errno::NOENT) => {
                debug!("{}: dangling symlink", String::from_utf8_lossy(entry_name));
                self.summary.skipped += 1;
                return Ok(());
            }
            Err(errno) => return Err(io::Error::from(errno).into()),
        };
        if target != FileType::RegularFile {
            self.skip(entry_name, target);
            return Ok(());
        }

        let fd = openat(
            dirfd,
            name,
            OFlags::RDONLY | OFlags::NOCTTY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|errno| ArchiveError::OpenSource {
            path: OsStr::from_bytes(entry_name).into(),
            source: errno.into(),
        })?;

        let buf = fstat(&fd).map_err(io::Error::from)?;
        let size = buf.st_size as u64;
        self.tar.append_reader(
            entry_name,
            &Self::stat(&buf),
            size,
            EntryKind::File,
            File::from(fd),
        )?;

        self.summary.files += 1;
        self.summary.bytes += size;
        Ok(())
    }

    fn skip(&mut self, entry_name: &[u8], file_type: FileType) {
        debug!(
            "{}: skipping {file_type:?}",
            String::from_utf8_lossy(entry_name)
        );
        self.summary.skipped += 1;
    }
}

fn join_name(prefix: &[u8], name: &[u8]) -> Vec<u8> {
    if prefix.is_empty() {
        return name.to_vec();
    }
    let mut joined = Vec::with_capacity(prefix.len() + 1 + name.len());
    joined.extend_from_slice(prefix);
    joined.push(b'/');
    joined.extend_from_slice(name);
    joined
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::symlink;

    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_join_name() {
        assert_eq!(join_name(b"", b"a"), b"a");
        assert_eq!(join_name(b"dir", b"a"), b"dir/a");
    }

    #[test]
    fn test_summary() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path();
        std::fs::create_dir_all(root.join("sub/deeper")).unwrap();
        std::fs::write(root.join("a.txt"), b"aaaa").unwrap();
        std::fs::write(root.join("sub/b.txt"), b"bb").unwrap();
        symlink("a.txt", root.join("link")).unwrap();
        symlink("sub", root.join("dirlink")).unwrap();
        symlink("nowhere", root.join("dangling")).unwrap();

        let source = Source {
            path: root.to_path_buf(),
            name_prefix: String::new(),
            archive_name: "t.tar".to_string(),
        };

        let mut out = Vec::new();
        let mut tar = TarWriter::new(&mut out);
        let summary = append_tree(&mut tar, &source, true).unwrap();
        tar.close().unwrap();

        assert_eq!(
            summary,
            TreeSummary {
                files: 3,
                directories: 2,
                skipped: 2,
                bytes: 10,
            }
        );
    }

    #[test]
    fn test_missing_root() {
        let source = Source {
            path: "/nonexistent/tardir".into(),
            name_prefix: String::new(),
            archive_name: "t.tar".to_string(),
        };
        let mut tar = TarWriter::new(Vec::new());
        assert!(matches!(
            append_tree(&mut tar, &source, false),
            Err(ArchiveError::OpenSource { .. })
        ));
    }
}
