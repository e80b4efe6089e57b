//! Logical description of the objects stored in an archive.

/// Kind of object an archive entry describes.
///
/// The kind selects the header typeflag and whether payload blocks follow the
/// header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file (typeflag '0').
    File,
    /// Directory (typeflag '5'), never followed by payload blocks.
    Directory,
    /// GNU long name pseudo-entry (typeflag 'L') whose payload is the full
    /// name of the following entry.
    LongLinkMarker,
}

impl EntryKind {
    /// Raw typeflag byte written at offset 156 of the header.
    #[must_use]
    pub fn typeflag(self) -> u8 {
        match self {
            EntryKind::File => b'0',
            EntryKind::Directory => b'5',
            EntryKind::LongLinkMarker => b'L',
        }
    }

    /// Parse a typeflag byte. Old-style archives use '\0' for regular files.
    #[must_use]
    pub fn from_typeflag(byte: u8) -> Option<Self> {
        match byte {
            b'0' | b'\0' => Some(EntryKind::File),
            b'5' => Some(EntryKind::Directory),
            b'L' => Some(EntryKind::LongLinkMarker),
            _ => None,
        }
    }

    /// Returns true if payload blocks follow the header.
    #[must_use]
    pub fn has_payload(self) -> bool {
        !matches!(self, EntryKind::Directory)
    }
}

/// Ownership, permissions and modification time of an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    /// Permission bits (for example `0o644`).
    pub st_mode: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    /// Seconds since the Unix epoch.
    pub st_mtim_sec: i64,
}

/// One object to be stored in the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Forward-slash separated path inside the archive.
    pub name: Vec<u8>,
    pub stat: Stat,
    /// Payload length in bytes. For [`EntryKind::LongLinkMarker`] this is the
    /// length of the overflowing name.
    pub size: u64,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// The synthetic entry announcing that `full_name` is stored as payload.
    #[must_use]
    pub fn long_link(full_name: &[u8]) -> Self {
        ArchiveEntry {
            name: crate::header::LONGLINK_NAME.to_vec(),
            stat: Stat::default(),
            size: full_name.len() as u64,
            kind: EntryKind::LongLinkMarker,
        }
    }

    /// Name as printable text, for log lines and error messages.
    #[must_use]
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}
