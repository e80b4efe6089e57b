//! USTAR header encoding.
//!
//! Every entry starts with one 512-byte header block:
//!
//! | Offset | Size | Field     | Written as                               |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | raw bytes, NUL padded, truncated at 100  |
//! | 100    | 8    | mode      | `"%6o "` + NUL                           |
//! | 108    | 8    | uid       | `"%6o "` + NUL                           |
//! | 116    | 8    | gid       | `"%6o "` + NUL                           |
//! | 124    | 12   | size      | `"%11o "`                                |
//! | 136    | 12   | mtime     | `"%11o "`                                |
//! | 148    | 8    | checksum  | `"%06o"` + NUL + space                   |
//! | 156    | 1    | typeflag  | see [`EntryKind::typeflag`]              |
//! | 157    | 100  | linkname  | NUL                                      |
//! | 257    | 6    | magic     | `"ustar\0"`                              |
//! | 263    | 2    | version   | `"00"`                                   |
//! | 265    | 32   | uname     | NUL                                      |
//! | 297    | 32   | gname     | NUL                                      |
//! | 329    | 8    | devmajor  | NUL                                      |
//! | 337    | 8    | devminor  | NUL                                      |
//! | 345    | 155  | prefix    | raw bytes, NUL padded, truncated at 155  |
//! | 500    | 12   | pad       | NUL                                      |
//!
//! Numeric fields are right-aligned octal with leading spaces. The encoder
//! does not decide how long names are split; see [`crate::longname`].

use std::fmt;

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::{
    entry::{EntryKind, Stat},
    error::{ArchiveError, Result},
    BLOCK_SIZE,
};

/// Capacity of the `name` field.
pub const NAME_LEN: usize = 100;

/// Capacity of the `prefix` field.
pub const PREFIX_LEN: usize = 155;

/// Magic string for UStar format headers ("ustar\0").
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version field for UStar format headers ("00").
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Name of the GNU pseudo-entry carrying an overlong name as its payload.
pub const LONGLINK_NAME: &[u8] = b"././@LongLink";

/// Byte range of the checksum field.
const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// UStar (POSIX.1-1988) header block.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarHeader {
    pub name: [u8; 100],
    pub mode: [u8; 8],
    pub uid: [u8; 8],
    pub gid: [u8; 8],
    pub size: [u8; 12],
    pub mtime: [u8; 12],
    pub checksum: [u8; 8],
    pub typeflag: u8,
    pub linkname: [u8; 100],
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub uname: [u8; 32],
    pub gname: [u8; 32],
    pub devmajor: [u8; 8],
    pub devminor: [u8; 8],
    pub prefix: [u8; 155],
    pub pad: [u8; 12],
}

impl Default for UstarHeader {
    fn default() -> Self {
        let mut header = Self::new_zeroed();
        header.magic.copy_from_slice(USTAR_MAGIC);
        header.version.copy_from_slice(USTAR_VERSION);
        header
    }
}

impl fmt::Debug for UstarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarHeader")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field(
                "prefix",
                &String::from_utf8_lossy(truncate_null(&self.prefix)),
            )
            .field("size", &parse_octal(&self.size))
            .field("typeflag", &char::from(self.typeflag))
            .finish_non_exhaustive()
    }
}

impl UstarHeader {
    /// View a raw block as a header.
    #[must_use]
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> &Self {
        zerocopy::transmute_ref!(block)
    }

    /// The header as the 512 bytes written to the archive.
    #[must_use]
    pub fn as_block(&self) -> &[u8; BLOCK_SIZE] {
        zerocopy::transmute_ref!(self)
    }

    /// Name field with trailing NULs removed.
    #[must_use]
    pub fn name_bytes(&self) -> &[u8] {
        truncate_null(&self.name)
    }

    /// Prefix field with trailing NULs removed.
    #[must_use]
    pub fn prefix_bytes(&self) -> &[u8] {
        truncate_null(&self.prefix)
    }

    /// Entry size recorded in the header.
    #[must_use]
    pub fn entry_size(&self) -> Option<u64> {
        parse_octal(&self.size)
    }

    /// Entry kind recorded in the header, if it is one this crate writes.
    #[must_use]
    pub fn kind(&self) -> Option<EntryKind> {
        EntryKind::from_typeflag(self.typeflag)
    }

    /// Checksum value stored in the checksum field.
    #[must_use]
    pub fn stored_checksum(&self) -> Option<u64> {
        parse_octal(&self.checksum)
    }

    /// Returns true if the stored checksum matches the block contents.
    #[must_use]
    pub fn checksum_ok(&self) -> bool {
        self.stored_checksum() == Some(compute_checksum(self.as_block()))
    }

    fn set_checksum(&mut self) {
        let sum = compute_checksum(self.as_block());
        // max sum is 512 * 255, which always fits in six octal digits
        let text = format!("{sum:06o}\0 ");
        self.checksum.copy_from_slice(text.as_bytes());
    }
}

/// Encode one header block.
///
/// `name` and `prefix` are copied as-is and silently truncated to their field
/// capacity. Numeric values that cannot be represented fail with
/// [`ArchiveError::FieldOverflow`].
pub fn encode_header(
    name: &[u8],
    prefix: &[u8],
    stat: &Stat,
    size: u64,
    kind: EntryKind,
) -> Result<UstarHeader> {
    let mut header = UstarHeader::default();

    copy_truncated(&mut header.name, name);
    write_octal(&mut header.mode, "mode", stat.st_mode.into(), 6)?;
    write_octal(&mut header.uid, "uid", stat.st_uid.into(), 6)?;
    write_octal(&mut header.gid, "gid", stat.st_gid.into(), 6)?;
    write_octal(&mut header.size, "size", size, 11)?;
    let mtime = u64::try_from(stat.st_mtim_sec).map_err(|_| ArchiveError::FieldOverflow {
        field: "mtime",
        value: stat.st_mtim_sec.into(),
    })?;
    write_octal(&mut header.mtime, "mtime", mtime, 11)?;
    header.typeflag = kind.typeflag();
    copy_truncated(&mut header.prefix, prefix);

    header.set_checksum();
    Ok(header)
}

/// Sum of all block bytes with the checksum field counted as eight spaces.
#[must_use]
pub fn compute_checksum(block: &[u8; BLOCK_SIZE]) -> u64 {
    let mut sum: u64 = 0;
    for (i, &byte) in block.iter().enumerate() {
        if CHECKSUM_RANGE.contains(&i) {
            sum += u64::from(b' ');
        } else {
            sum += u64::from(byte);
        }
    }
    sum
}

/// Parse an octal ASCII field, skipping leading spaces and stopping at the
/// first space or NUL after the digits. Returns `None` on anything else.
#[must_use]
pub fn parse_octal(bytes: &[u8]) -> Option<u64> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let mut value: u64 = 0;
    for &byte in &bytes[start..end] {
        if !(b'0'..=b'7').contains(&byte) {
            return None;
        }
        value = value.checked_mul(8)?.checked_add(u64::from(byte - b'0'))?;
    }
    Some(value)
}

/// Truncate a byte slice at the first NUL byte.
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

fn copy_truncated(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
}

/// Render `value` right-aligned in `columns` octal digits followed by a space.
///
/// Bytes past the text stay NUL. The trailing space is dropped when the digits
/// alone fill the field.
fn write_octal(field: &mut [u8], name: &'static str, value: u64, columns: usize) -> Result<()> {
    let text = format!("{value:>columns$o} ");
    let digits = text.trim_start().len() - 1;
    if digits > field.len() {
        return Err(ArchiveError::FieldOverflow {
            field: name,
            value: value.into(),
        });
    }
    copy_truncated(field, text.as_bytes());
    Ok(())
}
