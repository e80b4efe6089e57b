//! Choosing how an entry name is stored.
//!
//! A name of up to [`NAME_LEN`] bytes goes straight into the `name` field.
//! Longer names are first split POSIX-style into `prefix` (the directory part)
//! and `name` (the final segment). When either part is still too long, the
//! full name is written as the payload of a GNU `././@LongLink` entry and the
//! real header keeps only the first [`NAME_LEN`] bytes, which readers ignore.

use crate::header::{NAME_LEN, PREFIX_LEN};

/// How a name is laid out in the header(s) of its entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamePlan<'a> {
    /// Fits the USTAR fields, possibly split across `prefix` and `name`.
    Plain { name: &'a [u8], prefix: &'a [u8] },
    /// Needs a preceding long-link entry carrying `full`; the real header
    /// holds `truncated`.
    LongLink { full: &'a [u8], truncated: &'a [u8] },
}

/// Decide the layout of `name`. Only byte lengths are considered.
#[must_use]
pub fn plan_name(name: &[u8]) -> NamePlan<'_> {
    if name.len() <= NAME_LEN {
        return NamePlan::Plain { name, prefix: b"" };
    }

    let (dir, base) = split_name(name);
    if base.len() <= NAME_LEN && dir.len() <= PREFIX_LEN {
        NamePlan::Plain {
            name: base,
            prefix: dir,
        }
    } else {
        NamePlan::LongLink {
            full: name,
            truncated: &name[..NAME_LEN],
        }
    }
}

/// Split a path into `(dirname, basename)`.
///
/// Trailing slashes are ignored. A name without a slash has the dirname
/// `"."`, a name directly below the root has the dirname `"/"`.
#[must_use]
pub fn split_name(name: &[u8]) -> (&[u8], &[u8]) {
    let end = name
        .iter()
        .rposition(|&b| b != b'/')
        .map_or(0, |i| i + 1);
    let trimmed = &name[..end];

    match trimmed.iter().rposition(|&b| b == b'/') {
        None => (&b"."[..], trimmed),
        Some(slash) => {
            let base = &trimmed[slash + 1..];
            let dir_end = trimmed[..slash]
                .iter()
                .rposition(|&b| b != b'/')
                .map_or(0, |i| i + 1);
            if dir_end == 0 {
                (&b"/"[..], base)
            } else {
                (&trimmed[..dir_end], base)
            }
        }
    }
}
