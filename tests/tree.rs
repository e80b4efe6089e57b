//! Archiving real directory trees and reading them back with the `tar` crate.

use std::{
    fs::{create_dir_all, set_permissions, write, Permissions},
    io::Read,
    os::unix::fs::{symlink, PermissionsExt},
    path::Path,
};

use similar_asserts::assert_eq;

use tardir::{fs::append_tree, Source, TarDirConfig, TarWriter, BLOCK_SIZE};

#[derive(Debug, PartialEq, Eq)]
struct Seen {
    path: String,
    kind: tar::EntryType,
    mode: u32,
    content: Vec<u8>,
}

fn archive(source: &Source, include_directories: bool) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut tar = TarWriter::new(&mut out);
        append_tree(&mut tar, source, include_directories).unwrap();
        tar.close().unwrap();
    }
    out
}

fn read_back(out: &[u8]) -> Vec<Seen> {
    let mut archive = tar::Archive::new(out);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            Seen {
                path: String::from_utf8(entry.path_bytes().into_owned()).unwrap(),
                kind: entry.header().entry_type(),
                mode: entry.header().mode().unwrap(),
                content,
            }
        })
        .collect()
}

fn file(path: &str, mode: u32, content: &[u8]) -> Seen {
    Seen {
        path: path.to_string(),
        kind: tar::EntryType::Regular,
        mode,
        content: content.to_vec(),
    }
}

fn dir(path: &str, mode: u32) -> Seen {
    Seen {
        path: path.to_string(),
        kind: tar::EntryType::Directory,
        mode,
        content: vec![],
    }
}

fn put(root: &Path, name: &str, mode: u32, content: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        create_dir_all(parent).unwrap();
    }
    write(&path, content).unwrap();
    set_permissions(&path, Permissions::from_mode(mode)).unwrap();
}

#[test]
fn test_files_only() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    put(root, "b.txt", 0o644, b"bee");
    put(root, "a/z.bin", 0o600, &[0u8; 700]);
    put(root, "a/run.sh", 0o755, b"#!/bin/sh\n");
    put(root, "empty", 0o644, b"");

    let source = TarDirConfig::default().resolve_in(root).unwrap();
    let out = archive(&source, false);

    assert_eq!(out.len() % BLOCK_SIZE, 0);
    assert_eq!(
        read_back(&out),
        vec![
            file("a/run.sh", 0o755, b"#!/bin/sh\n"),
            file("a/z.bin", 0o600, &[0u8; 700]),
            file("b.txt", 0o644, b"bee"),
            file("empty", 0o644, b""),
        ]
    );
}

#[test]
fn test_named_directory_with_dirs() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    put(base, "docs/guide/intro.md", 0o644, b"# intro\n");
    put(base, "other/ignored", 0o644, b"not archived");
    set_permissions(base.join("docs"), Permissions::from_mode(0o750)).unwrap();
    set_permissions(base.join("docs/guide"), Permissions::from_mode(0o700)).unwrap();

    let config = TarDirConfig {
        directory: Some("docs".to_string()),
        include_directories: true,
        ..Default::default()
    };
    let source = config.resolve_in(base).unwrap();
    let out = archive(&source, config.include_directories);

    assert_eq!(
        read_back(&out),
        vec![
            dir("docs", 0o750),
            dir("docs/guide", 0o700),
            file("docs/guide/intro.md", 0o644, b"# intro\n"),
        ]
    );
}

#[test]
fn test_long_names() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();

    // 203 bytes, splits into a 150-byte prefix and a 52-byte name
    let split = format!("{}/{}/{}", "p".repeat(70), "q".repeat(79), "s".repeat(52));
    // a 120-byte final segment needs a long-link entry
    let long = format!("{}/{}", "l".repeat(20), "n".repeat(120));
    put(root, &split, 0o644, b"split");
    put(root, &long, 0o644, b"long");

    let source = TarDirConfig::default().resolve_in(root).unwrap();
    let out = archive(&source, false);

    assert_eq!(
        read_back(&out),
        vec![file(&long, 0o644, b"long"), file(&split, 0o644, b"split")]
    );
}

#[test]
fn test_symlinks() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    put(root, "real", 0o644, b"content");
    put(root, "sub/inner", 0o644, b"inner");
    symlink("real", root.join("alias")).unwrap();
    symlink("sub", root.join("sublink")).unwrap();
    symlink("missing", root.join("broken")).unwrap();

    let source = TarDirConfig::default().resolve_in(root).unwrap();
    let out = archive(&source, false);

    assert_eq!(
        read_back(&out),
        vec![
            file("alias", 0o644, b"content"),
            file("real", 0o644, b"content"),
            file("sub/inner", 0o644, b"inner"),
        ]
    );
}

#[test]
fn test_deterministic() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    for i in 0..20 {
        put(root, &format!("d{}/f{i}", i % 3), 0o644, format!("{i}").as_bytes());
    }

    let source = TarDirConfig::default().resolve_in(root).unwrap();
    assert_eq!(archive(&source, true), archive(&source, true));
}
