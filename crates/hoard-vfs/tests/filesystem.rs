//! End-to-end filesystem behaviour over both backing stores.

use std::io::{Read, Write};
use std::sync::Arc;

use hoard_vfs::{
    ArchiveFs, ArchiveFsConfig, FileType, Filesystem, LocalBacking, MemoryBacking, OpenFlags,
    VfsError,
};

fn memory_fs() -> ArchiveFs {
    ArchiveFs::new(Arc::new(MemoryBacking::new()), "test.hoard")
}

fn paths(infos: &[hoard_vfs::FileInfo]) -> Vec<&str> {
    infos.iter().map(|i| i.path.as_str()).collect()
}

#[test]
fn test_create_then_stat_before_close() {
    let fs = memory_fs();
    let mut h = fs.open_file("/docs/readme", OpenFlags::create_truncate(), 0o640).unwrap();
    h.write_all(b"hello").unwrap();

    let info = fs.stat("docs/readme").unwrap();
    assert_eq!(info.path, "docs/readme");
    assert_eq!(info.name(), "readme");
    assert_eq!(info.perm, 0o640);
    assert_eq!(info.kind, FileType::File);

    h.close().unwrap();
    assert_eq!(fs.stat("docs/readme").unwrap().size, 5);
}

#[test]
fn test_create_uses_configured_mode() {
    let config = ArchiveFsConfig {
        file_mode: 0o600,
        ..Default::default()
    };
    let fs = ArchiveFs::with_config(Arc::new(MemoryBacking::new()), "m.hoard", config);
    fs.write_file("f", b"x").unwrap();
    assert_eq!(fs.stat("f").unwrap().perm, 0o600);
}

#[test]
fn test_remove_hides_entry_everywhere() {
    let fs = memory_fs();
    fs.write_file("a/b/c", b"1").unwrap();
    fs.write_file("a/keep", b"2").unwrap();
    fs.remove("a/b/c").unwrap();

    assert!(matches!(fs.stat("a/b/c"), Err(VfsError::NotFound(_))));
    assert!(matches!(fs.open("a/b/c"), Err(VfsError::NotFound(_))));
    assert!(matches!(fs.stat("a/b"), Err(VfsError::NotFound(_))));
    assert_eq!(paths(&fs.read_dir("a").unwrap()), vec!["a/keep"]);
    assert!(matches!(fs.remove("a/b/c"), Err(VfsError::NotFound(_))));
}

#[test]
fn test_synthetic_directory_mtime() {
    let fs = memory_fs();
    fs.write_file("a/b/c", b"data").unwrap();
    let file = fs.stat("a/b/c").unwrap();

    let listing = fs.read_dir("a").unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].path, "a/b");
    assert!(listing[0].is_dir());
    assert_eq!(listing[0].mtime, file.mtime);
    assert_eq!(listing[0].perm, 0o755);

    let dir = fs.stat("/a").unwrap();
    assert!(dir.is_dir());
    assert_eq!(dir.mtime, file.mtime);
}

#[test]
fn test_read_dir_orders_dirs_before_files() {
    let fs = memory_fs();
    for name in ["z", "m/x", "a", "b/y/z", "c"] {
        fs.write_file(name, name.as_bytes()).unwrap();
    }
    let root = fs.read_dir("/").unwrap();
    assert_eq!(paths(&root), vec!["b", "m", "a", "c", "z"]);

    assert!(fs.read_dir("nothing/here").unwrap().is_empty());
    assert!(matches!(fs.read_dir("a"), Err(VfsError::NotADirectory(_))));
}

#[test]
fn test_names_with_glob_metacharacters() {
    let fs = memory_fs();
    fs.write_file("we[ir]d*/f?le", b"1").unwrap();
    fs.write_file("weid/x", b"2").unwrap();

    let listing = fs.read_dir("we[ir]d*").unwrap();
    assert_eq!(paths(&listing), vec!["we[ir]d*/f?le"]);
}

#[test]
fn test_single_writer() {
    let fs = memory_fs();
    let mut first = fs.create("one").unwrap();
    assert!(matches!(fs.create("two"), Err(VfsError::WriterBusy(_))));

    fs.write_file("x", b"").unwrap_err();
    first.write_all(b"first").unwrap();

    // Reads keep working while the writer is open.
    assert_eq!(fs.stat("one").unwrap().path, "one");

    first.close().unwrap();
    let mut second = fs.create("two").unwrap();
    second.write_all(b"second").unwrap();
    second.close().unwrap();

    assert_eq!(fs.read_file("one").unwrap(), b"first");
    assert_eq!(fs.read_file("two").unwrap(), b"second");
}

#[test]
fn test_remove_while_writer_open() {
    let fs = memory_fs();
    fs.write_file("old", b"1").unwrap();
    let mut w = fs.create("new").unwrap();
    assert!(matches!(fs.remove("old"), Err(VfsError::WriterBusy(_))));
    w.close().unwrap();
    fs.remove("old").unwrap();
}

#[test]
fn test_overwrite_returns_latest() {
    let fs = memory_fs();
    fs.write_file("f", b"one").unwrap();
    fs.write_file("f", b"two").unwrap();
    fs.write_file("f", b"three").unwrap();
    assert_eq!(fs.read_file("f").unwrap(), b"three");
    assert_eq!(fs.read_dir("/").unwrap().len(), 1);

    fs.remove("f").unwrap();
    fs.write_file("f", b"again").unwrap();
    assert_eq!(fs.read_file("f").unwrap(), b"again");
}

#[test]
fn test_directory_file_conflicts() {
    let fs = memory_fs();
    fs.write_file("a/b", b"x").unwrap();

    assert!(matches!(fs.remove("a"), Err(VfsError::DirectoryNotEmpty(_))));
    assert!(matches!(fs.create("a"), Err(VfsError::IsADirectory(_))));

    fs.write_file("f", b"x").unwrap();
    assert!(matches!(fs.create("f/g"), Err(VfsError::NotADirectory(_))));
    assert!(matches!(fs.create("f/g/h"), Err(VfsError::NotADirectory(_))));
}

#[test]
fn test_mkdir_all() {
    let fs = memory_fs();
    fs.mkdir_all("a/b/c", 0o755).unwrap();
    // Nothing is recorded for an empty directory.
    assert!(matches!(fs.stat("a"), Err(VfsError::NotFound(_))));

    fs.write_file("f", b"x").unwrap();
    assert!(matches!(fs.mkdir_all("f", 0o755), Err(VfsError::NotADirectory(_))));
    assert!(matches!(fs.mkdir_all("f/sub", 0o755), Err(VfsError::NotADirectory(_))));
}

#[test]
fn test_exclusive_create() {
    let fs = memory_fs();
    fs.write_file("f", b"x").unwrap();
    assert!(matches!(
        fs.open_file("f", OpenFlags::create_exclusive(), 0o644),
        Err(VfsError::AlreadyExists(_))
    ));
    let mut h = fs
        .open_file("g", OpenFlags::create_exclusive(), 0o644)
        .unwrap();
    h.close().unwrap();
}

#[test]
fn test_unsupported_operations() {
    let fs = memory_fs();
    assert!(matches!(fs.rename("a", "b"), Err(VfsError::Unsupported(_))));
    assert!(matches!(fs.temp_file("", "tmp"), Err(VfsError::Unsupported(_))));
    assert_eq!(fs.base(), "/");
    assert_eq!(fs.join(&["a", "/b/", "../c"]), "a/c");
}

#[test]
fn test_empty_archive_root() {
    let fs = memory_fs();
    assert!(matches!(fs.stat("/"), Err(VfsError::NotFound(_))));
    fs.write_file("x", b"1").unwrap();
    assert!(fs.stat("/").unwrap().is_dir());
}

#[test]
fn test_round_trip_sizes() {
    let fs = memory_fs();
    let big: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    let cases: [(&str, &[u8]); 3] = [
        ("empty", b"".as_slice()),
        ("one", b"z".as_slice()),
        ("big", big.as_slice()),
    ];

    for (name, data) in cases {
        fs.write_file(name, data).unwrap();
    }
    fs.close().unwrap();
    for (name, data) in cases {
        assert_eq!(fs.stat(name).unwrap().size, data.len() as u64);
        assert_eq!(fs.read_file(name).unwrap(), data, "{name}");
    }
}

#[test]
fn test_handles_survive_sync() {
    let fs = memory_fs();
    fs.write_file("f", b"abcdef").unwrap();
    let mut r = fs.open("f").unwrap();
    fs.sync().unwrap();

    let mut out = String::new();
    r.read_to_string(&mut out).unwrap();
    assert_eq!(out, "abcdef");
    r.close().unwrap();
}

#[test]
fn test_sync_with_open_writer() {
    let fs = memory_fs();
    let mut w = fs.create("f").unwrap();
    w.write_all(b"abc").unwrap();

    assert!(matches!(fs.sync(), Err(VfsError::WriterBusy(_))));

    w.write_all(b"def").unwrap();
    w.close().unwrap();
    fs.sync().unwrap();

    assert_eq!(fs.read_file("f").unwrap(), b"abcdef");
    fs.close().unwrap();
    assert_eq!(fs.read_file("f").unwrap(), b"abcdef");
}

#[test]
fn test_persistence_on_local_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backing = Arc::new(LocalBacking::new(dir.path()));

    let fs = ArchiveFs::new(backing.clone(), "repo.hoard");
    fs.write_file("objects/aa/1", b"first").unwrap();
    fs.write_file("objects/bb/2", b"second").unwrap();
    fs.write_file("HEAD", b"ref: main").unwrap();
    fs.close().unwrap();
    assert!(dir.path().join("repo.hoard").exists());

    let fs = ArchiveFs::new(backing.clone(), "repo.hoard");
    assert_eq!(paths(&fs.read_dir("objects").unwrap()), vec!["objects/aa", "objects/bb"]);
    fs.remove("objects/aa/1").unwrap();
    fs.write_file("HEAD", b"ref: dev").unwrap();
    fs.close().unwrap();

    let fs = ArchiveFs::new(backing, "repo.hoard");
    assert_eq!(paths(&fs.read_dir("objects").unwrap()), vec!["objects/bb"]);
    assert_eq!(fs.read_file("HEAD").unwrap(), b"ref: dev");
    fs.close().unwrap();
}

#[test]
fn test_unflushed_writes_lost_without_close() {
    let backing = Arc::new(MemoryBacking::new());
    let fs = ArchiveFs::new(backing.clone(), "lost.hoard");
    fs.write_file("kept", b"1").unwrap();
    fs.remove("kept").unwrap();
    // The tombstone is still pending; a fresh session sees the file.
    let other = ArchiveFs::new(backing, "lost.hoard");
    assert_eq!(other.read_file("kept").unwrap(), b"1");
}

#[test]
fn test_missing_archive_without_create() {
    let config = ArchiveFsConfig {
        create_if_missing: false,
        ..Default::default()
    };
    let fs = ArchiveFs::with_config(Arc::new(MemoryBacking::new()), "absent.hoard", config);
    assert!(matches!(fs.stat("x"), Err(VfsError::NotFound(_))));
    assert!(!fs.is_open());
}

#[test]
fn test_concurrent_readers() {
    let fs = memory_fs();
    for i in 0..8 {
        fs.write_file(&format!("f{i}"), format!("payload {i}").as_bytes())
            .unwrap();
    }

    std::thread::scope(|s| {
        for i in 0..8 {
            let fs = fs.clone();
            s.spawn(move || {
                for _ in 0..20 {
                    let data = fs.read_file(&format!("f{i}")).unwrap();
                    assert_eq!(data, format!("payload {i}").as_bytes());
                }
            });
        }
    });
}
