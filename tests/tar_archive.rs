use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use arclib::{Archive, ArcError, MemberInfo, TarArchive, TarInfo};
use tempfile::tempdir;

fn build_archive(path: &Path) {
    let mut archive = TarArchive::create(path).unwrap();
    archive.add_data("alpha.txt", b"first member").unwrap();
    archive.add_data("beta/gamma.txt", b"nested").unwrap();
    archive.close().unwrap();
}

#[test]
fn members_and_all_info_agree() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    let mut archive = TarArchive::open(&tar_path).unwrap();
    let names = archive.members().unwrap();
    let infos = archive.all_info().unwrap();

    assert_eq!(names, vec!["alpha.txt", "beta/gamma.txt"]);
    assert_eq!(names.len(), infos.len());
    for (name, info) in names.iter().zip(&infos) {
        assert_eq!(*name, info.filename());
    }
    assert_eq!(infos[0].size(), 12);
    assert_eq!(infos[1].size(), 6);
}

#[test]
fn info_for_missing_member_fails() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    let mut archive = TarArchive::open(&tar_path).unwrap();
    let info = archive.info_for("alpha.txt").unwrap();
    assert_eq!(info.size(), 12);

    match archive.info_for("missing.txt") {
        Err(ArcError::MemberNotFound(name)) => assert_eq!(name, "missing.txt"),
        other => panic!("expected MemberNotFound, got {:?}", other.map(|i| i.filename())),
    }
}

#[test]
fn open_member_returns_none_for_missing_name() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    let mut archive = TarArchive::open(&tar_path).unwrap();

    let mut member = archive.open_member("beta/gamma.txt").unwrap().unwrap();
    assert_eq!(member.name(), "beta/gamma.txt");
    assert_eq!(member.len(), 6);
    let mut content = String::new();
    member.read_to_string(&mut content).unwrap();
    assert_eq!(content, "nested");

    // Missing member is a sentinel, not an error.
    assert!(archive.open_member("missing.txt").unwrap().is_none());
}

#[test]
fn extract_and_extract_all() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    let mut archive = TarArchive::open(&tar_path).unwrap();

    let out1 = dir.path().join("one");
    archive.extract("alpha.txt", Some(&out1)).unwrap();
    assert_eq!(fs::read(out1.join("alpha.txt")).unwrap(), b"first member");

    let out2 = dir.path().join("all");
    archive.extract_all(Some(&out2), None).unwrap();
    assert_eq!(fs::read(out2.join("beta/gamma.txt")).unwrap(), b"nested");

    let out3 = dir.path().join("subset");
    archive
        .extract_all(Some(&out3), Some(&["beta/gamma.txt"][..]))
        .unwrap();
    assert!(out3.join("beta/gamma.txt").exists());
    assert!(!out3.join("alpha.txt").exists());

    assert!(matches!(
        archive.extract("missing.txt", Some(&out1)),
        Err(ArcError::MemberNotFound(_))
    ));
}

#[test]
fn add_directory_recursively() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("inner")).unwrap();
    fs::write(src.join("top.txt"), b"top").unwrap();
    fs::write(src.join("inner/deep.txt"), b"deep").unwrap();

    let tar_path = dir.path().join("tree.tar");
    let mut archive = TarArchive::create(&tar_path).unwrap();
    archive.add(&src, Some("root"), true).unwrap();
    archive.close().unwrap();

    let mut archive = TarArchive::open(&tar_path).unwrap();
    let names = archive.members().unwrap();
    assert!(names.iter().any(|n| n == "root/top.txt"));
    assert!(names.iter().any(|n| n == "root/inner/deep.txt"));
}

#[test]
fn add_data_info_reuses_record_fields() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("meta.tar");

    let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    let mut info = TarInfo::new("stamped.txt").unwrap();
    info.set_size(5);
    info.set_mtime(mtime).unwrap();

    let mut archive = TarArchive::create(&tar_path).unwrap();
    archive.add_data_info(&info, b"bytes").unwrap();
    archive.close().unwrap();

    let mut archive = TarArchive::open(&tar_path).unwrap();
    let stored = archive.info_for("stamped.txt").unwrap();
    assert_eq!(stored.size(), 5);
    assert_eq!(stored.mtime(), mtime);
}

#[test]
fn add_info_reuses_backend_header_verbatim() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("verbatim.tar");

    let mut info = TarInfo::new("raw.bin").unwrap();
    info.set_size(3);

    let mut archive = TarArchive::create(&tar_path).unwrap();
    archive.add_info(&info, b"abc").unwrap();
    archive.close().unwrap();

    let mut archive = TarArchive::open(&tar_path).unwrap();
    let mut member = archive.open_member("raw.bin").unwrap().unwrap();
    let mut data = Vec::new();
    member.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"abc");
}

#[test]
fn duplicate_names_are_allowed() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("dup.tar");

    let mut archive = TarArchive::create(&tar_path).unwrap();
    archive.add_data("same.txt", b"one").unwrap();
    archive.add_data("same.txt", b"two").unwrap();
    archive.close().unwrap();

    let mut archive = TarArchive::open(&tar_path).unwrap();
    assert_eq!(archive.members().unwrap(), vec!["same.txt", "same.txt"]);
    // Lookup returns the first match in archive order.
    let mut member = archive.open_member("same.txt").unwrap().unwrap();
    let mut data = Vec::new();
    member.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"one");
}

#[test]
fn closed_archive_rejects_operations() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    let mut archive = TarArchive::open(&tar_path).unwrap();
    archive.close().unwrap();
    // close is idempotent, everything else fails
    archive.close().unwrap();
    assert!(matches!(archive.members(), Err(ArcError::Closed)));
    assert!(matches!(
        archive.add_data("x", b"y"),
        Err(ArcError::Closed)
    ));
}

#[test]
fn mode_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("w.tar");

    let mut writing = TarArchive::create(&tar_path).unwrap();
    assert!(matches!(writing.members(), Err(ArcError::Mode(_))));
    writing.add_data("a.txt", b"a").unwrap();
    writing.close().unwrap();

    let mut reading = TarArchive::open(&tar_path).unwrap();
    assert!(matches!(
        reading.add_data("b.txt", b"b"),
        Err(ArcError::Mode(_))
    ));
}

#[test]
fn in_memory_archive_roundtrip() {
    let mut archive = TarArchive::from_writer(Cursor::new(Vec::new()));
    archive.add_data("mem.txt", b"in memory").unwrap();
    let cursor = archive.into_inner().unwrap();

    let mut archive = TarArchive::from_reader(cursor);
    let mut member = archive.open_member("mem.txt").unwrap().unwrap();
    let mut data = Vec::new();
    member.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"in memory");
}

#[test]
fn is_tar_file_probe() {
    let dir = tempdir().unwrap();
    let tar_path = dir.path().join("bundle.tar");
    build_archive(&tar_path);

    assert!(arclib::is_tar_file(&tar_path));

    let other = dir.path().join("not.tar");
    fs::write(&other, b"definitely not a tar file").unwrap();
    assert!(!arclib::is_tar_file(&other));
    assert!(!arclib::is_tar_file(dir.path().join("absent.tar")));
}
