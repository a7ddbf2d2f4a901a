use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use arclib::{Archive, ArcError, MemberInfo, ZipArchive, ZipInfo};
use tempfile::tempdir;

fn build_archive(path: &Path) {
    let mut archive = ZipArchive::create(path).unwrap();
    archive.add_data("alpha.txt", b"first member").unwrap();
    archive.add_data("beta/gamma.txt", b"nested").unwrap();
    archive.close().unwrap();
}

#[test]
fn members_and_all_info_agree() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    let mut archive = ZipArchive::open(&zip_path).unwrap();
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
fn open_member_returns_none_for_missing_name() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    let mut archive = ZipArchive::open(&zip_path).unwrap();

    let mut member = archive.open_member("alpha.txt").unwrap().unwrap();
    assert_eq!(member.name(), "alpha.txt");
    let mut content = String::new();
    member.read_to_string(&mut content).unwrap();
    assert_eq!(content, "first member");

    assert!(archive.open_member("missing.txt").unwrap().is_none());
}

#[test]
fn info_for_missing_member_fails() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    let mut archive = ZipArchive::open(&zip_path).unwrap();
    assert!(matches!(
        archive.info_for("missing.txt"),
        Err(ArcError::MemberNotFound(_))
    ));
}

#[test]
fn extract_and_extract_all() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    let mut archive = ZipArchive::open(&zip_path).unwrap();

    let out1 = dir.path().join("one");
    archive.extract("beta/gamma.txt", Some(&out1)).unwrap();
    assert_eq!(fs::read(out1.join("beta/gamma.txt")).unwrap(), b"nested");

    let out2 = dir.path().join("all");
    archive.extract_all(Some(&out2), None).unwrap();
    assert_eq!(fs::read(out2.join("alpha.txt")).unwrap(), b"first member");
    assert_eq!(fs::read(out2.join("beta/gamma.txt")).unwrap(), b"nested");

    let out3 = dir.path().join("subset");
    archive
        .extract_all(Some(&out3), Some(&["alpha.txt"][..]))
        .unwrap();
    assert!(out3.join("alpha.txt").exists());
    assert!(!out3.join("beta").exists());
}

#[test]
fn recursive_add_with_alternate_root() {
    // A file "a/b.txt" added from root "a/" under archive root "x" becomes
    // member "x/b.txt".
    let dir = tempdir().unwrap();
    let src = dir.path().join("a");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("b.txt"), b"hi").unwrap();

    let zip_path = dir.path().join("rooted.zip");
    let mut archive = ZipArchive::create(&zip_path).unwrap();
    archive.add(&src, Some("x"), true).unwrap();
    archive.close().unwrap();

    let mut archive = ZipArchive::open(&zip_path).unwrap();
    assert_eq!(archive.members().unwrap(), vec!["x/b.txt"]);
    let info = archive.info_for("x/b.txt").unwrap();
    assert_eq!(info.size(), 2);
}

#[test]
fn recursive_add_without_arcname_strips_root() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("tree");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("top.txt"), b"top").unwrap();
    fs::write(src.join("sub/deep.txt"), b"deep").unwrap();

    let zip_path = dir.path().join("tree.zip");
    let mut archive = ZipArchive::create(&zip_path).unwrap();
    archive.add(&src, None, true).unwrap();
    archive.close().unwrap();

    let mut archive = ZipArchive::open(&zip_path).unwrap();
    let names = archive.members().unwrap();
    assert!(names.iter().any(|n| n == "top.txt"));
    assert!(names.iter().any(|n| n == "sub/deep.txt"));
}

#[test]
fn encrypted_member_requires_password() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("secret.zip");

    let mut archive = ZipArchive::create(&zip_path).unwrap();
    archive
        .add_data_with_password("secret.txt", b"classified", "hunter2")
        .unwrap();
    archive.close().unwrap();

    let mut archive = ZipArchive::open(&zip_path).unwrap();

    // Metadata is readable without a credential.
    assert_eq!(archive.members().unwrap(), vec!["secret.txt"]);
    assert_eq!(archive.info_for("secret.txt").unwrap().size(), 10);

    // Payload is not.
    assert!(matches!(
        archive.open_member("secret.txt"),
        Err(ArcError::PasswordRequired(_))
    ));

    let mut member = archive
        .open_member_with_password("secret.txt", "hunter2")
        .unwrap()
        .unwrap();
    let mut content = Vec::new();
    member.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"classified");

    assert!(archive
        .open_member_with_password("secret.txt", "wrong password")
        .is_err());

    let out = dir.path().join("out");
    archive
        .extract_with_password("secret.txt", Some(&out), "hunter2")
        .unwrap();
    assert_eq!(fs::read(out.join("secret.txt")).unwrap(), b"classified");
}

#[test]
fn mtime_conversion_truncates_once() {
    let mut info = ZipInfo::new("stamped.txt");

    // 2020-09-13 12:26:40 UTC plus 250ms of sub-second noise.
    let precise = UNIX_EPOCH + Duration::new(1_600_000_000, 250_000_000);
    info.set_mtime(precise).unwrap();

    let first = info.mtime();
    // Fractional seconds are gone after the first conversion.
    assert_eq!(first, UNIX_EPOCH + Duration::from_secs(1_600_000_000));

    // And the truncation is a fixpoint: converting again changes nothing.
    info.set_mtime(first).unwrap();
    assert_eq!(info.mtime(), first);
}

#[test]
fn pre_1980_mtime_is_unsupported() {
    let mut info = ZipInfo::new("old.txt");
    assert!(matches!(
        info.set_mtime(UNIX_EPOCH),
        Err(ArcError::Unsupported(_))
    ));
}

#[test]
fn closed_archive_rejects_operations() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    let mut archive = ZipArchive::open(&zip_path).unwrap();
    archive.close().unwrap();
    archive.close().unwrap();
    assert!(matches!(archive.members(), Err(ArcError::Closed)));
}

#[test]
fn mode_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("w.zip");

    let mut writing = ZipArchive::create(&zip_path).unwrap();
    assert!(matches!(writing.members(), Err(ArcError::Mode(_))));
    writing.add_data("a.txt", b"a").unwrap();
    writing.close().unwrap();

    let mut reading = ZipArchive::open(&zip_path).unwrap();
    assert!(matches!(
        reading.add_data("b.txt", b"b"),
        Err(ArcError::Mode(_))
    ));
}

#[test]
fn add_data_info_carries_name_and_mtime() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("meta.zip");

    let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    let mut info = ZipInfo::new("stamped.txt");
    info.set_size(5);
    info.set_mtime(mtime).unwrap();

    let mut archive = ZipArchive::create(&zip_path).unwrap();
    archive.add_data_info(&info, b"bytes").unwrap();
    archive.close().unwrap();

    let mut archive = ZipArchive::open(&zip_path).unwrap();
    let stored = archive.info_for("stamped.txt").unwrap();
    assert_eq!(stored.filename(), "stamped.txt");
    assert_eq!(stored.size(), 5);
    assert_eq!(stored.mtime(), mtime);
}

#[test]
fn in_memory_archive_roundtrip() {
    let mut archive = ZipArchive::from_writer(Cursor::new(Vec::new()));
    archive.add_data("mem.txt", b"in memory").unwrap();
    let cursor = archive.into_inner().unwrap();

    let mut archive = ZipArchive::from_reader(cursor).unwrap();
    let mut member = archive.open_member("mem.txt").unwrap().unwrap();
    let mut data = Vec::new();
    member.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"in memory");
}

#[test]
fn is_zip_file_probe() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bundle.zip");
    build_archive(&zip_path);

    assert!(arclib::is_zip_file(&zip_path));

    let other = dir.path().join("not.zip");
    fs::write(&other, b"definitely not a zip file").unwrap();
    assert!(!arclib::is_zip_file(&other));
}
