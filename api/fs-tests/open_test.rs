use super::FSName;
use crate::error_fs::VfsError;
use virtualfs_api::error::ErrorCode;
use virtualfs_api::fs::{
    DescriptorSupport, DirectorySupport, FileSupport, LinkSupport, MetadataSupport,
};
use virtualfs_api::types::OpenFlags;

#[path = "utils.rs"]
mod utils;

#[test]
fn descriptors_are_small_and_reused() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    let a = fs.open_str("/f", "r").unwrap();
    let b = fs.open_str("/f", "r").unwrap();
    assert_eq!(a, 0);
    assert_eq!(b, 1);
    fs.close(a).unwrap();
    let c = fs.open_str("/f", "r").unwrap();
    assert_eq!(c, 0);
    fs.close(b).unwrap();
    fs.close(c).unwrap();
    utils::assert_code(fs.close(c), ErrorCode::EBADF);
}

#[test]
fn unknown_mode_strings_are_a_usage_error() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    match fs.open_str("/f", "rw") {
        Err(VfsError::Mode(_)) => {}
        other => panic!("expected a mode error, got {:?}", other.map(|_| ())),
    }
    // and carries no errno
    match fs.open_str("/f", "banana") {
        Err(e) => assert_eq!(e.code(), None),
        Ok(_) => panic!("mode should not parse"),
    }
}

#[test]
fn open_without_creat_needs_an_existing_file() {
    let mut fs = utils::new_fs();
    utils::assert_code(fs.open_str("/missing", "r"), ErrorCode::ENOENT);
    utils::assert_code(fs.open_str("/missing/deeper", "w"), ErrorCode::ENOENT);

    let fd = fs.open_str("/created", "w").unwrap();
    fs.close(fd).unwrap();
    assert!(fs.exists("/created"));
    assert_eq!(fs.stat("/created").unwrap().size, 0);
}

#[test]
fn exclusive_creation_refuses_existing_targets() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    utils::assert_code(fs.open_str("/f", "wx"), ErrorCode::EEXIST);
    utils::assert_code(fs.open_str("/f", "ax+"), ErrorCode::EEXIST);
    // a symlink at the final position counts, even a dangling one
    fs.symlink("/nowhere", "/ln").unwrap();
    utils::assert_code(fs.open_str("/ln", "wx"), ErrorCode::EEXIST);
}

#[test]
fn truncating_open_clears_the_file() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "a lot of contents");
    let fd = fs.open_str("/f", "w").unwrap();
    fs.close(fd).unwrap();
    assert_eq!(fs.stat("/f").unwrap().size, 0);
}

#[test]
fn nofollow_refuses_terminating_symlinks() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.symlink("/f", "/ln").unwrap();
    utils::assert_code(
        fs.open("/ln", OpenFlags::NOFOLLOW, 0o666),
        ErrorCode::ELOOP,
    );
    // without it, the link is followed
    let fd = fs.open("/ln", OpenFlags::empty(), 0o666).unwrap();
    assert_eq!(fs.fstat(fd).unwrap().ino, fs.stat("/f").unwrap().ino);
    fs.close(fd).unwrap();
}

#[test]
fn open_through_a_dangling_symlink_can_create() {
    let mut fs = utils::new_fs();
    fs.mkdir("/d", 0o777).unwrap();
    fs.symlink("/d/target", "/ln").unwrap();
    utils::assert_code(fs.open_str("/ln", "r"), ErrorCode::ENOENT);
    // creation lands at the link's destination
    let fd = fs.open_str("/ln", "w").unwrap();
    fs.close(fd).unwrap();
    assert!(fs.exists("/d/target"));
}

#[test]
fn directory_flag_demands_a_directory() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    utils::assert_code(
        fs.open("/f", OpenFlags::DIRECTORY, 0o666),
        ErrorCode::ENOTDIR,
    );
    let fd = fs.open("/", OpenFlags::DIRECTORY, 0o666).unwrap();
    fs.close(fd).unwrap();
}

#[test]
fn directories_open_read_only() {
    let mut fs = utils::new_fs();
    fs.mkdir("/d", 0o777).unwrap();
    utils::assert_code(fs.open_str("/d", "w"), ErrorCode::EISDIR);
    utils::assert_code(fs.open_str("/d", "r+"), ErrorCode::EISDIR);

    let fd = fs.open_str("/d", "r").unwrap();
    let mut buf = [0u8; 8];
    utils::assert_code(fs.read(fd, &mut buf, 0, 8, None), ErrorCode::EISDIR);
    utils::assert_code(fs.write(fd, b"x", None), ErrorCode::EBADF);
    utils::assert_code(fs.ftruncate(fd, 0), ErrorCode::EINVAL);
    utils::assert_code(fs.read_file(fd.into()), ErrorCode::EISDIR);
    utils::assert_code(fs.write_file(fd.into(), b"x"), ErrorCode::EBADF);
    assert!(fs.fstat(fd).unwrap().is_directory());
    fs.close(fd).unwrap();
}

#[test]
fn descriptor_metadata_operations_validate_the_descriptor() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    let fd = fs.open_str("/f", "r").unwrap();

    fs.fchmod(fd, 0o000).unwrap();
    fs.fchown(fd, 9, 9).unwrap();
    fs.fsync(fd).unwrap();
    fs.fdatasync(fd).unwrap();
    assert_eq!(fs.fstat(fd).unwrap().mode, 0o777);

    fs.futimes(fd, 7, 8).unwrap();
    let st = fs.fstat(fd).unwrap();
    assert_eq!((st.atime, st.mtime), (7, 8));

    fs.close(fd).unwrap();
    utils::assert_code(fs.fstat(fd), ErrorCode::EBADF);
    utils::assert_code(fs.fchmod(fd, 0o777), ErrorCode::EBADF);
    utils::assert_code(fs.fchown(fd, 0, 0), ErrorCode::EBADF);
    utils::assert_code(fs.futimes(fd, 0, 0), ErrorCode::EBADF);
    utils::assert_code(fs.fsync(fd), ErrorCode::EBADF);
    utils::assert_code(fs.fdatasync(fd), ErrorCode::EBADF);
    utils::assert_code(fs.ftruncate(fd, 0), ErrorCode::EBADF);
}

#[test]
fn append_mode_opens_at_position_zero_but_writes_at_the_end() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "abc");
    let fd = fs.open_str("/f", "a").unwrap();
    // append never truncates
    assert_eq!(fs.fstat(fd).unwrap().size, 3);
    fs.write(fd, b"def", None).unwrap();
    fs.close(fd).unwrap();
    assert_eq!(utils::read_str(&mut fs, "/f"), "abcdef");
}
