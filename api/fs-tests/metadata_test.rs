use super::FSName;
use virtualfs_api::error::ErrorCode;
use virtualfs_api::fs::{DirectorySupport, FileSysSupport, LinkSupport, MetadataSupport};
use virtualfs_api::types::FsOptions;

#[path = "utils.rs"]
mod utils;

#[test]
fn empty_root() {
    let fs = utils::new_fs();
    assert_eq!(fs.readdir("/").unwrap(), Vec::<String>::new());
    let st = fs.stat("/").unwrap();
    assert!(st.is_directory());
    assert!(!st.is_file());
    assert!(!st.is_symbolic_link());
    assert_eq!(st.ino, 1);
    assert_eq!(st.nlink, 2);
    assert_eq!(st.mode, 0o777);
    assert_eq!(st.uid, 0);
    assert_eq!(st.gid, 0);
    assert!(fs.exists("/"));
}

#[test]
fn options_gate_construction() {
    assert!(FSName::options_valid(&FsOptions::default()));
    let bad = FsOptions {
        alloc_block_size: 20,
        shrink_ids: false,
    };
    assert!(!FSName::options_valid(&bad));
    utils::assert_code(FSName::with_options(&bad), ErrorCode::EINVAL);

    let wide = FsOptions {
        alloc_block_size: 64,
        shrink_ids: true,
    };
    let fs = FSName::with_options(&wide).unwrap();
    assert!(fs.exists("/"));
}

#[test]
fn stat_follows_symlinks_lstat_does_not() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "abc");
    fs.symlink("/f", "/ln").unwrap();

    let through = fs.stat("/ln").unwrap();
    assert!(through.is_file());
    assert_eq!(through.size, 3);
    assert_eq!(through.ino, fs.stat("/f").unwrap().ino);

    let onto = fs.lstat("/ln").unwrap();
    assert!(onto.is_symbolic_link());
    assert_eq!(onto.size, 2); // the target string "/f"
    assert_eq!(onto.nlink, 1);
}

#[test]
fn stat_misses_are_enoent() {
    let fs = utils::new_fs();
    utils::assert_code(fs.stat("/missing"), ErrorCode::ENOENT);
    utils::assert_code(fs.stat(""), ErrorCode::ENOENT);
    utils::assert_code(fs.lstat("/missing"), ErrorCode::ENOENT);
}

#[test]
fn exists_never_errors() {
    let mut fs = utils::new_fs();
    assert!(!fs.exists("/missing"));
    assert!(!fs.exists(""));
    // dangling and looping symlinks simply do not exist
    fs.symlink("/nowhere", "/dangling").unwrap();
    assert!(!fs.exists("/dangling"));
    fs.symlink("/loop", "/loop").unwrap();
    assert!(!fs.exists("/loop"));
    utils::write_str(&mut fs, "/f", "x");
    assert!(fs.exists("/f"));
}

#[test]
fn access_checks_existence_only() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.access("/f", 0).unwrap();
    fs.access("/f", 0o7).unwrap();
    utils::assert_code(fs.access("/missing", 0), ErrorCode::ENOENT);
}

#[test]
fn modes_and_owners_are_accepted_and_ignored() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.chmod("/f", 0o000).unwrap();
    fs.chown("/f", 42, 42).unwrap();
    let st = fs.stat("/f").unwrap();
    assert_eq!(st.mode, 0o777);
    assert_eq!(st.uid, 0);
    assert_eq!(st.gid, 0);
    utils::assert_code(fs.chmod("/missing", 0o644), ErrorCode::ENOENT);
    utils::assert_code(fs.chown("/missing", 0, 0), ErrorCode::ENOENT);
}

#[test]
fn lchmod_operates_on_the_link_itself() {
    let mut fs = utils::new_fs();
    fs.symlink("/nowhere", "/dangling").unwrap();
    // the dangling link is reachable without following it
    fs.lchmod("/dangling", 0o600).unwrap();
    fs.lchown("/dangling", 1, 1).unwrap();
    utils::assert_code(fs.chmod("/dangling", 0o600), ErrorCode::ENOENT);
}

#[test]
fn utimes_sets_times_by_the_millisecond() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.utimes("/f", 42, 43).unwrap();
    let st = fs.stat("/f").unwrap();
    assert_eq!(st.atime, 42);
    assert_eq!(st.mtime, 43);
    utils::assert_code(fs.utimes("/missing", 0, 0), ErrorCode::ENOENT);
}

#[test]
fn directory_sizes_are_fixed() {
    let mut fs = utils::new_fs();
    fs.mkdir("/d", 0o777).unwrap();
    let st = fs.stat("/d").unwrap();
    assert_eq!(st.size, 4096);
    assert_eq!(st.blksize, 4096);
}
