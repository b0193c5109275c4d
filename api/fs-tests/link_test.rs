use super::FSName;
use virtualfs_api::error::ErrorCode;
use virtualfs_api::fs::{
    DescriptorSupport, DirectorySupport, FileSupport, LinkSupport, MetadataSupport,
};

#[path = "utils.rs"]
mod utils;

#[test]
fn hard_links_share_one_inode() {
    let mut fs = utils::new_fs();
    fs.mkdir("/test", 0o777).unwrap();
    fs.write_file("/test/a".into(), b"").unwrap();
    fs.link("/test/a", "/test/b").unwrap();

    let a = fs.stat("/test/a").unwrap();
    let b = fs.stat("/test/b").unwrap();
    assert_eq!(a.ino, b.ino);
    assert_eq!(a.nlink, 2);
    assert_eq!(
        fs.read_file("/test/a".into()).unwrap(),
        fs.read_file("/test/b".into()).unwrap()
    );

    // writes through one name show through the other
    utils::write_str(&mut fs, "/test/a", "shared");
    assert_eq!(utils::read_str(&mut fs, "/test/b"), "shared");

    // dropping one name leaves the other fully alive
    fs.unlink("/test/a").unwrap();
    assert_eq!(fs.stat("/test/b").unwrap().nlink, 1);
    assert_eq!(utils::read_str(&mut fs, "/test/b"), "shared");
}

#[test]
fn link_guards_its_endpoints() {
    let mut fs = utils::new_fs();
    fs.mkdir("/d", 0o777).unwrap();
    utils::write_str(&mut fs, "/f", "x");

    utils::assert_code(fs.link("/d", "/d2"), ErrorCode::EPERM);
    utils::assert_code(fs.link("/missing", "/f2"), ErrorCode::ENOENT);
    utils::assert_code(fs.link("/f", "/f"), ErrorCode::EEXIST);
    utils::assert_code(fs.link("/f", "/d"), ErrorCode::EEXIST);
    utils::assert_code(fs.link("/f", "/missing/f2"), ErrorCode::ENOENT);
}

#[test]
fn link_takes_a_symlink_endpoint_itself() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.symlink("/f", "/ln").unwrap();
    fs.link("/ln", "/ln2").unwrap();
    // the new name is a second name for the symlink, not for /f
    assert!(fs.lstat("/ln2").unwrap().is_symbolic_link());
    assert_eq!(fs.lstat("/ln2").unwrap().ino, fs.lstat("/ln").unwrap().ino);
    assert_eq!(fs.readlink("/ln2").unwrap(), "/f");
}

#[test]
fn unlink_removes_names_not_objects() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.unlink("/f").unwrap();
    assert!(!fs.exists("/f"));
    utils::assert_code(fs.unlink("/f"), ErrorCode::ENOENT);

    fs.mkdir("/d", 0o777).unwrap();
    utils::assert_code(fs.unlink("/d"), ErrorCode::EISDIR);
    utils::assert_code(fs.unlink("/"), ErrorCode::EISDIR);
}

#[test]
fn unlink_on_a_symlink_spares_the_target() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "x");
    fs.symlink("/f", "/ln").unwrap();
    fs.unlink("/ln").unwrap();
    assert!(!fs.exists("/ln"));
    assert_eq!(utils::read_str(&mut fs, "/f"), "x");
}

#[test]
fn symlink_round_trips_its_target() {
    let mut fs = utils::new_fs();
    fs.symlink("/anywhere/at/all", "/ln").unwrap();
    assert_eq!(fs.readlink("/ln").unwrap(), "/anywhere/at/all");
    assert_eq!(fs.lstat("/ln").unwrap().size, 15);

    utils::write_str(&mut fs, "/f", "x");
    utils::assert_code(fs.readlink("/f"), ErrorCode::EINVAL);
    utils::assert_code(fs.readlink("/missing"), ErrorCode::ENOENT);
    utils::assert_code(fs.symlink("/f", "/ln"), ErrorCode::EEXIST);
    utils::assert_code(fs.symlink("/f", "/missing/ln"), ErrorCode::ENOENT);
    utils::assert_code(fs.symlink("", "/empty"), ErrorCode::ENOENT);
}

#[test]
fn symlinks_chain_transitively() {
    let mut fs = utils::new_fs();
    fs.mkdir("/test", 0o777).unwrap();
    utils::write_str(&mut fs, "/test/hello-world.txt", "Hello World");
    fs.symlink("/test", "/linktotestdir").unwrap();
    fs.symlink("/linktotestdir/hello-world.txt", "/linktofile")
        .unwrap();
    fs.symlink("/linktofile", "/linktolink").unwrap();

    assert_eq!(utils::read_str(&mut fs, "/linktolink"), "Hello World");
    assert_eq!(utils::read_str(&mut fs, "/linktotestdir/hello-world.txt"), "Hello World");
}

#[test]
fn symlink_loops_are_eloop() {
    let mut fs = utils::new_fs();
    fs.symlink("/x", "/x").unwrap();
    utils::assert_code(fs.read_file("/x".into()), ErrorCode::ELOOP);

    fs.mkdir("/a", 0o777).unwrap();
    fs.symlink("/a/x", "/y").unwrap();
    fs.symlink("/y", "/a/x").unwrap();
    utils::assert_code(fs.read_file("/y/nope".into()), ErrorCode::ELOOP);
}

#[test]
fn open_descriptors_keep_unlinked_inodes_alive() {
    let mut fs = utils::new_fs();
    utils::write_str(&mut fs, "/f", "abc");
    let held = fs.open_str("/f", "r+").unwrap();
    let watcher = fs.open_str("/f", "r").unwrap();

    fs.unlink("/f").unwrap();
    assert!(!fs.exists("/f"));
    assert_eq!(fs.fstat(held).unwrap().nlink, 0);

    // the inode is still fully usable, and shared between the descriptors
    fs.write(held, b"xyz", Some(0)).unwrap();
    let mut buf = [0u8; 3];
    assert_eq!(fs.read(watcher, &mut buf, 0, 3, Some(0)).unwrap(), 3);
    assert_eq!(&buf, b"xyz");

    fs.close(held).unwrap();
    assert_eq!(fs.fstat(watcher).unwrap().nlink, 0);
    fs.close(watcher).unwrap();
    // nothing refers to the inode anymore; its number is free again
    utils::write_str(&mut fs, "/g", "fresh");
    assert_eq!(fs.stat("/g").unwrap().ino, 2);
}
