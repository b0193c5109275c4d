#![allow(dead_code)]

//Shared helpers for the filesystem test-suites
use crate::error_fs::VfsError;
use crate::fs::FSName;
use virtualfs_api::error::ErrorCode;
use virtualfs_api::fs::{FileSupport, FileSysSupport};

//Fresh empty filesystem with default options
pub fn new_fs() -> FSName {
    FSName::new()
}

//Replace a whole file from a string
pub fn write_str(fs: &mut FSName, path: &str, data: &str) {
    fs.write_file(path.into(), data.as_bytes()).unwrap();
}

//Read a whole file back as a string
pub fn read_str(fs: &mut FSName, path: &str) -> String {
    String::from_utf8(fs.read_file(path.into()).unwrap()).unwrap()
}

//Assert that a result failed with the given POSIX code
pub fn assert_code<T: std::fmt::Debug>(res: Result<T, VfsError>, code: ErrorCode) {
    match res {
        Ok(v) => panic!("expected {}, got Ok({:?})", code, v),
        Err(e) => assert_eq!(e.code(), Some(code), "unexpected error: {}", e),
    }
}
