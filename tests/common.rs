//! tests/common.rs
//! Shared fixtures for the integration tests

use std::path::PathBuf;

use wxunpack::pkg::{build_container, Source};

#[allow(dead_code)] // Used across multiple test files
pub const TEST_WXID: &str = "wx0123456789abcdef";

/// Fresh scratch directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wxunpack-{tag}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
    dir
}

/// "a.txt" = "hello", "sub/b.json" = {"a":1}
#[allow(dead_code)]
pub fn two_file_container() -> Vec<u8> {
    build_container(&[
        Source::new("a.txt", b"hello".to_vec()),
        Source::new("sub/b.json", br#"{"a":1}"#.to_vec()),
    ])
}

/// A few dozen files spread over nested directories.
#[allow(dead_code)]
pub fn many_sources() -> Vec<Source> {
    (0..60)
        .map(|i| {
            let name = format!("/pages/p{}/file{i}.{}", i % 7, ["js", "json", "wxml"][i % 3]);
            let data = if i % 3 == 1 {
                format!("{{\"index\":{i}}}").into_bytes()
            } else {
                format!("content of file {i}\n").repeat(i + 1).into_bytes()
            };
            Source::new(name, data)
        })
        .collect()
}
