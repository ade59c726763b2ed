#![forbid(unsafe_code)]

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::pkg::error::{PkgError, PkgResult};

pub const PACKAGE_EXT: &str = "wxapkg";

/// Pull the `wx` + 16 hex identifier out of the last component of `root`.
pub fn parse_identifier(root: &Path) -> PkgResult<String> {
    let re = Regex::new(r"wx[0-9a-f]{16}").map_err(|e| PkgError::Config(e.to_string()))?;
    let base = root
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    re.find(&base)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            PkgError::Config(format!(
                "'{}' is not a mini program path (no wx identifier)",
                root.display()
            ))
        })
}

/// Sub-directories of `root` holding packages, sorted by name.
pub fn package_dirs(root: &Path) -> PkgResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for ent in fs::read_dir(root)? {
        let ent = ent?;
        if ent.file_name() == ".DS_Store" || !ent.file_type()?.is_dir() {
            continue;
        }
        dirs.push(ent.path());
    }
    dirs.sort();
    Ok(dirs)
}

/// All `*.wxapkg` files below `dir`, sorted. Empty is an error.
pub fn scan_packages(dir: &Path) -> PkgResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ent in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let ent = ent.map_err(|e| {
            let msg = e.to_string();
            PkgError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, msg)),
            )
        })?;
        if ent.file_type().is_file()
            && ent.path().extension().and_then(|e| e.to_str()) == Some(PACKAGE_EXT)
        {
            files.push(ent.into_path());
        }
    }

    if files.is_empty() {
        return Err(PkgError::Config(format!(
            "no '.{PACKAGE_EXT}' file found in '{}'",
            dir.display()
        )));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_from_dir_name() {
        let root = Path::new("/home/u/Applet").join("wx0123456789abcdef");
        assert_eq!(parse_identifier(&root).unwrap(), "wx0123456789abcdef");
    }

    #[test]
    fn identifier_embedded_in_name() {
        let root = Path::new("__wx0123456789abcdef__");
        assert_eq!(parse_identifier(root).unwrap(), "wx0123456789abcdef");
    }

    #[test]
    fn missing_identifier() {
        for p in ["/tmp/Applet", "/tmp/wx0123", "/tmp/WX0123456789ABCDEF"] {
            assert!(matches!(parse_identifier(Path::new(p)), Err(PkgError::Config(_))));
        }
    }
}
