#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::pkg::error::{PkgError, PkgResult};

/// `file_path` relative to `input_root`, '/'-joined.
pub fn normalize_rel_path(input_root: &Path, file_path: &Path) -> PkgResult<String> {
    let rel = file_path
        .strip_prefix(input_root)
        .map_err(|_| PkgError::Outside(file_path.to_string_lossy().into_owned()))?;

    let out = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace('\\', "/"))
        .collect::<Vec<_>>()
        .join("/");

    if out.is_empty() {
        return Err(PkgError::Format("empty relative path".into()));
    }
    Ok(out)
}

/// Map an entry name onto a path under `root`.
///
/// Names are '/'-separated and usually absolute ("/pages/index.js"). Both
/// separators are accepted, "." is dropped and ".." pops a component; a ".."
/// that would climb above `root` is rejected, as is a drive or stream
/// component (":") on Windows. The result always lies under `root`.
pub fn resolve_entry_path(root: &Path, name: &[u8]) -> PkgResult<PathBuf> {
    let name = std::str::from_utf8(name)
        .map_err(|_| PkgError::Format(format!("entry name is not utf8: {}", String::from_utf8_lossy(name))))?;

    let mut parts: Vec<&str> = Vec::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(PkgError::Outside(name.to_string()));
                }
            }
            p if p.contains('\0') => {
                return Err(PkgError::Format(format!("entry name contains NUL: {name:?}")));
            }
            #[cfg(windows)]
            p if p.contains(':') => {
                return Err(PkgError::Outside(name.to_string()));
            }
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        return Err(PkgError::Format(format!("entry name has no file component: {name:?}")));
    }

    let mut out = root.to_path_buf();
    out.extend(parts);
    Ok(out)
}

/// Extension of a '/'-separated name including the dot, or "" when there is none.
pub fn extension(name: &[u8]) -> String {
    let base = match name.iter().rposition(|&b| b == b'/' || b == b'\\') {
        Some(i) => &name[i + 1..],
        None => name,
    };
    match base.iter().rposition(|&b| b == b'.') {
        Some(i) => String::from_utf8_lossy(&base[i..]).into_owned(),
        None => String::new(),
    }
}
