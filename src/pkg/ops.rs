#![forbid(unsafe_code)]

use blake3::Hasher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::UnpackConfig;
use crate::pkg::crypt::{decrypt, DecryptionPolicy};
use crate::pkg::error::{PkgError, PkgResult};
use crate::pkg::extract::{extract, EntryFailure, ExtractOptions, ExtractReport, ExtractionStats};
use crate::pkg::format::{EntryInfo, FileTable};
use crate::pkg::io::hex32;
use crate::pkg::read::parse;

/// Read, decrypt and index one package.
pub fn open(path: &Path, identifier: &str, policy: DecryptionPolicy) -> PkgResult<(Vec<u8>, FileTable)> {
    let raw = fs::read(path)?;
    let plain = decrypt(policy, identifier, &raw)?;
    drop(raw);
    let table = parse(&plain)?;
    Ok((plain, table))
}

pub fn unpack_package(
    path: &Path,
    identifier: &str,
    policy: DecryptionPolicy,
    output_root: &Path,
    opts: &ExtractOptions,
) -> PkgResult<ExtractReport> {
    let (plain, table) = open(path, identifier, policy)?;
    extract(&plain, &table, output_root, opts)
}

/// Result for one package that could be opened.
#[derive(Debug)]
pub struct PackageReport {
    pub path: PathBuf,
    pub files: usize,
    pub failures: Vec<EntryFailure>,
}

/// A package rejected as a whole (read, decrypt or index error).
#[derive(Debug)]
pub struct PackageFailure {
    pub path: PathBuf,
    pub error: PkgError,
}

#[derive(Debug, Default)]
pub struct UnpackSummary {
    pub stats: ExtractionStats,
    pub packages: Vec<PackageReport>,
    pub failed: Vec<PackageFailure>,
}

impl UnpackSummary {
    pub fn total_files(&self) -> usize {
        self.stats.files()
    }

    pub fn entry_failures(&self) -> impl Iterator<Item = (&Path, &EntryFailure)> {
        self.packages
            .iter()
            .flat_map(|p| p.failures.iter().map(move |f| (p.path.as_path(), f)))
    }

    pub fn merge(&mut self, other: UnpackSummary) {
        self.stats.absorb(&other.stats);
        self.packages.extend(other.packages);
        self.failed.extend(other.failed);
    }
}

/// Unpack every input of `config` into its output root. A broken package is
/// recorded and skipped; the others still run.
pub fn unpack(config: &UnpackConfig) -> PkgResult<UnpackSummary> {
    config.validate()?;
    let opts = config.extract_options();
    let mut summary = UnpackSummary::default();

    for path in &config.inputs {
        match unpack_package(path, &config.identifier, config.policy, &config.output_root, &opts) {
            Ok(report) => {
                info!(
                    "unpacked {:5} files from '{}'",
                    report.files_extracted(),
                    path.display()
                );
                summary.stats.absorb(&report.stats);
                summary.packages.push(PackageReport {
                    path: path.clone(),
                    files: report.files_extracted(),
                    failures: report.failures,
                });
            }
            Err(e) => {
                error!("failed to unpack '{}': {e}", path.display());
                summary.failed.push(PackageFailure {
                    path: path.clone(),
                    error: e,
                });
            }
        }
    }

    Ok(summary)
}

/// Index entries of a package, hashing each payload that lies in bounds.
pub fn entries(path: &Path, identifier: &str, policy: DecryptionPolicy) -> PkgResult<Vec<EntryInfo>> {
    let (plain, table) = open(path, identifier, policy)?;
    Ok(table
        .iter()
        .map(|e| {
            let hash_hex = e.range(plain.len()).ok().map(|r| {
                let mut hasher = Hasher::new();
                hasher.update(&plain[r]);
                let full: [u8; 32] = hasher.finalize().into();
                hex32(&full)
            });
            EntryInfo {
                name: e.name_lossy(),
                offset: e.offset,
                size: e.size,
                hash_hex,
            }
        })
        .collect())
}

pub fn list(path: &Path, identifier: &str, policy: DecryptionPolicy, verbose: bool) -> PkgResult<()> {
    let entries = entries(path, identifier, policy)?;
    for e in &entries {
        if verbose {
            println!(
                "{}  off={} len={} hash={}",
                e.name,
                e.offset,
                e.size,
                e.hash_hex.as_deref().unwrap_or("out-of-bounds")
            );
        } else {
            println!("{}", e.name);
        }
    }
    println!("{} entries", entries.len());
    Ok(())
}
