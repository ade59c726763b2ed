#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use tracing::{debug, info, warn};

use crate::pkg::beautify::Beautifier;
use crate::pkg::error::{PkgError, PkgResult};
use crate::pkg::format::{FileEntry, FileTable};
use crate::pkg::path::{extension, resolve_entry_path};

pub const DEFAULT_CONCURRENCY: usize = 30;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub concurrency: usize,
    pub beautify: bool,
    pub beautifier: Beautifier,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            beautify: true,
            beautifier: Beautifier::builtin(),
        }
    }
}

/// Success counter and per-extension counts, shared by the workers of one run.
#[derive(Debug, Default)]
pub struct ExtractionStats {
    files: AtomicUsize,
    extensions: Mutex<HashMap<String, usize>>,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one written file. Returns the new total.
    pub fn record_file(&self) -> usize {
        self.files.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count one file that went through the beautifier.
    pub fn record_extension(&self, ext: &str) {
        let mut map = self.extensions.lock().unwrap_or_else(|e| e.into_inner());
        *map.entry(ext.to_string()).or_insert(0) += 1;
    }

    pub fn files(&self) -> usize {
        self.files.load(Ordering::SeqCst)
    }

    pub fn extension_counts(&self) -> HashMap<String, usize> {
        self.extensions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Counts by descending frequency, ties by extension.
    pub fn sorted_extensions(&self) -> Vec<(String, usize)> {
        let mut v: Vec<_> = self.extension_counts().into_iter().collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v
    }

    /// Add another run's counts into this one.
    pub fn absorb(&self, other: &ExtractionStats) {
        let theirs = other.extension_counts();
        {
            let mut map = self.extensions.lock().unwrap_or_else(|e| e.into_inner());
            for (ext, n) in theirs {
                *map.entry(ext).or_insert(0) += n;
            }
        }
        self.files.fetch_add(other.files(), Ordering::SeqCst);
    }
}

/// An entry that could not be written.
#[derive(Debug)]
pub struct EntryFailure {
    pub name: String,
    pub error: PkgError,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub stats: ExtractionStats,
    pub failures: Vec<EntryFailure>,
}

impl ExtractReport {
    pub fn files_extracted(&self) -> usize {
        self.stats.files()
    }
}

/// Write every entry of `table` under `output_root`.
///
/// One producer feeds a rendezvous channel, `concurrency` workers drain it.
/// A failing entry is recorded in the report and does not stop the others.
pub fn extract(
    plain: &[u8],
    table: &FileTable,
    output_root: &Path,
    opts: &ExtractOptions,
) -> PkgResult<ExtractReport> {
    if opts.concurrency == 0 {
        return Err(PkgError::Config("concurrency must be at least 1".into()));
    }

    fs::create_dir_all(output_root)?;
    let report = ExtractReport::default();
    if table.is_empty() {
        return Ok(report);
    }

    let total = table.len();
    let started = Instant::now();
    let (queue, superseded) = dedup_targets(table, output_root);
    let workers = opts.concurrency.min(queue.len()).max(1);
    let failures = Mutex::new(superseded);

    {
        let stats = &report.stats;
        let failures = &failures;

        thread::scope(|s| {
            let (tx, rx) = bounded::<&FileEntry>(0);

            s.spawn(move || {
                for entry in queue {
                    if tx.send(entry).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..workers {
                let rx = rx.clone();
                s.spawn(move || {
                    for entry in rx.iter() {
                        match extract_entry(plain, entry, output_root, opts) {
                            Ok(ext) => {
                                if opts.beautify {
                                    stats.record_extension(&ext);
                                }
                                let done = stats.record_file();
                                debug!("unpack {done}/{total} {}", entry.name_lossy());
                            }
                            Err(error) => {
                                let name = entry.name_lossy();
                                warn!("failed to unpack {name}: {error}");
                                failures
                                    .lock()
                                    .unwrap_or_else(|e| e.into_inner())
                                    .push(EntryFailure { name, error });
                            }
                        }
                    }
                });
            }
        });
    }

    let mut report = report;
    report.failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());

    info!(
        files = report.files_extracted(),
        failed = report.failures.len(),
        workers,
        "extracted to '{}' in {:.2}s",
        output_root.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Entries to write, plus failures for entries whose target path is
/// written again by a later entry. The last entry for a path wins, as it
/// would when writing sequentially.
fn dedup_targets<'t>(
    table: &'t FileTable,
    output_root: &Path,
) -> (Vec<&'t FileEntry>, Vec<EntryFailure>) {
    let targets: Vec<Option<PathBuf>> = table
        .iter()
        .map(|e| resolve_entry_path(output_root, &e.name).ok())
        .collect();

    let mut last: HashMap<&Path, usize> = HashMap::new();
    for (i, target) in targets.iter().enumerate() {
        if let Some(p) = target {
            last.insert(p.as_path(), i);
        }
    }

    let mut queue = Vec::with_capacity(table.len());
    let mut superseded = Vec::new();
    for (i, (entry, target)) in table.iter().zip(&targets).enumerate() {
        match target {
            Some(p) if last.get(p.as_path()) != Some(&i) => {
                let name = entry.name_lossy();
                warn!("skipping {name}: a later entry writes the same path");
                superseded.push(EntryFailure {
                    name,
                    error: PkgError::Format(format!(
                        "duplicate entry for '{}', superseded by a later entry",
                        p.display()
                    )),
                });
            }
            _ => queue.push(entry),
        }
    }
    (queue, superseded)
}

fn extract_entry(
    plain: &[u8],
    entry: &FileEntry,
    output_root: &Path,
    opts: &ExtractOptions,
) -> PkgResult<String> {
    let out_path = resolve_entry_path(output_root, &entry.name)?;
    let range = entry.range(plain.len())?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let ext = extension(&entry.name);
    let data = &plain[range];
    let data = if opts.beautify {
        opts.beautifier.apply(&entry.name_lossy(), &ext, data)
    } else {
        data.into()
    };

    write_private(&out_path, &data)?;
    Ok(ext)
}

fn write_private(path: &Path, data: &[u8]) -> PkgResult<()> {
    let mut o = OpenOptions::new();
    o.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        o.mode(0o600);
    }
    let mut f = o.open(path)?;
    f.write_all(data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_record_and_sort() {
        let stats = ExtractionStats::new();
        for ext in [".js", ".json", ".js"] {
            stats.record_extension(ext);
        }
        stats.record_file();
        assert_eq!(stats.record_file(), 2);
        assert_eq!(stats.files(), 2);
        assert_eq!(
            stats.sorted_extensions(),
            vec![(".js".to_string(), 2), (".json".to_string(), 1)]
        );
    }

    #[test]
    fn stats_absorb() {
        let a = ExtractionStats::new();
        a.record_file();
        a.record_extension(".js");
        let b = ExtractionStats::new();
        for ext in [".js", ""] {
            b.record_file();
            b.record_extension(ext);
        }
        a.absorb(&b);
        assert_eq!(a.files(), 3);
        assert_eq!(a.extension_counts()[".js"], 2);
        assert_eq!(a.extension_counts()[""], 1);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let table = crate::pkg::read::parse(&crate::pkg::build::build_container(&[])).unwrap();
        let opts = ExtractOptions {
            concurrency: 0,
            ..ExtractOptions::default()
        };
        let err = extract(&[], &table, Path::new("unused"), &opts).unwrap_err();
        assert!(matches!(err, PkgError::Config(_)));
    }
}
