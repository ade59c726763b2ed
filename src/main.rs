#![forbid(unsafe_code)]

mod ui;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::warn;

use wxunpack::logging::init_logging;
use wxunpack::pkg::{self, DecryptionPolicy, PkgError, PkgResult, UnpackSummary};
use wxunpack::UnpackConfig;

#[derive(Debug, Parser)]
#[command(name = "wxunpack", version, about = "Decrypt and unpack wxapkg mini program packages")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Identity on macOS, hybrid elsewhere.
    Auto,
    /// Packages are plaintext.
    Identity,
    /// AES-CBC prefix plus XOR tail.
    Hybrid,
}

impl From<PolicyArg> for DecryptionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Auto => DecryptionPolicy::for_host(),
            PolicyArg::Identity => DecryptionPolicy::Identity,
            PolicyArg::Hybrid => DecryptionPolicy::HybridAesXor,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive prompts for `unpack`.
    Ui,

    /// Decrypt and unpack every package under a mini program directory.
    Unpack {
        /// Mini program directory, e.g. ".../Applet/wx0123456789abcdef".
        #[arg(long, short)]
        root: PathBuf,
        /// Output directory.
        #[arg(long, short, default_value = "unpack")]
        output: PathBuf,
        /// Worker threads per package.
        #[arg(long, short = 'n', default_value_t = pkg::DEFAULT_CONCURRENCY)]
        thread: usize,
        /// Write json and friends exactly as stored.
        #[arg(long, default_value_t = false)]
        disable_beautify: bool,
        #[arg(long, value_enum, default_value_t = PolicyArg::Auto)]
        policy: PolicyArg,
    },

    /// List entries of a single package.
    List {
        #[arg(long)]
        pkg: PathBuf,
        /// Identifier used to derive the key.
        #[arg(long)]
        wxid: String,
        /// Print offsets, sizes and blake3 hashes too.
        #[arg(long, default_value_t = false)]
        long: bool,
        #[arg(long, value_enum, default_value_t = PolicyArg::Auto)]
        policy: PolicyArg,
    },

    /// Build a package from a directory.
    Pack {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        wxid: String,
        #[arg(long, value_enum, default_value_t = PolicyArg::Auto)]
        policy: PolicyArg,
    },
}

/// Unpack every package found under `root` into `output/<subdir>`.
pub(crate) fn unpack_root(
    root: &Path,
    output: &Path,
    thread: usize,
    beautify: bool,
    policy: DecryptionPolicy,
) -> PkgResult<()> {
    let identifier = pkg::parse_identifier(root)?;
    let dirs = pkg::package_dirs(root)?;

    println!("[+] unpack root '{}' with {} threads", root.display(), thread);

    let base = root.parent().unwrap_or(root);
    let mut summary = UnpackSummary::default();
    for dir in dirs {
        let inputs = match pkg::scan_packages(&dir) {
            Ok(v) => v,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        let sub_output = match dir.file_name() {
            Some(name) => output.join(name),
            None => output.to_path_buf(),
        };
        let config = UnpackConfig::new(identifier.clone(), sub_output)
            .inputs(inputs)
            .concurrency(thread)
            .beautify(beautify)
            .policy(policy);

        let part = pkg::unpack(&config)?;
        for p in &part.packages {
            let rel = p.path.strip_prefix(base).unwrap_or(&p.path);
            println!("[+] unpacked {:5} files from '{}'", p.files, rel.display());
        }
        summary.merge(part);
    }

    if summary.packages.is_empty() && summary.failed.is_empty() {
        return Err(PkgError::Config(format!(
            "no '.{}' file found under '{}'",
            pkg::PACKAGE_EXT,
            root.display()
        )));
    }

    report(&summary, output);

    if !summary.failed.is_empty() {
        return Err(PkgError::Format(format!(
            "{} package(s) could not be unpacked",
            summary.failed.len()
        )));
    }
    Ok(())
}

fn report(summary: &UnpackSummary, output: &Path) {
    for (path, f) in summary.entry_failures() {
        println!("[-] {} in '{}': {}", f.name, path.display(), f.error);
    }
    for f in &summary.failed {
        println!("[-] failed '{}': {}", f.path.display(), f.error);
    }

    println!("[+] all {} files saved to '{}'", summary.total_files(), output.display());
    println!("[+] extension statistics:");
    for (ext, n) in summary.stats.sorted_extensions() {
        println!("  - {:<5} {:5}", ext, n);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match cli.cmd {
        Command::Ui => ui::run(),
        Command::Unpack {
            root,
            output,
            thread,
            disable_beautify,
            policy,
        } => unpack_root(&root, &output, thread, !disable_beautify, policy.into()),
        Command::List {
            pkg: path,
            wxid,
            long,
            policy,
        } => pkg::list(&path, &wxid, policy.into(), long),
        Command::Pack {
            input,
            output,
            wxid,
            policy,
        } => pkg::pack(&input, &output, &wxid, policy.into()).map(|n| {
            println!("packed {n} files into '{}'", output.display());
        }),
    };

    if let Err(e) = res {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
