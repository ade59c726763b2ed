#![forbid(unsafe_code)]

use inquire::validator::Validation;
use inquire::{Confirm, Text};
use std::path::PathBuf;

use wxunpack::pkg::{self, DecryptionPolicy, PkgError, PkgResult};

fn prompt_err(e: inquire::InquireError) -> PkgError {
    PkgError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

fn validate_root(p: &str) -> Result<(), String> {
    let pb = PathBuf::from(p.trim());
    if !pb.is_dir() {
        return Err("Path is not a directory".to_string());
    }
    pkg::parse_identifier(&pb).map(|_| ()).map_err(|e| e.to_string())
}

fn parse_threads(s: &str) -> usize {
    s.trim()
        .parse::<usize>()
        .unwrap_or(pkg::DEFAULT_CONCURRENCY)
        .clamp(1, 256)
}

pub fn run() -> PkgResult<()> {
    println!("wxunpack wizard\n");

    let root = Text::new("Mini program directory (…/Applet/wx…)")
        .with_validator(|s: &str| {
            Ok::<_, inquire::CustomUserError>(match validate_root(s) {
                Ok(()) => Validation::Valid,
                Err(msg) => Validation::Invalid(msg.into()),
            })
        })
        .prompt()
        .map(|s| PathBuf::from(s.trim()))
        .map_err(prompt_err)?;

    let output = Text::new("Output directory")
        .with_default("unpack")
        .prompt()
        .map(|s| PathBuf::from(s.trim()))
        .map_err(prompt_err)?;

    let threads = Text::new("Worker threads")
        .with_default(&pkg::DEFAULT_CONCURRENCY.to_string())
        .prompt()
        .map(|s| parse_threads(&s))
        .map_err(prompt_err)?;

    let beautify = Confirm::new("Pretty-print json files?")
        .with_default(true)
        .prompt()
        .map_err(prompt_err)?;

    let encrypted = Confirm::new("Are the packages encrypted?")
        .with_default(DecryptionPolicy::for_host() == DecryptionPolicy::HybridAesXor)
        .prompt()
        .map_err(prompt_err)?;
    let policy = if encrypted {
        DecryptionPolicy::HybridAesXor
    } else {
        DecryptionPolicy::Identity
    };

    println!("\nUnpack summary:");
    println!("  root    : {}", root.display());
    println!("  output  : {}", output.display());
    println!("  threads : {threads}");
    println!("  beautify: {beautify}");
    println!("  policy  : {policy:?}");

    let proceed = Confirm::new("Proceed?")
        .with_default(true)
        .prompt()
        .map_err(prompt_err)?;
    if !proceed {
        return Ok(());
    }

    crate::unpack_root(&root, &output, threads, beautify, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_parsing() {
        assert_eq!(parse_threads("8"), 8);
        assert_eq!(parse_threads(" 0 "), 1);
        assert_eq!(parse_threads("lots"), pkg::DEFAULT_CONCURRENCY);
        assert_eq!(parse_threads("100000"), 256);
    }
}
