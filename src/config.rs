#![forbid(unsafe_code)]

use std::path::PathBuf;

use crate::pkg::{Beautifier, DecryptionPolicy, ExtractOptions, PkgError, PkgResult, DEFAULT_CONCURRENCY};

/// Everything one unpack run needs. Built by the CLI or the wizard.
#[derive(Debug, Clone)]
pub struct UnpackConfig {
    pub identifier: String,
    pub inputs: Vec<PathBuf>,
    pub output_root: PathBuf,
    pub concurrency: usize,
    pub beautify: bool,
    pub policy: DecryptionPolicy,
    pub beautifier: Beautifier,
}

impl UnpackConfig {
    pub fn new(identifier: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            inputs: Vec::new(),
            output_root: output_root.into(),
            concurrency: DEFAULT_CONCURRENCY,
            beautify: true,
            policy: DecryptionPolicy::for_host(),
            beautifier: Beautifier::builtin(),
        }
    }

    pub fn inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn beautify(mut self, on: bool) -> Self {
        self.beautify = on;
        self
    }

    pub fn policy(mut self, policy: DecryptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn beautifier(mut self, beautifier: Beautifier) -> Self {
        self.beautifier = beautifier;
        self
    }

    pub fn validate(&self) -> PkgResult<()> {
        if self.identifier.trim().is_empty() {
            return Err(PkgError::Config("identifier is empty".into()));
        }
        if self.concurrency == 0 {
            return Err(PkgError::Config("thread count must be at least 1".into()));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(PkgError::Config("output path is empty".into()));
        }
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            concurrency: self.concurrency,
            beautify: self.beautify,
            beautifier: self.beautifier.clone(),
        }
    }
}
