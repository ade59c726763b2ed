#![forbid(unsafe_code)]

mod beautify;
mod build;
mod crypt;
mod discover;
mod error;
mod extract;
mod format;
mod io;
mod key;
mod ops;
mod path;
mod read;

pub use beautify::{pretty_json, Beautifier, Transform};
pub use build::{build_container, collect_sources, pack, Source};
pub use crypt::{decrypt, encrypt, xor_key, DecryptionPolicy, CBC_IV, CBC_KEPT, CBC_LEN, DEFAULT_XOR_KEY, FRAME_LEN};
pub use discover::{package_dirs, parse_identifier, scan_packages, PACKAGE_EXT};
pub use error::{PkgError, PkgResult};
pub use extract::{
    extract, EntryFailure, ExtractOptions, ExtractReport, ExtractionStats, DEFAULT_CONCURRENCY,
};
pub use format::{
    EntryInfo, FileEntry, FileTable, Header, FRAME_PREFIX, HEADER_LEN, MARKER_HEAD, MARKER_TAIL,
    MAX_NAME_LEN,
};
pub use key::{derive_key, KDF_ITERATIONS, KDF_SALT};
pub use ops::{entries, list, open, unpack, unpack_package, PackageFailure, PackageReport, UnpackSummary};
pub use path::{extension, resolve_entry_path};
pub use read::parse;
