#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

use crate::pkg::error::{PkgError, PkgResult};

/// Content transform for one extension. Returning `Err` keeps the original bytes.
pub type Transform = Arc<dyn Fn(&[u8]) -> PkgResult<Vec<u8>> + Send + Sync>;

/// Extension -> transform table consulted during extraction.
#[derive(Clone, Default)]
pub struct Beautifier {
    transforms: HashMap<String, Transform>,
}

impl fmt::Debug for Beautifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exts: Vec<_> = self.transforms.keys().collect();
        exts.sort();
        f.debug_struct("Beautifier").field("extensions", &exts).finish()
    }
}

impl Beautifier {
    /// Empty table: every file is written unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// Built-in transforms (`.json`).
    pub fn builtin() -> Self {
        let mut b = Self::default();
        b.register(".json", pretty_json);
        b
    }

    /// `ext` includes the dot, e.g. ".json", and is matched exactly. A
    /// transform that panics is treated like one that returns `Err`.
    pub fn register<F>(&mut self, ext: &str, f: F) -> &mut Self
    where
        F: Fn(&[u8]) -> PkgResult<Vec<u8>> + Send + Sync + 'static,
    {
        self.transforms.insert(ext.to_string(), Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transform `data` if a transform is registered for `ext`. On failure the
    /// original bytes are returned.
    pub fn apply<'a>(&self, name: &str, ext: &str, data: &'a [u8]) -> Cow<'a, [u8]> {
        let Some(f) = self.transforms.get(ext) else {
            return Cow::Borrowed(data);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| f(data))) {
            Ok(Ok(out)) => Cow::Owned(out),
            Ok(Err(e)) => {
                warn!("keeping original bytes for {name}: {e}");
                Cow::Borrowed(data)
            }
            Err(_) => {
                warn!("keeping original bytes for {name}: transform panicked");
                Cow::Borrowed(data)
            }
        }
    }
}

pub fn pretty_json(data: &[u8]) -> PkgResult<Vec<u8>> {
    let v: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| PkgError::Transform(format!("json: {e}")))?;
    serde_json::to_vec_pretty(&v).map_err(|e| PkgError::Transform(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_pretty_printed_in_key_order() {
        let b = Beautifier::builtin();
        let out = b.apply("/x.json", ".json", br#"{"b":1,"a":[1,2]}"#);
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.contains('\n'));
        assert!(text.find("\"b\"").unwrap() < text.find("\"a\"").unwrap());
    }

    #[test]
    fn invalid_json_keeps_original() {
        let b = Beautifier::builtin();
        let data = b"{not json";
        assert_eq!(&*b.apply("/x.json", ".json", data), data);
    }

    #[test]
    fn unknown_extension_is_untouched() {
        let b = Beautifier::builtin();
        let out = b.apply("/x.txt", ".txt", b"hello");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn failing_transform_falls_back() {
        let mut b = Beautifier::none();
        b.register(".js", |_| Err(PkgError::Transform("boom".into())));
        assert_eq!(&*b.apply("/a.js", ".js", b"var a=1"), b"var a=1");
    }

    #[test]
    fn extension_match_is_exact() {
        let b = Beautifier::builtin();
        let out = b.apply("/A.JSON", ".JSON", br#"{"a":1}"#);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn panicking_transform_falls_back() {
        let mut b = Beautifier::none();
        b.register(".json", |_| panic!("transform bug"));
        assert_eq!(&*b.apply("/a.json", ".json", br#"{"a":1}"#), br#"{"a":1}"#);
    }
}
