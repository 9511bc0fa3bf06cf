//! Extension-keyed decoder selection
//!
//! The registry is built once per batch and shared read-only by every scan
//! task. Families are statically linked; runtime extensibility happens
//! through [`DecoderRegistry::with_families`] at startup, not through dynamic
//! loading.

use crate::adapter::DecoderAdapter;
use crate::error::{DecodeError, Result};
use crate::universal::SymphoniaFamily;
use crate::wav::WavFamily;
use std::path::Path;

/// One statically linked decoding library.
///
/// `init` and `exit` bound process-wide library state. The registry calls
/// `init` exactly once before any file of the family is opened, and `exit`
/// exactly once after the registry is dropped.
pub trait DecoderFamily: Send + Sync {
    /// Short library name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Lowercase extensions claimed by this family.
    fn extensions(&self) -> &'static [&'static str];

    /// Process-wide library initialization.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Process-wide library teardown.
    fn exit(&self) {}

    /// Open one file and return its adapter.
    fn open(&self, path: &Path) -> Result<Box<dyn DecoderAdapter>>;
}

/// Maps lowercase file extensions to decoder families and owns the families'
/// library lifecycle.
pub struct DecoderRegistry {
    families: Vec<Box<dyn DecoderFamily>>,
}

impl DecoderRegistry {
    /// Registry with the built-in families: WAV via hound, compressed
    /// formats via symphonia.
    pub fn new() -> Result<Self> {
        Self::with_families(vec![Box::new(WavFamily), Box::new(SymphoniaFamily)])
    }

    /// Registry over an explicit family list, first match on an extension
    /// wins. Runs every family's library init up front; a failure tears down
    /// the families already initialized and is fatal to the whole batch.
    pub fn with_families(families: Vec<Box<dyn DecoderFamily>>) -> Result<Self> {
        for (idx, family) in families.iter().enumerate() {
            if let Err(err) = family.init() {
                for initialized in &families[..idx] {
                    initialized.exit();
                }
                return Err(DecodeError::LibraryInit(family.name(), err.to_string()));
            }
        }
        Ok(Self { families })
    }

    /// Every extension resolvable by this registry.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.families
            .iter()
            .flat_map(|f| f.extensions().iter().copied())
            .collect()
    }

    /// Select a family by the path's lowercase extension and open the file.
    ///
    /// # Errors
    /// `UnsupportedFormat` when no family claims the extension; otherwise
    /// whatever the family's open reports.
    pub fn resolve(&self, path: &Path) -> Result<Box<dyn DecoderAdapter>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let family = self
            .families
            .iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
            .ok_or(DecodeError::UnsupportedFormat(ext))?;

        tracing::debug!(family = family.name(), path = %path.display(), "opening input");
        family.open(path)
    }
}

impl Drop for DecoderRegistry {
    fn drop(&mut self) {
        for family in &self.families {
            family.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFamily {
        inits: Arc<AtomicUsize>,
        exits: Arc<AtomicUsize>,
        fail_init: bool,
    }

    impl DecoderFamily for CountingFamily {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &["cnt"]
        }

        fn init(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(DecodeError::LibraryInit("counting", "forced".into()));
            }
            Ok(())
        }

        fn exit(&self) {
            self.exits.fetch_add(1, Ordering::SeqCst);
        }

        fn open(&self, path: &Path) -> Result<Box<dyn DecoderAdapter>> {
            Err(DecodeError::OpenFailed {
                path: path.to_path_buf(),
                reason: "not a real family".into(),
            })
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let registry = DecoderRegistry::new().unwrap();
        let err = registry.resolve(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(ext) if ext == "txt"));

        let err = registry.resolve(Path::new("no-extension")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(ext) if ext.is_empty()));
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let registry = DecoderRegistry::new().unwrap();
        // Resolution picks the WAV family before touching the filesystem, so
        // a missing file fails at open, not at lookup.
        let err = registry.resolve(Path::new("/nonexistent/track.WAV")).unwrap_err();
        assert!(matches!(err, DecodeError::OpenFailed { .. }));
    }

    #[test]
    fn builtin_extensions_are_claimed() {
        let registry = DecoderRegistry::new().unwrap();
        let extensions = registry.supported_extensions();
        for ext in ["wav", "flac", "ogg", "mp3", "m4a", "aac"] {
            assert!(extensions.contains(&ext), "missing {ext}");
        }
    }

    #[test]
    fn library_lifecycle_runs_exactly_once() {
        let inits = Arc::new(AtomicUsize::new(0));
        let exits = Arc::new(AtomicUsize::new(0));

        let registry = DecoderRegistry::with_families(vec![Box::new(CountingFamily {
            inits: inits.clone(),
            exits: exits.clone(),
            fail_init: false,
        })])
        .unwrap();

        let _ = registry.resolve(&PathBuf::from("a.cnt"));
        let _ = registry.resolve(&PathBuf::from("b.cnt"));
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert_eq!(exits.load(Ordering::SeqCst), 0);

        drop(registry);
        assert_eq!(exits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_tears_down_earlier_families() {
        let first_inits = Arc::new(AtomicUsize::new(0));
        let first_exits = Arc::new(AtomicUsize::new(0));

        let result = DecoderRegistry::with_families(vec![
            Box::new(CountingFamily {
                inits: first_inits.clone(),
                exits: first_exits.clone(),
                fail_init: false,
            }),
            Box::new(CountingFamily {
                inits: Arc::new(AtomicUsize::new(0)),
                exits: Arc::new(AtomicUsize::new(0)),
                fail_init: true,
            }),
        ]);

        assert!(matches!(result, Err(DecodeError::LibraryInit("counting", _))));
        assert_eq!(first_inits.load(Ordering::SeqCst), 1);
        assert_eq!(first_exits.load(Ordering::SeqCst), 1);
    }
}
