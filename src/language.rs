//! Language Registry (spec §4.2): a pure extension → language lookup. The
//! grammar itself is loaded lazily, on first parse, by each extractor — the
//! registry only holds identity and the extension table.

use std::collections::HashMap;
use std::path::Path;

/// Stable identity for a language, e.g. `"rust"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageId(pub &'static str);

impl LanguageId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for LanguageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity, display name, and recognized extensions for one language.
/// Grammar loading is deferred to the owning extractor (spec §4.2).
#[derive(Debug, Clone)]
pub struct LanguageDescriptor {
    pub id: LanguageId,
    pub display_name: &'static str,
    pub extensions: &'static [&'static str],
}

/// Extension → descriptor lookup. Unknown extensions return `None`; the
/// Parser rejects files with no registered language.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    by_extension: HashMap<&'static str, LanguageDescriptor>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    pub fn register(&mut self, descriptor: LanguageDescriptor) {
        for ext in descriptor.extensions {
            self.by_extension.insert(ext, descriptor.clone());
        }
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<&LanguageDescriptor> {
        self.by_extension.get(ext.to_lowercase().as_str())
    }

    pub fn get_by_path(&self, path: &Path) -> Option<&LanguageDescriptor> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.get_by_extension(e))
    }

    /// All registered extensions, used by the Project Scanner to filter the
    /// workspace walk.
    pub fn all_extensions(&self) -> Vec<&'static str> {
        self.by_extension.keys().copied().collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &LanguageDescriptor> {
        let mut seen = std::collections::HashSet::new();
        self.by_extension.values().filter(move |d| seen.insert(d.id))
    }

    /// Drops every extension whose language is disabled in `settings`
    /// (`languages.<id>.enabled = false`), so a disabled language is never
    /// looked up by the scanner or the parser.
    pub fn retain_enabled(&mut self, settings: &crate::config::Settings) {
        self.by_extension
            .retain(|_, descriptor| settings.language_enabled(descriptor.id.as_str()));
    }
}

/// The registry shipped by this build: Rust, Python, JavaScript,
/// TypeScript, Go, Java. See `DESIGN.md` for the languages the teacher
/// carries that this build drops.
pub fn default_registry() -> LanguageRegistry {
    let mut registry = LanguageRegistry::new();
    registry.register(LanguageDescriptor {
        id: LanguageId("rust"),
        display_name: "Rust",
        extensions: &["rs"],
    });
    registry.register(LanguageDescriptor {
        id: LanguageId("python"),
        display_name: "Python",
        extensions: &["py", "pyi"],
    });
    registry.register(LanguageDescriptor {
        id: LanguageId("javascript"),
        display_name: "JavaScript",
        extensions: &["js", "jsx", "mjs", "cjs"],
    });
    registry.register(LanguageDescriptor {
        id: LanguageId("typescript"),
        display_name: "TypeScript",
        extensions: &["ts", "tsx", "mts", "cts"],
    });
    registry.register(LanguageDescriptor {
        id: LanguageId("go"),
        display_name: "Go",
        extensions: &["go"],
    });
    registry.register(LanguageDescriptor {
        id: LanguageId("java"),
        display_name: "Java",
        extensions: &["java"],
    });
    registry
}

/// The registry for a given `Settings`: the default six languages, minus
/// any disabled in `settings.languages`.
pub fn registry_for_settings(settings: &crate::config::Settings) -> LanguageRegistry {
    let mut registry = default_registry();
    registry.retain_enabled(settings);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn looks_up_by_extension_case_insensitively() {
        let registry = default_registry();
        assert_eq!(registry.get_by_extension("RS").unwrap().id, LanguageId("rust"));
        assert_eq!(registry.get_by_extension("py").unwrap().id, LanguageId("python"));
        assert!(registry.get_by_extension("txt").is_none());
    }

    #[test]
    fn looks_up_by_path() {
        let registry = default_registry();
        let path = PathBuf::from("src/main.rs");
        assert_eq!(registry.get_by_path(&path).unwrap().id, LanguageId("rust"));
        assert!(registry.get_by_path(Path::new("README.md")).is_none());
    }

    #[test]
    fn descriptors_are_deduplicated_across_extensions() {
        let registry = default_registry();
        let count = registry.descriptors().count();
        assert_eq!(count, 6);
    }

    #[test]
    fn registry_for_settings_drops_disabled_languages() {
        let mut settings = crate::config::Settings::default();
        settings
            .languages
            .get_mut("python")
            .unwrap()
            .enabled = false;
        let registry = registry_for_settings(&settings);
        assert!(registry.get_by_extension("py").is_none());
        assert!(registry.get_by_extension("rs").is_some());
    }
}
