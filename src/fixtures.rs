//! Named JSON fixtures
//!
//! A reference like `healthCheck.validHealthCheckResponse` names the file
//! `healthCheck.json` and the key path inside it. Files are looked up in the
//! locale subdirectory first, then in the fixtures root.

use crate::error::{Error, Result, ResultExt};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixture files under one root directory
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
    locale: Option<String>,
}

impl FixtureStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            locale: None,
        }
    }

    /// Prefer fixtures from the `<root>/<locale>` subdirectory
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the fixture named by `reference`
    pub fn load(&self, reference: &str) -> Result<Value> {
        let mut parts = reference.split('.');
        let file = parts
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| Error::fixture(reference, "empty fixture reference"))?;

        let path = self.locate(file).ok_or_else(|| {
            Error::fixture(
                reference,
                format!("no {file}.json under {}", self.root.display()),
            )
        })?;
        debug!(fixture = reference, path = %path.display(), "Loading fixture");

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let mut value: Value = serde_json::from_str(&content)
            .map_err(|e| Error::fixture(reference, format!("{}: {e}", path.display())))?;

        for key in parts {
            value = match value {
                Value::Object(mut map) => map
                    .remove(key)
                    .ok_or_else(|| Error::fixture(reference, format!("missing key '{key}'")))?,
                _ => {
                    return Err(Error::fixture(
                        reference,
                        format!("cannot descend into '{key}': not an object"),
                    ))
                }
            };
        }

        Ok(value)
    }

    /// Resolve an upload file: an existing path as given, otherwise the
    /// single file under the root whose name or relative path ends with `pattern`
    pub fn find_file(&self, pattern: &str) -> Result<PathBuf> {
        let direct = Path::new(pattern);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let mut found = Vec::new();
        collect_matches(&self.root, Path::new(pattern), &mut found)?;
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(Error::fixture(
                pattern,
                format!("no file found under {}", self.root.display()),
            )),
            n => Err(Error::fixture(
                pattern,
                format!("{n} files found under {}", self.root.display()),
            )),
        }
    }

    fn locate(&self, file: &str) -> Option<PathBuf> {
        let name = format!("{file}.json");
        let localized = self.locale.as_ref().map(|locale| self.root.join(locale).join(&name));

        localized
            .into_iter()
            .chain(std::iter::once(self.root.join(&name)))
            .find(|candidate| candidate.is_file())
    }
}

fn collect_matches(dir: &Path, pattern: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_matches(&path, pattern, found)?;
        } else if path.ends_with(pattern) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write(path: &Path, value: &Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_load_nested_key() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("healthCheck.json"),
            &json!({"validHealthCheckResponse": {"status": "UP"}}),
        );

        let store = FixtureStore::new(dir.path());
        let value = store.load("healthCheck.validHealthCheckResponse").unwrap();
        assert_eq!(value, json!({"status": "UP"}));
    }

    #[test]
    fn test_whole_file() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("users.json"), &json!([1, 2]));

        let store = FixtureStore::new(dir.path());
        assert_eq!(store.load("users").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_locale_takes_precedence() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("greeting.json"), &json!({"text": "hello"}));
        write(&dir.path().join("cn/greeting.json"), &json!({"text": "ni hao"}));

        let store = FixtureStore::new(dir.path()).with_locale("cn");
        assert_eq!(store.load("greeting.text").unwrap(), json!("ni hao"));

        let store = FixtureStore::new(dir.path()).with_locale("fr");
        assert_eq!(store.load("greeting.text").unwrap(), json!("hello"));
    }

    #[test]
    fn test_missing_file_and_key() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.json"), &json!({"b": 1}));
        let store = FixtureStore::new(dir.path());

        assert!(matches!(store.load("nope.x"), Err(Error::Fixture { .. })));
        assert!(matches!(store.load("a.c"), Err(Error::Fixture { .. })));
        assert!(matches!(store.load("a.b.c"), Err(Error::Fixture { .. })));
        assert!(matches!(store.load(""), Err(Error::Fixture { .. })));
    }

    #[test]
    fn test_find_file_searches_below_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("uploads/cn")).unwrap();
        fs::write(dir.path().join("uploads/cn/avatar.png"), b"png").unwrap();
        fs::write(dir.path().join("uploads/a.txt"), b"a").unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("other/a.txt"), b"a").unwrap();
        let store = FixtureStore::new(dir.path());

        let found = store.find_file("avatar.png").unwrap();
        assert_eq!(found, dir.path().join("uploads/cn/avatar.png"));
        assert_eq!(
            store.find_file("uploads/a.txt").unwrap(),
            dir.path().join("uploads/a.txt")
        );

        let direct = dir.path().join("other/a.txt");
        assert_eq!(store.find_file(direct.to_str().unwrap()).unwrap(), direct);

        assert!(matches!(store.find_file("a.txt"), Err(Error::Fixture { .. })));
        assert!(matches!(store.find_file("none.bin"), Err(Error::Fixture { .. })));
    }

    #[test]
    fn test_invalid_json_is_fixture_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let store = FixtureStore::new(dir.path());
        assert!(matches!(store.load("broken"), Err(Error::Fixture { .. })));
    }
}
