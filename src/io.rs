//! Input sources and include resolution.
//!
//! A requested include name resolves in three steps, first match wins:
//! registered override sources, then (for quoted includes only) the
//! including file's own directory, then the configured include directories
//! in registration order. An override shadows a same-named file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A readable text buffer with an identity for diagnostics. File-backed
/// sources keep their parent directory for resolving quoted includes.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    content: String,
    base_dir: Option<PathBuf>,
}

impl Source {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self {
            name: path.display().to_string(),
            content,
            base_dir: path.parent().map(Path::to_path_buf),
        })
    }

    pub fn from_text(name: &str, content: &str) -> Self {
        Self {
            name: name.to_owned(),
            content: content.to_owned(),
            base_dir: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}

/// Ordered list of include search directories.
#[derive(Debug, Clone, Default)]
pub struct Directories {
    entries: Vec<PathBuf>,
}

impl Directories {
    pub fn include(&mut self, dir: PathBuf) {
        if !self.entries.contains(&dir) {
            self.entries.push(dir);
        }
    }

    pub fn exclude(&mut self, dir: &Path) {
        self.entries.retain(|d| d != dir);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }
}

/// In-memory sources registered under an include name. Lookup happens on
/// the normalized name, so `"./foo.h"` and `foo.h` address the same entry.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    entries: Vec<(String, String)>,
}

impl SourceOverrides {
    pub fn add(&mut self, name: &str, content: &str) {
        let name = normalize_name(name);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content.to_owned(),
            None => self.entries.push((name, content.to_owned())),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        let before = self.entries.len();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.len() != before
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, content)| content.as_str())
    }
}

/// Canonical form of an include name: trimmed, forward slashes, no edge
/// separators or `./` prefix.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim().replace('\\', "/");
    let name = name.strip_prefix("./").unwrap_or(&name);
    name.trim_matches('/').to_owned()
}

/// Locates the content for an include request. `base_dir` is the including
/// source's own directory and is consulted for quoted includes only.
pub fn resolve(
    name: &str,
    quoted: bool,
    base_dir: Option<&Path>,
    overrides: &SourceOverrides,
    directories: &Directories,
) -> Result<Option<Source>> {
    if let Some(content) = overrides.find(name) {
        return Ok(Some(Source::from_text(name, content)));
    }
    let relative = PathBuf::from(normalize_name(name));
    if quoted {
        if let Some(base) = base_dir {
            let candidate = base.join(&relative);
            if candidate.is_file() {
                return Source::from_file(&candidate).map(Some);
            }
        }
    }
    for dir in directories.iter() {
        let candidate = dir.join(&relative);
        if candidate.is_file() {
            return Source::from_file(&candidate).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cpre-io-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  foo.h "), "foo.h");
        assert_eq!(normalize_name("./sub/foo.h"), "sub/foo.h");
        assert_eq!(normalize_name("/foo.h/"), "foo.h");
        assert_eq!(normalize_name("sub\\foo.h"), "sub/foo.h");
    }

    #[test]
    fn test_overrides_lookup_is_normalized() {
        let mut overrides = SourceOverrides::default();
        overrides.add("foo.h", "int x;");
        assert_eq!(overrides.find("./foo.h"), Some("int x;"));
        assert_eq!(overrides.find("bar.h"), None);

        overrides.add("foo.h", "int y;");
        assert_eq!(overrides.find("foo.h"), Some("int y;"));

        assert!(overrides.remove("foo.h"));
        assert!(!overrides.remove("foo.h"));
    }

    #[test]
    fn test_override_wins_over_directory_file() {
        let dir = scratch_dir("override");
        let mut file = File::create(dir.join("foo.h")).unwrap();
        file.write_all(b"from disk").unwrap();

        let mut overrides = SourceOverrides::default();
        overrides.add("foo.h", "from override");
        let mut directories = Directories::default();
        directories.include(dir.clone());

        let source = resolve("foo.h", false, None, &overrides, &directories)
            .unwrap()
            .unwrap();
        assert_eq!(source.content(), "from override");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_quoted_include_checks_base_dir_first() {
        let base = scratch_dir("base");
        let search = scratch_dir("search");
        fs::write(base.join("near.h"), "near").unwrap();
        fs::write(search.join("near.h"), "far").unwrap();

        let mut directories = Directories::default();
        directories.include(search.clone());
        let overrides = SourceOverrides::default();

        let quoted = resolve("near.h", true, Some(&base), &overrides, &directories)
            .unwrap()
            .unwrap();
        assert_eq!(quoted.content(), "near");

        let angled = resolve("near.h", false, Some(&base), &overrides, &directories)
            .unwrap()
            .unwrap();
        assert_eq!(angled.content(), "far");

        fs::remove_dir_all(&base).ok();
        fs::remove_dir_all(&search).ok();
    }

    #[test]
    fn test_unresolvable_name() {
        let out = resolve(
            "missing.h",
            true,
            None,
            &SourceOverrides::default(),
            &Directories::default(),
        )
        .unwrap();
        assert!(out.is_none());
    }
}
