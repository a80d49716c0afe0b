//! # Stores
//!
//! A store owns one persisted location holding one complete document.
//!
//! Saving always replaces the whole document. Readers of a location see
//! either the previous or the new document, never a mix of both.

use crate::document::{Document, from_document, to_document};
use crate::format::DocumentFormat;
use crate::settings::Settings;
use errors::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path as FsPath, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Single-location persistence of one document.
pub trait Store {
    /// Identifier of the persisted location.
    fn location(&self) -> &str;

    fn exists(&self) -> Result<bool, ConfigError>;

    /// Read the whole document. Fails with `NotFound` when nothing is persisted.
    fn load_document(&self) -> Result<Document, ConfigError>;

    /// Replace the whole persisted document.
    fn save_document(&self, document: &Document) -> Result<(), ConfigError>;

    fn load<T: DeserializeOwned>(&self) -> Result<T, ConfigError>
    where
        Self: Sized,
    {
        from_document(self.load_document()?)
    }

    fn save<T: Serialize>(&self, value: &T) -> Result<(), ConfigError>
    where
        Self: Sized,
    {
        self.save_document(&to_document(value)?)
    }
}

/// A document persisted as a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    location: String,
    format: DocumentFormat,
    pretty: bool,
    create_dirs: bool,
}

impl FileStore {
    /// Create a store for `path`, detecting the format from its extension.
    pub fn new(path: impl AsRef<FsPath>, settings: &Settings) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        let format = DocumentFormat::detect(&location, settings.default_format)?;

        Ok(Self {
            path,
            location,
            format,
            pretty: settings.pretty,
            create_dirs: settings.create_dirs,
        })
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    fn directory(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Store for FileStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn exists(&self) -> Result<bool, ConfigError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::io(&self.location, e)),
        }
    }

    fn load_document(&self) -> Result<Document, ConfigError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound {
                location: self.location.clone(),
            },
            _ => ConfigError::io(&self.location, e),
        })?;

        debug!("Loaded {} ({} bytes)", self.location, contents.len());
        self.format.parse(&contents, &self.location)
    }

    fn save_document(&self, document: &Document) -> Result<(), ConfigError> {
        let contents = self.format.serialize(document, self.pretty)?;
        let directory = self.directory();

        if self.create_dirs {
            fs::create_dir_all(&directory).map_err(|e| ConfigError::io(&self.location, e))?;
        }

        // Write to a sibling temp file, then rename over the target.
        let mut temp = tempfile::NamedTempFile::new_in(&directory)
            .map_err(|e| ConfigError::io(&self.location, e))?;
        temp.write_all(contents.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| ConfigError::io(&self.location, e))?;
        temp.persist(&self.path)
            .map_err(|e| ConfigError::io(&self.location, e.error))?;

        debug!("Saved {} ({} bytes)", self.location, contents.len());
        Ok(())
    }
}

/// A document persisted in process memory.
///
/// Clones share the same contents, so a clone can play the role of another
/// reader or writer of the location.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    location: String,
    format: DocumentFormat,
    contents: Rc<RefCell<Option<String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: DocumentFormat::Toml,
            contents: Rc::new(RefCell::new(None)),
            writes: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// The persisted text, if any.
    pub fn text(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Overwrite the persisted text directly, bypassing the codec.
    pub fn write_text(&self, text: impl Into<String>) {
        *self.contents.borrow_mut() = Some(text.into());
    }

    /// Number of completed `save_document` calls.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Store for MemoryStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn exists(&self) -> Result<bool, ConfigError> {
        Ok(self.contents.borrow().is_some())
    }

    fn load_document(&self) -> Result<Document, ConfigError> {
        let contents = self.text().ok_or_else(|| ConfigError::NotFound {
            location: self.location.clone(),
        })?;
        self.format.parse(&contents, &self.location)
    }

    fn save_document(&self, document: &Document) -> Result<(), ConfigError> {
        let contents = self.format.serialize(document, true)?;
        *self.contents.borrow_mut() = Some(contents);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        port: u16,
    }

    fn sample() -> Sample {
        Sample {
            name: "svc".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_file_store_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("cfg.toml"), &Settings::default()).unwrap();

        assert!(!store.exists().unwrap());
        store.save(&sample()).unwrap();
        assert!(store.exists().unwrap());
        assert_eq!(store.load::<Sample>().unwrap(), sample());
    }

    #[test]
    fn test_file_store_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("absent.toml"), &Settings::default()).unwrap();

        let err = store.load_document().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_file_store_save_replaces_whole_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.toml");
        fs::write(&path, "stale = true\nport = 1\n").unwrap();
        let store = FileStore::new(&path, &Settings::default()).unwrap();

        store.save(&sample()).unwrap();

        let document = store.load_document().unwrap();
        assert!(!document.contains_key("stale"));
        assert_eq!(document["port"].as_integer(), Some(8080));
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("cfg.toml"), &Settings::default()).unwrap();
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_file_store_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("cfg.yaml");
        let store = FileStore::new(&path, &Settings::default()).unwrap();
        assert_eq!(store.format(), DocumentFormat::Yaml);

        store.save(&sample()).unwrap();
        assert!(path.is_file());
        assert!(fs::read_to_string(&path).unwrap().contains("port: 8080"));
    }

    #[test]
    fn test_file_store_without_create_dirs_fails() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            create_dirs: false,
            ..Settings::default()
        };
        let store = FileStore::new(dir.path().join("missing").join("cfg.toml"), &settings).unwrap();

        let result = store.save(&sample());
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_file_store_rejects_unknown_extension() {
        let result = FileStore::new("cfg.ini", &Settings::default());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_file_store_reports_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileStore::new(&path, &Settings::default()).unwrap();

        assert!(matches!(store.load_document(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_memory_store_counts_writes_and_shares_contents() {
        let store = MemoryStore::new("mem");
        let other = store.clone();

        assert!(!store.exists().unwrap());
        assert!(store.load_document().unwrap_err().is_not_found());

        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(other.writes(), 2);
        assert!(other.text().unwrap().contains("port = 8080"));

        other.write_text("name = \"ext\"\nport = 1\n");
        assert_eq!(store.load::<Sample>().unwrap().port, 1);
        assert_eq!(store.writes(), 2);
    }
}
