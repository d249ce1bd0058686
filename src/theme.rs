use std::{
    collections::BTreeSet,
    fmt, fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{
        Arc, Mutex, OnceLock, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ThemeError;

/// The one key under which the theme mode is persisted. Both the read at
/// initialization and the write on toggle go through this constant.
pub const THEME_STORAGE_KEY: &str = "theme";

/// ThemeMode
///
/// The appearance mode. Persisted as the literal string `"light"` or `"dark"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Strict parse of a persisted value. Anything but the two literals is invalid.
    pub fn from_persisted(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// ThemeSnapshot
///
/// Read-only projection of the store handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ThemeSnapshot {
    pub mode: ThemeMode,
    pub is_dark: bool,
}

impl From<ThemeMode> for ThemeSnapshot {
    fn from(mode: ThemeMode) -> Self {
        Self {
            mode,
            is_dark: mode == ThemeMode::Dark,
        }
    }
}

// --- Persistence ---

/// ThemeStorage
///
/// Durable client-side key-value storage. Swapped for `MemoryStorage` in tests.
pub trait ThemeStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError>;
    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError>;
}

/// FileStorage
///
/// Stores all preferences as one flat JSON object on disk. Writes go to a sibling
/// temp file which is then renamed over the original, so a crash mid-write leaves
/// the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn storage_err(&self, e: impl fmt::Display) -> ThemeError {
        ThemeError::Storage(format!("{}: {e}", self.path.display()))
    }

    /// Raw file contents, `None` when the file does not exist yet.
    fn raw(&self) -> Result<Option<String>, ThemeError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_err(e)),
        }
    }

    fn load(&self) -> Result<Map<String, Value>, ThemeError> {
        match self.raw()? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| self.storage_err(e)),
            None => Ok(Map::new()),
        }
    }
}

impl ThemeStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError> {
        // Non-string JSON values come back verbatim so the caller rejects them.
        Ok(self.load()?.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        let storage_err = |e: std::io::Error| self.storage_err(e);

        // A file that fails to parse is replaced rather than blocking every future
        // write. One that cannot be read at all is left alone.
        let mut entries = match self.raw()? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "replacing unparseable preferences file");
                Map::new()
            }),
            None => Map::new(),
        };
        entries.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let body = serde_json::to_string_pretty(&entries)
            .map_err(|e| ThemeError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(storage_err)?;
        fs::rename(&tmp, &self.path).map_err(storage_err)
    }
}

/// MemoryStorage
///
/// In-process storage used by tests. Can be seeded with a value and told to fail
/// every write.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Vec<(String, String)>>,
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn seeded(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((key.to_string(), value.to_string()));
        storage
    }
}

impl ThemeStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ThemeError> {
        let entries = self.entries.lock().map_err(|_| ThemeError::LockPoisoned)?;
        Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        if self.should_fail {
            return Err(ThemeError::Storage("Mock Storage Error: Simulation requested".into()));
        }
        let mut entries = self.entries.lock().map_err(|_| ThemeError::LockPoisoned)?;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }
}

// --- Appearance hint ---

/// AppearanceHint
///
/// The platform-level marker (a root class) that styling keys off.
pub trait AppearanceHint: Send + Sync {
    fn apply(&self, mode: ThemeMode);
}

/// ClassList
///
/// A root element's class set. After every `apply` exactly one of the two mode
/// markers is present; unrelated classes are left alone.
#[derive(Debug, Default)]
pub struct ClassList {
    classes: Mutex<BTreeSet<String>>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes<I: IntoIterator<Item = S>, S: Into<String>>(classes: I) -> Self {
        Self {
            classes: Mutex::new(classes.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(class)
    }

    /// Space-separated value suitable for a `class` attribute.
    pub fn to_attribute(&self) -> String {
        self.classes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AppearanceHint for ClassList {
    fn apply(&self, mode: ThemeMode) {
        let mut classes = self
            .classes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        classes.remove(mode.toggled().as_str());
        classes.insert(mode.as_str().to_string());
    }
}

// --- Store ---

/// ThemeStore
///
/// Owns the in-memory theme mode together with its persistence and appearance
/// hint. All mutation happens under the write lock, so a reader never observes
/// a mode that disagrees with storage or the applied class.
pub struct ThemeStore {
    mode: RwLock<ThemeMode>,
    storage: Arc<dyn ThemeStorage>,
    hint: Arc<dyn AppearanceHint>,
    live: AtomicBool,
}

impl ThemeStore {
    /// initialize
    ///
    /// Reads the persisted mode once. Absent, unreadable or unrecognised values
    /// fall back to `light`; none of these is an error.
    pub fn initialize(storage: Arc<dyn ThemeStorage>, hint: Arc<dyn AppearanceHint>) -> Self {
        let mode = match storage.read(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => ThemeMode::from_persisted(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "discarding unrecognised persisted theme");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                tracing::warn!(error = %e, "persisted theme unreadable, using default");
                ThemeMode::default()
            }
        };

        hint.apply(mode);
        tracing::debug!(mode = mode.as_str(), "theme store initialized");

        Self {
            mode: RwLock::new(mode),
            storage,
            hint,
            live: AtomicBool::new(false),
        }
    }

    fn activate(&self) {
        let _mode = self.mode.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.live.store(true, Ordering::Release);
    }

    /// Liveness is checked while holding the mode lock; `retire` takes the same
    /// lock, so no read or toggle straddles a teardown.
    fn ensure_live(&self) -> Result<(), ThemeError> {
        if self.live.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ThemeError::MissingContext)
        }
    }

    pub fn read(&self) -> Result<ThemeSnapshot, ThemeError> {
        let mode = *self.mode.read().map_err(|_| ThemeError::LockPoisoned)?;
        self.ensure_live()?;
        Ok(mode.into())
    }

    /// toggle
    ///
    /// Flips the mode. Storage is written first; if that fails nothing else
    /// changes and the error is returned.
    pub fn toggle(&self) -> Result<ThemeSnapshot, ThemeError> {
        let mut mode = self.mode.write().map_err(|_| ThemeError::LockPoisoned)?;
        self.ensure_live()?;
        let next = mode.toggled();

        self.storage.write(THEME_STORAGE_KEY, next.as_str())?;
        self.hint.apply(next);
        *mode = next;

        tracing::info!(mode = next.as_str(), "theme toggled");
        Ok(next.into())
    }

    fn retire(&self) {
        let _mode = self.mode.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.live.store(false, Ordering::Release);
    }
}

// --- Process-wide slot ---

/// Handle to the installed store.
pub type ThemeHandle = Arc<ThemeStore>;

fn slot() -> &'static RwLock<Option<ThemeHandle>> {
    static ACTIVE: OnceLock<RwLock<Option<ThemeHandle>>> = OnceLock::new();
    ACTIVE.get_or_init(|| RwLock::new(None))
}

/// Makes `store` the single process-wide instance. A store only answers reads
/// and toggles once installed.
pub fn install(store: ThemeStore) -> Result<ThemeHandle, ThemeError> {
    let mut active = slot().write().map_err(|_| ThemeError::LockPoisoned)?;
    if active.is_some() {
        return Err(ThemeError::AlreadyInstalled);
    }
    store.activate();
    let handle = Arc::new(store);
    *active = Some(handle.clone());
    Ok(handle)
}

/// The installed store, or `MissingContext` outside its lifetime.
pub fn use_theme() -> Result<ThemeHandle, ThemeError> {
    slot()
        .read()
        .map_err(|_| ThemeError::LockPoisoned)?
        .clone()
        .ok_or(ThemeError::MissingContext)
}

/// Ends the store's lifetime. Handles still held elsewhere start failing with
/// `MissingContext`.
pub fn teardown() {
    let mut active = slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(store) = active.take() {
        store.retire();
        tracing::debug!("theme store torn down");
    }
}
