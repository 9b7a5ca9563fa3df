//! Persisted one-time UI flags.
//!
//! Flags record whether a hint or dialog has already been shown. They are
//! stored as a flat JSON object keyed by [`PreferenceFlag::key`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::PreferencesError;

/// Result type for preference operations.
pub type Result<T> = std::result::Result<T, PreferencesError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceFlag {
    OnboardingShown,
    FileImportTipShown,
    ReorderPagesTipShown,
    MultipageDialogShown,
}

impl PreferenceFlag {
    pub const ALL: [PreferenceFlag; 4] = [
        PreferenceFlag::OnboardingShown,
        PreferenceFlag::FileImportTipShown,
        PreferenceFlag::ReorderPagesTipShown,
        PreferenceFlag::MultipageDialogShown,
    ];

    /// Storage key.
    pub fn key(&self) -> &'static str {
        match self {
            PreferenceFlag::OnboardingShown => "docket.defaults.onboardingShown",
            PreferenceFlag::FileImportTipShown => "docket.defaults.fileImportTipShown",
            PreferenceFlag::ReorderPagesTipShown => "docket.defaults.reorderPagesTipShown",
            PreferenceFlag::MultipageDialogShown => "docket.defaults.multipageDialogShown",
        }
    }

    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        self.key().trim_start_matches("docket.defaults.")
    }
}

impl fmt::Display for PreferenceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PreferenceFlag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PreferenceFlag::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(s) || flag.key() == s)
            .ok_or_else(|| format!("unknown flag: {}", s))
    }
}

/// Storage for [`PreferenceFlag`]s.
pub trait PreferenceStore {
    fn get(&self, flag: PreferenceFlag) -> bool;

    fn set(&mut self, flag: PreferenceFlag, value: bool) -> Result<()>;

    /// Return `true` the first time it is called for `flag`, then `false`.
    fn take_once(&mut self, flag: PreferenceFlag) -> Result<bool> {
        if self.get(flag) {
            return Ok(false);
        }
        self.set(flag, true)?;
        Ok(true)
    }

    /// Clear every flag.
    fn reset(&mut self) -> Result<()> {
        for flag in PreferenceFlag::ALL {
            self.set(flag, false)?;
        }
        Ok(())
    }
}

/// In-memory flags, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    flags: BTreeMap<String, bool>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, flag: PreferenceFlag) -> bool {
        self.flags.get(flag.key()).copied().unwrap_or(false)
    }

    fn set(&mut self, flag: PreferenceFlag, value: bool) -> Result<()> {
        self.flags.insert(flag.key().to_string(), value);
        Ok(())
    }
}

/// Flags stored in a JSON file, written on every change.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
    flags: BTreeMap<String, bool>,
}

impl FilePreferences {
    /// Open the flags file. A missing file means no flag is set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let flags = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        debug!("Loaded {} preference flags from {}", flags.len(), path.display());
        Ok(Self { path, flags })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.flags)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, flag: PreferenceFlag) -> bool {
        self.flags.get(flag.key()).copied().unwrap_or(false)
    }

    fn set(&mut self, flag: PreferenceFlag, value: bool) -> Result<()> {
        self.flags.insert(flag.key().to_string(), value);
        self.save()
    }
}
