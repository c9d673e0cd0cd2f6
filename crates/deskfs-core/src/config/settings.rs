//! Application configuration loaded from a TOML file.
//!
//! The default configuration matches the values shown in `config/default.toml`.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::fs::clipboard::ConflictPolicy;
use crate::fs::store::NameMatching;
use crate::nav::filter::{SortDirection, SortField};
use crate::nav::search::SearchOptions;
use crate::vfs::VfsOptions;

/// Top-level application configuration.
///
/// All fields have sensible defaults so DeskFS works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`VfsError::ConfigNotFound`] if the file does not exist.
    /// - [`VfsError::ConfigParse`] if the TOML is malformed or
    ///   `listing.date_format` is not a valid strftime pattern.
    pub fn load(path: &Path) -> VfsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VfsError::ConfigNotFound(path.to_path_buf()),
            _ => VfsError::Io(e),
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| VfsError::ConfigParse(e.to_string()))?;
        check_date_format(&config.listing.date_format)?;
        Ok(config)
    }

    /// Options the [`Vfs`](crate::Vfs) is booted with.
    pub fn vfs_options(&self) -> VfsOptions {
        VfsOptions {
            name_matching: if self.names.case_sensitive {
                NameMatching::CaseSensitive
            } else {
                NameMatching::CaseInsensitive
            },
            paste_conflict: self.clipboard.on_conflict,
        }
    }

    /// Default options for searches issued without explicit flags.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            include_hidden: self.search.include_hidden,
            match_content: self.search.match_content,
        }
    }
}

/// Sibling name comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

/// Paste behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

/// Defaults for search commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub match_content: bool,
}

/// Folder listing preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default)]
    pub show_hidden: bool,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default = "default_true")]
    pub folders_first: bool,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            sort: SortField::default(),
            direction: SortDirection::default(),
            folders_first: true,
            date_format: default_date_format(),
        }
    }
}

/// Where and when snapshots are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            autosave: true,
        }
    }
}

/// Rejects strftime patterns chrono cannot render.
///
/// # Errors
///
/// [`VfsError::ConfigParse`] naming the offending pattern.
pub fn check_date_format(pattern: &str) -> VfsResult<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(VfsError::ConfigParse(format!(
            "listing.date_format: invalid pattern {pattern:?}"
        )));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("deskfs.json")
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();

        assert!(config.names.case_sensitive);
        assert_eq!(config.clipboard.on_conflict, ConflictPolicy::Fail);
        assert!(!config.search.include_hidden);
        assert!(!config.search.match_content);
        assert!(!config.listing.show_hidden);
        assert_eq!(config.listing.sort, SortField::Manual);
        assert!(config.listing.folders_first);
        assert_eq!(config.storage.snapshot_path, PathBuf::from("deskfs.json"));
        assert!(config.storage.autosave);
    }

    #[test]
    fn default_vfs_options() {
        assert_eq!(Config::default().vfs_options(), VfsOptions::default());
    }

    #[test]
    fn load_full_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[names]
case_sensitive = false

[clipboard]
on_conflict = "suffix"

[search]
include_hidden = true
match_content = true

[listing]
show_hidden = true
sort = "name"
direction = "descending"
folders_first = false
date_format = "%d/%m/%Y"

[storage]
snapshot_path = "/var/lib/deskfs/state.json"
autosave = false
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert!(!config.names.case_sensitive);
        assert_eq!(config.clipboard.on_conflict, ConflictPolicy::Suffix);
        assert!(config.listing.show_hidden);
        assert_eq!(config.listing.sort, SortField::Name);
        assert_eq!(config.listing.direction, SortDirection::Descending);
        assert!(!config.listing.folders_first);
        assert_eq!(config.listing.date_format, "%d/%m/%Y");
        assert_eq!(
            config.storage.snapshot_path,
            PathBuf::from("/var/lib/deskfs/state.json")
        );
        assert!(!config.storage.autosave);

        let options = config.vfs_options();
        assert_eq!(options.name_matching, NameMatching::CaseInsensitive);
        assert_eq!(options.paste_conflict, ConflictPolicy::Suffix);
        let search = config.search_options();
        assert!(search.include_hidden);
        assert!(search.match_content);
    }

    #[test]
    fn load_partial_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[clipboard]
on_conflict = "suffix"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.clipboard.on_conflict, ConflictPolicy::Suffix);
        assert!(config.names.case_sensitive);
        assert!(config.storage.autosave);
    }

    #[test]
    fn load_empty_toml_uses_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        let default = Config::default();

        assert_eq!(config.names.case_sensitive, default.names.case_sensitive);
        assert_eq!(config.storage.snapshot_path, default.storage.snapshot_path);
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nonexistent.toml"));
        assert!(matches!(result.unwrap_err(), VfsError::ConfigNotFound(_)));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid [[[toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), VfsError::ConfigParse(_)));
    }

    #[test]
    fn invalid_date_format_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[listing]\ndate_format = \"%Q\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, VfsError::ConfigParse(ref msg) if msg.contains("%Q")));
    }

    #[test]
    fn check_date_format_accepts_default_and_literals() {
        assert!(check_date_format(&default_date_format()).is_ok());
        assert!(check_date_format("%d.%m.%Y at %H:%M:%S").is_ok());
        assert!(check_date_format("plain text").is_ok());
        assert!(check_date_format("%").is_err());
    }

    #[test]
    fn unknown_conflict_policy_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[clipboard]\non_conflict = \"overwrite\"\n").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            VfsError::ConfigParse(_)
        ));
    }
}
