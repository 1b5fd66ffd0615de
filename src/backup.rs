//! Backup and restore for the on-disk game store.
//!
//! A backup is a tar.gz of the sled directory plus a SHA-256 checksum kept in
//! `backups.json` next to the archives. Restores verify the checksum first.
//! Backups should be taken while no other process has the store open.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tar::{Archive, Builder};

use crate::config::BackupConfig;
use crate::game::errors::GameError;

const METADATA_FILE: &str = "backups.json";
/// Directory name of the store inside every archive.
const ARCHIVE_ROOT: &str = "gamestate";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    /// Timestamp-based identifier, also the archive file stem.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub kind: BackupKind,
    /// Hex SHA-256 of the archive.
    pub checksum: String,
    pub verified: bool,
    /// Archive path relative to the backup directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep the newest N automatic backups.
    pub automatic_count: usize,
    /// Manual backups are never pruned or deleted.
    pub keep_manual: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            automatic_count: 7,
            keep_manual: true,
        }
    }
}

impl From<&BackupConfig> for RetentionPolicy {
    fn from(config: &BackupConfig) -> Self {
        Self {
            automatic_count: config.automatic_count,
            keep_manual: config.keep_manual,
        }
    }
}

pub struct BackupManager {
    store_path: PathBuf,
    backup_path: PathBuf,
    retention: RetentionPolicy,
    backups: HashMap<String, BackupMetadata>,
}

impl BackupManager {
    pub fn new(store_path: PathBuf, backup_path: PathBuf, retention: RetentionPolicy) -> Result<Self, GameError> {
        fs::create_dir_all(&backup_path)?;
        let mut manager = Self {
            store_path,
            backup_path,
            retention,
            backups: HashMap::new(),
        };
        manager.load_metadata()?;
        Ok(manager)
    }

    fn load_metadata(&mut self) -> Result<(), GameError> {
        let metadata_path = self.backup_path.join(METADATA_FILE);
        if metadata_path.exists() {
            let contents = fs::read_to_string(&metadata_path)?;
            self.backups = serde_json::from_str(&contents)?;
        }
        Ok(())
    }

    fn save_metadata(&self) -> Result<(), GameError> {
        let contents = serde_json::to_string_pretty(&self.backups)?;
        fs::write(self.backup_path.join(METADATA_FILE), contents)?;
        Ok(())
    }

    fn find(&self, backup_id: &str) -> Result<&BackupMetadata, GameError> {
        self.backups
            .get(backup_id)
            .ok_or_else(|| GameError::NotFound(format!("backup: {}", backup_id)))
    }

    fn archive_file(&self, metadata: &BackupMetadata) -> Result<PathBuf, GameError> {
        let file = self.backup_path.join(&metadata.path);
        if !file.exists() {
            return Err(GameError::NotFound(format!(
                "backup archive missing: {}",
                file.display()
            )));
        }
        Ok(file)
    }

    pub fn create_backup(&mut self, name: Option<String>, kind: BackupKind) -> Result<BackupMetadata, GameError> {
        if !self.store_path.is_dir() {
            return Err(GameError::NotFound(format!(
                "game store: {}",
                self.store_path.display()
            )));
        }

        let timestamp = Utc::now();
        let mut id = format!("backup_{}", timestamp.format("%Y%m%d_%H%M%S_%3f"));
        let mut suffix = 1;
        while self.backups.contains_key(&id) {
            id = format!("backup_{}_{}", timestamp.format("%Y%m%d_%H%M%S_%3f"), suffix);
            suffix += 1;
        }
        let filename = format!("{}.tar.gz", id);
        let backup_file = self.backup_path.join(&filename);
        log::info!("Creating backup {} ({:?})", id, kind);

        let tar_gz = File::create(&backup_file)?;
        let mut tar = Builder::new(GzEncoder::new(tar_gz, Compression::default()));
        tar.append_dir_all(ARCHIVE_ROOT, &self.store_path)?;
        // The checksum must cover the finished gzip stream.
        tar.into_inner()?.finish()?;

        let metadata = BackupMetadata {
            id: id.clone(),
            name,
            created_at: timestamp,
            size_bytes: fs::metadata(&backup_file)?.len(),
            kind,
            checksum: calculate_checksum(&backup_file)?,
            verified: false,
            path: PathBuf::from(&filename),
        };
        self.backups.insert(id.clone(), metadata.clone());
        self.save_metadata()?;
        log::info!("Backup {} written ({} bytes)", id, metadata.size_bytes);
        Ok(metadata)
    }

    /// Recompute the checksum; marks the backup verified when it matches.
    pub fn verify_backup(&mut self, backup_id: &str) -> Result<bool, GameError> {
        let metadata = self.find(backup_id)?;
        let current = calculate_checksum(&self.archive_file(metadata)?)?;
        if current != metadata.checksum {
            log::error!("Backup {} failed verification (checksum mismatch)", backup_id);
            return Ok(false);
        }
        if let Some(meta) = self.backups.get_mut(backup_id) {
            meta.verified = true;
        }
        self.save_metadata()?;
        log::info!("Backup {} verified", backup_id);
        Ok(true)
    }

    /// Unpack a backup so the store ends up at `<data_dir>/gamestate`.
    ///
    /// An existing store is only replaced when `overwrite` is set.
    pub fn restore_backup(&self, backup_id: &str, data_dir: &Path, overwrite: bool) -> Result<PathBuf, GameError> {
        let metadata = self.find(backup_id)?;
        let backup_file = self.archive_file(metadata)?;
        if calculate_checksum(&backup_file)? != metadata.checksum {
            return Err(GameError::InvalidInput(format!(
                "backup {} checksum mismatch",
                backup_id
            )));
        }

        let target = data_dir.join(ARCHIVE_ROOT);
        if target.exists() {
            if !overwrite {
                return Err(GameError::AlreadyExists(format!(
                    "game store: {}",
                    target.display()
                )));
            }
            log::warn!("Replacing existing store at {}", target.display());
            fs::remove_dir_all(&target)?;
        }

        fs::create_dir_all(data_dir)?;
        let mut archive = Archive::new(GzDecoder::new(File::open(&backup_file)?));
        archive.unpack(data_dir)?;
        log::info!("Backup {} restored to {}", backup_id, target.display());
        Ok(target)
    }

    /// Delete automatic backups beyond the retention count, oldest first.
    pub fn apply_retention_policy(&mut self) -> Result<Vec<String>, GameError> {
        let mut automatic: Vec<&BackupMetadata> = self
            .backups
            .values()
            .filter(|b| b.kind == BackupKind::Automatic)
            .collect();
        automatic.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let expired: Vec<String> = automatic
            .iter()
            .skip(self.retention.automatic_count)
            .map(|b| b.id.clone())
            .collect();

        for backup_id in &expired {
            if let Some(metadata) = self.backups.remove(backup_id) {
                let file = self.backup_path.join(&metadata.path);
                if file.exists() {
                    fs::remove_file(&file)?;
                }
                log::info!("Pruned backup {}", backup_id);
            }
        }
        if !expired.is_empty() {
            self.save_metadata()?;
        }
        Ok(expired)
    }

    /// All backups, newest first.
    pub fn list_backups(&self) -> Vec<BackupMetadata> {
        let mut backups: Vec<_> = self.backups.values().cloned().collect();
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        backups
    }

    pub fn get_backup(&self, backup_id: &str) -> Option<&BackupMetadata> {
        self.backups.get(backup_id)
    }

    pub fn delete_backup(&mut self, backup_id: &str) -> Result<(), GameError> {
        let metadata = self.find(backup_id)?;
        if metadata.kind == BackupKind::Manual && self.retention.keep_manual {
            return Err(GameError::InvalidInput(
                "manual backups are kept by the retention policy".to_string(),
            ));
        }
        let file = self.backup_path.join(&metadata.path);
        if file.exists() {
            fs::remove_file(&file)?;
        }
        self.backups.remove(backup_id);
        self.save_metadata()?;
        log::info!("Deleted backup {}", backup_id);
        Ok(())
    }
}

fn calculate_checksum(path: &Path) -> Result<String, GameError> {
    use sha2::{Digest, Sha256};

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::create_initial_state;
    use crate::game::storage::{GameStateStore, SledGameStore};
    use tempfile::TempDir;

    fn seeded_store(data_dir: &Path) -> PathBuf {
        let store_path = data_dir.join("gamestate");
        let store = SledGameStore::open(&store_path).unwrap();
        store.save(&create_initial_state(1, "hunter", Utc::now())).unwrap();
        store.flush().unwrap();
        store_path
    }

    #[test]
    fn test_create_and_verify_backup() {
        let temp = TempDir::new().unwrap();
        let store_path = seeded_store(&temp.path().join("data"));
        let mut manager =
            BackupManager::new(store_path, temp.path().join("backups"), RetentionPolicy::default()).unwrap();

        let metadata = manager
            .create_backup(Some("before-upgrade".to_string()), BackupKind::Manual)
            .unwrap();
        assert!(metadata.size_bytes > 0);
        assert_eq!(metadata.checksum.len(), 64);
        assert!(manager.verify_backup(&metadata.id).unwrap());
        assert!(manager.get_backup(&metadata.id).unwrap().verified);
    }

    #[test]
    fn test_tampered_archive_fails_verification() {
        let temp = TempDir::new().unwrap();
        let store_path = seeded_store(&temp.path().join("data"));
        let backup_path = temp.path().join("backups");
        let mut manager =
            BackupManager::new(store_path, backup_path.clone(), RetentionPolicy::default()).unwrap();
        let metadata = manager.create_backup(None, BackupKind::Manual).unwrap();

        fs::write(backup_path.join(&metadata.path), b"garbage").unwrap();
        assert!(!manager.verify_backup(&metadata.id).unwrap());
        assert!(manager
            .restore_backup(&metadata.id, &temp.path().join("restore"), false)
            .is_err());
    }

    #[test]
    fn test_restore_round_trip() {
        let temp = TempDir::new().unwrap();
        let store_path = seeded_store(&temp.path().join("data"));
        let mut manager =
            BackupManager::new(store_path, temp.path().join("backups"), RetentionPolicy::default()).unwrap();
        let metadata = manager.create_backup(None, BackupKind::Manual).unwrap();

        let restore_dir = temp.path().join("restore");
        let restored = manager.restore_backup(&metadata.id, &restore_dir, false).unwrap();
        let store = SledGameStore::open(&restored).unwrap();
        assert_eq!(store.load(1).unwrap().username, "hunter");
        drop(store);

        assert!(matches!(
            manager.restore_backup(&metadata.id, &restore_dir, false),
            Err(GameError::AlreadyExists(_))
        ));
        assert!(manager.restore_backup(&metadata.id, &restore_dir, true).is_ok());
    }

    #[test]
    fn test_retention_prunes_only_automatic() {
        let temp = TempDir::new().unwrap();
        let store_path = seeded_store(&temp.path().join("data"));
        let policy = RetentionPolicy {
            automatic_count: 2,
            keep_manual: true,
        };
        let mut manager = BackupManager::new(store_path, temp.path().join("backups"), policy).unwrap();

        let manual = manager.create_backup(None, BackupKind::Manual).unwrap();
        for _ in 0..4 {
            manager.create_backup(None, BackupKind::Automatic).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let pruned = manager.apply_retention_policy().unwrap();
        assert_eq!(pruned.len(), 2);
        assert_eq!(manager.list_backups().len(), 3);
        assert!(manager.get_backup(&manual.id).is_some());
        assert!(manager.delete_backup(&manual.id).is_err());
    }

    #[test]
    fn test_metadata_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let store_path = seeded_store(&temp.path().join("data"));
        let backup_path = temp.path().join("backups");
        let id = {
            let mut manager =
                BackupManager::new(store_path.clone(), backup_path.clone(), RetentionPolicy::default()).unwrap();
            manager.create_backup(None, BackupKind::Automatic).unwrap().id
        };
        let manager = BackupManager::new(store_path, backup_path, RetentionPolicy::default()).unwrap();
        assert_eq!(manager.list_backups().len(), 1);
        assert!(manager.get_backup(&id).is_some());
    }
}
