use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// One JSON file per key under a directory. Entries are never evicted.
pub struct Cache {
    path: PathBuf,
}

impl Cache {
    pub fn new(path: &Path) -> Result<Cache> {
        fs::create_dir_all(path)?;
        Ok(Cache {
            path: path.to_path_buf(),
        })
    }

    pub fn write_from<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let file = File::create(self.key_path(key))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        Ok(())
    }

    /// Unreadable or stale-format entries count as a miss.
    pub fn read_into<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open cache entry {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => {
                debug!("cache read: {key}");
                Some(value)
            }
            Err(e) => {
                warn!("Discarding cache entry {}: {e}", path.display());
                None
            }
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        self.path.join(format!("{name}.json"))
    }
}
