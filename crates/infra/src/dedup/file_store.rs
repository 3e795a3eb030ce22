//! JSON-file dedup store.
//!
//! The file is a JSON array of alert keys (`["megastar_toys", ...]`). It is loaded
//! once at open and rewritten after every new key, so a crash between detecting a
//! conflict and reporting it cannot lose the record. Writes go to a sibling temp
//! file that is then renamed over the original.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use bridge_correlation::{AlertKey, DedupError, DedupStore};

#[derive(Debug)]
pub struct JsonFileDedupStore {
    path: PathBuf,
    keys: BTreeSet<AlertKey>,
}

impl JsonFileDedupStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that exists but does not parse is
    /// logged and treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DedupError> {
        let path = path.into();
        let keys = read_keys(&path)?;
        debug!(path = %path.display(), keys = keys.len(), "dedup store opened");
        Ok(Self { path, keys })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl DedupStore for JsonFileDedupStore {
    fn contains(&self, key: &AlertKey) -> bool {
        self.keys.contains(key)
    }

    fn add(&mut self, key: AlertKey) -> Result<(), DedupError> {
        if !self.keys.insert(key.clone()) {
            return Ok(());
        }
        if let Err(e) = write_keys(&self.path, &self.keys) {
            // Memory must not remember what disk does not.
            self.keys.remove(&key);
            return Err(e);
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeSet<AlertKey>, DedupError> {
        read_keys(&self.path)
    }

    fn persist(&mut self, keys: &BTreeSet<AlertKey>) -> Result<(), DedupError> {
        write_keys(&self.path, keys)?;
        self.keys = keys.clone();
        Ok(())
    }

    fn keys(&self) -> Vec<AlertKey> {
        self.keys.iter().cloned().collect()
    }
}

fn io_err(path: &Path, source: std::io::Error) -> DedupError {
    DedupError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_keys(path: &Path) -> Result<BTreeSet<AlertKey>, DedupError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(io_err(path, e)),
    };
    match serde_json::from_slice::<Vec<String>>(&bytes) {
        Ok(keys) => Ok(keys.iter().map(AlertKey::from_raw).collect()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "dedup file is corrupt; starting from an empty set");
            Ok(BTreeSet::new())
        }
    }
}

fn write_keys(path: &Path, keys: &BTreeSet<AlertKey>) -> Result<(), DedupError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let body = serde_json::to_vec_pretty(keys)?;
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut f = File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
    f.write_all(&body).map_err(|e| io_err(&tmp, e))?;
    f.sync_all().map_err(|e| io_err(&tmp, e))?;
    drop(f);

    fs::rename(&tmp, path).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use bridge_core::{CategoryName, VesselId};

    use super::*;

    #[test]
    fn keys_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_alerts.json");

        let mut store = JsonFileDedupStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.add(AlertKey::from_raw("megastar_toys")).unwrap();
        store.add(AlertKey::from_raw("star_electronics")).unwrap();
        drop(store);

        let reopened = JsonFileDedupStore::open(&path).unwrap();
        assert!(reopened.contains(&AlertKey::from_raw("megastar_toys")));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn add_writes_through_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sent_alerts.json");

        let mut store = JsonFileDedupStore::open(&path).unwrap();
        store.add(AlertKey::from_raw("europa_groceries")).unwrap();

        let on_disk: Vec<String> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["europa_groceries".to_string()]);
        assert!(!path.with_file_name("sent_alerts.json.tmp").exists());
    }

    #[test]
    fn reads_legacy_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_alerts.json");
        fs::write(&path, r#"["Megastar_Electronics", "Star_Toys"]"#).unwrap();

        let store = JsonFileDedupStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.load().unwrap().len(), 2);

        // Keys written in feed casing still suppress their pair.
        let megastar = VesselId::parse("Megastar").unwrap();
        let electronics = CategoryName::parse("Electronics").unwrap();
        assert!(store.contains(&AlertKey::new(&megastar, &electronics)));
        let star = VesselId::parse(" STAR").unwrap();
        let toys = CategoryName::parse("toys").unwrap();
        assert!(store.contains(&AlertKey::new(&star, &toys)));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_alerts.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = JsonFileDedupStore::open(&path).unwrap();
        assert!(store.is_empty());

        store.add(AlertKey::from_raw("star_toys")).unwrap();
        assert_eq!(JsonFileDedupStore::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn persist_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent_alerts.json");
        let mut store = JsonFileDedupStore::open(&path).unwrap();
        store.add(AlertKey::from_raw("a_b")).unwrap();

        let replacement: BTreeSet<AlertKey> = [AlertKey::from_raw("c_d")].into_iter().collect();
        store.persist(&replacement).unwrap();

        assert!(!store.contains(&AlertKey::from_raw("a_b")));
        assert_eq!(store.load().unwrap(), replacement);
    }
}
