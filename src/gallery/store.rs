// * On-disk image set with content-hash deduplication and a retained-count ceiling.
// * No state outside the directory itself: every open rescans and rehashes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use xxhash_rust::xxh64::xxh64;

use crate::config::NamingScheme;

const RELEVANT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const SLOT_PREFIX: &str = "slide_";
const SAVED_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Image directory I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn content_digest(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

pub fn digest_hex(digest: u64) -> String {
    format!("{:016x}", digest)
}

pub fn slot_file_name(slot: usize) -> String {
    format!("{}{}.{}", SLOT_PREFIX, slot, SAVED_EXTENSION)
}

// * `slide_3.jpg` -> Some(3)
pub fn parse_slot(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(SLOT_PREFIX)?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
        .filter(|&n| n > 0)
}

fn is_relevant(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| RELEVANT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub file_name: String,
    pub digest: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Saved(PathBuf),
    Duplicate,
    NoOpenSlot,
}

/// The output directory of the acquisition pipeline.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_retained: usize,
    naming: NamingScheme,
}

impl ImageStore {
    /// Opens the directory, creating it when missing.
    pub fn open(dir: impl Into<PathBuf>, max_retained: usize, naming: NamingScheme) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        Ok(Self {
            dir,
            max_retained,
            naming,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    // * Slot numbers past the ceiling are leftovers, not slots
    fn slot_of(&self, file_name: &str) -> Option<usize> {
        parse_slot(file_name).filter(|&n| n <= self.max_retained)
    }

    // * Relevant file names, lexicographically sorted
    fn relevant_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err(&self.dir))? {
            let entry = entry.map_err(io_err(&self.dir))?;
            let path = entry.path();
            if !is_relevant(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every relevant file with its content digest.
    pub fn scan(&self) -> Result<Vec<StoredImage>, StoreError> {
        self.relevant_names()?
            .into_iter()
            .map(|file_name| {
                let path = self.dir.join(&file_name);
                let bytes = fs::read(&path).map_err(io_err(&path))?;
                Ok(StoredImage {
                    digest: content_digest(&bytes),
                    path,
                    file_name,
                })
            })
            .collect()
    }

    pub fn relevant_count(&self) -> Result<usize, StoreError> {
        Ok(self.relevant_names()?.len())
    }

    pub fn is_full(&self) -> Result<bool, StoreError> {
        Ok(self.relevant_count()? >= self.max_retained)
    }

    pub fn digests(&self) -> Result<HashSet<u64>, StoreError> {
        Ok(self.scan()?.into_iter().map(|img| img.digest).collect())
    }

    /// Slot numbers in `1..=max_retained` with no file yet.
    pub fn open_slots(&self) -> Result<Vec<usize>, StoreError> {
        let taken: HashSet<usize> = self
            .relevant_names()?
            .iter()
            .filter_map(|name| self.slot_of(name))
            .collect();
        Ok((1..=self.max_retained).filter(|n| !taken.contains(n)).collect())
    }

    /// How many new images this run may add.
    pub fn remaining_capacity(&self) -> Result<usize, StoreError> {
        match self.naming {
            NamingScheme::Slots => Ok(self.open_slots()?.len()),
            NamingScheme::Timestamped => Ok(self.max_retained.saturating_sub(self.relevant_count()?)),
        }
    }

    /// Writes `bytes` unless their digest is in `known`, then enforces the ceiling.
    /// A saved digest is added to `known`.
    pub fn persist(&self, bytes: &[u8], known: &mut HashSet<u64>) -> Result<PersistOutcome, StoreError> {
        let digest = content_digest(bytes);
        if known.contains(&digest) {
            debug!(digest = %digest_hex(digest), "Duplicate content; not saved");
            return Ok(PersistOutcome::Duplicate);
        }

        let file_name = match self.naming {
            NamingScheme::Slots => match self.open_slots()?.first() {
                Some(&slot) => slot_file_name(slot),
                None => return Ok(PersistOutcome::NoOpenSlot),
            },
            NamingScheme::Timestamped => {
                let count = self.relevant_count()?;
                if count >= self.max_retained {
                    self.evict(count + 1 - self.max_retained, None)?;
                }
                format!(
                    "{}_{}.{}",
                    chrono::Local::now().format("%Y%m%d_%H%M%S"),
                    &digest_hex(digest)[..8],
                    SAVED_EXTENSION
                )
            }
        };

        let path = self.dir.join(&file_name);
        let partial = self.dir.join(format!("{}.part", file_name));
        fs::write(&partial, bytes).map_err(io_err(&partial))?;
        fs::rename(&partial, &path).map_err(io_err(&path))?;
        known.insert(digest);
        info!(file = %file_name, bytes = bytes.len(), "Image saved");

        self.trim(Some(file_name.as_str()))?;
        Ok(PersistOutcome::Saved(path))
    }

    /// Deletes files beyond the ceiling. Returns what was removed.
    pub fn enforce_ceiling(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.trim(None)
    }

    fn trim(&self, keep: Option<&str>) -> Result<Vec<PathBuf>, StoreError> {
        let count = self.relevant_count()?;
        if count <= self.max_retained {
            return Ok(Vec::new());
        }
        self.evict(count - self.max_retained, keep)
    }

    // * Non-slot files first (lexicographic), then slots by number; `keep` is never a candidate
    fn eviction_order(&self, names: Vec<String>, keep: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = names
            .into_iter()
            .filter(|name| Some(name.as_str()) != keep)
            .collect();
        names.sort_by(|a, b| match (self.slot_of(a), self.slot_of(b)) {
            (None, None) => a.cmp(b),
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        });
        names
    }

    fn evict(&self, how_many: usize, keep: Option<&str>) -> Result<Vec<PathBuf>, StoreError> {
        let names = self.eviction_order(self.relevant_names()?, keep);

        let mut removed = Vec::new();
        for name in names.into_iter().take(how_many) {
            let path = self.dir.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %name, "Evicted to respect retained-count ceiling");
                    removed.push(path);
                }
                Err(e) => warn!(file = %name, error = %e, "Eviction failed"),
            }
        }
        Ok(removed)
    }
}
