use anyhow::Result;
use chrono::Local;
use log::{info, warn};
use shared::Datenbestand;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::storage::traits::Connection;

/// Name of the snapshot document inside the data directory
pub const DATA_FILE_NAME: &str = "taxi-ledger-data.json";

/// Errors raised while reading or writing the snapshot document
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read data file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("data file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize ledger data for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write data file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// JsonConnection manages the snapshot file and serializes access to it.
///
/// All repositories created from one connection share the same document, so
/// every read-modify-write cycle runs under a common lock. The lock is only
/// held around synchronous filesystem work, never across an await point.
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
    document_lock: Arc<Mutex<()>>,
}

impl JsonConnection {
    /// Create a new JSON connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
            document_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a new JSON connection in the default data directory,
    /// ~/Documents/Taxi Ledger
    pub fn new_default() -> Result<Self> {
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let data_dir = PathBuf::from(home_dir).join("Documents").join("Taxi Ledger");
        info!("Using data directory: {}", data_dir.display());

        Self::new(data_dir)
    }

    /// Path of the snapshot document
    pub fn data_file_path(&self) -> PathBuf {
        self.base_directory.join(DATA_FILE_NAME)
    }

    /// The base directory this connection works in
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// First-run setup: load the snapshot if one exists, otherwise create it
    /// with the example dataset so the application starts usable.
    pub fn initialize(&self) -> Result<Datenbestand> {
        let _guard = self.document_lock.lock().unwrap();

        if self.data_file_path().exists() {
            let bestand = self.read_document()?;
            info!(
                "Loaded ledger data: {} vehicles, {} employees, {} revenue records, {} settlements",
                bestand.fahrzeuge.len(),
                bestand.mitarbeiter.len(),
                bestand.umsaetze.len(),
                bestand.abrechnungen.len()
            );
            return Ok(bestand);
        }

        let heute = Local::now().date_naive();
        let bestand = Datenbestand::mit_beispieldaten(heute);
        self.write_document(&bestand)?;
        info!(
            "Created new data file with example data: {}",
            self.data_file_path().display()
        );

        Ok(bestand)
    }

    /// Read the current snapshot. A missing file is an empty ledger, not an
    /// error; `initialize` decides whether to seed example data.
    pub fn load(&self) -> Result<Datenbestand> {
        let _guard = self.document_lock.lock().unwrap();
        Ok(self.read_document()?)
    }

    /// Apply a change to the snapshot and persist it. The closure's error
    /// aborts the cycle before anything is written.
    pub fn modify<T>(
        &self,
        apply: impl FnOnce(&mut Datenbestand) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.document_lock.lock().unwrap();

        let mut bestand = self.read_document()?;
        let outcome = apply(&mut bestand)?;
        self.write_document(&bestand)?;

        Ok(outcome)
    }

    fn read_document(&self) -> Result<Datenbestand, SnapshotError> {
        let path = self.data_file_path();

        if !path.exists() {
            warn!("Data file {} does not exist, starting empty", path.display());
            return Ok(Datenbestand::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| SnapshotError::Read {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| SnapshotError::Parse { path, source })
    }

    fn write_document(&self, bestand: &Datenbestand) -> Result<(), SnapshotError> {
        let path = self.data_file_path();

        let json = serde_json::to_string_pretty(bestand).map_err(|source| {
            SnapshotError::Serialize {
                path: path.clone(),
                source,
            }
        })?;

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|source| SnapshotError::Write {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }
}


impl Connection for JsonConnection {
    type FahrzeugRepository = super::fahrzeug_repository::FahrzeugRepository;
    type MitarbeiterRepository = super::mitarbeiter_repository::MitarbeiterRepository;
    type UmsatzRepository = super::umsatz_repository::UmsatzRepository;
    type AbrechnungRepository = super::abrechnung_repository::AbrechnungRepository;

    fn create_fahrzeug_repository(&self) -> Self::FahrzeugRepository {
        super::fahrzeug_repository::FahrzeugRepository::new(self.clone())
    }

    fn create_mitarbeiter_repository(&self) -> Self::MitarbeiterRepository {
        super::mitarbeiter_repository::MitarbeiterRepository::new(self.clone())
    }

    fn create_umsatz_repository(&self) -> Self::UmsatzRepository {
        super::umsatz_repository::UmsatzRepository::new(self.clone())
    }

    fn create_abrechnung_repository(&self) -> Self::AbrechnungRepository {
        super::abrechnung_repository::AbrechnungRepository::new(self.clone())
    }
}
