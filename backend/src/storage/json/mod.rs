//! # JSON Storage Module
//!
//! This module provides a JSON-snapshot storage implementation for the taxi
//! ledger. The whole application state lives in a single document,
//! `taxi-ledger-data.json`, with four top-level collections:
//!
//! ```json
//! {
//!   "fahrzeuge": [...],
//!   "mitarbeiter": [...],
//!   "umsaetze": [...],
//!   "abrechnungen": [...]
//! }
//! ```
//!
//! Every repository operation reads the document, applies its change and
//! atomically rewrites the file (temp file + rename). The connection
//! serializes these read-modify-write cycles so concurrent operations can
//! never interleave on the file.

pub mod abrechnung_repository;
pub mod connection;
pub mod fahrzeug_repository;
pub mod mitarbeiter_repository;
pub mod umsatz_repository;

pub use abrechnung_repository::AbrechnungRepository;
pub use connection::{JsonConnection, SnapshotError, DATA_FILE_NAME};
pub use fahrzeug_repository::FahrzeugRepository;
pub use mitarbeiter_repository::MitarbeiterRepository;
pub use umsatz_repository::UmsatzRepository;
