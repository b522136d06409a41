//! # Storage Module
//!
//! Handles all data persistence for the taxi ledger.
//!
//! This module abstracts away the specific storage implementation and gives
//! the domain layer a consistent interface for persisting and retrieving
//! data. The implementation can be swapped (JSON snapshot, SQL database,
//! cloud storage, ...) without touching domain logic.
//!
//! ## Key Responsibilities
//!
//! - **Data Persistence**: Saving vehicles, employees, revenue records and
//!   settlements to disk
//! - **Data Retrieval**: Loading stored data back into memory
//! - **Storage Abstraction**: A consistent API regardless of backend
//! - **Write Safety**: Atomic snapshot writes so a crash never leaves a
//!   half-written data file
//!
//! ## Current Implementation
//!
//! A single JSON document (`taxi-ledger-data.json`) holds the entire ledger.
//! The dataset is one household's taxi fleet, small enough that reading and
//! rewriting the whole document per operation is simpler and safer than
//! partial updates.
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: Clean separation between domain and data access
//! - **Interface Segregation**: Focused traits per entity
//! - **Dependency Inversion**: Domain depends on storage traits, not
//!   implementations

pub mod json;
pub mod traits;

// Re-export the main types that other modules need
pub use json::JsonConnection;
pub use traits::{
    AbrechnungStorage,
    Connection,
    FahrzeugStorage,
    MitarbeiterStorage,
    UmsatzStorage,
};
