//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Abrechnung, Fahrzeug, Mitarbeiter, Umsatz};

/// Trait defining the interface for vehicle storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// without modification.
#[async_trait]
pub trait FahrzeugStorage: Send + Sync {
    /// Store a new vehicle
    async fn store_fahrzeug(&self, fahrzeug: &Fahrzeug) -> Result<()>;

    /// Retrieve a specific vehicle by ID
    async fn get_fahrzeug(&self, fahrzeug_id: &str) -> Result<Option<Fahrzeug>>;

    /// List all vehicles in insertion order
    async fn list_fahrzeuge(&self) -> Result<Vec<Fahrzeug>>;

    /// Update an existing vehicle (matched by ID)
    async fn update_fahrzeug(&self, fahrzeug: &Fahrzeug) -> Result<()>;

    /// Delete a vehicle by ID
    /// Returns true if the vehicle was found and deleted, false otherwise
    async fn delete_fahrzeug(&self, fahrzeug_id: &str) -> Result<bool>;
}

/// Trait defining the interface for employee storage operations
#[async_trait]
pub trait MitarbeiterStorage: Send + Sync {
    /// Store a new employee
    async fn store_mitarbeiter(&self, mitarbeiter: &Mitarbeiter) -> Result<()>;

    /// Retrieve a specific employee by ID
    async fn get_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<Option<Mitarbeiter>>;

    /// List all employees in insertion order
    async fn list_mitarbeiter(&self) -> Result<Vec<Mitarbeiter>>;

    /// Update an existing employee (matched by ID)
    async fn update_mitarbeiter(&self, mitarbeiter: &Mitarbeiter) -> Result<()>;

    /// Delete an employee by ID
    /// Returns true if the employee was found and deleted, false otherwise
    async fn delete_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<bool>;
}

/// Trait defining the interface for weekly revenue storage operations
#[async_trait]
pub trait UmsatzStorage: Send + Sync {
    /// Store a new revenue record
    async fn store_umsatz(&self, umsatz: &Umsatz) -> Result<()>;

    /// Retrieve a specific revenue record by ID
    async fn get_umsatz(&self, umsatz_id: &str) -> Result<Option<Umsatz>>;

    /// List all revenue records in insertion order
    async fn list_umsaetze(&self) -> Result<Vec<Umsatz>>;

    /// List all revenue records of one employee in insertion order
    async fn list_umsaetze_fuer_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<Vec<Umsatz>>;

    /// Find the revenue record of one employee for one calendar week.
    /// When duplicates exist the first stored record wins; the quick-entry
    /// flow keeps at most one record per (employee, week) pair.
    async fn find_umsatz_fuer_woche(
        &self,
        mitarbeiter_id: &str,
        jahr: i32,
        wochen_nummer: u32,
    ) -> Result<Option<Umsatz>>;

    /// Update an existing revenue record (matched by ID)
    async fn update_umsatz(&self, umsatz: &Umsatz) -> Result<()>;

    /// Delete a revenue record by ID
    /// Returns true if the record was found and deleted, false otherwise
    async fn delete_umsatz(&self, umsatz_id: &str) -> Result<bool>;
}

/// Trait defining the interface for settlement storage operations.
///
/// Settlements are append-only: there is deliberately no update operation,
/// a stored settlement is a historical document.
#[async_trait]
pub trait AbrechnungStorage: Send + Sync {
    /// Store a new settlement
    async fn store_abrechnung(&self, abrechnung: &Abrechnung) -> Result<()>;

    /// Retrieve a specific settlement by ID
    async fn get_abrechnung(&self, abrechnung_id: &str) -> Result<Option<Abrechnung>>;

    /// List all settlements in insertion order
    async fn list_abrechnungen(&self) -> Result<Vec<Abrechnung>>;

    /// List all settlements of one employee in insertion order
    async fn list_abrechnungen_fuer_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
    ) -> Result<Vec<Abrechnung>>;

    /// Delete a settlement by ID
    /// Returns true if the settlement was found and deleted, false otherwise
    async fn delete_abrechnung(&self, abrechnung_id: &str) -> Result<bool>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides
/// factory methods for creating repositories. This allows the domain layer
/// to work with any storage backend without knowing the implementation
/// details.
pub trait Connection: Send + Sync + Clone {
    /// The type of FahrzeugStorage this connection creates
    type FahrzeugRepository: FahrzeugStorage + Clone;

    /// The type of MitarbeiterStorage this connection creates
    type MitarbeiterRepository: MitarbeiterStorage + Clone;

    /// The type of UmsatzStorage this connection creates
    type UmsatzRepository: UmsatzStorage + Clone;

    /// The type of AbrechnungStorage this connection creates
    type AbrechnungRepository: AbrechnungStorage + Clone;

    /// Create a new vehicle repository for this connection
    fn create_fahrzeug_repository(&self) -> Self::FahrzeugRepository;

    /// Create a new employee repository for this connection
    fn create_mitarbeiter_repository(&self) -> Self::MitarbeiterRepository;

    /// Create a new revenue repository for this connection
    fn create_umsatz_repository(&self) -> Self::UmsatzRepository;

    /// Create a new settlement repository for this connection
    fn create_abrechnung_repository(&self) -> Self::AbrechnungRepository;
}
