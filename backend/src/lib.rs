//! # Taxi Ledger Backend
//!
//! Contains all non-UI logic for the taxi fleet ledger application.
//!
//! This crate brings together:
//! - **Domain**: Business rules for vehicles, drivers, weekly revenue and settlements
//! - **Storage**: The JSON snapshot document the whole ledger persists to
//!
//! The backend is UI-agnostic: a desktop shell, a web handler layer or a CLI
//! can sit on top of [`AppState`] without modification.
//!
//! ## Key Responsibilities
//!
//! - Initialize the snapshot store and seed it on first start
//! - Construct and wire all domain services over one shared connection
//! - Re-export the service and storage types a caller needs

pub mod domain;
pub mod storage;

use anyhow::Result;
use log::info;
use std::path::Path;
use std::sync::Arc;

pub use domain::*;
pub use storage::JsonConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub fahrzeug_service: FahrzeugService<JsonConnection>,
    pub mitarbeiter_service: MitarbeiterService<JsonConnection>,
    pub umsatz_service: UmsatzService<JsonConnection>,
    pub abrechnung_service: AbrechnungService<JsonConnection>,
    pub statistik_service: StatistikService<JsonConnection>,
    pub calendar_service: CalendarService,
}

/// Initialize the backend against the default data directory
pub fn initialize_backend() -> Result<AppState> {
    let connection = JsonConnection::new_default()?;
    initialize_with_connection(connection)
}

/// Initialize the backend against a specific data directory. Used by tests
/// and portable installations that keep their data next to the executable.
pub fn initialize_backend_at<P: AsRef<Path>>(base_directory: P) -> Result<AppState> {
    let connection = JsonConnection::new(base_directory)?;
    initialize_with_connection(connection)
}

fn initialize_with_connection(connection: JsonConnection) -> Result<AppState> {
    info!(
        "Setting up snapshot store in {}",
        connection.base_directory().display()
    );
    connection.initialize()?;

    info!("Setting up domain services");
    let connection = Arc::new(connection);
    let app_state = AppState {
        fahrzeug_service: FahrzeugService::new(connection.clone()),
        mitarbeiter_service: MitarbeiterService::new(connection.clone()),
        umsatz_service: UmsatzService::new(connection.clone()),
        abrechnung_service: AbrechnungService::new(connection.clone()),
        statistik_service: StatistikService::new(connection.clone()),
        calendar_service: CalendarService::new(),
    };

    Ok(app_state)
}
