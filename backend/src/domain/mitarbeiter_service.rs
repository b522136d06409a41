//! Employee management: drivers and their pay terms.

use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::{Connection, MitarbeiterStorage};
use shared::{
    CreateMitarbeiterRequest, Mitarbeiter, MitarbeiterListResponse, MitarbeiterResponse,
    UpdateMitarbeiterRequest,
};

/// Service for managing employees in the taxi ledger
#[derive(Clone)]
pub struct MitarbeiterService<C: Connection> {
    mitarbeiter_repository: C::MitarbeiterRepository,
}

impl<C: Connection> MitarbeiterService<C> {
    /// Create a new MitarbeiterService
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            mitarbeiter_repository: connection.create_mitarbeiter_repository(),
        }
    }

    /// Create a new employee
    pub async fn create_mitarbeiter(
        &self,
        request: CreateMitarbeiterRequest,
    ) -> Result<MitarbeiterResponse> {
        info!(
            "Creating employee: {} {}",
            request.vorname, request.nachname
        );

        self.validate_create_request(&request)?;

        let mitarbeiter = Mitarbeiter {
            id: Uuid::new_v4().to_string(),
            vorname: request.vorname.trim().to_string(),
            nachname: request.nachname.trim().to_string(),
            email: request.email,
            telefon: request.telefon,
            einstellungsdatum: request.einstellungsdatum,
            aktiv: request.aktiv,
            fahrzeug_id: request.fahrzeug_id,
            steuer: request.steuer,
            netto_gehalt: request.netto_gehalt,
            stundenlohn: request.stundenlohn,
            prozent_verguetung: request.prozent_verguetung,
            soll_fahrten_anzahl: request.soll_fahrten_anzahl,
            krankenversicherung: request.krankenversicherung,
        };

        self.mitarbeiter_repository
            .store_mitarbeiter(&mitarbeiter)
            .await?;

        info!(
            "Created employee {} with ID: {}",
            mitarbeiter.voller_name(),
            mitarbeiter.id
        );

        Ok(MitarbeiterResponse {
            success_message: format!(
                "{} wurde erfolgreich hinzugefügt.",
                mitarbeiter.voller_name()
            ),
            mitarbeiter,
        })
    }

    /// Get an employee by ID
    pub async fn get_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<Option<Mitarbeiter>> {
        let mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(mitarbeiter_id)
            .await?;

        if mitarbeiter.is_none() {
            warn!("Employee not found: {}", mitarbeiter_id);
        }

        Ok(mitarbeiter)
    }

    /// List all employees
    pub async fn list_mitarbeiter(&self) -> Result<MitarbeiterListResponse> {
        let mitarbeiter = self.mitarbeiter_repository.list_mitarbeiter().await?;
        Ok(MitarbeiterListResponse { mitarbeiter })
    }

    /// Update an existing employee. Double-wrapped options distinguish
    /// "leave unchanged" (outer None) from "clear the field" (Some(None)).
    pub async fn update_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
        request: UpdateMitarbeiterRequest,
    ) -> Result<MitarbeiterResponse> {
        info!("Updating employee: {}", mitarbeiter_id);

        let mut mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", mitarbeiter_id))?;

        self.validate_update_request(&request)?;

        if let Some(vorname) = request.vorname {
            mitarbeiter.vorname = vorname.trim().to_string();
        }
        if let Some(nachname) = request.nachname {
            mitarbeiter.nachname = nachname.trim().to_string();
        }
        if let Some(email) = request.email {
            mitarbeiter.email = email;
        }
        if let Some(telefon) = request.telefon {
            mitarbeiter.telefon = telefon;
        }
        if let Some(einstellungsdatum) = request.einstellungsdatum {
            mitarbeiter.einstellungsdatum = einstellungsdatum;
        }
        if let Some(aktiv) = request.aktiv {
            mitarbeiter.aktiv = aktiv;
        }
        if let Some(fahrzeug_id) = request.fahrzeug_id {
            mitarbeiter.fahrzeug_id = fahrzeug_id;
        }
        if let Some(steuer) = request.steuer {
            mitarbeiter.steuer = steuer;
        }
        if let Some(netto_gehalt) = request.netto_gehalt {
            mitarbeiter.netto_gehalt = netto_gehalt;
        }
        if let Some(stundenlohn) = request.stundenlohn {
            mitarbeiter.stundenlohn = stundenlohn;
        }
        if let Some(prozent_verguetung) = request.prozent_verguetung {
            mitarbeiter.prozent_verguetung = prozent_verguetung;
        }
        if let Some(soll_fahrten_anzahl) = request.soll_fahrten_anzahl {
            mitarbeiter.soll_fahrten_anzahl = soll_fahrten_anzahl;
        }
        if let Some(krankenversicherung) = request.krankenversicherung {
            mitarbeiter.krankenversicherung = krankenversicherung;
        }

        self.mitarbeiter_repository
            .update_mitarbeiter(&mitarbeiter)
            .await?;

        info!(
            "Updated employee {} with ID: {}",
            mitarbeiter.voller_name(),
            mitarbeiter.id
        );

        Ok(MitarbeiterResponse {
            success_message: format!(
                "Die Daten von {} wurden aktualisiert.",
                mitarbeiter.voller_name()
            ),
            mitarbeiter,
        })
    }

    /// Delete an employee. Their revenue records and settlements stay in the
    /// ledger as historical data.
    pub async fn delete_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<()> {
        info!("Deleting employee: {}", mitarbeiter_id);

        let mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", mitarbeiter_id))?;

        self.mitarbeiter_repository
            .delete_mitarbeiter(mitarbeiter_id)
            .await?;

        info!(
            "Deleted employee: {} ({})",
            mitarbeiter.voller_name(),
            mitarbeiter.id
        );

        Ok(())
    }

    /// Validate create employee request
    fn validate_create_request(&self, request: &CreateMitarbeiterRequest) -> Result<()> {
        if request.vorname.trim().is_empty() {
            return Err(anyhow::anyhow!("First name cannot be empty"));
        }
        if request.nachname.trim().is_empty() {
            return Err(anyhow::anyhow!("Last name cannot be empty"));
        }
        self.validate_datum(&request.einstellungsdatum)?;

        Ok(())
    }

    /// Validate update employee request
    fn validate_update_request(&self, request: &UpdateMitarbeiterRequest) -> Result<()> {
        if let Some(ref vorname) = request.vorname {
            if vorname.trim().is_empty() {
                return Err(anyhow::anyhow!("First name cannot be empty"));
            }
        }
        if let Some(ref nachname) = request.nachname {
            if nachname.trim().is_empty() {
                return Err(anyhow::anyhow!("Last name cannot be empty"));
            }
        }
        if let Some(ref einstellungsdatum) = request.einstellungsdatum {
            self.validate_datum(einstellungsdatum)?;
        }

        Ok(())
    }

    /// Validate hire date format (ISO 8601: YYYY-MM-DD)
    fn validate_datum(&self, datum: &str) -> Result<()> {
        NaiveDate::parse_from_str(datum, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Einstellungsdatum must be in YYYY-MM-DD format"))?;
        Ok(())
    }
}
