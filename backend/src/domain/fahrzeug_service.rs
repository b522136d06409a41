//! Vehicle management: fleet vehicles and their recurring cost items.

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::{Connection, FahrzeugStorage};
use shared::{
    CreateFahrzeugRequest, CreateKostenRequest, Fahrzeug, FahrzeugKosten, FahrzeugListResponse,
    FahrzeugResponse, UpdateFahrzeugRequest, UpdateKostenRequest,
};

/// Service for managing fleet vehicles and their recurring cost items
#[derive(Clone)]
pub struct FahrzeugService<C: Connection> {
    fahrzeug_repository: C::FahrzeugRepository,
}

impl<C: Connection> FahrzeugService<C> {
    /// Create a new FahrzeugService
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            fahrzeug_repository: connection.create_fahrzeug_repository(),
        }
    }

    /// Create a new vehicle
    pub async fn create_fahrzeug(
        &self,
        request: CreateFahrzeugRequest,
    ) -> Result<FahrzeugResponse> {
        info!(
            "Creating vehicle: {} {} ({})",
            request.marke, request.modell, request.kennzeichen
        );

        self.validate_create_request(&request)?;

        let fahrzeug = Fahrzeug {
            id: Uuid::new_v4().to_string(),
            kennzeichen: request.kennzeichen.trim().to_string(),
            marke: request.marke.trim().to_string(),
            modell: request.modell.trim().to_string(),
            baujahr: request.baujahr,
            aktiv: request.aktiv,
            kosten: Vec::new(),
        };

        self.fahrzeug_repository.store_fahrzeug(&fahrzeug).await?;

        info!("Created vehicle {} with ID: {}", fahrzeug.kennzeichen, fahrzeug.id);

        Ok(FahrzeugResponse {
            success_message: format!(
                "{} {} wurde erfolgreich hinzugefügt.",
                fahrzeug.marke, fahrzeug.modell
            ),
            fahrzeug,
        })
    }

    /// Get a vehicle by ID
    pub async fn get_fahrzeug(&self, fahrzeug_id: &str) -> Result<Option<Fahrzeug>> {
        let fahrzeug = self.fahrzeug_repository.get_fahrzeug(fahrzeug_id).await?;

        if fahrzeug.is_none() {
            warn!("Vehicle not found: {}", fahrzeug_id);
        }

        Ok(fahrzeug)
    }

    /// List all vehicles
    pub async fn list_fahrzeuge(&self) -> Result<FahrzeugListResponse> {
        let fahrzeuge = self.fahrzeug_repository.list_fahrzeuge().await?;
        Ok(FahrzeugListResponse { fahrzeuge })
    }

    /// Update an existing vehicle. Cost items are managed by their own
    /// operations and stay untouched here.
    pub async fn update_fahrzeug(
        &self,
        fahrzeug_id: &str,
        request: UpdateFahrzeugRequest,
    ) -> Result<FahrzeugResponse> {
        info!("Updating vehicle: {}", fahrzeug_id);

        let mut fahrzeug = self
            .fahrzeug_repository
            .get_fahrzeug(fahrzeug_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug_id))?;

        self.validate_update_request(&request)?;

        if let Some(kennzeichen) = request.kennzeichen {
            fahrzeug.kennzeichen = kennzeichen.trim().to_string();
        }
        if let Some(marke) = request.marke {
            fahrzeug.marke = marke.trim().to_string();
        }
        if let Some(modell) = request.modell {
            fahrzeug.modell = modell.trim().to_string();
        }
        if let Some(baujahr) = request.baujahr {
            fahrzeug.baujahr = baujahr;
        }
        if let Some(aktiv) = request.aktiv {
            fahrzeug.aktiv = aktiv;
        }

        self.fahrzeug_repository.update_fahrzeug(&fahrzeug).await?;

        info!("Updated vehicle {} with ID: {}", fahrzeug.kennzeichen, fahrzeug.id);

        Ok(FahrzeugResponse {
            success_message: format!("{} {} wurde aktualisiert.", fahrzeug.marke, fahrzeug.modell),
            fahrzeug,
        })
    }

    /// Delete a vehicle. Employees referencing it keep their `fahrzeug_id`;
    /// the reference is allowed to dangle.
    pub async fn delete_fahrzeug(&self, fahrzeug_id: &str) -> Result<()> {
        info!("Deleting vehicle: {}", fahrzeug_id);

        let fahrzeug = self
            .fahrzeug_repository
            .get_fahrzeug(fahrzeug_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug_id))?;

        self.fahrzeug_repository.delete_fahrzeug(fahrzeug_id).await?;

        info!("Deleted vehicle: {} ({})", fahrzeug.kennzeichen, fahrzeug.id);

        Ok(())
    }

    /// Add a recurring cost item to a vehicle. The monthly equivalent is
    /// derived from amount and payment frequency.
    pub async fn add_kosten(
        &self,
        fahrzeug_id: &str,
        request: CreateKostenRequest,
    ) -> Result<FahrzeugResponse> {
        info!(
            "Adding cost item '{}' to vehicle {}",
            request.bezeichnung, fahrzeug_id
        );

        if request.bezeichnung.trim().is_empty() {
            return Err(anyhow::anyhow!("Cost description cannot be empty"));
        }
        if request.betrag <= 0.0 {
            return Err(anyhow::anyhow!("Cost amount must be greater than zero"));
        }

        let mut fahrzeug = self
            .fahrzeug_repository
            .get_fahrzeug(fahrzeug_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug_id))?;

        let kosten = FahrzeugKosten {
            id: Uuid::new_v4().to_string(),
            bezeichnung: request.bezeichnung.trim().to_string(),
            betrag: request.betrag,
            zahlungsturnus: request.zahlungsturnus,
            faellig_am: request.faellig_am,
            monatlich_umgerechnet: request.zahlungsturnus.monatlicher_betrag(request.betrag),
        };
        fahrzeug.kosten.push(kosten);

        self.fahrzeug_repository.update_fahrzeug(&fahrzeug).await?;

        Ok(FahrzeugResponse {
            success_message: "Kosten wurden hinzugefügt.".to_string(),
            fahrzeug,
        })
    }

    /// Update a cost item. The monthly equivalent is always recomputed from
    /// the resulting amount and frequency, never taken from the caller.
    pub async fn update_kosten(
        &self,
        fahrzeug_id: &str,
        kosten_id: &str,
        request: UpdateKostenRequest,
    ) -> Result<FahrzeugResponse> {
        info!("Updating cost item {} of vehicle {}", kosten_id, fahrzeug_id);

        if let Some(ref bezeichnung) = request.bezeichnung {
            if bezeichnung.trim().is_empty() {
                return Err(anyhow::anyhow!("Cost description cannot be empty"));
            }
        }
        if let Some(betrag) = request.betrag {
            if betrag <= 0.0 {
                return Err(anyhow::anyhow!("Cost amount must be greater than zero"));
            }
        }

        let mut fahrzeug = self
            .fahrzeug_repository
            .get_fahrzeug(fahrzeug_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug_id))?;

        let kosten = fahrzeug
            .kosten
            .iter_mut()
            .find(|k| k.id == kosten_id)
            .ok_or_else(|| anyhow::anyhow!("Kosten not found: {}", kosten_id))?;

        if let Some(bezeichnung) = request.bezeichnung {
            kosten.bezeichnung = bezeichnung.trim().to_string();
        }
        if let Some(betrag) = request.betrag {
            kosten.betrag = betrag;
        }
        if let Some(zahlungsturnus) = request.zahlungsturnus {
            kosten.zahlungsturnus = zahlungsturnus;
        }
        if let Some(faellig_am) = request.faellig_am {
            kosten.faellig_am = faellig_am;
        }
        kosten.monatlich_umgerechnet = kosten.zahlungsturnus.monatlicher_betrag(kosten.betrag);

        self.fahrzeug_repository.update_fahrzeug(&fahrzeug).await?;

        Ok(FahrzeugResponse {
            success_message: "Kosten wurden aktualisiert.".to_string(),
            fahrzeug,
        })
    }

    /// Remove a cost item from a vehicle
    pub async fn delete_kosten(
        &self,
        fahrzeug_id: &str,
        kosten_id: &str,
    ) -> Result<FahrzeugResponse> {
        info!("Deleting cost item {} of vehicle {}", kosten_id, fahrzeug_id);

        let mut fahrzeug = self
            .fahrzeug_repository
            .get_fahrzeug(fahrzeug_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug_id))?;

        let before = fahrzeug.kosten.len();
        fahrzeug.kosten.retain(|k| k.id != kosten_id);
        if fahrzeug.kosten.len() == before {
            return Err(anyhow::anyhow!("Kosten not found: {}", kosten_id));
        }

        self.fahrzeug_repository.update_fahrzeug(&fahrzeug).await?;

        Ok(FahrzeugResponse {
            success_message: "Kosten wurden gelöscht.".to_string(),
            fahrzeug,
        })
    }

    /// Validate create vehicle request
    fn validate_create_request(&self, request: &CreateFahrzeugRequest) -> Result<()> {
        if request.kennzeichen.trim().is_empty() {
            return Err(anyhow::anyhow!("License plate cannot be empty"));
        }
        if request.marke.trim().is_empty() {
            return Err(anyhow::anyhow!("Make cannot be empty"));
        }
        if request.modell.trim().is_empty() {
            return Err(anyhow::anyhow!("Model cannot be empty"));
        }
        self.validate_baujahr(request.baujahr)?;

        Ok(())
    }

    /// Validate update vehicle request
    fn validate_update_request(&self, request: &UpdateFahrzeugRequest) -> Result<()> {
        if let Some(ref kennzeichen) = request.kennzeichen {
            if kennzeichen.trim().is_empty() {
                return Err(anyhow::anyhow!("License plate cannot be empty"));
            }
        }
        if let Some(ref marke) = request.marke {
            if marke.trim().is_empty() {
                return Err(anyhow::anyhow!("Make cannot be empty"));
            }
        }
        if let Some(ref modell) = request.modell {
            if modell.trim().is_empty() {
                return Err(anyhow::anyhow!("Model cannot be empty"));
            }
        }
        if let Some(baujahr) = request.baujahr {
            self.validate_baujahr(baujahr)?;
        }

        Ok(())
    }

    fn validate_baujahr(&self, baujahr: i32) -> Result<()> {
        if !(1950..=2100).contains(&baujahr) {
            return Err(anyhow::anyhow!("Baujahr must be between 1950 and 2100"));
        }
        Ok(())
    }
}
