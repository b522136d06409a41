//! Weekly revenue capture and aggregation.
//!
//! The quick-entry flow upserts: entering numbers for a week that already
//! has a record replaces that record's values instead of creating a
//! duplicate, so every (employee, week) pair keeps at most one record.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::{Connection, MitarbeiterStorage, UmsatzStorage};
use shared::{
    Kalenderwoche, Umsatz, UmsatzListResponse, UmsatzResponse, UmsatzWerte, UpsertUmsatzRequest,
};

/// Field-wise sums over a set of weekly revenue records.
///
/// Aggregation is order-independent and an empty input yields all zeros, so
/// a settlement over weeks without any records comes out as zero rather
/// than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UmsatzAggregat {
    pub gesamtumsatz: f64,
    pub netto_fahrpreis: f64,
    pub aktionen: f64,
    pub rueckerstattungen: f64,
    pub trinkgeld: f64,
    pub bargeld: f64,
    pub fahrten: u32,
    pub waschen: f64,
}

impl UmsatzAggregat {
    /// Add one record's quantities to the running sums
    pub fn add(&mut self, umsatz: &Umsatz) {
        self.gesamtumsatz += umsatz.gesamtumsatz;
        self.netto_fahrpreis += umsatz.netto_fahrpreis;
        self.aktionen += umsatz.aktionen;
        self.rueckerstattungen += umsatz.rueckerstattungen;
        self.trinkgeld += umsatz.trinkgeld;
        self.bargeld += umsatz.bargeld;
        self.fahrten += umsatz.fahrten;
        self.waschen += umsatz.waschen;
    }

    /// Sum all records of the iterator
    pub fn aus_umsaetzen<'a, I>(umsaetze: I) -> Self
    where
        I: IntoIterator<Item = &'a Umsatz>,
    {
        let mut aggregat = Self::default();
        for umsatz in umsaetze {
            aggregat.add(umsatz);
        }
        aggregat
    }
}

/// Service for capturing and querying weekly revenue records
#[derive(Clone)]
pub struct UmsatzService<C: Connection> {
    umsatz_repository: C::UmsatzRepository,
    mitarbeiter_repository: C::MitarbeiterRepository,
}

impl<C: Connection> UmsatzService<C> {
    /// Create a new UmsatzService
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            umsatz_repository: connection.create_umsatz_repository(),
            mitarbeiter_repository: connection.create_mitarbeiter_repository(),
        }
    }

    /// Quick entry: store the revenue record for one employee and week,
    /// replacing the values of an existing record for that week instead of
    /// creating a duplicate.
    pub async fn upsert_umsatz(&self, request: UpsertUmsatzRequest) -> Result<UmsatzResponse> {
        info!(
            "Capturing revenue for employee {} in week {}-{:02}",
            request.mitarbeiter_id, request.jahr, request.wochen_nummer
        );

        if request.wochen_nummer == 0 {
            return Err(anyhow::anyhow!("Week number must be at least 1"));
        }

        self.mitarbeiter_repository
            .get_mitarbeiter(&request.mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", request.mitarbeiter_id))?;

        let woche = Kalenderwoche::new(request.jahr, request.wochen_nummer);
        let existing = self
            .umsatz_repository
            .find_umsatz_fuer_woche(&request.mitarbeiter_id, request.jahr, request.wochen_nummer)
            .await?;

        match existing {
            Some(mut umsatz) => {
                Self::werte_uebernehmen(&mut umsatz, &request.werte);
                umsatz.erfasst_am = Utc::now().to_rfc3339();

                self.umsatz_repository.update_umsatz(&umsatz).await?;

                info!("Replaced revenue record {} for week {}", umsatz.id, woche.id());

                Ok(UmsatzResponse {
                    success_message: format!("Umsatz für {} wurde aktualisiert.", woche.anzeige()),
                    aktualisiert: true,
                    umsatz,
                })
            }
            None => {
                let mut umsatz = Umsatz {
                    id: Uuid::new_v4().to_string(),
                    mitarbeiter_id: request.mitarbeiter_id,
                    wochen_nummer: request.wochen_nummer,
                    jahr: request.jahr,
                    kalenderwoche: woche.id(),
                    erfasst_am: Utc::now().to_rfc3339(),
                    gesamtumsatz: 0.0,
                    netto_fahrpreis: 0.0,
                    aktionen: 0.0,
                    rueckerstattungen: 0.0,
                    trinkgeld: 0.0,
                    bargeld: 0.0,
                    fahrten: 0,
                    waschen: 0.0,
                };
                Self::werte_uebernehmen(&mut umsatz, &request.werte);

                self.umsatz_repository.store_umsatz(&umsatz).await?;

                info!("Stored revenue record {} for week {}", umsatz.id, woche.id());

                Ok(UmsatzResponse {
                    success_message: format!("Umsatz für {} wurde gespeichert.", woche.anzeige()),
                    aktualisiert: false,
                    umsatz,
                })
            }
        }
    }

    /// Replace the quantities of an existing record, matched by ID. Used by
    /// the edit dialog on the revenue list.
    pub async fn update_werte(&self, umsatz_id: &str, werte: UmsatzWerte) -> Result<UmsatzResponse> {
        info!("Updating revenue record: {}", umsatz_id);

        let mut umsatz = self
            .umsatz_repository
            .get_umsatz(umsatz_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Umsatz not found: {}", umsatz_id))?;

        Self::werte_uebernehmen(&mut umsatz, &werte);
        umsatz.erfasst_am = Utc::now().to_rfc3339();

        self.umsatz_repository.update_umsatz(&umsatz).await?;

        Ok(UmsatzResponse {
            success_message: format!("Umsatz für {} wurde aktualisiert.", umsatz.woche().anzeige()),
            aktualisiert: true,
            umsatz,
        })
    }

    /// Get a revenue record by ID
    pub async fn get_umsatz(&self, umsatz_id: &str) -> Result<Option<Umsatz>> {
        let umsatz = self.umsatz_repository.get_umsatz(umsatz_id).await?;

        if umsatz.is_none() {
            warn!("Revenue record not found: {}", umsatz_id);
        }

        Ok(umsatz)
    }

    /// List all revenue records, newest week first
    pub async fn list_umsaetze(&self) -> Result<UmsatzListResponse> {
        let mut umsaetze = self.umsatz_repository.list_umsaetze().await?;
        umsaetze.sort_by(|a, b| b.woche().cmp(&a.woche()));
        Ok(UmsatzListResponse { umsaetze })
    }

    /// List all revenue records of one employee, newest week first
    pub async fn list_umsaetze_fuer_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
    ) -> Result<UmsatzListResponse> {
        let mut umsaetze = self
            .umsatz_repository
            .list_umsaetze_fuer_mitarbeiter(mitarbeiter_id)
            .await?;
        umsaetze.sort_by(|a, b| b.woche().cmp(&a.woche()));
        Ok(UmsatzListResponse { umsaetze })
    }

    /// Distinct weeks an employee has revenue recorded for, newest first.
    /// Feeds the week picker on the settlement form.
    pub async fn wochen_mit_daten(&self, mitarbeiter_id: &str) -> Result<Vec<Kalenderwoche>> {
        let umsaetze = self
            .umsatz_repository
            .list_umsaetze_fuer_mitarbeiter(mitarbeiter_id)
            .await?;

        let wochen: BTreeSet<Kalenderwoche> = umsaetze.iter().map(|u| u.woche()).collect();
        Ok(wochen.into_iter().rev().collect())
    }

    /// Delete a revenue record
    pub async fn delete_umsatz(&self, umsatz_id: &str) -> Result<()> {
        info!("Deleting revenue record: {}", umsatz_id);

        let deleted = self.umsatz_repository.delete_umsatz(umsatz_id).await?;
        if !deleted {
            return Err(anyhow::anyhow!("Umsatz not found: {}", umsatz_id));
        }

        Ok(())
    }

    fn werte_uebernehmen(umsatz: &mut Umsatz, werte: &UmsatzWerte) {
        umsatz.gesamtumsatz = werte.gesamtumsatz;
        umsatz.netto_fahrpreis = werte.netto_fahrpreis;
        umsatz.aktionen = werte.aktionen;
        umsatz.rueckerstattungen = werte.rueckerstattungen;
        umsatz.trinkgeld = werte.trinkgeld;
        umsatz.bargeld = werte.bargeld;
        umsatz.fahrten = werte.fahrten;
        umsatz.waschen = werte.waschen;
    }
}
