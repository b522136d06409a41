//! Settlement calculation and creation.
//!
//! A settlement ("Abrechnung") pays out one employee for a set of selected
//! calendar weeks: their percentage share of the aggregated gross revenue,
//! plus pass-through allowances (tips, car wash, reimbursements, ad-hoc
//! items), minus deductions (cash already kept, tax, net salary, ad-hoc
//! items). Once created a settlement is immutable; corrections are new
//! settlements.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::commands::abrechnungen::{AbrechnungVorgaben, AbrechnungVorschau};
use crate::domain::umsatz_service::UmsatzAggregat;
use crate::storage::{AbrechnungStorage, Connection, MitarbeiterStorage, UmsatzStorage};
use shared::{
    Abrechnung, AbrechnungFormValidation, AbrechnungListResponse, AbrechnungResponse,
    AbrechnungValidationError, CreateAbrechnungRequest, Kalenderwoche, PostenEingabe,
    SonstigerPosten, Umsatz,
};

/// Service for creating and querying settlements
#[derive(Clone)]
pub struct AbrechnungService<C: Connection> {
    abrechnung_repository: C::AbrechnungRepository,
    mitarbeiter_repository: C::MitarbeiterRepository,
    umsatz_repository: C::UmsatzRepository,
}

impl<C: Connection> AbrechnungService<C> {
    /// Create a new AbrechnungService
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            abrechnung_repository: connection.create_abrechnung_repository(),
            mitarbeiter_repository: connection.create_mitarbeiter_repository(),
            umsatz_repository: connection.create_umsatz_repository(),
        }
    }

    /// Validate the settlement form. Collects every problem instead of
    /// stopping at the first so the form can mark all offending fields.
    pub fn validate_form(&self, request: &CreateAbrechnungRequest) -> AbrechnungFormValidation {
        let mut errors = Vec::new();

        if request.mitarbeiter_id.trim().is_empty() {
            errors.push(AbrechnungValidationError::KeinMitarbeiterGewaehlt);
        }
        if request.wochen.is_empty() {
            errors.push(AbrechnungValidationError::KeineWochenGewaehlt);
        }

        for posten in request
            .sonstige_abzuege
            .iter()
            .chain(request.sonstige_zuschuesse.iter())
        {
            if posten.bezeichnung.trim().is_empty() {
                errors.push(AbrechnungValidationError::PostenOhneBezeichnung);
            }
            if posten.betrag <= 0.0 {
                errors.push(AbrechnungValidationError::PostenBetragNichtPositiv(
                    posten.betrag,
                ));
            }
        }

        AbrechnungFormValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// The settlement arithmetic, kept pure so the form can render a live
    /// preview from the same code path that creates the final document.
    ///
    /// The share is deliberately unclamped: a percentage outside 0..=100
    /// scales the payout proportionally, and a result below zero means the
    /// employee owes money.
    pub fn berechne(
        aggregat: UmsatzAggregat,
        prozent_verguetung: f64,
        steuer: f64,
        netto_gehalt: f64,
        sonstige_abzuege: &[PostenEingabe],
        sonstige_zuschuesse: &[PostenEingabe],
    ) -> AbrechnungVorschau {
        let anteil = aggregat.gesamtumsatz * prozent_verguetung / 100.0;

        let zuschuesse = aggregat.trinkgeld
            + aggregat.waschen
            + aggregat.rueckerstattungen
            + sonstige_zuschuesse.iter().map(|p| p.betrag).sum::<f64>();

        let abzuege = aggregat.bargeld
            + steuer
            + netto_gehalt
            + sonstige_abzuege.iter().map(|p| p.betrag).sum::<f64>();

        AbrechnungVorschau {
            aggregat,
            anteil,
            zuschuesse,
            abzuege,
            ergebnis: anteil + zuschuesse - abzuege,
        }
    }

    /// Form defaults for a newly selected employee: tax and net salary come
    /// from the employee record until the user overrides them
    pub async fn vorgaben_fuer_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
    ) -> Result<AbrechnungVorgaben> {
        let mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", mitarbeiter_id))?;

        Ok(AbrechnungVorgaben {
            steuer: mitarbeiter.steuer,
            netto_gehalt: mitarbeiter.netto_gehalt,
        })
    }

    /// Compute the amounts a settlement over the requested weeks would pay
    /// out, without persisting anything
    pub async fn vorschau(&self, request: &CreateAbrechnungRequest) -> Result<AbrechnungVorschau> {
        let mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(&request.mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", request.mitarbeiter_id))?;

        let wochen = Self::parse_wochen(&request.wochen)?;
        let umsaetze = self.selektierte_umsaetze(&mitarbeiter.id, &wochen).await?;
        let aggregat = UmsatzAggregat::aus_umsaetzen(&umsaetze);

        Ok(Self::berechne(
            aggregat,
            mitarbeiter.prozent_verguetung,
            request.steuer,
            request.netto_gehalt,
            &request.sonstige_abzuege,
            &request.sonstige_zuschuesse,
        ))
    }

    /// Create a settlement over the selected weeks
    pub async fn create_abrechnung(
        &self,
        request: CreateAbrechnungRequest,
    ) -> Result<AbrechnungResponse> {
        info!(
            "Creating settlement for employee {} over {} selected weeks",
            request.mitarbeiter_id,
            request.wochen.len()
        );

        let validation = self.validate_form(&request);
        if !validation.is_valid {
            let meldungen: Vec<String> =
                validation.errors.iter().map(|e| e.message()).collect();
            return Err(anyhow::anyhow!(meldungen.join(" ")));
        }

        let mitarbeiter = self
            .mitarbeiter_repository
            .get_mitarbeiter(&request.mitarbeiter_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Mitarbeiter not found: {}", request.mitarbeiter_id))?;

        let wochen = Self::parse_wochen(&request.wochen)?;
        let umsaetze = self.selektierte_umsaetze(&mitarbeiter.id, &wochen).await?;
        if umsaetze.is_empty() {
            warn!(
                "No revenue records in the selected weeks for employee {}, settling over zero",
                mitarbeiter.id
            );
        }

        let aggregat = UmsatzAggregat::aus_umsaetzen(&umsaetze);
        let vorschau = Self::berechne(
            aggregat,
            mitarbeiter.prozent_verguetung,
            request.steuer,
            request.netto_gehalt,
            &request.sonstige_abzuege,
            &request.sonstige_zuschuesse,
        );

        // The covered range is the earliest and latest selected week, in
        // chronological year-then-week order
        let (start_woche, end_woche) = match (wochen.iter().min(), wochen.iter().max()) {
            (Some(start), Some(end)) => (start.id(), end.id()),
            // Unreachable: validation rejects an empty week selection
            _ => return Err(anyhow::anyhow!("No weeks selected")),
        };

        let abrechnung = Abrechnung {
            id: Uuid::new_v4().to_string(),
            mitarbeiter_id: mitarbeiter.id.clone(),
            start_woche,
            end_woche,
            erstellt_am: Utc::now().to_rfc3339(),
            gesamtumsatz: aggregat.gesamtumsatz,
            netto_fahrpreis: aggregat.netto_fahrpreis,
            aktionen: aggregat.aktionen,
            rueckerstattungen: aggregat.rueckerstattungen,
            trinkgeld: aggregat.trinkgeld,
            bargeld: aggregat.bargeld,
            fahrten: aggregat.fahrten,
            waschen: aggregat.waschen,
            steuer: request.steuer,
            netto_gehalt: request.netto_gehalt,
            sonstige_abzuege: Self::posten_uebernehmen(request.sonstige_abzuege),
            sonstige_zuschuesse: Self::posten_uebernehmen(request.sonstige_zuschuesse),
            ergebnis: vorschau.ergebnis,
        };

        self.abrechnung_repository
            .store_abrechnung(&abrechnung)
            .await?;

        info!(
            "Created settlement {} for {} ({} to {}), payout {:.2}",
            abrechnung.id,
            mitarbeiter.voller_name(),
            abrechnung.start_woche,
            abrechnung.end_woche,
            abrechnung.ergebnis
        );

        Ok(AbrechnungResponse {
            success_message: format!(
                "Abrechnung für {} wurde erstellt.",
                mitarbeiter.voller_name()
            ),
            abrechnung,
        })
    }

    /// Get a settlement by ID
    pub async fn get_abrechnung(&self, abrechnung_id: &str) -> Result<Option<Abrechnung>> {
        let abrechnung = self
            .abrechnung_repository
            .get_abrechnung(abrechnung_id)
            .await?;

        if abrechnung.is_none() {
            warn!("Settlement not found: {}", abrechnung_id);
        }

        Ok(abrechnung)
    }

    /// List all settlements, most recently created first
    pub async fn list_abrechnungen(&self) -> Result<AbrechnungListResponse> {
        let mut abrechnungen = self.abrechnung_repository.list_abrechnungen().await?;
        Self::neueste_zuerst(&mut abrechnungen);
        Ok(AbrechnungListResponse { abrechnungen })
    }

    /// List all settlements of one employee, most recently created first
    pub async fn list_abrechnungen_fuer_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
    ) -> Result<AbrechnungListResponse> {
        let mut abrechnungen = self
            .abrechnung_repository
            .list_abrechnungen_fuer_mitarbeiter(mitarbeiter_id)
            .await?;
        Self::neueste_zuerst(&mut abrechnungen);
        Ok(AbrechnungListResponse { abrechnungen })
    }

    /// Delete a settlement. The only mutation settlements support; the
    /// revenue records it aggregated stay untouched.
    pub async fn delete_abrechnung(&self, abrechnung_id: &str) -> Result<()> {
        info!("Deleting settlement: {}", abrechnung_id);

        let deleted = self
            .abrechnung_repository
            .delete_abrechnung(abrechnung_id)
            .await?;
        if !deleted {
            return Err(anyhow::anyhow!("Abrechnung not found: {}", abrechnung_id));
        }

        Ok(())
    }

    // RFC 3339 timestamps in UTC sort correctly as strings
    fn neueste_zuerst(abrechnungen: &mut [Abrechnung]) {
        abrechnungen.sort_by(|a, b| b.erstellt_am.cmp(&a.erstellt_am));
    }

    fn parse_wochen(wochen: &[String]) -> Result<Vec<Kalenderwoche>> {
        wochen
            .iter()
            .map(|id| {
                Kalenderwoche::parse_id(id)
                    .map_err(|e| anyhow::anyhow!("Invalid calendar week id '{}': {}", id, e))
            })
            .collect()
    }

    /// The employee's revenue records falling into the selected weeks.
    /// Matching uses the split year/week fields; the redundant id string on
    /// the record is ignored. Duplicate selections cannot double-count
    /// because the selection is a set.
    async fn selektierte_umsaetze(
        &self,
        mitarbeiter_id: &str,
        wochen: &[Kalenderwoche],
    ) -> Result<Vec<Umsatz>> {
        let auswahl: HashSet<Kalenderwoche> = wochen.iter().copied().collect();

        let umsaetze = self
            .umsatz_repository
            .list_umsaetze_fuer_mitarbeiter(mitarbeiter_id)
            .await?;

        Ok(umsaetze
            .into_iter()
            .filter(|u| auswahl.contains(&u.woche()))
            .collect())
    }

    fn posten_uebernehmen(eingaben: Vec<PostenEingabe>) -> Vec<SonstigerPosten> {
        eingaben
            .into_iter()
            .map(|p| SonstigerPosten {
                id: Uuid::new_v4().to_string(),
                bezeichnung: p.bezeichnung.trim().to_string(),
                betrag: p.betrag,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::JsonConnection;
    use shared::{Mitarbeiter, Umsatz};
    use tempfile::TempDir;

    struct TestSetup {
        service: AbrechnungService<JsonConnection>,
        connection: Arc<JsonConnection>,
        _temp_dir: TempDir,
    }

    async fn setup_with_employee() -> TestSetup {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(temp_dir.path()).unwrap());
        let service = AbrechnungService::new(connection.clone());

        let mitarbeiter = Mitarbeiter {
            id: "m1".to_string(),
            vorname: "Frank".to_string(),
            nachname: "Rossler".to_string(),
            email: None,
            telefon: None,
            einstellungsdatum: "2022-04-01".to_string(),
            aktiv: true,
            fahrzeug_id: None,
            steuer: 100.0,
            netto_gehalt: 1800.0,
            stundenlohn: None,
            prozent_verguetung: 40.0,
            soll_fahrten_anzahl: Some(90),
            krankenversicherung: None,
        };
        connection
            .create_mitarbeiter_repository()
            .store_mitarbeiter(&mitarbeiter)
            .await
            .unwrap();

        TestSetup {
            service,
            connection,
            _temp_dir: temp_dir,
        }
    }

    async fn seed_umsatz(
        setup: &TestSetup,
        jahr: i32,
        wochen_nummer: u32,
        gesamtumsatz: f64,
        trinkgeld: f64,
        waschen: f64,
        rueckerstattungen: f64,
        bargeld: f64,
    ) {
        let umsatz = Umsatz {
            id: Uuid::new_v4().to_string(),
            mitarbeiter_id: "m1".to_string(),
            wochen_nummer,
            jahr,
            kalenderwoche: format!("{}-{:02}", jahr, wochen_nummer),
            erfasst_am: "2024-02-18T10:00:00+00:00".to_string(),
            gesamtumsatz,
            netto_fahrpreis: gesamtumsatz * 0.9,
            aktionen: 0.0,
            rueckerstattungen,
            trinkgeld,
            bargeld,
            fahrten: 80,
            waschen,
        };
        setup
            .connection
            .create_umsatz_repository()
            .store_umsatz(&umsatz)
            .await
            .unwrap();
    }

    fn request(wochen: Vec<&str>) -> CreateAbrechnungRequest {
        CreateAbrechnungRequest {
            mitarbeiter_id: "m1".to_string(),
            wochen: wochen.into_iter().map(String::from).collect(),
            steuer: 0.0,
            netto_gehalt: 0.0,
            sonstige_abzuege: Vec::new(),
            sonstige_zuschuesse: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_settlement_arithmetic() {
        let setup = setup_with_employee().await;
        seed_umsatz(&setup, 2024, 7, 1000.0, 50.0, 20.0, 10.0, 200.0).await;

        let vorschau = setup
            .service
            .vorschau(&request(vec!["2024-07"]))
            .await
            .expect("Failed to compute preview");

        // 40% of 1000 gross
        assert!((vorschau.anteil - 400.0).abs() < 1e-9);
        // tips 50 + wash 20 + reimbursements 10
        assert!((vorschau.zuschuesse - 80.0).abs() < 1e-9);
        // cash 200, no tax or salary in the request
        assert!((vorschau.abzuege - 200.0).abs() < 1e-9);
        assert!((vorschau.ergebnis - 280.0).abs() < 1e-9);

        let response = setup
            .service
            .create_abrechnung(request(vec!["2024-07"]))
            .await
            .expect("Failed to create settlement");
        assert!((response.abrechnung.ergebnis - 280.0).abs() < 1e-9);
        assert!((response.abrechnung.gesamtumsatz - 1000.0).abs() < 1e-9);
        assert_eq!(response.abrechnung.start_woche, "2024-07");
        assert_eq!(response.abrechnung.end_woche, "2024-07");
        assert_eq!(response.success_message, "Abrechnung für Frank Rossler wurde erstellt.");
    }

    #[tokio::test]
    async fn test_settlement_with_adjustments() {
        let setup = setup_with_employee().await;
        seed_umsatz(&setup, 2024, 7, 1000.0, 50.0, 20.0, 10.0, 200.0).await;

        let mut req = request(vec!["2024-07"]);
        req.sonstige_zuschuesse.push(PostenEingabe {
            bezeichnung: "Bonus".to_string(),
            betrag: 25.0,
        });
        req.sonstige_abzuege.push(PostenEingabe {
            bezeichnung: "Strafzettel".to_string(),
            betrag: 15.0,
        });

        let response = setup
            .service
            .create_abrechnung(req)
            .await
            .expect("Failed to create settlement");

        // 400 + (80 + 25) - (200 + 15)
        assert!((response.abrechnung.ergebnis - 290.0).abs() < 1e-9);
        assert_eq!(response.abrechnung.sonstige_zuschuesse.len(), 1);
        assert_eq!(response.abrechnung.sonstige_abzuege.len(), 1);
        // Ad-hoc items get their own ids when the settlement is created
        assert!(!response.abrechnung.sonstige_zuschuesse[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_settlement_week_range_from_unordered_selection() {
        let setup = setup_with_employee().await;
        seed_umsatz(&setup, 2024, 5, 500.0, 0.0, 0.0, 0.0, 0.0).await;
        seed_umsatz(&setup, 2024, 10, 600.0, 0.0, 0.0, 0.0, 0.0).await;
        seed_umsatz(&setup, 2024, 12, 700.0, 0.0, 0.0, 0.0, 0.0).await;

        let response = setup
            .service
            .create_abrechnung(request(vec!["2024-10", "2024-05", "2024-12"]))
            .await
            .expect("Failed to create settlement");

        assert_eq!(response.abrechnung.start_woche, "2024-05");
        assert_eq!(response.abrechnung.end_woche, "2024-12");
        assert!((response.abrechnung.gesamtumsatz - 1800.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_settlement_over_weeks_without_records() {
        let setup = setup_with_employee().await;

        let mut req = request(vec!["2024-20", "2024-21"]);
        req.steuer = 100.0;
        req.netto_gehalt = 1800.0;

        let response = setup
            .service
            .create_abrechnung(req)
            .await
            .expect("Failed to create settlement");

        // Nothing aggregated, fixed deductions still apply
        assert!((response.abrechnung.gesamtumsatz).abs() < 1e-9);
        assert_eq!(response.abrechnung.fahrten, 0);
        assert!((response.abrechnung.ergebnis + 1900.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_duplicate_week_selection_does_not_double_count() {
        let setup = setup_with_employee().await;
        seed_umsatz(&setup, 2024, 7, 1000.0, 0.0, 0.0, 0.0, 0.0).await;

        let response = setup
            .service
            .create_abrechnung(request(vec!["2024-07", "2024-07"]))
            .await
            .expect("Failed to create settlement");

        assert!((response.abrechnung.gesamtumsatz - 1000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_validate_form_collects_all_errors() {
        let setup = setup_with_employee().await;

        let req = CreateAbrechnungRequest {
            mitarbeiter_id: "".to_string(),
            wochen: Vec::new(),
            steuer: 0.0,
            netto_gehalt: 0.0,
            sonstige_abzuege: vec![PostenEingabe {
                bezeichnung: "  ".to_string(),
                betrag: -3.0,
            }],
            sonstige_zuschuesse: Vec::new(),
        };

        let validation = setup.service.validate_form(&req);
        assert!(!validation.is_valid);
        assert!(validation
            .errors
            .contains(&AbrechnungValidationError::KeinMitarbeiterGewaehlt));
        assert!(validation
            .errors
            .contains(&AbrechnungValidationError::KeineWochenGewaehlt));
        assert!(validation
            .errors
            .contains(&AbrechnungValidationError::PostenOhneBezeichnung));
        assert!(validation
            .errors
            .contains(&AbrechnungValidationError::PostenBetragNichtPositiv(-3.0)));

        // Creation refuses the same request
        assert!(setup.service.create_abrechnung(req).await.is_err());
    }

    #[tokio::test]
    async fn test_vorgaben_come_from_employee_record() {
        let setup = setup_with_employee().await;

        let vorgaben = setup
            .service
            .vorgaben_fuer_mitarbeiter("m1")
            .await
            .expect("Failed to fetch form defaults");
        assert!((vorgaben.steuer - 100.0).abs() < 1e-9);
        assert!((vorgaben.netto_gehalt - 1800.0).abs() < 1e-9);

        assert!(setup
            .service
            .vorgaben_fuer_mitarbeiter("ghost")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_orders_by_creation_time_descending() {
        let setup = setup_with_employee().await;
        let repo = setup.connection.create_abrechnung_repository();

        for (id, erstellt_am) in [
            ("a-alt", "2024-01-10T08:00:00+00:00"),
            ("a-neu", "2024-03-01T08:00:00+00:00"),
            ("a-mittel", "2024-02-15T08:00:00+00:00"),
        ] {
            let abrechnung = Abrechnung {
                id: id.to_string(),
                mitarbeiter_id: "m1".to_string(),
                start_woche: "2024-01".to_string(),
                end_woche: "2024-02".to_string(),
                erstellt_am: erstellt_am.to_string(),
                gesamtumsatz: 0.0,
                netto_fahrpreis: 0.0,
                aktionen: 0.0,
                rueckerstattungen: 0.0,
                trinkgeld: 0.0,
                bargeld: 0.0,
                fahrten: 0,
                waschen: 0.0,
                steuer: 0.0,
                netto_gehalt: 0.0,
                sonstige_abzuege: Vec::new(),
                sonstige_zuschuesse: Vec::new(),
                ergebnis: 0.0,
            };
            repo.store_abrechnung(&abrechnung).await.unwrap();
        }

        let list = setup.service.list_abrechnungen().await.unwrap();
        let ids: Vec<&str> = list.abrechnungen.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a-neu", "a-mittel", "a-alt"]);
    }

    #[tokio::test]
    async fn test_create_requires_existing_employee() {
        let setup = setup_with_employee().await;

        let mut req = request(vec!["2024-07"]);
        req.mitarbeiter_id = "ghost".to_string();
        assert!(setup.service.create_abrechnung(req).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_week_id() {
        let setup = setup_with_employee().await;

        let result = setup
            .service
            .create_abrechnung(request(vec!["garbage"]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_and_delete_abrechnung() {
        let setup = setup_with_employee().await;
        seed_umsatz(&setup, 2024, 7, 1000.0, 0.0, 0.0, 0.0, 0.0).await;

        let created = setup
            .service
            .create_abrechnung(request(vec!["2024-07"]))
            .await
            .unwrap();

        let eigene = setup
            .service
            .list_abrechnungen_fuer_mitarbeiter("m1")
            .await
            .unwrap();
        assert_eq!(eigene.abrechnungen.len(), 1);

        setup
            .service
            .delete_abrechnung(&created.abrechnung.id)
            .await
            .expect("Failed to delete settlement");
        assert!(setup
            .service
            .delete_abrechnung(&created.abrechnung.id)
            .await
            .is_err());
    }
}
