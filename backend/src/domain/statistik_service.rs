//! Read-only statistics over the ledger.
//!
//! Produces the dashboard headline figures and the weekly revenue series
//! behind the charts. Nothing in here mutates the snapshot; every figure is
//! recomputed from the stored records on each call.

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::commands::statistik::{
    DashboardKennzahlen, UmsatzDurchschnitt, WochenUmsatzPunkt,
};
use crate::storage::{Connection, FahrzeugStorage, MitarbeiterStorage, UmsatzStorage};
use shared::{Kalenderwoche, Umsatz};

/// Service computing dashboard figures and chart series
#[derive(Clone)]
pub struct StatistikService<C: Connection> {
    fahrzeug_repository: C::FahrzeugRepository,
    mitarbeiter_repository: C::MitarbeiterRepository,
    umsatz_repository: C::UmsatzRepository,
}

impl<C: Connection> StatistikService<C> {
    /// Create a new StatistikService
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            fahrzeug_repository: connection.create_fahrzeug_repository(),
            mitarbeiter_repository: connection.create_mitarbeiter_repository(),
            umsatz_repository: connection.create_umsatz_repository(),
        }
    }

    /// Dashboard figures relative to today
    pub async fn dashboard_kennzahlen(&self) -> Result<DashboardKennzahlen> {
        self.dashboard_kennzahlen_am(Local::now().date_naive())
            .await
    }

    /// Dashboard figures relative to a given day.
    ///
    /// "Revenue this month" buckets records by their capture timestamp, not
    /// by the calendar week they cover, so a week entered late counts
    /// towards the month it was typed in. Cost figures include inactive
    /// vehicles and employees; they drop out of the total only when deleted.
    pub async fn dashboard_kennzahlen_am(&self, heute: NaiveDate) -> Result<DashboardKennzahlen> {
        let fahrzeuge = self.fahrzeug_repository.list_fahrzeuge().await?;
        let mitarbeiter = self.mitarbeiter_repository.list_mitarbeiter().await?;
        let umsaetze = self.umsatz_repository.list_umsaetze().await?;

        debug!(
            "Computing dashboard figures over {} vehicles, {} employees, {} revenue records",
            fahrzeuge.len(),
            mitarbeiter.len(),
            umsaetze.len()
        );

        let umsatz_aktueller_monat = umsaetze
            .iter()
            .filter(|u| Self::im_monat_erfasst(u, heute))
            .map(|u| u.gesamtumsatz)
            .sum();

        let fahrzeugkosten: f64 = fahrzeuge.iter().map(|f| f.monatliche_gesamtkosten()).sum();
        let mitarbeiterkosten: f64 = mitarbeiter
            .iter()
            .map(|m| m.netto_gehalt + m.krankenversicherung.unwrap_or(0.0))
            .sum();

        let durchschnitt_fahrten_pro_woche = if umsaetze.is_empty() {
            0
        } else {
            let fahrten: u32 = umsaetze.iter().map(|u| u.fahrten).sum();
            (f64::from(fahrten) / umsaetze.len() as f64).round() as u32
        };

        Ok(DashboardKennzahlen {
            umsatz_aktueller_monat,
            gesamtkosten_monat: fahrzeugkosten + mitarbeiterkosten,
            aktive_fahrzeuge: fahrzeuge.iter().filter(|f| f.aktiv).count(),
            fahrzeuge_gesamt: fahrzeuge.len(),
            aktive_mitarbeiter: mitarbeiter.iter().filter(|m| m.aktiv).count(),
            mitarbeiter_gesamt: mitarbeiter.len(),
            durchschnitt_fahrten_pro_woche,
        })
    }

    /// The weekly revenue series for the chart, optionally restricted to one
    /// employee. Records are grouped per calendar week and returned in
    /// chronological order, oldest first. Weeks without records are absent
    /// rather than zero-filled.
    pub async fn wochen_serie(
        &self,
        mitarbeiter_id: Option<&str>,
    ) -> Result<Vec<WochenUmsatzPunkt>> {
        let umsaetze = match mitarbeiter_id {
            Some(id) => {
                self.umsatz_repository
                    .list_umsaetze_fuer_mitarbeiter(id)
                    .await?
            }
            None => self.umsatz_repository.list_umsaetze().await?,
        };

        // BTreeMap keyed by week gives the chronological order for free
        let mut punkte: BTreeMap<Kalenderwoche, WochenUmsatzPunkt> = BTreeMap::new();
        for umsatz in &umsaetze {
            let woche = umsatz.woche();
            let punkt = punkte.entry(woche).or_insert_with(|| WochenUmsatzPunkt {
                woche,
                gesamtumsatz: 0.0,
                netto_fahrpreis: 0.0,
                aktionen: 0.0,
                trinkgeld: 0.0,
                fahrten: 0,
            });
            punkt.gesamtumsatz += umsatz.gesamtumsatz;
            punkt.netto_fahrpreis += umsatz.netto_fahrpreis;
            punkt.aktionen += umsatz.aktionen;
            punkt.trinkgeld += umsatz.trinkgeld;
            punkt.fahrten += umsatz.fahrten;
        }

        Ok(punkte.into_values().collect())
    }

    /// Averages over the weekly series of one employee, or of the whole
    /// fleet when no employee is given. Totals and week counts come from the
    /// same filtered series, so a driver's per-week average never mixes in
    /// other drivers' revenue.
    pub async fn durchschnitt(&self, mitarbeiter_id: Option<&str>) -> Result<UmsatzDurchschnitt> {
        let serie = self.wochen_serie(mitarbeiter_id).await?;
        Ok(Self::durchschnitt_der_serie(&serie))
    }

    /// Averages over an already computed weekly series
    pub fn durchschnitt_der_serie(serie: &[WochenUmsatzPunkt]) -> UmsatzDurchschnitt {
        if serie.is_empty() {
            return UmsatzDurchschnitt::default();
        }

        let wochen = serie.len() as f64;
        let umsatz: f64 = serie.iter().map(|p| p.gesamtumsatz).sum();
        let trinkgeld: f64 = serie.iter().map(|p| p.trinkgeld).sum();
        let fahrten: u32 = serie.iter().map(|p| p.fahrten).sum();

        UmsatzDurchschnitt {
            umsatz_pro_woche: umsatz / wochen,
            fahrten_pro_woche: f64::from(fahrten) / wochen,
            trinkgeld_pro_fahrt: if fahrten == 0 {
                0.0
            } else {
                trinkgeld / f64::from(fahrten)
            },
        }
    }

    /// Whether the record was captured in the same month and year as `heute`.
    /// Records with an unparseable timestamp never match.
    fn im_monat_erfasst(umsatz: &Umsatz, heute: NaiveDate) -> bool {
        match DateTime::parse_from_rfc3339(&umsatz.erfasst_am) {
            Ok(erfasst) => {
                let datum = erfasst.date_naive();
                datum.month() == heute.month() && datum.year() == heute.year()
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::JsonConnection;
    use shared::{Fahrzeug, FahrzeugKosten, Mitarbeiter, Umsatz, Zahlungsturnus};
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn setup_test_service() -> (StatistikService<JsonConnection>, Arc<JsonConnection>, TempDir)
    {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(temp_dir.path()).unwrap());
        let service = StatistikService::new(connection.clone());
        (service, connection, temp_dir)
    }

    fn test_mitarbeiter(id: &str, aktiv: bool, netto_gehalt: f64, kv: Option<f64>) -> Mitarbeiter {
        Mitarbeiter {
            id: id.to_string(),
            vorname: "Test".to_string(),
            nachname: id.to_string(),
            email: None,
            telefon: None,
            einstellungsdatum: "2022-04-01".to_string(),
            aktiv,
            fahrzeug_id: None,
            steuer: 0.0,
            netto_gehalt,
            stundenlohn: None,
            prozent_verguetung: 40.0,
            soll_fahrten_anzahl: None,
            krankenversicherung: kv,
        }
    }

    fn test_umsatz(
        mitarbeiter_id: &str,
        jahr: i32,
        wochen_nummer: u32,
        erfasst_am: &str,
        gesamtumsatz: f64,
        trinkgeld: f64,
        fahrten: u32,
    ) -> Umsatz {
        Umsatz {
            id: Uuid::new_v4().to_string(),
            mitarbeiter_id: mitarbeiter_id.to_string(),
            wochen_nummer,
            jahr,
            kalenderwoche: format!("{}-{:02}", jahr, wochen_nummer),
            erfasst_am: erfasst_am.to_string(),
            gesamtumsatz,
            netto_fahrpreis: gesamtumsatz * 0.9,
            aktionen: 5.0,
            rueckerstattungen: 0.0,
            trinkgeld,
            bargeld: 0.0,
            fahrten,
            waschen: 0.0,
        }
    }

    #[tokio::test]
    async fn test_dashboard_kennzahlen() {
        let (service, connection, _temp_dir) = setup_test_service().await;

        let fahrzeug_repo = connection.create_fahrzeug_repository();
        fahrzeug_repo
            .store_fahrzeug(&Fahrzeug {
                id: "f1".to_string(),
                kennzeichen: "B-TX 1234".to_string(),
                marke: "Toyota".to_string(),
                modell: "Prius".to_string(),
                baujahr: 2020,
                aktiv: true,
                kosten: vec![FahrzeugKosten {
                    id: "k1".to_string(),
                    bezeichnung: "Versicherung".to_string(),
                    betrag: 1200.0,
                    zahlungsturnus: Zahlungsturnus::Jaehrlich,
                    faellig_am: None,
                    monatlich_umgerechnet: 100.0,
                }],
            })
            .await
            .unwrap();
        // Inactive vehicles still cost money every month
        fahrzeug_repo
            .store_fahrzeug(&Fahrzeug {
                id: "f2".to_string(),
                kennzeichen: "B-TX 5678".to_string(),
                marke: "VW".to_string(),
                modell: "Touran".to_string(),
                baujahr: 2016,
                aktiv: false,
                kosten: vec![FahrzeugKosten {
                    id: "k2".to_string(),
                    bezeichnung: "Stellplatz".to_string(),
                    betrag: 50.0,
                    zahlungsturnus: Zahlungsturnus::Monatlich,
                    faellig_am: None,
                    monatlich_umgerechnet: 50.0,
                }],
            })
            .await
            .unwrap();

        let mitarbeiter_repo = connection.create_mitarbeiter_repository();
        mitarbeiter_repo
            .store_mitarbeiter(&test_mitarbeiter("m1", true, 1800.0, Some(300.0)))
            .await
            .unwrap();
        mitarbeiter_repo
            .store_mitarbeiter(&test_mitarbeiter("m2", false, 1500.0, None))
            .await
            .unwrap();

        let umsatz_repo = connection.create_umsatz_repository();
        for umsatz in [
            test_umsatz("m1", 2024, 6, "2024-02-10T09:00:00+00:00", 800.0, 30.0, 80),
            test_umsatz("m1", 2024, 7, "2024-02-18T09:00:00+00:00", 200.0, 10.0, 40),
            test_umsatz("m2", 2024, 3, "2024-01-20T09:00:00+00:00", 500.0, 20.0, 60),
        ] {
            umsatz_repo.store_umsatz(&umsatz).await.unwrap();
        }

        let kennzahlen = service
            .dashboard_kennzahlen_am(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
            .await
            .expect("Failed to compute dashboard figures");

        // Only the two February captures count, regardless of their weeks
        assert!((kennzahlen.umsatz_aktueller_monat - 1000.0).abs() < 1e-9);
        // Vehicles 100 + 50, salaries 1800 + 1500, health insurance 300
        assert!((kennzahlen.gesamtkosten_monat - 3750.0).abs() < 1e-9);
        assert_eq!(kennzahlen.aktive_fahrzeuge, 1);
        assert_eq!(kennzahlen.fahrzeuge_gesamt, 2);
        assert_eq!(kennzahlen.aktive_mitarbeiter, 1);
        assert_eq!(kennzahlen.mitarbeiter_gesamt, 2);
        // (80 + 40 + 60) / 3
        assert_eq!(kennzahlen.durchschnitt_fahrten_pro_woche, 60);
    }

    #[tokio::test]
    async fn test_dashboard_kennzahlen_on_empty_ledger() {
        let (service, _connection, _temp_dir) = setup_test_service().await;

        let kennzahlen = service
            .dashboard_kennzahlen_am(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
            .await
            .unwrap();

        assert!((kennzahlen.umsatz_aktueller_monat).abs() < 1e-9);
        assert!((kennzahlen.gesamtkosten_monat).abs() < 1e-9);
        assert_eq!(kennzahlen.fahrzeuge_gesamt, 0);
        assert_eq!(kennzahlen.durchschnitt_fahrten_pro_woche, 0);
    }

    #[tokio::test]
    async fn test_unparseable_capture_timestamp_is_not_this_month() {
        let (service, connection, _temp_dir) = setup_test_service().await;

        let umsatz_repo = connection.create_umsatz_repository();
        let kaputt = test_umsatz("m1", 2024, 6, "irgendwann", 800.0, 0.0, 10);
        umsatz_repo.store_umsatz(&kaputt).await.unwrap();

        let kennzahlen = service
            .dashboard_kennzahlen_am(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
            .await
            .unwrap();
        assert!((kennzahlen.umsatz_aktueller_monat).abs() < 1e-9);
        // The record still participates in the trip average
        assert_eq!(kennzahlen.durchschnitt_fahrten_pro_woche, 10);
    }

    #[tokio::test]
    async fn test_wochen_serie_groups_and_sorts() {
        let (service, connection, _temp_dir) = setup_test_service().await;

        let umsatz_repo = connection.create_umsatz_repository();
        for umsatz in [
            test_umsatz("m1", 2024, 7, "2024-02-18T09:00:00+00:00", 600.0, 20.0, 50),
            test_umsatz("m1", 2023, 53, "2024-01-02T09:00:00+00:00", 400.0, 10.0, 30),
            test_umsatz("m1", 2024, 1, "2024-01-08T09:00:00+00:00", 500.0, 15.0, 40),
            // Second record in week 2024-07 from another driver
            test_umsatz("m2", 2024, 7, "2024-02-18T10:00:00+00:00", 100.0, 5.0, 10),
        ] {
            umsatz_repo.store_umsatz(&umsatz).await.unwrap();
        }

        let serie = service.wochen_serie(None).await.unwrap();

        let ids: Vec<String> = serie.iter().map(|p| p.woche.id()).collect();
        assert_eq!(ids, vec!["2023-53", "2024-01", "2024-07"]);
        assert!((serie[2].gesamtumsatz - 700.0).abs() < 1e-9);
        assert_eq!(serie[2].fahrten, 60);
    }

    #[tokio::test]
    async fn test_wochen_serie_filtered_by_mitarbeiter() {
        let (service, connection, _temp_dir) = setup_test_service().await;

        let umsatz_repo = connection.create_umsatz_repository();
        for umsatz in [
            test_umsatz("m1", 2024, 7, "2024-02-18T09:00:00+00:00", 600.0, 20.0, 50),
            test_umsatz("m2", 2024, 7, "2024-02-18T10:00:00+00:00", 100.0, 5.0, 10),
            test_umsatz("m2", 2024, 8, "2024-02-25T10:00:00+00:00", 300.0, 8.0, 20),
        ] {
            umsatz_repo.store_umsatz(&umsatz).await.unwrap();
        }

        let serie = service.wochen_serie(Some("m2")).await.unwrap();
        assert_eq!(serie.len(), 2);
        assert!((serie[0].gesamtumsatz - 100.0).abs() < 1e-9);

        let durchschnitt = service.durchschnitt(Some("m2")).await.unwrap();
        assert!((durchschnitt.umsatz_pro_woche - 200.0).abs() < 1e-9);
        assert!((durchschnitt.fahrten_pro_woche - 15.0).abs() < 1e-9);
        // (5 + 8) tips over 30 trips
        assert!((durchschnitt.trinkgeld_pro_fahrt - 13.0 / 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_durchschnitt_guards_against_zero_trips() {
        let serie = vec![WochenUmsatzPunkt {
            woche: Kalenderwoche::new(2024, 7),
            gesamtumsatz: 100.0,
            netto_fahrpreis: 90.0,
            aktionen: 0.0,
            trinkgeld: 12.0,
            fahrten: 0,
        }];

        let durchschnitt =
            StatistikService::<JsonConnection>::durchschnitt_der_serie(&serie);
        assert!((durchschnitt.trinkgeld_pro_fahrt).abs() < 1e-9);
        assert!((durchschnitt.umsatz_pro_woche - 100.0).abs() < 1e-9);

        let leer = StatistikService::<JsonConnection>::durchschnitt_der_serie(&[]);
        assert_eq!(leer, UmsatzDurchschnitt::default());
    }
}
