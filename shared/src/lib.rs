use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment frequency of a recurring vehicle cost ("Zahlungsturnus").
///
/// Serialized as the lowercase German tags the ledger snapshot has always
/// used: `"woechentlich"`, `"monatlich"`, `"quartalsweise"`,
/// `"halbjaehrlich"`, `"jaehrlich"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zahlungsturnus {
    Woechentlich,
    Monatlich,
    Quartalsweise,
    Halbjaehrlich,
    Jaehrlich,
}

impl Zahlungsturnus {
    /// Convert an amount billed at this frequency into its monthly
    /// equivalent.
    ///
    /// The weekly factor is the fixed approximation 4.33 (≈ 52/12), not a
    /// recomputation from the actual week count of any particular year;
    /// derived `monatlich_umgerechnet` values stored in old snapshots were
    /// produced with exactly these ratios.
    pub fn monatlicher_betrag(&self, betrag: f64) -> f64 {
        match self {
            // 4.33 average weeks per month
            Zahlungsturnus::Woechentlich => betrag * 4.33,
            Zahlungsturnus::Monatlich => betrag,
            Zahlungsturnus::Quartalsweise => betrag / 3.0,
            Zahlungsturnus::Halbjaehrlich => betrag / 6.0,
            Zahlungsturnus::Jaehrlich => betrag / 12.0,
        }
    }

    /// Human-readable label for the frequency
    pub fn anzeige_name(&self) -> &'static str {
        match self {
            Zahlungsturnus::Woechentlich => "Wöchentlich",
            Zahlungsturnus::Monatlich => "Monatlich",
            Zahlungsturnus::Quartalsweise => "Quartalsweise",
            Zahlungsturnus::Halbjaehrlich => "Halbjährlich",
            Zahlungsturnus::Jaehrlich => "Jährlich",
        }
    }
}

/// One calendar week, identified by year and week number.
///
/// The canonical id form is `"{jahr}-{woche:02}"`, e.g. `"2024-07"`. Week
/// numbers run 1..=53 by convention; the type itself performs no range
/// validation, callers are expected to supply sane values.
///
/// Ordering is chronological: year first, then week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Kalenderwoche {
    pub jahr: i32,
    pub woche: u32,
}

impl Kalenderwoche {
    pub fn new(jahr: i32, woche: u32) -> Self {
        Self { jahr, woche }
    }

    /// Canonical id string, e.g. `"2024-07"`
    pub fn id(&self) -> String {
        format!("{}-{:02}", self.jahr, self.woche)
    }

    /// Parse a canonical id string back into a week.
    ///
    /// Malformed input is a typed error; garbage ids from a damaged
    /// snapshot must never leak into sorting or aggregation.
    pub fn parse_id(id: &str) -> Result<Self, KalenderwocheIdError> {
        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() != 2 {
            return Err(KalenderwocheIdError::InvalidFormat);
        }

        let jahr = parts[0]
            .parse::<i32>()
            .map_err(|_| KalenderwocheIdError::InvalidJahr)?;

        let woche = parts[1]
            .parse::<u32>()
            .map_err(|_| KalenderwocheIdError::InvalidWoche)?;

        Ok(Self { jahr, woche })
    }

    /// Week containing the given date.
    ///
    /// Numbering rule: January 1st is day one of week 1, and a new week
    /// begins every seven days from there, shifted by January 1st's weekday
    /// (Sunday = 0, ..., Saturday = 6). Late-December days of long years can
    /// therefore land in week 53 or even 54. This deliberately differs from
    /// ISO-8601 week numbering; every stored revenue record was indexed with
    /// this rule, so it must not be swapped for the ISO one.
    pub fn fuer_datum(datum: NaiveDate) -> Self {
        let jan1 = match datum.with_ordinal0(0) {
            Some(d) => d,
            // Unreachable for any valid date, keep the input as fallback
            None => datum,
        };
        let jan1_wochentag = jan1.weekday().num_days_from_sunday();
        let woche = (datum.ordinal0() + jan1_wochentag) / 7 + 1;

        Self {
            jahr: datum.year(),
            woche,
        }
    }

    /// All selectable weeks of a year: weeks 1 through 53 inclusive,
    /// ascending. The count is fixed and not adjusted for years that only
    /// have 52 ISO weeks.
    pub fn fuer_jahr(jahr: i32) -> Vec<Kalenderwoche> {
        (1..=53).map(|woche| Self { jahr, woche }).collect()
    }

    /// Display form, e.g. `"KW 07/2024"`
    pub fn anzeige(&self) -> String {
        format!("KW {:02}/{}", self.woche, self.jahr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KalenderwocheIdError {
    InvalidFormat,
    InvalidJahr,
    InvalidWoche,
}

impl fmt::Display for KalenderwocheIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KalenderwocheIdError::InvalidFormat => {
                write!(f, "Invalid calendar week id format (expected \"JJJJ-WW\")")
            }
            KalenderwocheIdError::InvalidJahr => {
                write!(f, "Invalid year in calendar week id")
            }
            KalenderwocheIdError::InvalidWoche => {
                write!(f, "Invalid week number in calendar week id")
            }
        }
    }
}

impl std::error::Error for KalenderwocheIdError {}

/// A recurring cost attached to a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FahrzeugKosten {
    pub id: String,
    pub bezeichnung: String,
    /// Raw amount, billed once per `zahlungsturnus`
    pub betrag: f64,
    pub zahlungsturnus: Zahlungsturnus,
    /// Optional due date (ISO 8601 date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faellig_am: Option<String>,
    /// Derived monthly equivalent of `betrag`. Always equals
    /// `zahlungsturnus.monatlicher_betrag(betrag)`; recomputed whenever the
    /// amount or frequency changes and never edited on its own.
    pub monatlich_umgerechnet: f64,
}

/// A fleet vehicle together with its recurring costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fahrzeug {
    pub id: String,
    /// License plate
    pub kennzeichen: String,
    pub marke: String,
    pub modell: String,
    pub baujahr: i32,
    pub aktiv: bool,
    pub kosten: Vec<FahrzeugKosten>,
}

impl Fahrzeug {
    /// Sum of the monthly equivalents of all cost items
    pub fn monatliche_gesamtkosten(&self) -> f64 {
        self.kosten.iter().map(|k| k.monatlich_umgerechnet).sum()
    }
}

/// An employee (driver) and their pay terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mitarbeiter {
    pub id: String,
    pub vorname: String,
    pub nachname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefon: Option<String>,
    /// Hire date (ISO 8601 date)
    pub einstellungsdatum: String,
    pub aktiv: bool,
    /// Vehicle usually driven by this employee (foreign key, may dangle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fahrzeug_id: Option<String>,
    /// Fixed tax amount applied per settlement
    pub steuer: f64,
    /// Fixed net salary, deducted per settlement
    pub netto_gehalt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stundenlohn: Option<f64>,
    /// Revenue share in percent. Deliberately unclamped; values outside
    /// 0..=100 simply scale the settlement share proportionally.
    pub prozent_verguetung: f64,
    /// Weekly trip target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soll_fahrten_anzahl: Option<u32>,
    /// Monthly health insurance contribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub krankenversicherung: Option<f64>,
}

impl Mitarbeiter {
    pub fn voller_name(&self) -> String {
        format!("{} {}", self.vorname, self.nachname)
    }
}

/// One employee's reported revenue for one calendar week ("Umsatz").
///
/// The week is stored redundantly: split into `jahr`/`wochen_nummer` and as
/// the composed `kalenderwoche` id string. By convention at most one record
/// exists per (employee, week) pair — the quick-entry flow upserts — but the
/// data model does not enforce that uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Umsatz {
    pub id: String,
    pub mitarbeiter_id: String,
    pub wochen_nummer: u32,
    pub jahr: i32,
    /// Composed week id, `"{jahr}-{wochen_nummer:02}"`
    pub kalenderwoche: String,
    /// Capture timestamp (RFC 3339)
    pub erfasst_am: String,
    /// Gross revenue
    pub gesamtumsatz: f64,
    /// Net fare revenue
    pub netto_fahrpreis: f64,
    /// Promotional deductions
    pub aktionen: f64,
    /// Reimbursements
    pub rueckerstattungen: f64,
    /// Tips
    pub trinkgeld: f64,
    /// Cash collected by the driver
    pub bargeld: f64,
    /// Trip count
    pub fahrten: u32,
    /// Car wash cost
    pub waschen: f64,
}

impl Umsatz {
    /// The week this record belongs to, from the split fields
    pub fn woche(&self) -> Kalenderwoche {
        Kalenderwoche::new(self.jahr, self.wochen_nummer)
    }
}

/// Ad-hoc named line item used as a deduction or allowance in a settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SonstigerPosten {
    pub id: String,
    pub bezeichnung: String,
    pub betrag: f64,
}

/// An immutable payroll settlement ("Abrechnung").
///
/// Created once from aggregated revenue plus manual adjustments, then
/// appended to the ledger and never mutated or recomputed; correcting a
/// settlement means creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Abrechnung {
    pub id: String,
    pub mitarbeiter_id: String,
    /// First covered week (canonical id)
    pub start_woche: String,
    /// Last covered week (canonical id)
    pub end_woche: String,
    /// Creation timestamp (RFC 3339)
    pub erstellt_am: String,
    pub gesamtumsatz: f64,
    pub netto_fahrpreis: f64,
    pub aktionen: f64,
    pub rueckerstattungen: f64,
    pub trinkgeld: f64,
    pub bargeld: f64,
    pub fahrten: u32,
    pub waschen: f64,
    pub steuer: f64,
    pub netto_gehalt: f64,
    pub sonstige_abzuege: Vec<SonstigerPosten>,
    pub sonstige_zuschuesse: Vec<SonstigerPosten>,
    /// Final payout
    pub ergebnis: f64,
}

/// The entire persisted application state. Serialized as one JSON document;
/// the four keys below are the complete snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datenbestand {
    #[serde(default)]
    pub fahrzeuge: Vec<Fahrzeug>,
    #[serde(default)]
    pub mitarbeiter: Vec<Mitarbeiter>,
    #[serde(default)]
    pub umsaetze: Vec<Umsatz>,
    #[serde(default)]
    pub abrechnungen: Vec<Abrechnung>,
}

impl Datenbestand {
    /// First-run state: no vehicles, revenues or settlements yet, one
    /// example employee so the settlement flow can be tried immediately.
    pub fn mit_beispieldaten(heute: NaiveDate) -> Self {
        Self {
            fahrzeuge: Vec::new(),
            mitarbeiter: vec![Mitarbeiter {
                id: "m1".to_string(),
                vorname: "Frank".to_string(),
                nachname: "Rossler".to_string(),
                email: Some("frank.rossler@example.com".to_string()),
                telefon: Some("0123456789".to_string()),
                einstellungsdatum: heute.format("%Y-%m-%d").to_string(),
                aktiv: true,
                fahrzeug_id: None,
                steuer: 0.0,
                netto_gehalt: 1800.0,
                stundenlohn: None,
                prozent_verguetung: 40.0,
                soll_fahrten_anzahl: Some(90),
                krankenversicherung: None,
            }],
            umsaetze: Vec::new(),
            abrechnungen: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request for creating a new vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateFahrzeugRequest {
    pub kennzeichen: String,
    pub marke: String,
    pub modell: String,
    pub baujahr: i32,
    pub aktiv: bool,
}

/// Request for updating an existing vehicle (cost items have their own
/// operations and are not touched here)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateFahrzeugRequest {
    pub kennzeichen: Option<String>,
    pub marke: Option<String>,
    pub modell: Option<String>,
    pub baujahr: Option<i32>,
    pub aktiv: Option<bool>,
}

/// Request for adding a cost item to a vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateKostenRequest {
    pub bezeichnung: String,
    pub betrag: f64,
    pub zahlungsturnus: Zahlungsturnus,
    pub faellig_am: Option<String>,
}

/// Request for updating a cost item. The monthly equivalent is always
/// recomputed by the service, never supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateKostenRequest {
    pub bezeichnung: Option<String>,
    pub betrag: Option<f64>,
    pub zahlungsturnus: Option<Zahlungsturnus>,
    pub faellig_am: Option<Option<String>>,
}

/// Response after creating or updating a vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FahrzeugResponse {
    pub fahrzeug: Fahrzeug,
    pub success_message: String,
}

/// Response containing all vehicles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FahrzeugListResponse {
    pub fahrzeuge: Vec<Fahrzeug>,
}

/// Request for creating a new employee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMitarbeiterRequest {
    pub vorname: String,
    pub nachname: String,
    pub email: Option<String>,
    pub telefon: Option<String>,
    /// Hire date (ISO 8601 date)
    pub einstellungsdatum: String,
    pub aktiv: bool,
    pub fahrzeug_id: Option<String>,
    pub steuer: f64,
    pub netto_gehalt: f64,
    pub stundenlohn: Option<f64>,
    pub prozent_verguetung: f64,
    pub soll_fahrten_anzahl: Option<u32>,
    pub krankenversicherung: Option<f64>,
}

/// Request for updating an existing employee
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateMitarbeiterRequest {
    pub vorname: Option<String>,
    pub nachname: Option<String>,
    pub email: Option<Option<String>>,
    pub telefon: Option<Option<String>>,
    pub einstellungsdatum: Option<String>,
    pub aktiv: Option<bool>,
    pub fahrzeug_id: Option<Option<String>>,
    pub steuer: Option<f64>,
    pub netto_gehalt: Option<f64>,
    pub stundenlohn: Option<Option<f64>>,
    pub prozent_verguetung: Option<f64>,
    pub soll_fahrten_anzahl: Option<Option<u32>>,
    pub krankenversicherung: Option<Option<f64>>,
}

/// Response after creating or updating an employee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MitarbeiterResponse {
    pub mitarbeiter: Mitarbeiter,
    pub success_message: String,
}

/// Response containing all employees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MitarbeiterListResponse {
    pub mitarbeiter: Vec<Mitarbeiter>,
}

/// The eight weekly quantities of a revenue entry, without identity fields.
/// Used by the entry forms; everything defaults to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UmsatzWerte {
    pub gesamtumsatz: f64,
    pub netto_fahrpreis: f64,
    pub aktionen: f64,
    pub rueckerstattungen: f64,
    pub trinkgeld: f64,
    pub bargeld: f64,
    pub fahrten: u32,
    pub waschen: f64,
}

/// Quick-entry request: create or update the revenue record for one
/// employee and week in a single step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpsertUmsatzRequest {
    pub mitarbeiter_id: String,
    pub jahr: i32,
    pub wochen_nummer: u32,
    pub werte: UmsatzWerte,
}

/// Response after storing a revenue record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UmsatzResponse {
    pub umsatz: Umsatz,
    /// True when quick entry replaced an existing record for the same
    /// employee and week instead of inserting a new one
    pub aktualisiert: bool,
    pub success_message: String,
}

/// Response containing revenue records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UmsatzListResponse {
    pub umsaetze: Vec<Umsatz>,
}

/// Adjustment line item as entered in the settlement form (id not yet
/// assigned)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostenEingabe {
    pub bezeichnung: String,
    pub betrag: f64,
}

/// Request for creating a settlement over a set of selected weeks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateAbrechnungRequest {
    pub mitarbeiter_id: String,
    /// Selected week ids (canonical form), any order
    pub wochen: Vec<String>,
    pub steuer: f64,
    pub netto_gehalt: f64,
    pub sonstige_abzuege: Vec<PostenEingabe>,
    pub sonstige_zuschuesse: Vec<PostenEingabe>,
}

/// Response after creating a settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbrechnungResponse {
    pub abrechnung: Abrechnung,
    pub success_message: String,
}

/// Response containing settlements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbrechnungListResponse {
    pub abrechnungen: Vec<Abrechnung>,
}

/// Validation result for the settlement form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbrechnungFormValidation {
    pub is_valid: bool,
    pub errors: Vec<AbrechnungValidationError>,
}

/// Specific validation errors for the settlement form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AbrechnungValidationError {
    KeinMitarbeiterGewaehlt,
    KeineWochenGewaehlt,
    PostenOhneBezeichnung,
    PostenBetragNichtPositiv(f64),
}

impl AbrechnungValidationError {
    /// User-facing message for this error
    pub fn message(&self) -> String {
        match self {
            AbrechnungValidationError::KeinMitarbeiterGewaehlt => {
                "Bitte einen Mitarbeiter auswählen.".to_string()
            }
            AbrechnungValidationError::KeineWochenGewaehlt => {
                "Bitte mindestens eine Kalenderwoche auswählen.".to_string()
            }
            AbrechnungValidationError::PostenOhneBezeichnung => {
                "Jeder Posten braucht eine Bezeichnung.".to_string()
            }
            AbrechnungValidationError::PostenBetragNichtPositiv(betrag) => {
                format!("Der Betrag eines Postens muss größer als 0 sein (war {:.2}).", betrag)
            }
        }
    }
}
