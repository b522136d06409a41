//! Domain-level result types
//! These structs are produced by services inside the domain layer and are
//! **not** part of the persisted data model. A UI layer renders them
//! directly; nothing here is written to the snapshot.

pub mod abrechnungen {
    use crate::domain::umsatz_service::UmsatzAggregat;

    /// Form defaults taken from the employee record when one is selected.
    /// Both stay editable on the form; only the final request values count.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct AbrechnungVorgaben {
        pub steuer: f64,
        pub netto_gehalt: f64,
    }

    /// Computed settlement amounts, shown as a live preview before the
    /// settlement is saved and embedded in the final document.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AbrechnungVorschau {
        /// Field-wise sums of the selected weeks' revenue records
        pub aggregat: UmsatzAggregat,
        /// The employee's share of gross revenue
        pub anteil: f64,
        /// Total allowances: tips, car wash, reimbursements and ad-hoc items
        pub zuschuesse: f64,
        /// Total deductions: cash kept, tax, net salary and ad-hoc items
        pub abzuege: f64,
        /// Final payout: share plus allowances minus deductions
        pub ergebnis: f64,
    }
}

pub mod statistik {
    use shared::Kalenderwoche;

    /// Headline figures for the dashboard
    #[derive(Debug, Clone, PartialEq)]
    pub struct DashboardKennzahlen {
        /// Gross revenue of records captured in the current calendar month
        pub umsatz_aktueller_monat: f64,
        /// Monthly vehicle costs plus salaries and health insurance
        pub gesamtkosten_monat: f64,
        pub aktive_fahrzeuge: usize,
        pub fahrzeuge_gesamt: usize,
        pub aktive_mitarbeiter: usize,
        pub mitarbeiter_gesamt: usize,
        /// Average trips per revenue record, rounded
        pub durchschnitt_fahrten_pro_woche: u32,
    }

    /// One calendar week in the revenue chart
    #[derive(Debug, Clone, PartialEq)]
    pub struct WochenUmsatzPunkt {
        pub woche: Kalenderwoche,
        pub gesamtumsatz: f64,
        pub netto_fahrpreis: f64,
        pub aktionen: f64,
        pub trinkgeld: f64,
        pub fahrten: u32,
    }

    /// Averages over a weekly revenue series
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct UmsatzDurchschnitt {
        pub umsatz_pro_woche: f64,
        pub fahrten_pro_woche: f64,
        pub trinkgeld_pro_fahrt: f64,
    }
}
