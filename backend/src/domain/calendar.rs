//! Calendar week logic for revenue capture and settlement selection.
//!
//! Week numbering is anchored at January 1st (see
//! [`shared::Kalenderwoche::fuer_datum`]); this module only decides which
//! weeks are offered for selection and which week "now" falls into.

use chrono::{Local, NaiveDate};
use shared::Kalenderwoche;

/// Service for calendar week selection
#[derive(Clone, Default)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService
    pub fn new() -> Self {
        Self
    }

    /// The calendar week containing today's local date
    pub fn aktuelle_woche(&self) -> Kalenderwoche {
        self.woche_fuer_datum(Local::now().date_naive())
    }

    /// The calendar week containing the given date
    pub fn woche_fuer_datum(&self, datum: NaiveDate) -> Kalenderwoche {
        Kalenderwoche::fuer_datum(datum)
    }

    /// Weeks offered in entry forms: all weeks of the given year, then all
    /// weeks of the previous year. Revenue is entered retroactively at most
    /// one year back.
    pub fn auswaehlbare_wochen(&self, jahr: i32) -> Vec<Kalenderwoche> {
        let mut wochen = Kalenderwoche::fuer_jahr(jahr);
        wochen.extend(Kalenderwoche::fuer_jahr(jahr - 1));
        wochen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woche_fuer_datum() {
        let service = CalendarService::new();

        let kw = service.woche_fuer_datum(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(kw, Kalenderwoche::new(2024, 1));

        let kw = service.woche_fuer_datum(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(kw, Kalenderwoche::new(2024, 24));
    }

    #[test]
    fn test_auswaehlbare_wochen_covers_two_years() {
        let service = CalendarService::new();

        let wochen = service.auswaehlbare_wochen(2024);
        assert_eq!(wochen.len(), 106);

        // Current year first, previous year after
        assert_eq!(wochen[0].id(), "2024-01");
        assert_eq!(wochen[52].id(), "2024-53");
        assert_eq!(wochen[53].id(), "2023-01");
        assert_eq!(wochen[105].id(), "2023-53");
    }
}
