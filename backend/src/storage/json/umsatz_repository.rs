use anyhow::Result;
use async_trait::async_trait;
use shared::Umsatz;

use super::connection::JsonConnection;
use crate::storage::traits::UmsatzStorage;

/// JSON-snapshot-backed repository for weekly revenue records
#[derive(Clone)]
pub struct UmsatzRepository {
    connection: JsonConnection,
}

impl UmsatzRepository {
    /// Create a new revenue repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl UmsatzStorage for UmsatzRepository {
    async fn store_umsatz(&self, umsatz: &Umsatz) -> Result<()> {
        let umsatz = umsatz.clone();
        self.connection.modify(move |bestand| {
            bestand.umsaetze.push(umsatz);
            Ok(())
        })
    }

    async fn get_umsatz(&self, umsatz_id: &str) -> Result<Option<Umsatz>> {
        let bestand = self.connection.load()?;
        Ok(bestand.umsaetze.into_iter().find(|u| u.id == umsatz_id))
    }

    async fn list_umsaetze(&self) -> Result<Vec<Umsatz>> {
        let bestand = self.connection.load()?;
        Ok(bestand.umsaetze)
    }

    async fn list_umsaetze_fuer_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<Vec<Umsatz>> {
        let bestand = self.connection.load()?;
        Ok(bestand
            .umsaetze
            .into_iter()
            .filter(|u| u.mitarbeiter_id == mitarbeiter_id)
            .collect())
    }

    async fn find_umsatz_fuer_woche(
        &self,
        mitarbeiter_id: &str,
        jahr: i32,
        wochen_nummer: u32,
    ) -> Result<Option<Umsatz>> {
        let bestand = self.connection.load()?;
        Ok(bestand.umsaetze.into_iter().find(|u| {
            u.mitarbeiter_id == mitarbeiter_id && u.jahr == jahr && u.wochen_nummer == wochen_nummer
        }))
    }

    async fn update_umsatz(&self, umsatz: &Umsatz) -> Result<()> {
        let umsatz = umsatz.clone();
        self.connection.modify(move |bestand| {
            match bestand.umsaetze.iter_mut().find(|u| u.id == umsatz.id) {
                Some(existing) => {
                    *existing = umsatz;
                    Ok(())
                }
                None => Err(anyhow::anyhow!("Umsatz not found: {}", umsatz.id)),
            }
        })
    }

    async fn delete_umsatz(&self, umsatz_id: &str) -> Result<bool> {
        let umsatz_id = umsatz_id.to_string();
        self.connection.modify(move |bestand| {
            let before = bestand.umsaetze.len();
            bestand.umsaetze.retain(|u| u.id != umsatz_id);
            Ok(bestand.umsaetze.len() < before)
        })
    }
}
