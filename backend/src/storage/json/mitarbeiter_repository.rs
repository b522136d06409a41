use anyhow::Result;
use async_trait::async_trait;
use shared::Mitarbeiter;

use super::connection::JsonConnection;
use crate::storage::traits::MitarbeiterStorage;

/// JSON-snapshot-backed employee repository
#[derive(Clone)]
pub struct MitarbeiterRepository {
    connection: JsonConnection,
}

impl MitarbeiterRepository {
    /// Create a new employee repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl MitarbeiterStorage for MitarbeiterRepository {
    async fn store_mitarbeiter(&self, mitarbeiter: &Mitarbeiter) -> Result<()> {
        let mitarbeiter = mitarbeiter.clone();
        self.connection.modify(move |bestand| {
            bestand.mitarbeiter.push(mitarbeiter);
            Ok(())
        })
    }

    async fn get_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<Option<Mitarbeiter>> {
        let bestand = self.connection.load()?;
        Ok(bestand
            .mitarbeiter
            .into_iter()
            .find(|m| m.id == mitarbeiter_id))
    }

    async fn list_mitarbeiter(&self) -> Result<Vec<Mitarbeiter>> {
        let bestand = self.connection.load()?;
        Ok(bestand.mitarbeiter)
    }

    async fn update_mitarbeiter(&self, mitarbeiter: &Mitarbeiter) -> Result<()> {
        let mitarbeiter = mitarbeiter.clone();
        self.connection.modify(move |bestand| {
            match bestand
                .mitarbeiter
                .iter_mut()
                .find(|m| m.id == mitarbeiter.id)
            {
                Some(existing) => {
                    *existing = mitarbeiter;
                    Ok(())
                }
                None => Err(anyhow::anyhow!("Mitarbeiter not found: {}", mitarbeiter.id)),
            }
        })
    }

    async fn delete_mitarbeiter(&self, mitarbeiter_id: &str) -> Result<bool> {
        let mitarbeiter_id = mitarbeiter_id.to_string();
        self.connection.modify(move |bestand| {
            let before = bestand.mitarbeiter.len();
            bestand.mitarbeiter.retain(|m| m.id != mitarbeiter_id);
            Ok(bestand.mitarbeiter.len() < before)
        })
    }
}
