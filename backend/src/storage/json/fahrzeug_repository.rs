use anyhow::Result;
use async_trait::async_trait;
use shared::Fahrzeug;

use super::connection::JsonConnection;
use crate::storage::traits::FahrzeugStorage;

/// JSON-snapshot-backed vehicle repository
#[derive(Clone)]
pub struct FahrzeugRepository {
    connection: JsonConnection,
}

impl FahrzeugRepository {
    /// Create a new vehicle repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl FahrzeugStorage for FahrzeugRepository {
    async fn store_fahrzeug(&self, fahrzeug: &Fahrzeug) -> Result<()> {
        let fahrzeug = fahrzeug.clone();
        self.connection.modify(move |bestand| {
            bestand.fahrzeuge.push(fahrzeug);
            Ok(())
        })
    }

    async fn get_fahrzeug(&self, fahrzeug_id: &str) -> Result<Option<Fahrzeug>> {
        let bestand = self.connection.load()?;
        Ok(bestand.fahrzeuge.into_iter().find(|f| f.id == fahrzeug_id))
    }

    async fn list_fahrzeuge(&self) -> Result<Vec<Fahrzeug>> {
        let bestand = self.connection.load()?;
        Ok(bestand.fahrzeuge)
    }

    async fn update_fahrzeug(&self, fahrzeug: &Fahrzeug) -> Result<()> {
        let fahrzeug = fahrzeug.clone();
        self.connection.modify(move |bestand| {
            match bestand.fahrzeuge.iter_mut().find(|f| f.id == fahrzeug.id) {
                Some(existing) => {
                    *existing = fahrzeug;
                    Ok(())
                }
                None => Err(anyhow::anyhow!("Fahrzeug not found: {}", fahrzeug.id)),
            }
        })
    }

    async fn delete_fahrzeug(&self, fahrzeug_id: &str) -> Result<bool> {
        let fahrzeug_id = fahrzeug_id.to_string();
        self.connection.modify(move |bestand| {
            let before = bestand.fahrzeuge.len();
            bestand.fahrzeuge.retain(|f| f.id != fahrzeug_id);
            Ok(bestand.fahrzeuge.len() < before)
        })
    }
}
