use anyhow::Result;
use async_trait::async_trait;
use shared::Abrechnung;

use super::connection::JsonConnection;
use crate::storage::traits::AbrechnungStorage;

/// JSON-snapshot-backed settlement repository. Settlements are append-only;
/// the trait offers no update operation.
#[derive(Clone)]
pub struct AbrechnungRepository {
    connection: JsonConnection,
}

impl AbrechnungRepository {
    /// Create a new settlement repository
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AbrechnungStorage for AbrechnungRepository {
    async fn store_abrechnung(&self, abrechnung: &Abrechnung) -> Result<()> {
        let abrechnung = abrechnung.clone();
        self.connection.modify(move |bestand| {
            bestand.abrechnungen.push(abrechnung);
            Ok(())
        })
    }

    async fn get_abrechnung(&self, abrechnung_id: &str) -> Result<Option<Abrechnung>> {
        let bestand = self.connection.load()?;
        Ok(bestand
            .abrechnungen
            .into_iter()
            .find(|a| a.id == abrechnung_id))
    }

    async fn list_abrechnungen(&self) -> Result<Vec<Abrechnung>> {
        let bestand = self.connection.load()?;
        Ok(bestand.abrechnungen)
    }

    async fn list_abrechnungen_fuer_mitarbeiter(
        &self,
        mitarbeiter_id: &str,
    ) -> Result<Vec<Abrechnung>> {
        let bestand = self.connection.load()?;
        Ok(bestand
            .abrechnungen
            .into_iter()
            .filter(|a| a.mitarbeiter_id == mitarbeiter_id)
            .collect())
    }

    async fn delete_abrechnung(&self, abrechnung_id: &str) -> Result<bool> {
        let abrechnung_id = abrechnung_id.to_string();
        self.connection.modify(move |bestand| {
            let before = bestand.abrechnungen.len();
            bestand.abrechnungen.retain(|a| a.id != abrechnung_id);
            Ok(bestand.abrechnungen.len() < before)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_repo() -> (AbrechnungRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path()).unwrap();
        let repo = AbrechnungRepository::new(connection);
        (repo, temp_dir)
    }

    fn test_abrechnung(id: &str, mitarbeiter_id: &str) -> Abrechnung {
        Abrechnung {
            id: id.to_string(),
            mitarbeiter_id: mitarbeiter_id.to_string(),
            start_woche: "2024-05".to_string(),
            end_woche: "2024-08".to_string(),
            erstellt_am: "2024-03-25T09:00:00+00:00".to_string(),
            gesamtumsatz: 1000.0,
            netto_fahrpreis: 900.0,
            aktionen: 0.0,
            rueckerstattungen: 10.0,
            trinkgeld: 50.0,
            bargeld: 200.0,
            fahrten: 80,
            waschen: 20.0,
            steuer: 0.0,
            netto_gehalt: 0.0,
            sonstige_abzuege: Vec::new(),
            sonstige_zuschuesse: Vec::new(),
            ergebnis: 280.0,
        }
    }

    #[tokio::test]
    async fn test_store_and_get_abrechnung() {
        let (repo, _temp_dir) = setup_test_repo();

        let abrechnung = test_abrechnung("a1", "m1");
        repo.store_abrechnung(&abrechnung)
            .await
            .expect("Failed to store settlement");

        let retrieved = repo.get_abrechnung("a1").await.unwrap();
        assert_eq!(retrieved, Some(abrechnung));
    }

    #[tokio::test]
    async fn test_list_abrechnungen_fuer_mitarbeiter_filters() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.store_abrechnung(&test_abrechnung("a1", "m1")).await.unwrap();
        repo.store_abrechnung(&test_abrechnung("a2", "m2")).await.unwrap();
        repo.store_abrechnung(&test_abrechnung("a3", "m1")).await.unwrap();

        let eigene = repo.list_abrechnungen_fuer_mitarbeiter("m1").await.unwrap();
        let ids: Vec<&str> = eigene.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);

        assert_eq!(repo.list_abrechnungen().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_abrechnung() {
        let (repo, _temp_dir) = setup_test_repo();

        repo.store_abrechnung(&test_abrechnung("a1", "m1")).await.unwrap();

        assert!(repo.delete_abrechnung("a1").await.unwrap());
        assert!(!repo.delete_abrechnung("a1").await.unwrap());
        assert!(repo.list_abrechnungen().await.unwrap().is_empty());
    }
}
