use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use vet_core::db::collection::{Upsert, remove_estimate, sort_newest_first, upsert_estimate};
use vet_core::{Company, CompanyPatch, Estimate, EstimateRepository, RepositoryError, apply_update};

const COMPANY_FILE: &str = "company.json";
const ESTIMATES_FILE: &str = "estimates.json";
const SEQUENCE_FILE: &str = "sequence.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sequence {
    last_estimate_number: u64,
}

/// Repository backed by JSON documents in one directory.
///
/// Writes go through a single mutex and replace a whole document at a time
/// (write to `<name>.tmp`, then rename), so a reader sees either the old or
/// the new document. Two processes writing the same directory still race.
pub struct JsonFileRepository {
    dir: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileRepository {
    /// Use `dir` as the data directory, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            RepositoryError::Storage(format!(
                "failed to create data directory '{}': {e}",
                dir.display()
            ))
        })?;
        debug!(dir = %dir.display(), "opened json data directory");

        Ok(Self {
            dir,
            writer: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    async fn read_document<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let path = self.dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "failed to read '{}': {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            RepositoryError::Serialization(format!("failed to parse '{}': {e}", path.display()))
        })
    }

    async fn write_document<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| RepositoryError::Serialization(format!("failed to encode {name}: {e}")))?;

        let path = self.dir.join(name);
        let tmp_path = self.dir.join(format!("{name}.tmp"));

        tokio::fs::write(&tmp_path, &bytes).await.map_err(|e| {
            RepositoryError::Storage(format!("failed to write '{}': {e}", tmp_path.display()))
        })?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(RepositoryError::Storage(format!(
                "failed to replace '{}': {e}",
                path.display()
            )));
        }

        Ok(())
    }

    async fn load_estimates(&self) -> Result<Vec<Estimate>, RepositoryError> {
        Ok(self
            .read_document::<Vec<Estimate>>(ESTIMATES_FILE)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl EstimateRepository for JsonFileRepository {
    async fn get_company(&self) -> Result<Option<Company>, RepositoryError> {
        self.read_document(COMPANY_FILE).await
    }

    async fn update_company(
        &self,
        patch: CompanyPatch,
    ) -> Result<Company, RepositoryError> {
        let _guard = self.writer.lock().await;

        let existing = self.read_document::<Company>(COMPANY_FILE).await?;
        let company = apply_update(existing, patch);
        self.write_document(COMPANY_FILE, &company).await?;

        info!(name = %company.name, "company profile updated");
        Ok(company)
    }

    async fn get_estimates(&self) -> Result<Vec<Estimate>, RepositoryError> {
        let mut estimates = self.load_estimates().await?;
        sort_newest_first(&mut estimates);
        debug!(count = estimates.len(), "listed estimates");
        Ok(estimates)
    }

    async fn get_estimate_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Estimate>, RepositoryError> {
        Ok(self.load_estimates().await?.into_iter().find(|e| e.id == id))
    }

    async fn save_estimate(
        &self,
        estimate: Estimate,
    ) -> Result<Estimate, RepositoryError> {
        let _guard = self.writer.lock().await;

        let mut estimates = self.load_estimates().await?;
        let mut sequence = self
            .read_document::<Sequence>(SEQUENCE_FILE)
            .await?
            .unwrap_or_default();

        let (saved, outcome) = upsert_estimate(
            &mut estimates,
            &mut sequence.last_estimate_number,
            estimate,
            Utc::now(),
        );

        // A create touches two documents. The counter is written first, so a
        // failed collection write costs one number and leaves nothing stored.
        if outcome == Upsert::Created {
            self.write_document(SEQUENCE_FILE, &sequence).await?;
        }
        self.write_document(ESTIMATES_FILE, &estimates).await?;
        match outcome {
            Upsert::Created => info!(id = %saved.id, "estimate created"),
            Upsert::Updated => info!(id = %saved.id, "estimate updated"),
        }

        Ok(saved)
    }

    async fn delete_estimate(
        &self,
        id: &str,
    ) -> Result<bool, RepositoryError> {
        let _guard = self.writer.lock().await;

        let mut estimates = self.load_estimates().await?;
        if !remove_estimate(&mut estimates, id) {
            return Ok(false);
        }
        self.write_document(ESTIMATES_FILE, &estimates).await?;

        info!(id, "estimate deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use vet_core::{EstimateStatus, Gender, LineItem, NEW_ESTIMATE_ID, Owner, Pet};

    use super::*;

    fn draft() -> Estimate {
        Estimate {
            id: NEW_ESTIMATE_ID.to_string(),
            owner: Owner {
                name: "Ana".to_string(),
                address: "Valencia".to_string(),
                email: "ana@email.com".to_string(),
                phone: "633".to_string(),
                cedula: None,
            },
            pet: Pet {
                name: "Rocky".to_string(),
                breed: "Bulldog".to_string(),
                age: "7 años".to_string(),
                gender: Gender::Male,
            },
            line_items: vec![LineItem {
                id: "1".to_string(),
                service: "Consulta".to_string(),
                description: "Revisión".to_string(),
                quantity: dec!(1),
                price: dec!(75),
            }],
            tax_rate: dec!(10),
            created_at: Utc::now(),
            status: EstimateStatus::Draft,
        }
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");

        let repo = JsonFileRepository::open(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(repo.data_dir(), dir.as_path());
    }

    #[tokio::test]
    async fn missing_documents_read_as_empty() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();

        assert_eq!(repo.get_company().await, Ok(None));
        assert_eq!(repo.get_estimates().await, Ok(Vec::new()));
        assert_eq!(repo.get_estimate_by_id("EST-001").await, Ok(None));
    }

    #[tokio::test]
    async fn write_leaves_no_temp_file_behind() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();

        repo.write_document(SEQUENCE_FILE, &Sequence { last_estimate_number: 4 })
            .await
            .unwrap();

        assert!(tmp.path().join(SEQUENCE_FILE).is_file());
        assert!(!tmp.path().join("sequence.json.tmp").exists());
        let read: Option<Sequence> = repo.read_document(SEQUENCE_FILE).await.unwrap();
        assert_eq!(read.map(|s| s.last_estimate_number), Some(4));
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(ESTIMATES_FILE), b"{ not json").unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();

        assert!(matches!(
            repo.get_estimates().await,
            Err(RepositoryError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn stored_estimate_without_created_at_is_a_serialization_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(ESTIMATES_FILE),
            r#"[{
                "id": "EST-001",
                "owner": { "name": "Ana", "address": "Valencia", "email": "ana@email.com", "phone": "633" },
                "pet": { "name": "Rocky", "breed": "Bulldog", "age": "7 años", "gender": "Macho" },
                "lineItems": [],
                "taxRate": 21,
                "status": "Borrador"
            }]"#,
        )
        .unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();

        for _ in 0..2 {
            let err = repo.get_estimate_by_id("EST-001").await.unwrap_err();
            assert!(
                matches!(&err, RepositoryError::Serialization(msg) if msg.contains("createdAt")),
                "{err:?}"
            );
        }
    }

    #[tokio::test]
    async fn failed_create_stores_nothing_and_skips_its_number() {
        let tmp = TempDir::new().unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();
        let blocker = tmp.path().join("estimates.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(matches!(
            repo.save_estimate(draft()).await,
            Err(RepositoryError::Storage(_))
        ));
        assert_eq!(repo.get_estimates().await, Ok(Vec::new()));

        std::fs::remove_dir(&blocker).unwrap();
        let saved = repo.save_estimate(draft()).await.unwrap();

        assert_eq!(saved.id, "EST-002");
        assert_eq!(repo.get_estimates().await.unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn unreadable_document_is_a_storage_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join(COMPANY_FILE)).unwrap();
        let repo = JsonFileRepository::open(tmp.path()).await.unwrap();

        assert!(matches!(
            repo.get_company().await,
            Err(RepositoryError::Storage(_))
        ));
    }
}
