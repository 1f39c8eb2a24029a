use anyhow::{bail, Context, Result};
use archivist_core::scan::{RenderTarget, ScanEvent, ScanOutcome, ScanSessionManager};
use archivist_core::{
    capsule, CollectionSynchronizer, DocumentFields, DocumentId, Reconciled, ViewState,
};
use archivist_remote::ArchiveClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::line_camera::{LineCamera, LineSource};
use crate::render;
use crate::FieldArgs;

impl FieldArgs {
    pub fn to_fields(&self) -> DocumentFields {
        DocumentFields {
            title: self.title.clone(),
            description: self.description.clone(),
            department: self.department.clone(),
            owner_name: self.owner_name.clone(),
            owner_contact: self.owner_contact.clone(),
            shelf_code: self.shelf.clone(),
            box_number: self.box_number.clone(),
            folder_number: self.folder.clone(),
        }
    }
}

/// The CLI never tears its view down early, so a discarded result is a bug
fn applied<T>(result: Reconciled<T>) -> Result<T> {
    match result {
        Reconciled::Applied(value) => Ok(value),
        Reconciled::Discarded => bail!("result discarded: the view was closed"),
    }
}

pub fn qr_file_name_for(id: DocumentId) -> String {
    format!("document_qr_{}.png", id)
}

pub struct App {
    config: AppConfig,
    client: Arc<ArchiveClient>,
    sync: CollectionSynchronizer,
}

impl App {
    pub fn connect(config: AppConfig) -> Result<Self> {
        let client = ArchiveClient::new(config.remote())
            .map_err(|e| anyhow::anyhow!("Failed to set up archive client: {}", e))?;
        let client = Arc::new(client);
        let sync = CollectionSynchronizer::with_view(
            client.clone(),
            ViewState::new(config.page_size),
        );

        Ok(Self {
            config,
            client,
            sync,
        })
    }

    async fn load(&self) -> Result<usize> {
        let count = applied(self.sync.load().await?)?;
        info!("Archive holds {} documents", count);
        Ok(count)
    }

    pub async fn list(
        &self,
        search: Option<String>,
        department: Option<String>,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<()> {
        self.load().await?;

        if let Some(page_size) = page_size {
            self.sync.set_page_size(page_size);
        }
        self.sync.set_search_term(search.unwrap_or_default());
        self.sync.set_department_filter(department.unwrap_or_default());
        if page != 1 && !self.sync.go_to_page(page) {
            warn!("Page {} is out of range, showing page 1", page);
        }

        print!("{}", render::page(&self.sync.page()));
        Ok(())
    }

    pub async fn departments(&self) -> Result<()> {
        self.load().await?;
        let facets = self.sync.facets();
        if facets.is_empty() {
            println!("No departments recorded");
        }
        for department in facets {
            println!("{}", department);
        }
        Ok(())
    }

    pub async fn show(&self, id: DocumentId) -> Result<()> {
        let record = self
            .client
            .get_document(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch document {}: {}", id, e))?;
        print!("{}", render::record(&record));
        Ok(())
    }

    pub async fn search(&self, title: Option<String>, department: Option<String>) -> Result<()> {
        let result = self
            .client
            .search(title.as_deref(), department.as_deref())
            .await
            .map_err(|e| anyhow::anyhow!("Search failed: {}", e))?;

        for record in &result.documents {
            println!(
                "{:>6}  {}  [{}]",
                record.id,
                record.title,
                record.department().unwrap_or("-")
            );
        }
        println!("{} documents found", result.count);
        Ok(())
    }

    pub async fn add(&self, fields: FieldArgs) -> Result<()> {
        let created = applied(self.sync.create(fields.to_fields()).await?)?;
        println!("Registered document #{}", created.id);
        print!("{}", render::record(&created));
        Ok(())
    }

    pub async fn edit(&self, id: DocumentId, fields: FieldArgs) -> Result<()> {
        let fields = fields.to_fields();
        if fields.is_empty() {
            bail!("Nothing to change: pass at least one field flag");
        }
        let updated = applied(self.sync.update(id, fields).await?)?;
        println!("Updated document #{}", updated.id);
        print!("{}", render::record(&updated));
        Ok(())
    }

    pub async fn delete(&self, id: DocumentId, yes: bool) -> Result<()> {
        self.load().await?;
        let Some(confirmation) = self.sync.request_delete(id) else {
            bail!("Document {} not found", id);
        };

        if !yes {
            let title = self
                .sync
                .collection()
                .get(id)
                .map(|r| r.title.clone())
                .unwrap_or_default();
            if !confirm(&format!("Delete document #{} '{}'? [y/N] ", id, title)).await? {
                drop(confirmation);
                println!("Cancelled");
                return Ok(());
            }
        }

        let deleted = applied(self.sync.delete(confirmation).await?)?;
        println!("Deleted document #{}", deleted);
        Ok(())
    }

    pub async fn receipt(&self, id: DocumentId, out_dir: Option<PathBuf>, qr: bool) -> Result<()> {
        // The local copy supplies the capsule the receipt should carry
        if let Err(e) = self.sync.load().await {
            warn!("Could not refresh documents before downloading receipt: {}", e);
        }

        let receipt = applied(self.sync.download_receipt(id).await?)?;
        let dir = out_dir.unwrap_or_else(|| self.config.receipt_dir.clone());
        let path = write_file(&dir, &receipt.file_name, &receipt.pdf).await?;
        println!("Saved receipt to {}", path.display());

        if qr {
            let png = self
                .client
                .qr_code_png(id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to fetch QR code of {}: {}", id, e))?;
            let path = write_file(&dir, &qr_file_name_for(id), &png).await?;
            println!("Saved QR code to {}", path.display());
        }
        if let Some(capsule) = &receipt.capsule {
            info!("Receipt QR code should read: {}", capsule);
        }
        Ok(())
    }

    pub async fn capsule(&self, id: DocumentId) -> Result<()> {
        self.load().await?;
        let collection = self.sync.collection();
        let record = collection
            .get(id)
            .with_context(|| format!("Document {} not found", id))?;
        println!("{}", capsule::encode(record));
        Ok(())
    }

    pub async fn scan(&self, input: Option<PathBuf>, raw: bool) -> Result<()> {
        let (source, target) = match input {
            Some(path) => {
                let target = RenderTarget::new(path.display().to_string());
                (LineSource::File(path), target)
            }
            None => (LineSource::Stdin, RenderTarget::new("stdin")),
        };

        let camera = Arc::new(LineCamera::new(source));
        let mut session = ScanSessionManager::new(camera, self.config.scan());
        session.start(&target).await?;
        eprintln!("Scanning... (Ctrl+C to stop)");

        let finished = tokio::select! {
            outcome = session.run(report) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        let outcome = match finished {
            Some(outcome) => outcome,
            None => {
                session.stop();
                ScanOutcome::Stopped
            }
        };

        match outcome {
            ScanOutcome::Decoded(capsule) => {
                if raw {
                    if let Some(text) = session.raw_text() {
                        println!("Raw QR data: {}", text);
                    }
                }
                print!("{}", render::capsule(&capsule));
                match self.sync.load().await {
                    Ok(_) => match self.sync.collection().get(capsule.id) {
                        Some(stored) => println!(
                            "Found in archive, location: {}",
                            stored.location_line()
                        ),
                        None => println!("Document #{} is not in the archive", capsule.id),
                    },
                    Err(e) => warn!("Could not check the archive: {}", e),
                }
                Ok(())
            }
            ScanOutcome::Ended(error) => Err(error.into()),
            ScanOutcome::Stopped => {
                eprintln!("Scan stopped");
                Ok(())
            }
        }
    }
}

fn report(event: &ScanEvent) {
    if let ScanEvent::Rejected(error) = event {
        eprintln!("Not a document capsule: {}", error);
    }
}

/// Decode capsule text from the argument, or from stdin when absent
pub async fn decode(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read capsule from stdin")?;
            buffer
        }
    };

    let capsule = capsule::decode(&text)?;
    print!("{}", render::capsule(&capsule));
    Ok(())
}

async fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{}", prompt);
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_args_map_location_flags() {
        let args = FieldArgs {
            title: Some("Lease".into()),
            shelf: Some("S-01".into()),
            box_number: Some("4".into()),
            ..FieldArgs::default()
        };
        let fields = args.to_fields();
        assert_eq!(fields.shelf_code.as_deref(), Some("S-01"));
        assert_eq!(fields.box_number.as_deref(), Some("4"));
        assert_eq!(fields.folder_number, None);
        assert!(FieldArgs::default().to_fields().is_empty());
    }

    #[test]
    fn test_discarded_result_is_an_error() {
        assert_eq!(applied(Reconciled::Applied(3)).unwrap(), 3);
        assert!(applied::<i64>(Reconciled::Discarded).is_err());
    }

    #[tokio::test]
    async fn test_write_file_creates_directory() {
        let dir = std::env::temp_dir().join(format!("archivist-receipts-{}", std::process::id()));
        let path = write_file(&dir, "document_receipt_5.pdf", b"%PDF").await.unwrap();

        assert_eq!(path.file_name().unwrap(), "document_receipt_5.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
        std::fs::remove_dir_all(dir).ok();
    }
}
