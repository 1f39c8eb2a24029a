use super::config::RemoteConfig;
use super::models::{
    DocumentListResponse, DocumentPayload, DocumentResponse, MessageResponse, SearchResponse,
};
use archivist_api::{DocumentFields, DocumentId, DocumentRecord};
use archivist_core::traits::{DocumentService, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

/// Longest error body echoed into an error message
const MAX_ERROR_BODY: usize = 500;

pub struct ArchiveClient {
    config: RemoteConfig,
    default_headers: HeaderMap,
    client: reqwest::Client,
}

impl ArchiveClient {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        info!(
            "[ArchiveClient] Using archive at {} (timeout {:?})",
            config.base_url, config.timeout
        );

        Ok(Self {
            config,
            default_headers: headers,
            client,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Helper to create better error messages from reqwest errors
    fn format_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> String {
        if e.is_timeout() {
            format!(
                "Failed to {} for {}: timeout - request took too long (check network or increase timeout)",
                operation, url
            )
        } else if e.is_connect() {
            format!(
                "Failed to {} for {}: connection error - is the archive service running? Error: {}",
                operation, url, e
            )
        } else if e.is_request() {
            format!(
                "Failed to {} for {}: request error - invalid URL format or malformed request parameters. Error: {}",
                operation, url, e
            )
        } else if e.is_decode() {
            format!(
                "Failed to {} for {}: decode error - unexpected response format from server. Error: {}",
                operation, url, e
            )
        } else {
            format!("Failed to {} for {}: {}. Debug details: {:?}", operation, url, e, e)
        }
    }

    /// Turn a non-2xx status into an error carrying (a prefix of) the body
    async fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        let body = if body.chars().count() > MAX_ERROR_BODY {
            format!(
                "{}... (truncated)",
                body.chars().take(MAX_ERROR_BODY).collect::<String>()
            )
        } else {
            body
        };

        Err(format!("HTTP {} error from {}: {}", status.as_u16(), url, body).into())
    }

    /// Helper to handle HTTP responses with better error messages
    async fn handle_response(response: reqwest::Response, url: &str) -> Result<String> {
        let response = Self::check_status(response, url).await?;
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body from {}: {}", url, e))?;
        Ok(text)
    }

    async fn handle_binary_response(response: reqwest::Response, url: &str) -> Result<Vec<u8>> {
        let response = Self::check_status(response, url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read response body from {}: {}", url, e))?;
        Ok(bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(text: &str, url: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| {
            let message = format!(
                "Failed to parse response from {}: {} - Response: {}",
                url,
                e,
                text.chars().take(200).collect::<String>()
            );
            error!("[ArchiveClient] {}", message);
            message.into()
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        operation: &str,
    ) -> Result<reqwest::Response> {
        request
            .headers(self.default_headers.clone())
            .send()
            .await
            .map_err(|e| {
                let message = Self::format_reqwest_error(e, url, operation);
                error!("[ArchiveClient] {}", message);
                message.into()
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, operation: &str) -> Result<T> {
        let response = self.send(self.client.get(url), url, operation).await?;
        let text = Self::handle_response(response, url).await?;
        Self::parse(&text, url)
    }

    /// Fetch one document
    pub async fn get_document(&self, id: DocumentId) -> Result<DocumentRecord> {
        let url = self.config.endpoint(&format!("documents/{}", id));
        let response: DocumentResponse = self.get_json(&url, "fetch document").await?;
        Ok(response.document)
    }

    /// Server-side search: case-insensitive substring on title and department.
    /// Blank arguments are not sent.
    pub async fn search(
        &self,
        title: Option<&str>,
        department: Option<&str>,
    ) -> Result<SearchResponse> {
        let url = self.config.endpoint("documents/search");
        let mut query = Vec::new();
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            query.push(("title", title));
        }
        if let Some(department) = department.filter(|d| !d.trim().is_empty()) {
            query.push(("departement", department));
        }

        let request = self.client.get(&url).query(&query);
        let response = self.send(request, &url, "search documents").await?;
        let text = Self::handle_response(response, &url).await?;
        let result: SearchResponse = Self::parse(&text, &url)?;

        debug!(
            "[ArchiveClient] Search matched {} documents",
            result.documents.len()
        );
        Ok(result)
    }

    /// PNG image of the QR code the server prints on receipts
    pub async fn qr_code_png(&self, id: DocumentId) -> Result<Vec<u8>> {
        let url = self.config.endpoint(&format!("documents/{}/qr-code", id));
        let response = self
            .send(self.client.get(&url), &url, "fetch QR code")
            .await?;
        Self::handle_binary_response(response, &url).await
    }
}

#[async_trait]
impl DocumentService for ArchiveClient {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let url = self.config.endpoint("documents");
        let response: DocumentListResponse = self.get_json(&url, "list documents").await?;
        debug!(
            "[ArchiveClient] Listed {} documents",
            response.documents.len()
        );
        Ok(response.documents)
    }

    async fn create_document(&self, fields: &DocumentFields) -> Result<DocumentRecord> {
        let url = self.config.endpoint("documents");
        let request = self.client.post(&url).json(&DocumentPayload::from(fields));
        let response = self.send(request, &url, "create document").await?;
        let text = Self::handle_response(response, &url).await?;
        let record: DocumentRecord = Self::parse(&text, &url)?;

        debug!("[ArchiveClient] Created document {}", record.id);
        Ok(record)
    }

    async fn update_document(
        &self,
        id: DocumentId,
        fields: &DocumentFields,
    ) -> Result<DocumentRecord> {
        let url = self.config.endpoint(&format!("documents/{}", id));
        let request = self.client.put(&url).json(&DocumentPayload::from(fields));
        let response = self.send(request, &url, "update document").await?;
        let text = Self::handle_response(response, &url).await?;
        Self::parse(&text, &url)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<()> {
        let url = self.config.endpoint(&format!("documents/{}", id));
        let response = self
            .send(self.client.delete(&url), &url, "delete document")
            .await?;
        let text = Self::handle_response(response, &url).await?;

        // The acknowledgement body is informational only
        if let Ok(ack) = serde_json::from_str::<MessageResponse>(&text) {
            debug!("[ArchiveClient] {}", ack.message);
        }
        Ok(())
    }

    async fn generate_receipt(&self, id: DocumentId) -> Result<Vec<u8>> {
        let url = self
            .config
            .endpoint(&format!("documents/{}/generate-receipt", id));
        let response = self
            .send(self.client.post(&url), &url, "generate receipt")
            .await?;
        let pdf = Self::handle_binary_response(response, &url).await?;

        debug!(
            "[ArchiveClient] Receipt for document {} is {} bytes",
            id,
            pdf.len()
        );
        Ok(pdf)
    }
}
