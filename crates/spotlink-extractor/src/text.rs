//! Text accessor
//!
//! Reads a document's text either inline or from its location. Locations
//! may be `http(s)` URLs, `file` URLs, or plain filesystem paths. Nothing
//! is cached.

use std::path::{Path, PathBuf};

use reqwest::{Client, Url};
use spotlink_core::{Document, SpotlinkError};

#[derive(Debug, Clone, Default)]
pub struct TextAccessor {
    client: Client,
}

impl TextAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Full text of `document`
    pub async fn read_text(&self, document: &Document) -> spotlink_core::Result<String> {
        if let Some(location) = document.location() {
            let text = self.fetch(location).await?;
            tracing::debug!(document = document.id(), location, chars = text.chars().count(), "Fetched document text");
            return Ok(text);
        }

        document
            .inline_text()
            .map(str::to_string)
            .ok_or_else(|| SpotlinkError::ResourceUnavailable {
                location: document.id().to_string(),
                reason: "document has neither a location nor inline text".to_string(),
            })
    }

    async fn fetch(&self, location: &str) -> spotlink_core::Result<String> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch_url(url).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| unavailable(location, "not a local file path"))?;
                read_file(&path, location).await
            }
            Ok(url) => Err(unavailable(
                location,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(_) => read_file(&PathBuf::from(location), location).await,
        }
    }

    async fn fetch_url(&self, url: Url) -> spotlink_core::Result<String> {
        let location = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| unavailable(&location, e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(&location, e.to_string()))?;

        String::from_utf8(bytes.to_vec()).map_err(|e| unavailable(&location, format!("invalid UTF-8: {e}")))
    }
}

async fn read_file(path: &Path, location: &str) -> spotlink_core::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| unavailable(location, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| unavailable(location, format!("invalid UTF-8: {e}")))
}

fn unavailable(location: &str, reason: impl Into<String>) -> SpotlinkError {
    SpotlinkError::ResourceUnavailable {
        location: location.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_inline_text() {
        let doc = Document::text("m1", "Bob plays guitar.");
        let text = TextAccessor::new().read_text(&doc).await.unwrap();
        assert_eq!(text, "Bob plays guitar.");
    }

    #[tokio::test]
    async fn test_location_path_and_file_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Zoë visits Köln.").unwrap();
        let accessor = TextAccessor::new();

        let by_path = Document::located("m1", file.path().to_string_lossy());
        assert_eq!(accessor.read_text(&by_path).await.unwrap(), "Zoë visits Köln.");

        let url = Url::from_file_path(file.path()).unwrap();
        let by_url = Document::located("m2", url.as_str());
        assert_eq!(accessor.read_text(&by_url).await.unwrap(), "Zoë visits Köln.");
    }

    #[tokio::test]
    async fn test_location_takes_precedence_over_inline_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from file").unwrap();
        let mut doc = Document::text("m1", "inline");
        doc.properties.location = Some(file.path().to_string_lossy().into_owned());

        let text = TextAccessor::new().read_text(&doc).await.unwrap();
        assert_eq!(text, "from file");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let doc = Document::located("m1", "/definitely/not/here.txt");
        let err = TextAccessor::new().read_text(&doc).await.unwrap_err();
        assert!(matches!(err, SpotlinkError::ResourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let doc = Document::located("m1", file.path().to_string_lossy());
        let err = TextAccessor::new().read_text(&doc).await.unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[tokio::test]
    async fn test_document_without_text() {
        let mut doc = Document::text("m1", "");
        doc.properties.text = None;
        let err = TextAccessor::new().read_text(&doc).await.unwrap_err();
        assert!(matches!(err, SpotlinkError::ResourceUnavailable { .. }));
    }
}
