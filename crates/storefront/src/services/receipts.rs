//! Receipt storage for bank-transfer payments.
//!
//! Uploaded receipts are written to a local directory and served back
//! under `/receipts/`. The order record stores the public URL, not the
//! filesystem path.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use comelones_core::OrderId;

/// Content types accepted for receipt uploads, with their extensions.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

/// Uploads larger than this are rejected.
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

/// Errors from receipt storage.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Filesystem write failed.
    #[error("failed to store receipt: {0}")]
    Io(#[from] std::io::Error),

    /// Upload had a content type we do not accept.
    #[error("unsupported receipt content type: {0}")]
    UnsupportedType(String),

    /// Upload exceeded the size limit.
    #[error("receipt exceeds {MAX_RECEIPT_BYTES} bytes")]
    TooLarge,
}

/// Stores receipt files on the local filesystem.
#[derive(Clone)]
pub struct ReceiptStore {
    dir: PathBuf,
    public_base: String,
}

impl ReceiptStore {
    /// Create a store rooted at `dir`, serving files under
    /// `{public_base}/receipts/`.
    #[must_use]
    pub fn new(dir: PathBuf, public_base: &str) -> Self {
        Self {
            dir,
            public_base: public_base.trim_end_matches('/').to_owned(),
        }
    }

    /// Directory receipts are written to. Served via `ServeDir`.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a receipt for an order, returning its public URL.
    ///
    /// One receipt per order: a re-upload overwrites the previous file
    /// for the same order and content type.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::UnsupportedType` or `ReceiptError::TooLarge`
    /// when validation fails, `ReceiptError::Io` when the write fails.
    pub async fn save(
        &self,
        order_id: &OrderId,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, ReceiptError> {
        let ext = ALLOWED_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| ReceiptError::UnsupportedType(content_type.to_owned()))?;

        if bytes.len() > MAX_RECEIPT_BYTES {
            return Err(ReceiptError::TooLarge);
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = format!("{order_id}.{ext}");
        let path = self.dir.join(&filename);

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(format!("{}/receipts/{filename}", self.public_base))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> ReceiptStore {
        ReceiptStore::new(
            std::env::temp_dir().join("comelones-receipt-tests"),
            "https://comelonesfit.com/",
        )
    }

    #[tokio::test]
    async fn test_save_returns_public_url() {
        let order_id = OrderId::generate();
        let url = store()
            .save(&order_id, "image/png", b"fake png bytes")
            .await
            .unwrap();

        assert_eq!(
            url,
            format!("https://comelonesfit.com/receipts/{order_id}.png")
        );
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_content_type() {
        let result = store()
            .save(&OrderId::generate(), "text/html", b"<html>")
            .await;

        assert!(matches!(result, Err(ReceiptError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_upload() {
        let bytes = vec![0u8; MAX_RECEIPT_BYTES + 1];
        let result = store()
            .save(&OrderId::generate(), "image/jpeg", &bytes)
            .await;

        assert!(matches!(result, Err(ReceiptError::TooLarge)));
    }
}
