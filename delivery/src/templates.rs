//! CV templates on disk, one file per document type.

use std::path::PathBuf;

use cvup_types::DocumentType;

use crate::DeliveryError;

/// Directory holding `<type>_template.docx` files.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, document_type: DocumentType) -> PathBuf {
        self.dir
            .join(format!("{}_template.docx", document_type.as_str()))
    }

    /// Read the template bytes.
    pub async fn load(&self, document_type: DocumentType) -> Result<Vec<u8>, DeliveryError> {
        let path = self.path_for(document_type);
        tokio::fs::read(&path)
            .await
            .map_err(|e| DeliveryError::TemplateUnavailable {
                document_type: document_type.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }

    /// Document types whose template file is missing.
    pub fn missing(&self) -> Vec<DocumentType> {
        DocumentType::ALL
            .into_iter()
            .filter(|t| !self.path_for(*t).is_file())
            .collect()
    }
}
