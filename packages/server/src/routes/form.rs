//! Multipart form collection.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub data: Bytes,
}

/// Text fields and file parts of one multipart body. A repeated name keeps
/// the last value.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl FormData {
    pub async fn collect(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input
                    if !file_name.is_empty() && !data.is_empty() {
                        form.files.insert(name, FilePart { file_name, data });
                    }
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text field, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }
}
