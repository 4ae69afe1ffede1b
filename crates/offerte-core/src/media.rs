//! Inline images: file to data URL conversion and the payload size policy.
//!
//! Images are embedded in the invoice document as `data:` URLs. Before a
//! write, any image whose payload exceeds the configured limit is dropped and
//! reported as a warning instead of failing the whole write.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MediaError;
use crate::models::invoice::InvoiceDraft;

lazy_static! {
    /// `data:[<mime>][;<param>]*,` prefix of an inline payload.
    static ref DATA_URL: Regex = Regex::new(r"^\s*data:[^;,]*(?:;[^;,]*)*,").unwrap();
}

/// Encode bytes as a base64 `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read an image file into a `data:` URL, guessing its type from the extension.
pub fn file_to_data_url(path: &Path) -> Result<String, MediaError> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(encode_data_url(mime.essence_str(), &bytes))
}

/// Size of the image payload as stored in the document.
///
/// For `data:` URLs this is the length of the URL string, which is what the
/// document store has to hold. Remote URLs are tiny and always pass.
pub fn stored_size(url: &str) -> usize {
    if DATA_URL.is_match(url) {
        url.len()
    } else {
        0
    }
}

/// Where a dropped image lived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ImageLocation {
    Header { index: usize },
    Item { section_id: String, item_id: i64 },
}

/// An image dropped because it was too large.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageWarning {
    pub location: ImageLocation,
    pub size: usize,
    pub limit: usize,
    pub message: String,
}

impl ImageWarning {
    fn new(location: ImageLocation, size: usize, limit: usize) -> Self {
        let what = match &location {
            ImageLocation::Header { index } => format!("header image {}", index + 1),
            ImageLocation::Item {
                section_id,
                item_id,
            } => format!("image of item {} in section {}", item_id, section_id),
        };
        let message = format!(
            "{} is {} KB, above the {} KB limit, and was not saved",
            what,
            size / 1024,
            limit / 1024
        );
        Self {
            location,
            size,
            limit,
            message,
        }
    }
}

/// Drop every inline image larger than `limit` bytes from the draft.
pub fn strip_oversized_images(draft: &mut InvoiceDraft, limit: usize) -> Vec<ImageWarning> {
    let mut warnings = Vec::new();

    for (index, image) in draft.project_details.header_images.iter_mut().enumerate() {
        let size = stored_size(image);
        if size > limit {
            image.clear();
            warnings.push(ImageWarning::new(ImageLocation::Header { index }, size, limit));
        }
    }

    for section in &mut draft.sections {
        for item in &mut section.items {
            let size = item.image_url.as_deref().map_or(0, stored_size);
            if size > limit {
                item.image_url = None;
                warnings.push(ImageWarning::new(
                    ImageLocation::Item {
                        section_id: section.id.clone(),
                        item_id: item.id,
                    },
                    size,
                    limit,
                ));
            }
        }
    }

    for warning in &warnings {
        warn!("{}", warning.message);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stored_size() {
        let url = encode_data_url("image/png", b"\x89PNG");
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        assert_eq!(stored_size(&url), url.len());
        assert_eq!(stored_size("data:text/plain;charset=utf-8,hallo"), 35);
        assert_eq!(stored_size("https://example.com/a.png"), 0);
        assert_eq!(stored_size("data:no-comma"), 0);
    }

    #[test]
    fn test_file_to_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let url = file_to_data_url(&path).unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
    }

    #[test]
    fn test_strip_oversized_images() {
        let big = format!("data:image/png;base64,{}", "A".repeat(2048));
        let small = "data:image/png;base64,AA==".to_string();

        let mut draft = InvoiceDraft::default();
        draft.project_details.header_images = vec![big.clone(), small.clone()];
        draft.sections[0].items.push(LineItem {
            image_url: Some(big.clone()),
            ..LineItem::new(1)
        });
        draft.sections[0].items.push(LineItem {
            image_url: Some("https://example.com/tegel.jpg".into()),
            ..LineItem::new(2)
        });

        let warnings = strip_oversized_images(&mut draft, 1024);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].location, ImageLocation::Header { index: 0 });
        assert_eq!(
            warnings[1].location,
            ImageLocation::Item {
                section_id: "0.00".into(),
                item_id: 1
            }
        );
        assert_eq!(draft.project_details.header_images, vec![String::new(), small]);
        assert_eq!(draft.sections[0].items[0].image_url, None);
        assert!(draft.sections[0].items[1].image_url.is_some());
    }

    #[test]
    fn test_limit_is_inclusive() {
        let url = "data:,abc".to_string();
        let mut draft = InvoiceDraft::default();
        draft.project_details.header_images = vec![url.clone()];

        assert!(strip_oversized_images(&mut draft, url.len()).is_empty());
        assert_eq!(draft.project_details.header_images[0], url);
    }
}
