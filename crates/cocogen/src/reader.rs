// SPDX-License-Identifier: Apache-2.0

//! Annotation JSON file reading.
//!
//! The top-level file is parsed once, but the catalog and annotation
//! sections are kept as raw values: records are validated and typed
//! individually by the catalog loader and the grouper so that errors carry
//! the offending record index.

use crate::models::Info;
use crate::Error;
use log::info;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw sections of a COCO annotation file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationFile {
    /// Dataset header metadata, when present.
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub licenses: Vec<Value>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub categories: Vec<Value>,
    #[serde(default)]
    pub annotations: Vec<Value>,
}

/// Read a COCO annotation file from disk.
pub fn read_annotation_json<P: AsRef<Path>>(path: P) -> Result<AnnotationFile, Error> {
    let path = path.as_ref();
    info!("loading annotation json from {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(64 * 1024, file);
    let parsed: AnnotationFile = serde_json::from_reader(reader)?;
    info!(
        "loaded {} images, {} annotations, {} categories, {} licenses",
        parsed.images.len(),
        parsed.annotations.len(),
        parsed.categories.len(),
        parsed.licenses.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_minimal_caption_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "info": {{"description": "test split", "year": 2017}},
                "images": [{{"id": 1, "file_name": "a.jpg", "height": 4, "width": 4}}],
                "annotations": [{{"id": 1, "image_id": 1, "caption": "a cat"}}]
            }}"#
        )
        .unwrap();

        let parsed = read_annotation_json(file.path()).unwrap();
        assert_eq!(parsed.images.len(), 1);
        assert_eq!(parsed.annotations.len(), 1);
        assert!(parsed.categories.is_empty());
        assert_eq!(parsed.info.unwrap().description.as_deref(), Some("test split"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_annotation_json("/nonexistent/annotations.json")
            .err()
            .unwrap();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = read_annotation_json(file.path()).err().unwrap();
        assert!(matches!(err, Error::JsonError(_)));
    }
}
