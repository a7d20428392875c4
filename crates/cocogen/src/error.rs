// SPDX-License-Identifier: Apache-2.0

use crate::models::{AnnotationId, CategoryId, ImageId, LicenseId};

/// Error type covering the full annotation-to-example pipeline.
///
/// Loading, grouping, and generation are pure data transforms, so there is
/// no retry handling here: a malformed record aborts the enclosing call and
/// the error carries the offending identifier or record index.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred while reading annotation or image files.
    IoError(std::io::Error),
    /// JSON parsing error for a whole annotation file.
    JsonError(serde_json::Error),
    /// A raw record failed required-field or type checks. Carries the
    /// section name (`images`, `licenses`, `categories`, `annotations`),
    /// the 0-based record index, and the reason.
    InvalidRecord(&'static str, usize, String),
    /// An annotation references an `image_id` absent from the image catalog.
    MissingImage(ImageId, AnnotationId),
    /// An annotation references a `category_id` absent from the category
    /// catalog.
    MissingCategory(CategoryId, AnnotationId),
    /// An image declares a `license` id absent from the license catalog.
    MissingLicense(LicenseId, ImageId),
    /// A caption dataset contains an image with no caption annotations.
    MissingCaptions(ImageId),
    /// No segmentation codec was supplied but an operation required one.
    CodecUnavailable,
    /// The segmentation codec reported a failure.
    CodecError(String),
    /// A keypoint visibility code outside `{0, 1, 2}`.
    UnknownVisibility(i64),
    /// A flat keypoint sequence whose length is not a multiple of three.
    InvalidKeypoints(AnnotationId, usize),
    /// The number of labeled keypoints disagrees with the declared
    /// `num_keypoints`. Carries the annotation id, the declared count, and
    /// the count actually found.
    KeypointCountMismatch(AnnotationId, u32, usize),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::InvalidRecord(section, index, reason) => {
                write!(f, "Invalid {} record at index {}: {}", section, index, reason)
            }
            Error::MissingImage(image_id, annotation_id) => write!(
                f,
                "Annotation {} references unknown image_id {}",
                annotation_id, image_id
            ),
            Error::MissingCategory(category_id, annotation_id) => write!(
                f,
                "Annotation {} references unknown category_id {}",
                annotation_id, category_id
            ),
            Error::MissingLicense(license_id, image_id) => write!(
                f,
                "Image {} references unknown license id {}",
                image_id, license_id
            ),
            Error::MissingCaptions(image_id) => {
                write!(f, "No caption annotations for image id {}", image_id)
            }
            Error::CodecUnavailable => write!(f, "No segmentation codec available"),
            Error::CodecError(s) => write!(f, "Segmentation codec error: {}", s),
            Error::UnknownVisibility(v) => {
                write!(f, "Unknown keypoint visibility code {}", v)
            }
            Error::InvalidKeypoints(annotation_id, len) => write!(
                f,
                "Annotation {} has a flat keypoint list of length {} (not a multiple of 3)",
                annotation_id, len
            ),
            Error::KeypointCountMismatch(annotation_id, declared, found) => write!(
                f,
                "Annotation {} declares {} keypoints but {} are labeled",
                annotation_id, declared, found
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            _ => None,
        }
    }
}
