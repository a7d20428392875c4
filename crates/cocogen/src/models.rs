// SPDX-License-Identifier: Apache-2.0

//! Typed records for the COCO catalog sections.
//!
//! Raw COCO JSON uses `id` as the primary-key field everywhere and `license`
//! as the image's license reference; the serde aliases below accept both the
//! raw spelling and the normalized one, while serialization always emits the
//! normalized field names (`image_id`, `license_id`, ...) expected by the
//! downstream tabular layer.

use serde::{Deserialize, Serialize};

/// Unique image identifier.
pub type ImageId = u64;
/// Unique annotation identifier.
pub type AnnotationId = u64;
/// Unique category identifier.
pub type CategoryId = u32;
/// Unique license identifier.
pub type LicenseId = u32;

/// Image metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Unique image ID (raw field `id`).
    #[serde(alias = "id")]
    pub image_id: ImageId,
    /// Filename relative to the image directory.
    pub file_name: String,
    /// Image height in pixels.
    pub height: u32,
    /// Image width in pixels.
    pub width: u32,
    /// License ID (raw field `license`, references [`License::license_id`]).
    #[serde(alias = "license", default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<LicenseId>,
    /// COCO download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coco_url: Option<String>,
    /// Date the image was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<String>,
    /// Flickr URL (if from Flickr).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flickr_url: Option<String>,
}

/// License record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    /// Unique license ID (raw field `id`).
    #[serde(alias = "id")]
    pub license_id: LicenseId,
    /// License name.
    pub name: String,
    /// License URL.
    pub url: String,
}

/// Object category record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category ID (raw field `id`).
    #[serde(alias = "id")]
    pub category_id: CategoryId,
    /// Category name (e.g. "person", "car").
    pub name: String,
    /// Parent category name (e.g. "vehicle" for "car").
    pub supercategory: String,
}

/// Dataset header metadata. All fields are optional in practice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}
