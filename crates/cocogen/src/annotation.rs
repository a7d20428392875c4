// SPDX-License-Identifier: Apache-2.0

//! The three annotation variants and their construction from raw records.
//!
//! Variants form a closed set of concrete types sharing the
//! `annotation_id` / `image_id` base fields; processors dispatch on the
//! variant explicitly rather than through trait objects.

use crate::catalog::ImageCatalog;
use crate::mask::{self, CompressedRle, DenseMask, MaskCodec, RawSegmentation};
use crate::models::{AnnotationId, CategoryId, ImageId};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Caption annotation: free-form text describing an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Unique annotation ID (raw field `id`).
    #[serde(alias = "id")]
    pub annotation_id: AnnotationId,
    /// Image this caption describes.
    pub image_id: ImageId,
    /// Caption text.
    pub caption: String,
}

/// Segmentation representation held by an instance-like annotation.
///
/// Exactly one representation is used per loaded dataset, selected by the
/// `decode_rle` flag at load time; the two are never mixed within a load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// Compact run-length encoding (`decode_rle = false`).
    Compressed(CompressedRle),
    /// Rasterized `{0, 255}` mask (`decode_rle = true`).
    Dense(DenseMask),
}

/// Object instance annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    pub annotation_id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    /// Area of the segmentation mask in pixels².
    pub area: f64,
    /// Whether this annotation covers an indistinguishable crowd.
    pub iscrowd: bool,
    /// Bounding box `[x, y, width, height]` in pixels, top-left origin.
    pub bbox: [f64; 4],
    /// Resolved segmentation; `None` when the raw record carried an empty
    /// segmentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,
}

/// Raw instance record shape as found in `instances_*.json`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawInstance {
    #[serde(alias = "id")]
    pub annotation_id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub segmentation: Option<RawSegmentation>,
    pub area: f64,
    pub bbox: [f64; 4],
    #[serde(default)]
    pub iscrowd: u8,
}

impl Instance {
    pub(crate) fn from_raw(
        raw: RawInstance,
        images: &ImageCatalog,
        decode_rle: bool,
        codec: Option<&dyn MaskCodec>,
    ) -> Result<Self, Error> {
        let segmentation = resolve_segmentation(
            raw.segmentation,
            raw.image_id,
            raw.annotation_id,
            images,
            decode_rle,
            codec,
        )?;
        Ok(Self {
            annotation_id: raw.annotation_id,
            image_id: raw.image_id,
            category_id: raw.category_id,
            area: raw.area,
            iscrowd: raw.iscrowd != 0,
            bbox: raw.bbox,
            segmentation,
        })
    }
}

/// Pick the stored representation for a raw segmentation.
///
/// Empty segmentations short-circuit to `None` without consulting the
/// codec or the image catalog; non-empty ones need the image's dimensions
/// and therefore require the `image_id` to resolve.
fn resolve_segmentation(
    raw: Option<RawSegmentation>,
    image_id: ImageId,
    annotation_id: AnnotationId,
    images: &ImageCatalog,
    decode_rle: bool,
    codec: Option<&dyn MaskCodec>,
) -> Result<Option<Segmentation>, Error> {
    let raw = match raw {
        Some(seg) if !seg.is_empty() => seg,
        _ => return Ok(None),
    };
    let image = images
        .get(&image_id)
        .ok_or(Error::MissingImage(image_id, annotation_id))?;
    let codec = mask::require(codec)?;
    let segmentation = if decode_rle {
        Segmentation::Dense(mask::rasterize(codec, &raw, image.height, image.width)?)
    } else {
        Segmentation::Compressed(mask::compress(codec, &raw, image.height, image.width)?)
    };
    Ok(Some(segmentation))
}

/// Keypoint visibility, decoded from the raw `v` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeypointState {
    /// `v = 0`: keypoint not labeled.
    Unknown,
    /// `v = 1`: labeled but not visible.
    Invisible,
    /// `v = 2`: labeled and visible.
    Visible,
}

impl KeypointState {
    pub fn from_code(v: i64) -> Result<Self, Error> {
        match v {
            0 => Ok(KeypointState::Unknown),
            1 => Ok(KeypointState::Invisible),
            2 => Ok(KeypointState::Visible),
            other => Err(Error::UnknownVisibility(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointState::Unknown => "unknown",
            KeypointState::Invisible => "invisible",
            KeypointState::Visible => "visible",
        }
    }
}

/// One decoded keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keypoint {
    pub x: i32,
    pub y: i32,
    pub v: i32,
    pub state: KeypointState,
}

/// Person keypoint annotation: an [`Instance`] plus the keypoint skeleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonKeypoint {
    #[serde(flatten)]
    pub instance: Instance,
    /// Number of labeled keypoints (`state != unknown`).
    pub num_keypoints: u32,
    pub keypoints: Vec<Keypoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPersonKeypoint {
    #[serde(alias = "id")]
    pub annotation_id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub segmentation: Option<RawSegmentation>,
    pub area: f64,
    pub bbox: [f64; 4],
    #[serde(default)]
    pub iscrowd: u8,
    pub keypoints: Vec<i64>,
    pub num_keypoints: u32,
}

impl PersonKeypoint {
    pub(crate) fn from_raw(
        raw: RawPersonKeypoint,
        images: &ImageCatalog,
        decode_rle: bool,
        codec: Option<&dyn MaskCodec>,
    ) -> Result<Self, Error> {
        let keypoints = decode_keypoints(&raw.keypoints, raw.num_keypoints, raw.annotation_id)?;
        let instance = Instance::from_raw(
            RawInstance {
                annotation_id: raw.annotation_id,
                image_id: raw.image_id,
                category_id: raw.category_id,
                segmentation: raw.segmentation,
                area: raw.area,
                bbox: raw.bbox,
                iscrowd: raw.iscrowd,
            },
            images,
            decode_rle,
            codec,
        )?;
        Ok(Self {
            instance,
            num_keypoints: raw.num_keypoints,
            keypoints,
        })
    }
}

/// Decode a flat `[x1, y1, v1, x2, y2, v2, ...]` sequence into keypoints.
///
/// The labeled-keypoint count must agree with the declared `num_keypoints`;
/// a mismatch is a malformed annotation, reported rather than accepted.
pub fn decode_keypoints(
    flat: &[i64],
    num_keypoints: u32,
    annotation_id: AnnotationId,
) -> Result<Vec<Keypoint>, Error> {
    if flat.len() % 3 != 0 {
        return Err(Error::InvalidKeypoints(annotation_id, flat.len()));
    }
    let mut keypoints = Vec::with_capacity(flat.len() / 3);
    for triplet in flat.chunks_exact(3) {
        let state = KeypointState::from_code(triplet[2])?;
        keypoints.push(Keypoint {
            x: triplet[0] as i32,
            y: triplet[1] as i32,
            v: triplet[2] as i32,
            state,
        });
    }
    let labeled = keypoints
        .iter()
        .filter(|kp| kp.state != KeypointState::Unknown)
        .count();
    if labeled != num_keypoints as usize {
        return Err(Error::KeypointCountMismatch(
            annotation_id,
            num_keypoints,
            labeled,
        ));
    }
    Ok(keypoints)
}
