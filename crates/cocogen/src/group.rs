// SPDX-License-Identifier: Apache-2.0

//! Grouping of flat annotation sequences by image.
//!
//! Raw records are processed in `image_id` order (stable sort, ties keep
//! their original relative order) so that grouping is deterministic. Images
//! with zero annotations have no entry in the output map; callers treat a
//! missing key and an empty list as the same case.

use crate::annotation::{Caption, Instance, PersonKeypoint, RawInstance, RawPersonKeypoint};
use crate::catalog::ImageCatalog;
use crate::mask::MaskCodec;
use crate::models::ImageId;
use crate::Error;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

/// Annotations grouped by the image they reference, in sorted-input order.
pub type AnnotationGroups<A> = HashMap<ImageId, Vec<A>>;

/// Order raw annotation records by `image_id`, keeping the original index
/// for error reporting. The sort is stable.
fn sorted_by_image_id(records: &[Value]) -> Result<Vec<(usize, &Value)>, Error> {
    let mut keyed = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let image_id = record
            .get("image_id")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                Error::InvalidRecord("annotations", index, "missing or non-integer image_id".into())
            })?;
        keyed.push((image_id, index, record));
    }
    keyed.sort_by_key(|(image_id, _, _)| *image_id);
    Ok(keyed
        .into_iter()
        .map(|(_, index, record)| (index, record))
        .collect())
}

/// Group caption annotations by image.
pub fn group_captions(records: &[Value]) -> Result<AnnotationGroups<Caption>, Error> {
    let mut groups: AnnotationGroups<Caption> = HashMap::new();
    for (index, record) in sorted_by_image_id(records)? {
        let caption: Caption = serde_json::from_value(record.clone())
            .map_err(|e| Error::InvalidRecord("annotations", index, e.to_string()))?;
        groups.entry(caption.image_id).or_default().push(caption);
    }
    debug!("grouped {} caption annotations into {} images", records.len(), groups.len());
    Ok(groups)
}

/// Group instance annotations by image, resolving segmentations.
///
/// `decode_rle` selects the stored representation for every annotation in
/// this load: dense masks when true, compressed RLE otherwise. The codec
/// is only consulted for non-empty segmentations.
pub fn group_instances(
    records: &[Value],
    images: &ImageCatalog,
    decode_rle: bool,
    codec: Option<&dyn MaskCodec>,
) -> Result<AnnotationGroups<Instance>, Error> {
    let mut groups: AnnotationGroups<Instance> = HashMap::new();
    for (index, record) in sorted_by_image_id(records)? {
        let raw: RawInstance = serde_json::from_value(record.clone())
            .map_err(|e| Error::InvalidRecord("annotations", index, e.to_string()))?;
        let instance = Instance::from_raw(raw, images, decode_rle, codec)?;
        groups.entry(instance.image_id).or_default().push(instance);
    }
    debug!("grouped {} instance annotations into {} images", records.len(), groups.len());
    Ok(groups)
}

/// Group person keypoint annotations by image.
pub fn group_person_keypoints(
    records: &[Value],
    images: &ImageCatalog,
    decode_rle: bool,
    codec: Option<&dyn MaskCodec>,
) -> Result<AnnotationGroups<PersonKeypoint>, Error> {
    let mut groups: AnnotationGroups<PersonKeypoint> = HashMap::new();
    for (index, record) in sorted_by_image_id(records)? {
        let raw: RawPersonKeypoint = serde_json::from_value(record.clone())
            .map_err(|e| Error::InvalidRecord("annotations", index, e.to_string()))?;
        let ann = PersonKeypoint::from_raw(raw, images, decode_rle, codec)?;
        groups.entry(ann.instance.image_id).or_default().push(ann);
    }
    debug!(
        "grouped {} person keypoint annotations into {} images",
        records.len(),
        groups.len()
    );
    Ok(groups)
}
