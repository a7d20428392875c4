// SPDX-License-Identifier: Apache-2.0

//! Per-image example generation.
//!
//! The generator joins the indexed catalogs with the grouped annotations
//! and yields one record per image, lazily: records can embed full image
//! payloads and dense masks, so the full output is never materialized. The
//! iterators are finite and restartable — calling the variant method again
//! produces a fresh pass over the image catalog.
//!
//! Per-variant policy for images without annotations:
//! - captions: error (a caption dataset with an uncaptioned image is
//!   malformed),
//! - instances: log a warning and skip,
//! - person keypoints: skip silently (images without people are expected).

use crate::annotation::{Caption, Instance, PersonKeypoint};
use crate::catalog::{CategoryCatalog, ImageCatalog, LicenseCatalog};
use crate::group::AnnotationGroups;
use crate::models::{Category, Image, ImageId, License, LicenseId};
use crate::Error;
use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Opaque image payload resolved through an [`ImageLoader`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    /// Path the payload was loaded from.
    pub path: String,
    /// Raw file bytes; decoding is the consumer's concern.
    pub bytes: Vec<u8>,
}

/// External image loading seam.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<ImagePayload, Error>;
}

/// Default loader: reads the file's bytes from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<ImagePayload, Error> {
        Ok(ImagePayload {
            path: path.display().to_string(),
            bytes: std::fs::read(path)?,
        })
    }
}

/// One emitted per-image record: flattened image fields, optional license
/// join, optional image payload, and the annotation list.
///
/// Optional keys are omitted entirely when absent — never serialized as
/// null placeholders.
#[derive(Debug, Clone, Serialize)]
pub struct Example<A> {
    pub image_id: ImageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coco_url: Option<String>,
    pub height: u32,
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flickr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_id: Option<LicenseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    pub annotations: Vec<A>,
}

/// Instance annotation joined with its category.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceRecord {
    #[serde(flatten)]
    pub annotation: Instance,
    pub category: Category,
}

/// Person keypoint annotation joined with its category.
#[derive(Debug, Clone, Serialize)]
pub struct PersonKeypointRecord {
    #[serde(flatten)]
    pub annotation: PersonKeypoint,
    pub category: Category,
}

pub type CaptionExample = Example<Caption>;
pub type InstanceExample = Example<InstanceRecord>;
pub type PersonKeypointExample = Example<PersonKeypointRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingPolicy {
    Fatal,
    WarnSkip,
    SilentSkip,
}

/// Joins catalogs and grouped annotations into lazy example sequences.
///
/// Catalogs are borrowed for the generator's lifetime; generation never
/// mutates them. When no image directory is configured the examples omit
/// the `image` key — the documented metadata-only mode.
pub struct ExampleGenerator<'a> {
    images: &'a ImageCatalog,
    licenses: Option<&'a LicenseCatalog>,
    image_dir: Option<PathBuf>,
    loader: &'a dyn ImageLoader,
}

const FS_LOADER: &FsImageLoader = &FsImageLoader;

impl<'a> ExampleGenerator<'a> {
    pub fn new(images: &'a ImageCatalog) -> Self {
        Self {
            images,
            licenses: None,
            image_dir: None,
            loader: FS_LOADER,
        }
    }

    /// Supply a license catalog to join against `Image::license_id`.
    pub fn with_licenses(mut self, licenses: &'a LicenseCatalog) -> Self {
        self.licenses = Some(licenses);
        self
    }

    /// Supply the directory image payloads are loaded from.
    pub fn with_image_dir(mut self, image_dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(image_dir.into());
        self
    }

    /// Replace the filesystem image loader.
    pub fn with_loader(mut self, loader: &'a dyn ImageLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Lazily generate caption examples.
    ///
    /// Every image must have at least one caption; an uncaptioned image
    /// yields an error item.
    pub fn captions(
        &self,
        groups: &'a AnnotationGroups<Caption>,
    ) -> impl Iterator<Item = Result<(usize, CaptionExample), Error>> + 'a {
        self.examples(groups, MissingPolicy::Fatal, |ann: &Caption| Ok(ann.clone()))
    }

    /// Lazily generate instance examples, joining each annotation to its
    /// category. Images without annotations are skipped with a warning.
    pub fn instances(
        &self,
        groups: &'a AnnotationGroups<Instance>,
        categories: &'a CategoryCatalog,
    ) -> impl Iterator<Item = Result<(usize, InstanceExample), Error>> + 'a {
        self.examples(groups, MissingPolicy::WarnSkip, move |ann: &Instance| {
            let category = categories
                .get(&ann.category_id)
                .cloned()
                .ok_or(Error::MissingCategory(ann.category_id, ann.annotation_id))?;
            Ok(InstanceRecord {
                annotation: ann.clone(),
                category,
            })
        })
    }

    /// Lazily generate person keypoint examples. Images without person
    /// annotations are skipped silently.
    pub fn person_keypoints(
        &self,
        groups: &'a AnnotationGroups<PersonKeypoint>,
        categories: &'a CategoryCatalog,
    ) -> impl Iterator<Item = Result<(usize, PersonKeypointExample), Error>> + 'a {
        self.examples(
            groups,
            MissingPolicy::SilentSkip,
            move |ann: &PersonKeypoint| {
                let category = categories
                    .get(&ann.instance.category_id)
                    .cloned()
                    .ok_or(Error::MissingCategory(
                        ann.instance.category_id,
                        ann.instance.annotation_id,
                    ))?;
                Ok(PersonKeypointRecord {
                    annotation: ann.clone(),
                    category,
                })
            },
        )
    }

    fn examples<A, R, F>(
        &self,
        groups: &'a AnnotationGroups<A>,
        policy: MissingPolicy,
        build: F,
    ) -> Examples<'a, A, F>
    where
        F: Fn(&A) -> Result<R, Error>,
    {
        Examples {
            images: self.images,
            licenses: self.licenses,
            image_dir: self.image_dir.clone(),
            loader: self.loader,
            groups,
            policy,
            build,
            pos: 0,
            index: 0,
        }
    }
}

/// Lazy example iterator shared by all three variants.
///
/// Iterates images in catalog insertion order and assigns the 0-based
/// `index` densely over emitted (non-skipped) images.
struct Examples<'a, A, F> {
    images: &'a ImageCatalog,
    licenses: Option<&'a LicenseCatalog>,
    image_dir: Option<PathBuf>,
    loader: &'a dyn ImageLoader,
    groups: &'a AnnotationGroups<A>,
    policy: MissingPolicy,
    build: F,
    pos: usize,
    index: usize,
}

impl<A, R, F> Examples<'_, A, F>
where
    F: Fn(&A) -> Result<R, Error>,
{
    fn build_example(&self, image: &Image, anns: &[A]) -> Result<Example<R>, Error> {
        let license = match (self.licenses, image.license_id) {
            (Some(licenses), Some(license_id)) => Some(
                licenses
                    .get(&license_id)
                    .cloned()
                    .ok_or(Error::MissingLicense(license_id, image.image_id))?,
            ),
            _ => None,
        };

        let payload = match &self.image_dir {
            Some(dir) => Some(self.loader.load(&dir.join(&image.file_name))?),
            None => None,
        };

        let mut annotations = Vec::with_capacity(anns.len());
        for ann in anns {
            annotations.push((self.build)(ann)?);
        }

        Ok(Example {
            image_id: image.image_id,
            image: payload,
            file_name: image.file_name.clone(),
            coco_url: image.coco_url.clone(),
            height: image.height,
            width: image.width,
            date_captured: image.date_captured.clone(),
            flickr_url: image.flickr_url.clone(),
            license_id: image.license_id,
            license,
            annotations,
        })
    }
}

impl<A, R, F> Iterator for Examples<'_, A, F>
where
    F: Fn(&A) -> Result<R, Error>,
{
    type Item = Result<(usize, Example<R>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let image_id = *self.images.ids().get(self.pos)?;
            self.pos += 1;
            let image = self.images.get(&image_id)?;

            let anns = self
                .groups
                .get(&image_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if anns.is_empty() {
                match self.policy {
                    MissingPolicy::Fatal => {
                        return Some(Err(Error::MissingCaptions(image_id)));
                    }
                    MissingPolicy::WarnSkip => {
                        warn!("no annotation found for image id {}, skipping", image_id);
                        continue;
                    }
                    MissingPolicy::SilentSkip => continue,
                }
            }

            return Some(self.build_example(image, anns).map(|example| {
                let index = self.index;
                self.index += 1;
                (index, example)
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use crate::group::{group_captions, group_instances};
    use serde_json::json;

    fn images() -> ImageCatalog {
        load_catalog(&[
            json!({"id": 1, "file_name": "a.jpg", "height": 8, "width": 8, "license": 4}),
            json!({"id": 2, "file_name": "b.jpg", "height": 8, "width": 8}),
            json!({"id": 3, "file_name": "c.jpg", "height": 8, "width": 8}),
        ])
        .unwrap()
    }

    fn categories() -> CategoryCatalog {
        load_catalog(&[
            json!({"id": 1, "name": "person", "supercategory": "person"}),
            json!({"id": 2, "name": "car", "supercategory": "vehicle"}),
        ])
        .unwrap()
    }

    #[test]
    fn caption_example_joins_image_and_annotations() {
        let images = load_catalog(&[
            json!({"id": 1, "file_name": "a.jpg", "height": 8, "width": 8}),
        ])
        .unwrap();
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "a cat"}),
        ])
        .unwrap();

        let generator = ExampleGenerator::new(&images);
        let examples: Vec<_> = generator
            .captions(&groups)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(examples.len(), 1);
        let (index, example) = &examples[0];
        assert_eq!(*index, 0);
        assert_eq!(example.image_id, 1);
        assert_eq!(example.file_name, "a.jpg");
        assert!(example.image.is_none());
        assert!(example.license.is_none());
        assert_eq!(example.annotations.len(), 1);
        assert_eq!(example.annotations[0].annotation_id, 1);
        assert_eq!(example.annotations[0].caption, "a cat");
    }

    #[test]
    fn uncaptioned_image_is_fatal() {
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "a cat"}),
        ])
        .unwrap();
        let images = images();
        let generator = ExampleGenerator::new(&images);
        let results: Vec<_> = generator.captions(&groups).collect();
        assert!(matches!(results[0], Ok((0, _))));
        assert!(matches!(results[1], Err(Error::MissingCaptions(2))));
    }

    #[test]
    fn instance_skip_reindexes_densely() {
        // Annotations only for images 1 and 3; image 2 is skipped and the
        // emitted indices stay dense.
        let images = images();
        let records = vec![
            json!({"id": 1, "image_id": 1, "category_id": 2, "segmentation": [],
                   "area": 1.0, "bbox": [0.0, 0.0, 1.0, 1.0], "iscrowd": 0}),
            json!({"id": 2, "image_id": 3, "category_id": 2, "segmentation": [],
                   "area": 1.0, "bbox": [0.0, 0.0, 1.0, 1.0], "iscrowd": 0}),
        ];
        let groups = group_instances(&records, &images, false, None).unwrap();
        let categories = categories();
        let generator = ExampleGenerator::new(&images);
        let examples: Vec<_> = generator
            .instances(&groups, &categories)
            .collect::<Result<_, _>>()
            .unwrap();

        let indices: Vec<usize> = examples.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, [0, 1]);
        assert_eq!(examples[0].1.image_id, 1);
        assert_eq!(examples[1].1.image_id, 3);
    }

    #[test]
    fn instance_missing_category_is_fatal() {
        let images = images();
        let records = vec![json!({
            "id": 1, "image_id": 1, "category_id": 99, "segmentation": [],
            "area": 1.0, "bbox": [0.0, 0.0, 1.0, 1.0], "iscrowd": 0
        })];
        let groups = group_instances(&records, &images, false, None).unwrap();
        let categories = categories();
        let generator = ExampleGenerator::new(&images);
        let err = generator
            .instances(&groups, &categories)
            .next()
            .unwrap()
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingCategory(99, 1)));
    }

    #[test]
    fn license_join_embeds_license_fields() {
        let images = images();
        let licenses: LicenseCatalog = load_catalog(&[
            json!({"id": 4, "name": "CC BY 2.0", "url": "http://creativecommons.org"}),
        ])
        .unwrap();
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "licensed"}),
            json!({"id": 2, "image_id": 2, "caption": "unlicensed"}),
            json!({"id": 3, "image_id": 3, "caption": "also unlicensed"}),
        ])
        .unwrap();
        let generator = ExampleGenerator::new(&images).with_licenses(&licenses);
        let examples: Vec<_> = generator
            .captions(&groups)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(examples[0].1.license.as_ref().unwrap().name, "CC BY 2.0");
        assert_eq!(examples[0].1.license_id, Some(4));
        // No license id on the image: the key is omitted, not an error.
        assert!(examples[1].1.license.is_none());
        assert!(examples[1].1.license_id.is_none());
    }

    #[test]
    fn unknown_license_id_is_fatal() {
        let images = images();
        let licenses: LicenseCatalog = load_catalog(&[]).unwrap();
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "licensed"}),
        ])
        .unwrap();
        let generator = ExampleGenerator::new(&images).with_licenses(&licenses);
        let err = generator.captions(&groups).next().unwrap().err().unwrap();
        assert!(matches!(err, Error::MissingLicense(4, 1)));
    }

    #[test]
    fn image_payload_loaded_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"not really a jpeg").unwrap();
        let images = load_catalog(&[
            json!({"id": 1, "file_name": "a.jpg", "height": 8, "width": 8}),
        ])
        .unwrap();
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "a cat"}),
        ])
        .unwrap();
        let generator = ExampleGenerator::new(&images).with_image_dir(dir.path());
        let (_, example) = generator.captions(&groups).next().unwrap().unwrap();
        assert_eq!(example.image.unwrap().bytes, b"not really a jpeg");
    }

    #[test]
    fn iterator_is_restartable() {
        let images = images();
        let groups = group_captions(&[
            json!({"id": 1, "image_id": 1, "caption": "a"}),
            json!({"id": 2, "image_id": 2, "caption": "b"}),
            json!({"id": 3, "image_id": 3, "caption": "c"}),
        ])
        .unwrap();
        let generator = ExampleGenerator::new(&images);
        let first: Vec<ImageId> = generator
            .captions(&groups)
            .map(|r| r.unwrap().1.image_id)
            .collect();
        let second: Vec<ImageId> = generator
            .captions(&groups)
            .map(|r| r.unwrap().1.image_id)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, [1, 2, 3]);
    }

    #[test]
    fn example_serializes_flat_with_nested_category() {
        let images = images();
        let records = vec![json!({
            "id": 1, "image_id": 1, "category_id": 2, "segmentation": [],
            "area": 2.5, "bbox": [1.0, 2.0, 3.0, 4.0], "iscrowd": 0
        })];
        let groups = group_instances(&records, &images, false, None).unwrap();
        let categories = categories();
        let generator = ExampleGenerator::new(&images);
        let (_, example) = generator
            .instances(&groups, &categories)
            .next()
            .unwrap()
            .unwrap();

        let value = serde_json::to_value(&example).unwrap();
        assert_eq!(value["image_id"], 1);
        assert!(value.get("image").is_none());
        let ann = &value["annotations"][0];
        assert_eq!(ann["annotation_id"], 1);
        assert_eq!(ann["category"]["name"], "car");
        assert_eq!(ann["category"]["category_id"], 2);
        assert_eq!(ann["bbox"][2], 3.0);
        assert!(ann.get("segmentation").is_none());
    }
}
