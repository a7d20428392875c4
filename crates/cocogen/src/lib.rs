// SPDX-License-Identifier: Apache-2.0

//! # COCO annotation to per-image example records
//!
//! This crate converts MS-COCO annotation JSON (images, licenses,
//! categories, and one of three annotation kinds: captions, object
//! instances, person keypoints) into normalized per-image example records
//! for a downstream tabular dataset runtime.
//!
//! The pipeline has three stages, each a pure transform over in-memory
//! data:
//!
//! 1. **Load** raw record sequences into identifier-indexed catalogs
//!    ([`load_catalog`]).
//! 2. **Group** the flat annotation list by `image_id` into typed,
//!    variant-specific records ([`group_captions`], [`group_instances`],
//!    [`group_person_keypoints`]), resolving segmentation representations
//!    through the external [`MaskCodec`] seam.
//! 3. **Generate** one `(index, record)` pair per image lazily
//!    ([`ExampleGenerator`]), joining license and category catalogs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cocogen::{read_annotation_json, load_catalog, group_captions, ExampleGenerator};
//!
//! # fn main() -> Result<(), cocogen::Error> {
//! let file = read_annotation_json("annotations/captions_val2017.json")?;
//! let images = load_catalog(&file.images)?;
//! let licenses = load_catalog(&file.licenses)?;
//! let groups = group_captions(&file.annotations)?;
//!
//! let generator = ExampleGenerator::new(&images).with_licenses(&licenses);
//! for result in generator.captions(&groups) {
//!     let (index, example) = result?;
//!     println!("{}: image {} with {} captions",
//!              index, example.image_id, example.annotations.len());
//! }
//! # Ok(())
//! # }
//! ```

mod annotation;
mod catalog;
mod error;
mod generate;
mod group;
mod mask;
mod models;
mod reader;
mod schema;

#[doc(hidden)]
pub mod testing;

pub use crate::{
    annotation::{
        decode_keypoints, Caption, Instance, Keypoint, KeypointState, PersonKeypoint, Segmentation,
    },
    catalog::{
        load_catalog, Catalog, CatalogRecord, CategoryCatalog, ImageCatalog, LicenseCatalog,
    },
    error::Error,
    generate::{
        CaptionExample, Example, ExampleGenerator, FsImageLoader, ImageLoader, ImagePayload,
        InstanceExample, InstanceRecord, PersonKeypointExample, PersonKeypointRecord,
    },
    group::{group_captions, group_instances, group_person_keypoints, AnnotationGroups},
    mask::{compress, rasterize, CompressedRle, DenseMask, MaskCodec, RawSegmentation, UncompressedRle},
    models::{AnnotationId, Category, CategoryId, Image, ImageId, Info, License, LicenseId},
    reader::{read_annotation_json, AnnotationFile},
    schema::{base_fields, example_schema, FeatureType, Field, Variant},
};
