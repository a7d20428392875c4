// SPDX-License-Identifier: Apache-2.0

//! Declared output field sets per annotation variant.
//!
//! The downstream tabular layer owns the actual schema system; this module
//! only enumerates, per variant, the field names and numeric widths the
//! generator commits to, so producer and consumer agree on types. Widths
//! follow the upstream dataset convention: 64-bit ids, 32-bit image
//! dimensions and category ids, 32-bit floats for areas and boxes, and an
//! 8-bit license id inside the embedded license struct.

use std::fmt;

/// Annotation variant of a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Captions,
    Instances,
    PersonKeypoints,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Captions => "captions",
            Variant::Instances => "instances",
            Variant::PersonKeypoints => "person_keypoints",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared value type of an output field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureType {
    Int8,
    Int32,
    Int64,
    Float32,
    Bool,
    String,
    /// Opaque image payload (raw bytes plus source path).
    Image,
    /// Variable-length sequence.
    Sequence(Box<FeatureType>),
    /// Fixed-length sequence.
    FixedSequence(Box<FeatureType>, usize),
    Struct(Vec<Field>),
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Int8 => write!(f, "int8"),
            FeatureType::Int32 => write!(f, "int32"),
            FeatureType::Int64 => write!(f, "int64"),
            FeatureType::Float32 => write!(f, "float32"),
            FeatureType::Bool => write!(f, "bool"),
            FeatureType::String => write!(f, "string"),
            FeatureType::Image => write!(f, "image"),
            FeatureType::Sequence(inner) => write!(f, "sequence<{}>", inner),
            FeatureType::FixedSequence(inner, len) => write!(f, "sequence<{}, {}>", inner, len),
            FeatureType::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.dtype)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A named output field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub dtype: FeatureType,
}

impl Field {
    fn new(name: &'static str, dtype: FeatureType) -> Self {
        Self { name, dtype }
    }
}

/// Fields shared by every example record, whatever the variant.
pub fn base_fields() -> Vec<Field> {
    vec![
        Field::new("image_id", FeatureType::Int64),
        Field::new("image", FeatureType::Image),
        Field::new("file_name", FeatureType::String),
        Field::new("coco_url", FeatureType::String),
        Field::new("height", FeatureType::Int32),
        Field::new("width", FeatureType::Int32),
        Field::new("date_captured", FeatureType::String),
        Field::new("flickr_url", FeatureType::String),
        Field::new("license_id", FeatureType::Int32),
        Field::new(
            "license",
            FeatureType::Struct(vec![
                Field::new("license_id", FeatureType::Int8),
                Field::new("name", FeatureType::String),
                Field::new("url", FeatureType::String),
            ]),
        ),
    ]
}

fn category_struct() -> FeatureType {
    FeatureType::Struct(vec![
        Field::new("category_id", FeatureType::Int32),
        Field::new("name", FeatureType::String),
        Field::new("supercategory", FeatureType::String),
    ])
}

/// Segmentation output type, switching on the load-time representation
/// choice: a dense image when `decode_rle`, otherwise the compressed RLE
/// struct.
fn segmentation_feature(decode_rle: bool) -> FeatureType {
    if decode_rle {
        FeatureType::Image
    } else {
        FeatureType::Struct(vec![
            Field::new("counts", FeatureType::Sequence(Box::new(FeatureType::Int64))),
            Field::new("size", FeatureType::Sequence(Box::new(FeatureType::Int32))),
        ])
    }
}

fn caption_fields() -> Vec<Field> {
    vec![
        Field::new("annotation_id", FeatureType::Int64),
        Field::new("image_id", FeatureType::Int64),
        Field::new("caption", FeatureType::String),
    ]
}

fn instance_fields(decode_rle: bool) -> Vec<Field> {
    vec![
        Field::new("annotation_id", FeatureType::Int64),
        Field::new("image_id", FeatureType::Int64),
        Field::new("segmentation", segmentation_feature(decode_rle)),
        Field::new("area", FeatureType::Float32),
        Field::new("iscrowd", FeatureType::Bool),
        Field::new(
            "bbox",
            FeatureType::FixedSequence(Box::new(FeatureType::Float32), 4),
        ),
        Field::new("category_id", FeatureType::Int32),
        Field::new("category", category_struct()),
    ]
}

fn person_keypoint_fields(decode_rle: bool) -> Vec<Field> {
    let mut fields = instance_fields(decode_rle);
    fields.push(Field::new(
        "keypoints",
        FeatureType::Sequence(Box::new(FeatureType::Struct(vec![
            Field::new("x", FeatureType::Int32),
            Field::new("y", FeatureType::Int32),
            Field::new("v", FeatureType::Int32),
            Field::new("state", FeatureType::String),
        ]))),
    ));
    fields.push(Field::new("num_keypoints", FeatureType::Int32));
    fields
}

/// The full declared field set of an example record for `variant`.
pub fn example_schema(variant: Variant, decode_rle: bool) -> Vec<Field> {
    let annotation_fields = match variant {
        Variant::Captions => caption_fields(),
        Variant::Instances => instance_fields(decode_rle),
        Variant::PersonKeypoints => person_keypoint_fields(decode_rle),
    };
    let mut fields = base_fields();
    fields.push(Field::new(
        "annotations",
        FeatureType::Sequence(Box::new(FeatureType::Struct(annotation_fields))),
    ));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation_struct(schema: &[Field]) -> &[Field] {
        let annotations = schema.iter().find(|f| f.name == "annotations").unwrap();
        match &annotations.dtype {
            FeatureType::Sequence(inner) => match inner.as_ref() {
                FeatureType::Struct(fields) => fields,
                other => panic!("unexpected annotation type: {other}"),
            },
            other => panic!("unexpected annotations type: {other}"),
        }
    }

    #[test]
    fn caption_schema_fields() {
        let schema = example_schema(Variant::Captions, false);
        let names: Vec<_> = annotation_struct(&schema).iter().map(|f| f.name).collect();
        assert_eq!(names, ["annotation_id", "image_id", "caption"]);
    }

    #[test]
    fn segmentation_switches_on_decode_rle() {
        let rle = example_schema(Variant::Instances, false);
        let seg = annotation_struct(&rle)
            .iter()
            .find(|f| f.name == "segmentation")
            .unwrap();
        assert!(matches!(seg.dtype, FeatureType::Struct(_)));

        let dense = example_schema(Variant::Instances, true);
        let seg = annotation_struct(&dense)
            .iter()
            .find(|f| f.name == "segmentation")
            .unwrap();
        assert_eq!(seg.dtype, FeatureType::Image);
    }

    #[test]
    fn person_keypoints_extends_instances() {
        let schema = example_schema(Variant::PersonKeypoints, false);
        let fields = annotation_struct(&schema);
        assert!(fields.iter().any(|f| f.name == "keypoints"));
        assert!(fields.iter().any(|f| f.name == "num_keypoints"));
        assert!(fields.iter().any(|f| f.name == "bbox"));
    }

    #[test]
    fn base_fields_are_shared() {
        for variant in [Variant::Captions, Variant::Instances, Variant::PersonKeypoints] {
            let schema = example_schema(variant, false);
            assert_eq!(schema[0].name, "image_id");
            assert_eq!(schema[0].dtype, FeatureType::Int64);
            assert!(schema.iter().any(|f| f.name == "license"));
        }
    }

    #[test]
    fn display_renders_nested_types() {
        let dtype = FeatureType::Sequence(Box::new(FeatureType::Int64));
        assert_eq!(dtype.to_string(), "sequence<int64>");
    }
}
