// SPDX-License-Identifier: Apache-2.0

//! Segmentation mask representations and the external codec seam.
//!
//! The geometry work (polygon rasterization, RLE packing) lives behind the
//! [`MaskCodec`] trait and is supplied by the caller; this module only
//! decides *which* representation an annotation ends up holding and fails
//! with [`Error::CodecUnavailable`] when no codec was provided. There is no
//! import-time availability flag: absence surfaces at first use, and
//! callers can check up front simply by testing their `Option<&dyn
//! MaskCodec>`.

use crate::Error;
use serde::{Deserialize, Serialize};

/// Compressed run-length encoding of a binary mask.
///
/// `counts` is an opaque packed byte string produced by the codec; `size`
/// is `[height, width]` (note the order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedRle {
    pub counts: Vec<u8>,
    pub size: [u32; 2],
}

/// Uncompressed run-length encoding as found in raw crowd annotations.
///
/// The counts alternate between background and foreground pixel runs,
/// starting with background, in column-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncompressedRle {
    pub counts: Vec<u32>,
    pub size: [u32; 2],
}

/// Dense binary mask at the image's native resolution.
///
/// `data` is row-major `height * width` pixels. Masks stored on annotations
/// use `255` for foreground and `0` for background; codec output uses `1`
/// for foreground (see [`MaskCodec::decode`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseMask {
    pub data: Vec<u8>,
    pub size: [u32; 2],
}

impl DenseMask {
    pub fn height(&self) -> u32 {
        self.size[0]
    }

    pub fn width(&self) -> u32 {
        self.size[1]
    }

    /// Number of foreground pixels.
    pub fn foreground_area(&self) -> usize {
        self.data.iter().filter(|&&px| px != 0).count()
    }
}

/// Raw segmentation as it appears in annotation JSON: either a list of
/// polygon rings `[[x1,y1,x2,y2,...], ...]` or an uncompressed RLE object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSegmentation {
    /// Polygon rings in pixel coordinates. Multiple rings represent
    /// disjoint regions of the same object.
    Polygons(Vec<Vec<f64>>),
    /// Uncompressed RLE, used by crowd annotations.
    Rle(UncompressedRle),
}

impl RawSegmentation {
    /// An empty polygon list is a valid terminal state: the annotation
    /// stores no segmentation and the codec is never invoked.
    pub fn is_empty(&self) -> bool {
        match self {
            RawSegmentation::Polygons(rings) => rings.is_empty(),
            RawSegmentation::Rle(_) => false,
        }
    }
}

/// External segmentation codec interface.
///
/// Implementations are expected to behave as pure functions over their
/// inputs. The crate ships no implementation; tests use a stub.
pub trait MaskCodec {
    /// Encode a single polygon ring `[x1, y1, x2, y2, ...]` into a
    /// compressed RLE covering `height * width` pixels.
    fn encode_polygon(&self, ring: &[f64], height: u32, width: u32)
    -> Result<CompressedRle, Error>;

    /// Compress an uncompressed RLE directly.
    fn encode_rle(&self, rle: &UncompressedRle) -> Result<CompressedRle, Error>;

    /// Merge several RLEs into one covering their union.
    fn merge(&self, rles: &[CompressedRle]) -> Result<CompressedRle, Error>;

    /// Decode a compressed RLE to a dense mask with `1` for foreground.
    fn decode(&self, rle: &CompressedRle) -> Result<DenseMask, Error>;
}

/// Resolve an optional codec, failing when none was supplied.
pub fn require(codec: Option<&dyn MaskCodec>) -> Result<&dyn MaskCodec, Error> {
    codec.ok_or(Error::CodecUnavailable)
}

/// Compress a raw segmentation into a single RLE.
///
/// Crowd annotations carry an uncompressed RLE which is compressed
/// directly; polygon segmentations are encoded ring by ring and merged
/// into one RLE covering their union.
pub fn compress(
    codec: &dyn MaskCodec,
    segmentation: &RawSegmentation,
    height: u32,
    width: u32,
) -> Result<CompressedRle, Error> {
    match segmentation {
        RawSegmentation::Rle(rle) => codec.encode_rle(rle),
        RawSegmentation::Polygons(rings) => {
            let rles = rings
                .iter()
                .map(|ring| codec.encode_polygon(ring, height, width))
                .collect::<Result<Vec<_>, Error>>()?;
            codec.merge(&rles)
        }
    }
}

/// Rasterize a raw segmentation to a dense `{0, 255}` mask.
pub fn rasterize(
    codec: &dyn MaskCodec,
    segmentation: &RawSegmentation,
    height: u32,
    width: u32,
) -> Result<DenseMask, Error> {
    let rle = compress(codec, segmentation, height, width)?;
    let mut mask = codec.decode(&rle)?;
    for px in &mut mask.data {
        *px = if *px != 0 { 255 } else { 0 };
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BboxCodec;

    #[test]
    fn raw_segmentation_deserialize_polygons() {
        let json = r#"[[10.0, 10.0, 20.0, 10.0, 20.0, 20.0]]"#;
        let seg: RawSegmentation = serde_json::from_str(json).unwrap();
        match &seg {
            RawSegmentation::Polygons(rings) => assert_eq!(rings.len(), 1),
            _ => panic!("expected polygons"),
        }
        assert!(!seg.is_empty());
    }

    #[test]
    fn raw_segmentation_deserialize_rle() {
        let json = r#"{"counts": [6, 1, 40, 4, 5, 4, 5, 4, 21], "size": [10, 9]}"#;
        let seg: RawSegmentation = serde_json::from_str(json).unwrap();
        match &seg {
            RawSegmentation::Rle(rle) => {
                assert_eq!(rle.size, [10, 9]);
                assert_eq!(rle.counts.iter().sum::<u32>(), 90);
            }
            _ => panic!("expected RLE"),
        }
        assert!(!seg.is_empty());
    }

    #[test]
    fn empty_polygon_list_is_empty() {
        let seg = RawSegmentation::Polygons(vec![]);
        assert!(seg.is_empty());
    }

    #[test]
    fn require_without_codec_fails() {
        let err = require(None).err().unwrap();
        assert!(matches!(err, Error::CodecUnavailable));
    }

    #[test]
    fn rasterize_produces_0_255_mask() {
        let codec = BboxCodec;
        let seg = RawSegmentation::Polygons(vec![vec![1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0]]);
        let mask = rasterize(&codec, &seg, 4, 4).unwrap();
        assert_eq!(mask.size, [4, 4]);
        assert!(mask.data.iter().all(|&px| px == 0 || px == 255));
        // 2x2 pixel box from (1,1) to (3,3) exclusive
        assert_eq!(mask.foreground_area(), 4);
    }

    #[test]
    fn compress_merges_polygon_rings() {
        let codec = BboxCodec;
        // Two disjoint 1x1 boxes
        let seg = RawSegmentation::Polygons(vec![
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![3.0, 3.0, 4.0, 3.0, 4.0, 4.0, 3.0, 4.0],
        ]);
        let rle = compress(&codec, &seg, 4, 4).unwrap();
        let mask = codec.decode(&rle).unwrap();
        assert_eq!(mask.foreground_area(), 2);
    }

    #[test]
    fn compress_roundtrip_preserves_area() {
        let codec = BboxCodec;
        let seg = RawSegmentation::Polygons(vec![vec![0.0, 0.0, 5.0, 0.0, 5.0, 4.0, 0.0, 4.0]]);
        let dense = rasterize(&codec, &seg, 8, 8).unwrap();
        let recompressed = compress(&codec, &seg, 8, 8).unwrap();
        let decoded = codec.decode(&recompressed).unwrap();
        assert_eq!(dense.foreground_area(), decoded.foreground_area());
        assert_eq!(dense.foreground_area(), 20);
    }
}
