// SPDX-License-Identifier: Apache-2.0

//! Test support: a deliberately simple [`MaskCodec`] stub.
//!
//! Real deployments plug in a geometry library; the pipeline only needs
//! the codec to behave as pure encode/decode functions, so tests exercise
//! the plumbing with a codec that fills each polygon ring's bounding box.

use crate::mask::{CompressedRle, DenseMask, MaskCodec, UncompressedRle};
use crate::Error;

/// Stub codec: polygons rasterize to their axis-aligned bounding box and
/// the "compressed" representation is the dense bitmap itself (one byte
/// per pixel, row-major, `1` for foreground).
pub struct BboxCodec;

impl BboxCodec {
    fn bitmap(height: u32, width: u32) -> Vec<u8> {
        vec![0u8; (height as usize) * (width as usize)]
    }
}

impl MaskCodec for BboxCodec {
    fn encode_polygon(
        &self,
        ring: &[f64],
        height: u32,
        width: u32,
    ) -> Result<CompressedRle, Error> {
        if ring.len() < 6 || ring.len() % 2 != 0 {
            return Err(Error::CodecError(format!(
                "polygon ring of length {} is not a closed ring",
                ring.len()
            )));
        }
        let xs = ring.iter().step_by(2);
        let ys = ring.iter().skip(1).step_by(2);
        let min_x = xs.clone().cloned().fold(f64::INFINITY, f64::min).max(0.0) as usize;
        let max_x = (xs.cloned().fold(f64::NEG_INFINITY, f64::max) as usize).min(width as usize);
        let min_y = ys.clone().cloned().fold(f64::INFINITY, f64::min).max(0.0) as usize;
        let max_y = (ys.cloned().fold(f64::NEG_INFINITY, f64::max) as usize).min(height as usize);

        let mut bitmap = Self::bitmap(height, width);
        for y in min_y..max_y {
            for x in min_x..max_x {
                bitmap[y * width as usize + x] = 1;
            }
        }
        Ok(CompressedRle {
            counts: bitmap,
            size: [height, width],
        })
    }

    fn encode_rle(&self, rle: &UncompressedRle) -> Result<CompressedRle, Error> {
        let [height, width] = rle.size;
        let total = (height as usize) * (width as usize);
        if rle.counts.iter().map(|&c| c as usize).sum::<usize>() != total {
            return Err(Error::CodecError(format!(
                "RLE counts do not sum to {}x{}",
                height, width
            )));
        }
        // Counts are column-major, starting with background.
        let mut column_major = Self::bitmap(height, width);
        let mut pos = 0usize;
        let mut foreground = false;
        for &count in &rle.counts {
            if foreground {
                for px in &mut column_major[pos..pos + count as usize] {
                    *px = 1;
                }
            }
            pos += count as usize;
            foreground = !foreground;
        }
        let mut bitmap = Self::bitmap(height, width);
        for col in 0..width as usize {
            for row in 0..height as usize {
                bitmap[row * width as usize + col] = column_major[col * height as usize + row];
            }
        }
        Ok(CompressedRle {
            counts: bitmap,
            size: [height, width],
        })
    }

    fn merge(&self, rles: &[CompressedRle]) -> Result<CompressedRle, Error> {
        let first = rles
            .first()
            .ok_or_else(|| Error::CodecError("cannot merge zero RLEs".to_string()))?;
        let mut merged = first.clone();
        for rle in &rles[1..] {
            if rle.size != merged.size {
                return Err(Error::CodecError("mismatched RLE sizes in merge".to_string()));
            }
            for (dst, src) in merged.counts.iter_mut().zip(&rle.counts) {
                *dst |= src;
            }
        }
        Ok(merged)
    }

    fn decode(&self, rle: &CompressedRle) -> Result<DenseMask, Error> {
        Ok(DenseMask {
            data: rle.counts.clone(),
            size: rle.size,
        })
    }
}
