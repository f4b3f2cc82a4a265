//! Peak blob encoding for the library-DB format
//!
//! The library stores each spectrum's peaks as two blobs: m/z values as
//! little-endian 64-bit floats and intensities as little-endian 32-bit floats.
//! Each blob is zlib-compressed, but the compressed form is only kept when it
//! is strictly smaller than the packed bytes. Readers therefore cannot know
//! which form they received:
//!
//! 1. Try to inflate the blob
//! 2. On failure, treat the blob as already-packed bytes
//! 3. Interpret the bytes as floats

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, warn};

use crate::spectrum::PeakList;

/// Errors that can occur while decoding peak blobs
#[derive(Debug, thiserror::Error)]
pub enum PeakCodecError {
    /// Compression or packing I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Packed byte length is not a whole number of values
    #[error("Invalid {array} blob length: {length} bytes is not a multiple of {width}")]
    InvalidLength {
        /// Which array was being decoded
        array: &'static str,
        /// Length of the packed bytes
        length: usize,
        /// Width of one value in bytes
        width: usize,
    },
}

/// Encoded peak blobs ready to be stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakBlobs {
    /// m/z blob
    pub mz: Vec<u8>,
    /// Intensity blob
    pub intensity: Vec<u8>,
}

/// Codec for library peak blobs
pub struct PeakCodec;

impl PeakCodec {
    /// Pack and compress m/z and intensity arrays
    pub fn encode(mz: &[f64], intensity: &[f32]) -> Result<PeakBlobs, PeakCodecError> {
        let mut mz_bytes = Vec::with_capacity(mz.len() * 8);
        for &value in mz {
            mz_bytes.write_f64::<LittleEndian>(value)?;
        }

        let mut intensity_bytes = Vec::with_capacity(intensity.len() * 4);
        for &value in intensity {
            intensity_bytes.write_f32::<LittleEndian>(value)?;
        }

        Ok(PeakBlobs {
            mz: Self::compress_if_smaller(mz_bytes)?,
            intensity: Self::compress_if_smaller(intensity_bytes)?,
        })
    }

    /// Encode a [`PeakList`]
    pub fn encode_peaks(peaks: &PeakList) -> Result<PeakBlobs, PeakCodecError> {
        Self::encode(&peaks.mz, &peaks.intensity)
    }

    /// Decode blobs back into a [`PeakList`]
    ///
    /// A count mismatch against `expected_count` is logged and the decoded
    /// length is trusted. Arrays of unequal length are truncated to the shorter.
    pub fn decode(
        mz_blob: &[u8],
        intensity_blob: &[u8],
        expected_count: usize,
    ) -> Result<PeakList, PeakCodecError> {
        let mz_bytes = Self::inflate_or_raw(mz_blob);
        let intensity_bytes = Self::inflate_or_raw(intensity_blob);

        let mz = Self::unpack_f64(&mz_bytes)?;
        let intensity = Self::unpack_f32(&intensity_bytes)?;

        if mz.len() != expected_count {
            debug!(
                "Decoded {} m/z values but {} peaks were declared",
                mz.len(),
                expected_count
            );
        }

        if mz.len() != intensity.len() {
            warn!(
                "Malformed peak blobs: {} m/z values vs {} intensities, truncating to {}",
                mz.len(),
                intensity.len(),
                mz.len().min(intensity.len())
            );
        }

        Ok(PeakList::new(mz, intensity))
    }

    fn compress_if_smaller(packed: Vec<u8>) -> Result<Vec<u8>, PeakCodecError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(packed.len()), Compression::default());
        encoder.write_all(&packed)?;
        let compressed = encoder.finish()?;
        if compressed.len() < packed.len() {
            Ok(compressed)
        } else {
            Ok(packed)
        }
    }

    fn inflate_or_raw(blob: &[u8]) -> Vec<u8> {
        let mut decoder = ZlibDecoder::new(blob);
        let mut inflated = Vec::new();
        match decoder.read_to_end(&mut inflated) {
            Ok(_) => inflated,
            Err(_) => blob.to_vec(),
        }
    }

    fn unpack_f64(bytes: &[u8]) -> Result<Vec<f64>, PeakCodecError> {
        if bytes.len() % 8 != 0 {
            return Err(PeakCodecError::InvalidLength {
                array: "m/z",
                length: bytes.len(),
                width: 8,
            });
        }
        let mut values = vec![0.0f64; bytes.len() / 8];
        let mut cursor = std::io::Cursor::new(bytes);
        cursor.read_f64_into::<LittleEndian>(&mut values)?;
        Ok(values)
    }

    fn unpack_f32(bytes: &[u8]) -> Result<Vec<f32>, PeakCodecError> {
        if bytes.len() % 4 != 0 {
            return Err(PeakCodecError::InvalidLength {
                array: "intensity",
                length: bytes.len(),
                width: 4,
            });
        }
        let mut values = vec![0.0f32; bytes.len() / 4];
        LittleEndian::read_f32_into(bytes, &mut values);
        Ok(values)
    }
}

#[cfg(test)]
mod tests;
