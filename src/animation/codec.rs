//! Codec registry for frame payload decompression.
//!
//! Codec ids occupy a fixed 4-bit space, so the registry is a 16-slot table.
//! Id 0 is always the identity transform and cannot be replaced.

use std::fmt;
use std::sync::Arc;

use super::error::{FormatError, Result};
use super::format::CodecId;

/// Decompressor for one codec id.
pub trait Decompressor: Send + Sync {
    /// Decompress a frame payload.
    ///
    /// `expected_size` is the uncompressed frame size derived from the header;
    /// implementations may use it as a capacity hint. Length validation is
    /// done by the caller.
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>>;

    /// Human readable codec name.
    fn name(&self) -> &'static str;
}

/// LZ4 block format with a little-endian u32 uncompressed size prefix.
#[cfg(feature = "lz4")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Decompressor;

#[cfg(feature = "lz4")]
impl Decompressor for Lz4Decompressor {
    fn decompress(&self, data: &[u8], _expected_size: usize) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data).map_err(|e| FormatError::Codec {
            codec: CodecId::LZ4.value(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "lz4"
    }
}

/// Compress data in the layout `Lz4Decompressor` reads.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Fixed table mapping codec ids to decompressors.
#[derive(Clone)]
pub struct CodecRegistry {
    slots: [Option<Arc<dyn Decompressor>>; CodecId::COUNT],
}

impl CodecRegistry {
    /// Registry with no compressed codecs; only raw payloads decode.
    pub fn empty() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Register (or replace) the decompressor for `id`.
    ///
    /// Registering id 0 is ignored: raw payloads never go through the table.
    pub fn register(&mut self, id: CodecId, decompressor: Arc<dyn Decompressor>) -> &mut Self {
        if !id.is_raw() {
            self.slots[id.value() as usize] = Some(decompressor);
        }
        self
    }

    pub fn unregister(&mut self, id: CodecId) -> Option<Arc<dyn Decompressor>> {
        self.slots[id.value() as usize].take()
    }

    pub fn supports(&self, id: CodecId) -> bool {
        id.is_raw() || self.slots[id.value() as usize].is_some()
    }

    pub fn get(&self, id: CodecId) -> Option<&Arc<dyn Decompressor>> {
        self.slots[id.value() as usize].as_ref()
    }

    /// Turn an encoded payload into raw frame bytes.
    ///
    /// Raw payloads are returned as-is without copying.
    pub fn decode(&self, id: CodecId, data: Vec<u8>, expected_size: usize) -> Result<Vec<u8>> {
        if id.is_raw() {
            return Ok(data);
        }
        let decompressor = self
            .get(id)
            .ok_or(FormatError::UnsupportedCodec(id.value()))?;
        decompressor.decompress(&data, expected_size)
    }
}

impl Default for CodecRegistry {
    /// All codecs compiled into this build.
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "lz4")]
        registry.register(CodecId::LZ4, Arc::new(Lz4Decompressor));
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (id, slot) in self.slots.iter().enumerate() {
            if let Some(d) = slot {
                list.entry(&id, &d.name());
            }
        }
        list.finish()
    }
}
