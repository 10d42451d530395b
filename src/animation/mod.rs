//! Reading Flow Lenia Animation (`.flwa`) containers.
//!
//! A container holds pre-computed simulation frames with random access to
//! any frame through a trailing index table.
//!
//! # File Format
//!
//! ```text
//! Header (52 bytes):
//!   Magic: "FLWA" (4 bytes)
//!   Version: u16
//!   Flags: u16 (bits 0-3 codec id, bit 4 delta encoding)
//!   Width: u32
//!   Height: u32
//!   Depth: u32
//!   Channels: u32
//!   Frame count: u64
//!   dt: f32
//!   Reserved: 16 bytes
//!
//! Frame data (variable):
//!   Each frame is channels * depth * height * width * 4 bytes (f32)
//!   before compression, channel-major
//!
//! Frame index table (frame_count * 16 bytes, ends at EOF):
//!   Offset: u64
//!   Encoded size: u64
//! ```
//!
//! All integers and floats are little-endian.

mod cache;
mod codec;
mod error;
mod format;
mod frame;
mod index;
#[cfg(not(target_arch = "wasm32"))]
mod parallel;
mod reader;

#[cfg(feature = "lz4")]
pub use codec::{Lz4Decompressor, compress_lz4};
pub use codec::{CodecRegistry, Decompressor};
pub use error::{FormatError, Result};
pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationFlags, AnimationHeader, CodecId, FrameIndex,
    decode_frame, encode_frame,
};
pub use frame::{Frame, FrameCodec, FrameShape, FrameStats};
pub use index::{index_table_start, read_index_table};
#[cfg(not(target_arch = "wasm32"))]
pub use parallel::ParallelDecoder;
pub use reader::{AnimationReader, FrameIterator};
