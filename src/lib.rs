//! Flow Lenia Animation - decoder for recorded simulation containers.
//!
//! Flow Lenia simulations can be "compiled" ahead of time into `.flwa`
//! files: a fixed header, one payload block per frame and a trailing index
//! table. This crate opens those files and decodes any frame on demand into
//! a dense channel-major grid.
//!
//! # Architecture
//!
//! - `animation`: container format, codecs, frame decoding and the reader
//! - `schema`: reader configuration (cache size, keyframe policy)
//!
//! # Example
//!
//! ```rust,no_run
//! use flwa::{AnimationReader, FormatError};
//!
//! let mut reader = AnimationReader::open("simulation.flwa")?;
//! let (width, height, depth) = reader.dimensions();
//! println!("{}x{}x{}, {} frames", width, height, depth, reader.frame_count());
//!
//! let frame = reader.get_frame(reader.frame_count() - 1)?;
//! println!("Total mass at t={}: {}", frame.time(), frame.total_mass());
//! # Ok::<(), FormatError>(())
//! ```

pub mod animation;
pub mod schema;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use animation::{AnimationHeader, AnimationReader, FormatError, Frame, FrameStats};
pub use schema::{KeyframePolicy, ReaderConfig};
