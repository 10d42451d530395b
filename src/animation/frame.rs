//! Decoded frames and the per-frame decode path.
//!
//! A frame is stored channel-major as one flat buffer:
//! `[channel][z * height * width + y * width + x]`, matching the payload
//! layout written by the recorder.

use std::io::{Read, Seek, SeekFrom};

use log::trace;
use serde::{Deserialize, Serialize};

use super::codec::CodecRegistry;
use super::error::{FormatError, Result};
use super::format::{AnimationHeader, FrameIndex, decode_frame};

/// Activation threshold used when counting active cells.
const ACTIVE_THRESHOLD: f32 = 1e-6;

/// Shape of a decoded frame: `(channels, depth, height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    pub channels: usize,
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl FrameShape {
    pub fn from_header(header: &AnimationHeader) -> Self {
        Self {
            channels: header.channels as usize,
            depth: header.depth as usize,
            height: header.height as usize,
            width: header.width as usize,
        }
    }

    /// Cells in one channel block, or `None` if the count overflows `usize`.
    #[inline]
    pub fn cells_per_channel(&self) -> Option<usize> {
        self.depth.checked_mul(self.height)?.checked_mul(self.width)
    }

    /// Total number of values, or `None` on overflow.
    #[inline]
    pub fn len(&self) -> Option<usize> {
        self.channels.checked_mul(self.cells_per_channel()?)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels == 0 || self.depth == 0 || self.height == 0 || self.width == 0
    }

    /// Uncompressed payload size in bytes, or `None` on overflow.
    #[inline]
    pub fn byte_len(&self) -> Option<usize> {
        self.len()?.checked_mul(4)
    }

    /// Flat offset of `(c, z, y, x)`, or `None` if any coordinate is out of bounds.
    #[inline]
    pub fn offset(&self, c: usize, z: usize, y: usize, x: usize) -> Option<usize> {
        if c >= self.channels || z >= self.depth || y >= self.height || x >= self.width {
            return None;
        }
        c.checked_mul(self.depth)?
            .checked_add(z)?
            .checked_mul(self.height)?
            .checked_add(y)?
            .checked_mul(self.width)?
            .checked_add(x)
    }
}

/// One decoded frame with absolute values.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: u64,
    time: f32,
    shape: FrameShape,
    data: Vec<f32>,
}

impl Frame {
    /// Build a frame from a flat channel-major buffer.
    ///
    /// A shape whose size overflows `usize` never matches.
    pub fn from_data(index: u64, time: f32, shape: FrameShape, data: Vec<f32>) -> Result<Self> {
        if shape.len() != Some(data.len()) {
            return Err(FormatError::SizeMismatch {
                frame: index,
                expected: shape.byte_len().unwrap_or(usize::MAX),
                actual: data.len() * 4,
            });
        }
        Ok(Self {
            index,
            time,
            shape,
            data,
        })
    }

    /// Reshape raw little-endian payload bytes into a frame.
    pub fn from_le_bytes(index: u64, time: f32, shape: FrameShape, bytes: &[u8]) -> Result<Self> {
        if shape.byte_len() != Some(bytes.len()) {
            return Err(FormatError::SizeMismatch {
                frame: index,
                expected: shape.byte_len().unwrap_or(usize::MAX),
                actual: bytes.len(),
            });
        }

        let mut data = vec![0.0f32; bytes.len() / 4];
        let block = block_len(shape.channels, data.len());
        if block > 0 {
            for (channel, chunk) in data
                .chunks_exact_mut(block)
                .zip(bytes.chunks_exact(block * 4))
            {
                decode_frame(chunk, channel)?;
            }
        }

        Ok(Self {
            index,
            time,
            shape,
            data,
        })
    }

    /// Frame number within the animation.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Simulation time of this frame (`index * dt`).
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Flat channel-major values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Cells per channel. The shape is known to fit the data here.
    #[inline]
    fn block(&self) -> usize {
        block_len(self.shape.channels, self.data.len())
    }

    /// Value at `(c, z, y, x)`.
    pub fn get(&self, c: usize, z: usize, y: usize, x: usize) -> Option<f32> {
        self.shape.offset(c, z, y, x).map(|i| self.data[i])
    }

    /// All cells of one channel, depth-major then row-major.
    pub fn channel(&self, c: usize) -> Option<&[f32]> {
        if c >= self.shape.channels {
            return None;
        }
        let block = self.block();
        Some(&self.data[c * block..(c + 1) * block])
    }

    /// One `height * width` depth slice of a channel, row-major.
    pub fn slice(&self, c: usize, z: usize) -> Option<&[f32]> {
        let start = self.shape.offset(c, z, 0, 0)?;
        let plane = self.shape.height * self.shape.width;
        Some(&self.data[start..start + plane])
    }

    /// Iterate over channel blocks.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> + '_ {
        // chunks_exact panics on 0
        let block = self.block().max(1);
        self.data.chunks_exact(block)
    }

    /// Sum over all cells of all channels.
    pub fn total_mass(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn channel_mass(&self, c: usize) -> Option<f32> {
        self.channel(c).map(|values| values.iter().sum())
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats::from_frame(self)
    }

    /// Add a stored delta onto the absolute values of the previous frame.
    pub(crate) fn accumulate(&mut self, reference: &Frame) -> Result<()> {
        if reference.shape != self.shape {
            return Err(FormatError::SizeMismatch {
                frame: self.index,
                expected: reference.data.len() * 4,
                actual: self.data.len() * 4,
            });
        }
        for (v, r) in self.data.iter_mut().zip(&reference.data) {
            *v += *r;
        }
        Ok(())
    }
}

fn block_len(channels: usize, len: usize) -> usize {
    len.checked_div(channels).unwrap_or(0)
}

/// Summary statistics of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub total_mass: f32,
    pub max_value: f32,
    pub min_value: f32,
    pub mean_value: f32,
    pub active_cells: usize,
    /// Mass of each channel.
    pub channel_mass: Vec<f32>,
}

impl FrameStats {
    pub fn from_frame(frame: &Frame) -> Self {
        let mut total_mass = 0.0f32;
        let mut max_value = f32::NEG_INFINITY;
        let mut min_value = f32::INFINITY;
        let mut active_cells = 0usize;
        let mut channel_mass = Vec::with_capacity(frame.shape.channels);

        if frame.block() > 0 {
            for channel in frame.channels() {
                let mut mass = 0.0f32;
                for &v in channel {
                    mass += v;
                    max_value = max_value.max(v);
                    min_value = min_value.min(v);
                    if v > ACTIVE_THRESHOLD {
                        active_cells += 1;
                    }
                }
                total_mass += mass;
                channel_mass.push(mass);
            }
        }

        let count = frame.data.len();
        Self {
            total_mass,
            max_value,
            min_value,
            mean_value: if count > 0 {
                total_mass / count as f32
            } else {
                0.0
            },
            active_cells,
            channel_mass,
        }
    }
}

/// Stateless decoder for single frames of one container.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec<'a> {
    header: &'a AnimationHeader,
    codecs: &'a CodecRegistry,
}

impl<'a> FrameCodec<'a> {
    pub fn new(header: &'a AnimationHeader, codecs: &'a CodecRegistry) -> Self {
        Self { header, codecs }
    }

    /// Uncompressed frame size in bytes.
    ///
    /// Dimensions whose product overflows `usize` can never match a payload
    /// and are reported as a size mismatch against `actual`.
    fn frame_size(&self, frame: u64, actual: usize) -> Result<usize> {
        self.header
            .frame_size()
            .ok_or(FormatError::SizeMismatch {
                frame,
                expected: usize::MAX,
                actual,
            })
    }

    /// Read the encoded payload of frame `frame` described by `entry`.
    pub fn read_payload<R: Read + Seek>(
        &self,
        reader: &mut R,
        frame: u64,
        entry: &FrameIndex,
    ) -> Result<Vec<u8>> {
        let truncated = || FormatError::TruncatedFrame {
            frame,
            offset: entry.offset,
            expected: entry.size,
        };

        let size = usize::try_from(entry.size).unwrap_or(usize::MAX);
        let frame_size = self.frame_size(frame, size)?;

        reader.seek(SeekFrom::Start(entry.offset))?;

        // Cap the up-front allocation; a corrupt size must not allocate blindly.
        let capacity = size.min(frame_size.max(4096));
        let mut data = Vec::with_capacity(capacity);
        let read = reader.by_ref().take(entry.size).read_to_end(&mut data)?;
        if (read as u64) < entry.size {
            return Err(truncated());
        }
        Ok(data)
    }

    /// Decompress and reshape an encoded payload. No delta is applied.
    pub fn decode_payload(&self, frame: u64, payload: Vec<u8>) -> Result<Frame> {
        let expected = self.frame_size(frame, payload.len())?;
        let raw = self
            .codecs
            .decode(self.header.flags.compression, payload, expected)?;
        if raw.len() != expected {
            return Err(FormatError::SizeMismatch {
                frame,
                expected,
                actual: raw.len(),
            });
        }

        trace!("Decoded frame {} ({} bytes)", frame, raw.len());
        Frame::from_le_bytes(
            frame,
            frame as f32 * self.header.dt,
            FrameShape::from_header(self.header),
            &raw,
        )
    }

    /// Read and decode one frame.
    ///
    /// When `reference` is given, the decoded values are a delta and the
    /// reference (the absolute previous frame) is added to them.
    pub fn decode<R: Read + Seek>(
        &self,
        reader: &mut R,
        frame: u64,
        entry: &FrameIndex,
        reference: Option<&Frame>,
    ) -> Result<Frame> {
        let payload = self.read_payload(reader, frame, entry)?;
        let mut decoded = self.decode_payload(frame, payload)?;
        if let Some(reference) = reference {
            decoded.accumulate(reference)?;
        }
        Ok(decoded)
    }
}
