//! Animation reader: random access to the frames of a recorded simulation.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace};

use super::cache::FrameCache;
use super::codec::CodecRegistry;
use super::error::{FormatError, Result};
use super::format::{AnimationHeader, FrameIndex};
use super::frame::{Frame, FrameCodec};
use super::index::read_index_table;
use crate::schema::ReaderConfig;

/// Reader for Flow Lenia Animation containers.
///
/// Header and index table are parsed once at open; frames are decoded on
/// demand. For delta-encoded files the reader replays the delta chain from
/// the nearest keyframe or cached frame.
///
/// Usage:
/// ```ignore
/// let mut reader = AnimationReader::open("animation.flwa")?;
/// println!("Animation has {} frames", reader.frame_count());
///
/// // Read specific frame
/// let frame = reader.get_frame(100)?;
///
/// // Or iterate through all frames
/// for frame in reader.frames() {
///     let frame = frame?;
///     println!("t={} mass={}", frame.time(), frame.total_mass());
/// }
/// ```
pub struct AnimationReader<R = BufReader<File>> {
    reader: R,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    codecs: CodecRegistry,
    config: ReaderConfig,
    cache: FrameCache,
}

impl AnimationReader<BufReader<File>> {
    /// Open an animation file with the default configuration and codecs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReaderConfig::default(), CodecRegistry::default())
    }

    /// Open an animation file with an explicit configuration and codec table.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: ReaderConfig,
        codecs: CodecRegistry,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening animation {}", path.display());
        let file = File::open(path)?;
        Self::with_config(BufReader::new(file), config, codecs)
    }
}

impl<R: Read + Seek> AnimationReader<R> {
    /// Read a container from any seekable source.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_config(reader, ReaderConfig::default(), CodecRegistry::default())
    }

    /// Parse header and index table. No frame payload is touched.
    pub fn with_config(mut reader: R, config: ReaderConfig, codecs: CodecRegistry) -> Result<Self> {
        config.validate()?;

        reader.seek(SeekFrom::Start(0))?;
        let header = AnimationHeader::read_from(&mut reader)?;

        let file_len = reader.seek(SeekFrom::End(0))?;
        let frame_indices = read_index_table(&mut reader, &header, file_len)?;

        debug!(
            "Animation {}x{}x{} ({} channels), {} frames, dt={}, codec={}, delta={}",
            header.width,
            header.height,
            header.depth,
            header.channels,
            header.frame_count,
            header.dt,
            header.flags.compression,
            header.flags.delta_encoding
        );

        let cache = FrameCache::new(config.cache_capacity);
        Ok(Self {
            reader,
            header,
            frame_indices,
            codecs,
            config,
            cache,
        })
    }

    /// Get animation header.
    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    /// Frame index table in frame order.
    pub fn frame_indices(&self) -> &[FrameIndex] {
        &self.frame_indices
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Codec table, e.g. to register a decompressor after open.
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Get grid dimensions `(width, height, depth)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (
            self.header.width as usize,
            self.header.height as usize,
            self.header.depth as usize,
        )
    }

    /// Get number of channels.
    pub fn channel_count(&self) -> usize {
        self.header.channels as usize
    }

    /// Check if animation is 3D.
    pub fn is_3d(&self) -> bool {
        self.header.is_3d()
    }

    /// Get time step per frame.
    pub fn dt(&self) -> f32 {
        self.header.dt
    }

    /// Simulation time of frame `index`.
    pub fn frame_time(&self, index: u64) -> f32 {
        index as f32 * self.header.dt
    }

    /// Frame numbers currently held by the cache, least recently used first.
    pub fn cached_frames(&self) -> Vec<u64> {
        self.cache.indices()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// True if `index` is stored as absolute values.
    fn is_keyframe(&self, index: u64) -> bool {
        !self.header.flags.delta_encoding || self.config.keyframes.is_keyframe(index)
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.header.frame_count {
            return Err(FormatError::FrameIndexOutOfRange {
                index,
                frame_count: self.header.frame_count,
            });
        }
        Ok(())
    }

    /// Decode one frame from disk, applying `reference` as the delta base.
    fn decode_one(&mut self, index: u64, reference: Option<&Frame>) -> Result<Frame> {
        let entry = self.frame_indices[index as usize];
        FrameCodec::new(&self.header, &self.codecs).decode(
            &mut self.reader,
            index,
            &entry,
            reference,
        )
    }

    /// Read the absolute frame at `index`.
    ///
    /// Under delta encoding this decodes every frame between the chain's
    /// keyframe (or the latest cached frame of the chain) and `index`. A
    /// failure anywhere in that span is returned for `index` as well.
    pub fn get_frame(&mut self, index: u64) -> Result<Frame> {
        self.check_index(index)?;

        if let Some(frame) = self.cache.get(index) {
            trace!("Cache hit for frame {}", index);
            return Ok(frame.clone());
        }

        if self.is_keyframe(index) {
            let frame = self.decode_one(index, None)?;
            self.cache.insert(frame.clone());
            return Ok(frame);
        }

        let chain_start = self.config.keyframes.chain_start(index);
        let mut current = match self.cache.latest_in(chain_start, index).cloned() {
            Some(frame) => frame,
            None => {
                let frame = self.decode_one(chain_start, None)?;
                self.cache.insert(frame.clone());
                frame
            }
        };

        debug!(
            "Replaying delta chain {}..={} for frame {}",
            current.index() + 1,
            index,
            index
        );
        for i in current.index() + 1..=index {
            current = self.decode_one(i, Some(&current))?;
            self.cache.insert(current.clone());
        }
        Ok(current)
    }

    /// Create an iterator over all frames.
    pub fn frames(&mut self) -> FrameIterator<'_, R> {
        FrameIterator {
            reader: self,
            current: 0,
            previous: None,
        }
    }
}

/// Sequential iterator over the frames of an animation.
///
/// Keeps the previously yielded frame so delta chains are walked once,
/// independent of cache capacity.
pub struct FrameIterator<'a, R> {
    reader: &'a mut AnimationReader<R>,
    current: u64,
    previous: Option<Frame>,
}

impl<R: Read + Seek> Iterator for FrameIterator<'_, R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.reader.frame_count() {
            return None;
        }
        let index = self.current;
        self.current += 1;

        let reference = self.previous.take();
        let result = match reference {
            Some(prev) if !self.reader.is_keyframe(index) => {
                self.reader.decode_one(index, Some(&prev))
            }
            _ => self.reader.get_frame(index),
        };

        if let Ok(frame) = &result {
            if self.reader.header.flags.delta_encoding {
                self.previous = Some(frame.clone());
            }
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.reader.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl<R: Read + Seek> ExactSizeIterator for FrameIterator<'_, R> {}
