//! Multi-threaded decoding of frame ranges.
//!
//! Every worker owns its own file handle. Reading, decompressing and
//! reshaping payloads has no cross-frame dependency and runs on the rayon
//! pool; delta chains are then accumulated in frame order on the caller's
//! thread.

use std::fs::File;
use std::io::{self, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;

use super::codec::CodecRegistry;
use super::error::{FormatError, Result};
use super::format::{AnimationHeader, FrameIndex};
use super::frame::{Frame, FrameCodec};
use super::index::read_index_table;
use crate::schema::{KeyframePolicy, ReaderConfig};

/// Decoder that spreads frame decoding across threads.
#[derive(Debug, Clone)]
pub struct ParallelDecoder {
    path: PathBuf,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    codecs: CodecRegistry,
    keyframes: KeyframePolicy,
}

impl ParallelDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ReaderConfig::default(), CodecRegistry::default())
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: &ReaderConfig,
        codecs: CodecRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = AnimationHeader::read_from(&mut reader)?;
        let frame_indices = read_index_table(&mut reader, &header, file_len)?;

        Ok(Self {
            path,
            header,
            frame_indices,
            codecs,
            keyframes: config.keyframes,
        })
    }

    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Decode every frame in `range`.
    ///
    /// Fails as a whole only if either bound exceeds the frame count; each frame
    /// otherwise gets its own result. For delta files the chain is decoded
    /// from the keyframe preceding `range.start`.
    pub fn decode_range(&self, range: Range<u64>) -> Result<Vec<Result<Frame>>> {
        if range.start > self.header.frame_count || range.end > self.header.frame_count {
            return Err(FormatError::FrameIndexOutOfRange {
                index: range.end.saturating_sub(1).max(range.start),
                frame_count: self.header.frame_count,
            });
        }
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let delta = self.header.flags.delta_encoding;
        let first = if delta {
            self.keyframes.chain_start(range.start)
        } else {
            range.start
        };

        let indices: Vec<u64> = (first..range.end).collect();
        debug!(
            "Decoding frames {}..{} on {} threads",
            first,
            range.end,
            rayon::current_num_threads()
        );

        let codec = FrameCodec::new(&self.header, &self.codecs);
        let decoded: Vec<Result<Frame>> = indices
            .par_iter()
            .map_init(
                || File::open(&self.path).map(BufReader::new),
                |file, &i| -> Result<Frame> {
                    let file = file
                        .as_mut()
                        .map_err(|e| FormatError::Io(io::Error::new(e.kind(), e.to_string())))?;
                    codec.decode(file, i, &self.frame_indices[i as usize], None)
                },
            )
            .collect();

        let mut frames = if delta {
            self.accumulate(first, decoded)
        } else {
            decoded
        };
        Ok(frames.split_off((range.start - first) as usize))
    }

    /// Decode all frames.
    pub fn decode_all(&self) -> Result<Vec<Result<Frame>>> {
        self.decode_range(0..self.header.frame_count)
    }

    /// Turn decoded deltas into absolute frames, in order.
    fn accumulate(&self, first: u64, decoded: Vec<Result<Frame>>) -> Vec<Result<Frame>> {
        let mut out: Vec<Result<Frame>> = Vec::with_capacity(decoded.len());
        for (i, result) in (first..).zip(decoded) {
            let absolute = if self.keyframes.is_keyframe(i) {
                result
            } else {
                match out.last() {
                    Some(Ok(previous)) => result.and_then(|mut frame| {
                        frame.accumulate(previous)?;
                        Ok(frame)
                    }),
                    Some(Err(e)) => Err(e.duplicate()),
                    None => result,
                }
            };
            out.push(absolute);
        }
        out
    }
}
