//! Binary format definitions for Flow Lenia Animation files.

use std::fmt;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::error::{FormatError, Result};

/// Magic bytes identifying a Flow Lenia Animation file.
pub const ANIMATION_MAGIC: &[u8; 4] = b"FLWA";

/// The one format version this decoder reads.
pub const ANIMATION_VERSION: u16 = 1;

const CODEC_MASK: u16 = 0x0F;
const DELTA_BIT: u16 = 1 << 4;

/// Identifier of a per-frame payload codec (4 bits, 0-15).
///
/// Id 0 means the payload is stored as raw little-endian `f32` data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CodecId(u8);

impl CodecId {
    /// Raw f32 payload.
    pub const NONE: CodecId = CodecId(0);
    /// LZ4 block with a prepended u32 uncompressed size.
    pub const LZ4: CodecId = CodecId(1);

    /// Number of addressable codec ids.
    pub const COUNT: usize = 16;

    pub fn new(v: u8) -> Option<Self> {
        if (v as usize) < Self::COUNT {
            Some(Self(v))
        } else {
            None
        }
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_raw(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for CodecId {
    type Error = FormatError;

    fn try_from(v: u8) -> Result<Self> {
        Self::new(v).ok_or(FormatError::UnsupportedCodec(v))
    }
}

impl From<CodecId> for u8 {
    fn from(id: CodecId) -> u8 {
        id.0
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "none"),
            1 => write!(f, "lz4"),
            id => write!(f, "codec#{id}"),
        }
    }
}

/// Animation file header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFlags {
    /// Payload codec (lower 4 bits).
    pub compression: CodecId,
    /// If true, frames after a keyframe store the delta from the previous frame.
    pub delta_encoding: bool,
}

impl AnimationFlags {
    pub fn to_u16(self) -> u16 {
        let mut flags = self.compression.value() as u16;
        if self.delta_encoding {
            flags |= DELTA_BIT;
        }
        flags
    }

    /// Decode flags. Bits above bit 4 are reserved and ignored.
    pub fn from_u16(v: u16) -> Self {
        Self {
            compression: CodecId((v & CODEC_MASK) as u8),
            delta_encoding: (v & DELTA_BIT) != 0,
        }
    }
}

/// File header for Flow Lenia Animation format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationHeader {
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Grid depth (1 for 2D).
    pub depth: u32,
    /// Number of channels.
    pub channels: u32,
    /// Total number of frames.
    pub frame_count: u64,
    /// Simulation time step (dt) per frame.
    pub dt: f32,
    /// Animation flags.
    pub flags: AnimationFlags,
}

impl AnimationHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + Width(4) + Height(4) + Depth(4) +
    /// Channels(4) + FrameCount(8) + dt(4) + Reserved(16) = 52
    pub const SIZE: usize = 52;

    /// Number of cells in one channel (width * height * depth), or `None`
    /// if it does not fit in a `usize`.
    pub fn grid_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.depth as usize)
    }

    /// Size of one uncompressed frame in bytes, or `None` on overflow.
    pub fn frame_size(&self) -> Option<usize> {
        self.grid_size()?
            .checked_mul(self.channels as usize)?
            .checked_mul(4)
    }

    /// Check if this is a 3D animation.
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.depth.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.dt.to_le_bytes())?;
        // Reserved bytes
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    /// Read header from input.
    ///
    /// Stops right after the magic when it does not match.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let magic: [u8; 4] = read_array(r)?;
        if &magic != ANIMATION_MAGIC {
            return Err(FormatError::BadMagic { found: magic });
        }

        let version = u16::from_le_bytes(read_array(r)?);
        if version != ANIMATION_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                expected: ANIMATION_VERSION,
            });
        }

        let flags = AnimationFlags::from_u16(u16::from_le_bytes(read_array(r)?));
        let width = u32::from_le_bytes(read_array(r)?);
        let height = u32::from_le_bytes(read_array(r)?);
        let depth = u32::from_le_bytes(read_array(r)?);
        let channels = u32::from_le_bytes(read_array(r)?);
        let frame_count = u64::from_le_bytes(read_array(r)?);
        let dt = f32::from_le_bytes(read_array(r)?);

        // Skip reserved bytes
        let _reserved: [u8; 16] = read_array(r)?;

        Ok(Self {
            width,
            height,
            depth,
            channels,
            frame_count,
            dt,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Encoded payload size in bytes (equals uncompressed if no compression).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let size = u64::from_le_bytes(buf8);

        Ok(Self { offset, size })
    }

    /// Offset one past the last payload byte, if it fits in a u64.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// Encode f32 slice to little-endian bytes.
pub fn encode_frame(data: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for &v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian bytes into an f32 slice of matching length.
pub fn decode_frame(bytes: &[u8], output: &mut [f32]) -> io::Result<()> {
    if bytes.len() != output.len() * 4 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame size mismatch: {} bytes vs {} floats",
                bytes.len(),
                output.len()
            ),
        ));
    }
    for (v, b) in output.iter_mut().zip(bytes.chunks_exact(4)) {
        *v = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
    Ok(())
}

fn read_array<const N: usize, R: Read>(r: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::TruncatedHeader {
            expected: AnimationHeader::SIZE,
        },
        _ => FormatError::Io(e),
    })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> AnimationHeader {
        AnimationHeader {
            width: 64,
            height: 48,
            depth: 32,
            channels: 2,
            frame_count: 1000,
            dt: 0.1,
            flags: AnimationFlags {
                compression: CodecId::LZ4,
                delta_encoding: true,
            },
        }
    }

    #[test]
    fn test_header_layout() {
        let header = sample_header();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AnimationHeader::SIZE);

        assert_eq!(&buf[0..4], b"FLWA");
        assert_eq!(u16::from_le_bytes([buf[4], buf[5]]), 1);
        assert_eq!(u16::from_le_bytes([buf[6], buf[7]]), 0x11);
        assert_eq!(u32::from_le_bytes(buf[8..12].try_into().unwrap()), 64);
        assert_eq!(u32::from_le_bytes(buf[20..24].try_into().unwrap()), 2);
        assert_eq!(u64::from_le_bytes(buf[24..32].try_into().unwrap()), 1000);
        assert!(buf[36..52].iter().all(|&b| b == 0));

        let decoded = AnimationHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_magic_stops_after_four_bytes() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf[..4].copy_from_slice(b"RIFF");

        let mut cursor = Cursor::new(&buf);
        match AnimationHeader::read_from(&mut cursor) {
            Err(FormatError::BadMagic { found }) => assert_eq!(&found, b"RIFF"),
            other => panic!("expected BadMagic, got {:?}", other),
        }
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf[4..6].copy_from_slice(&2u16.to_le_bytes());

        let err = AnimationHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_reserved_flag_bits_ignored() {
        let flags = AnimationFlags::from_u16(0xFFE0 | 0x0003);
        assert_eq!(flags.compression.value(), 3);
        assert!(!flags.delta_encoding);

        let flags = AnimationFlags::from_u16(0x8010);
        assert_eq!(flags.compression, CodecId::NONE);
        assert!(flags.delta_encoding);
    }

    #[test]
    fn test_short_header_is_truncated() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf.truncate(30);

        let err = AnimationHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedHeader { expected: 52 }));
    }

    #[test]
    fn test_zero_dimensions_are_not_validated() {
        let mut header = sample_header();
        header.width = 0;
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        let decoded = AnimationHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded.width, 0);
        assert_eq!(decoded.frame_size(), Some(0));
    }

    #[test]
    fn test_oversized_dimensions_have_no_frame_size() {
        let mut header = sample_header();
        header.width = u32::MAX;
        header.height = u32::MAX;
        header.depth = u32::MAX;
        header.channels = u32::MAX;
        assert_eq!(header.grid_size(), None);
        assert_eq!(header.frame_size(), None);

        header.width = 65536;
        header.height = 65536;
        header.depth = 65536;
        header.channels = 65536;
        assert_eq!(header.frame_size(), None);
    }

    #[test]
    fn test_codec_id_range() {
        assert_eq!(CodecId::new(15).map(CodecId::value), Some(15));
        assert!(CodecId::new(16).is_none());
        assert!(CodecId::NONE.is_raw());
        assert_eq!(CodecId::LZ4.to_string(), "lz4");
    }

    #[test]
    fn test_codec_id_deserialize_checks_range() {
        let id: CodecId = serde_json::from_str("15").unwrap();
        assert_eq!(id.value(), 15);
        assert_eq!(serde_json::to_string(&id).unwrap(), "15");

        assert!(serde_json::from_str::<CodecId>("16").is_err());
        assert!(serde_json::from_str::<CodecId>("200").is_err());
        assert!(matches!(
            CodecId::try_from(200u8),
            Err(FormatError::UnsupportedCodec(200))
        ));

        let json = r#"{"compression":200,"delta_encoding":false}"#;
        assert!(serde_json::from_str::<AnimationFlags>(json).is_err());
    }

    #[test]
    fn test_frame_encode_decode() {
        let data: Vec<f32> = (0..100).map(|i| i as f32 * 0.1).collect();
        let encoded = encode_frame(&data);
        assert_eq!(encoded.len(), data.len() * 4);

        let mut decoded = vec![0.0f32; 100];
        decode_frame(&encoded, &mut decoded).unwrap();
        assert_eq!(decoded, data);

        let mut short = vec![0.0f32; 99];
        assert!(decode_frame(&encoded, &mut short).is_err());
    }

    #[test]
    fn test_frame_index_layout() {
        let index = FrameIndex {
            offset: 12345678,
            size: 8192,
        };

        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FrameIndex::SIZE);
        assert_eq!(u64::from_le_bytes(buf[0..8].try_into().unwrap()), 12345678);

        let decoded = FrameIndex::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, index);
        assert_eq!(decoded.end(), Some(12345678 + 8192));
    }
}
