//! Trailing frame index table.
//!
//! The table holds `frame_count` fixed-size entries and ends exactly at
//! end-of-file, so its start can only be computed once the header is known.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use super::error::{FormatError, Result};
use super::format::{AnimationHeader, FrameIndex};

/// Compute the byte offset where the index table starts.
///
/// Fails with `TruncatedIndex` when the table would overlap the header
/// or start before the beginning of the file.
pub fn index_table_start(header: &AnimationHeader, file_len: u64) -> Result<u64> {
    let truncated = || FormatError::TruncatedIndex {
        frame_count: header.frame_count,
        file_len,
    };

    let table_len = header
        .frame_count
        .checked_mul(FrameIndex::SIZE as u64)
        .ok_or_else(truncated)?;
    let start = file_len.checked_sub(table_len).ok_or_else(truncated)?;
    if start < AnimationHeader::SIZE as u64 {
        return Err(truncated());
    }
    Ok(start)
}

/// Read all frame index entries in file order.
///
/// Entry `i` describes frame `i`. Entries are not cross-checked against each
/// other or against the file length; bad ranges surface when a frame is read.
pub fn read_index_table<R: Read + Seek>(
    reader: &mut R,
    header: &AnimationHeader,
    file_len: u64,
) -> Result<Vec<FrameIndex>> {
    let start = index_table_start(header, file_len)?;
    reader.seek(SeekFrom::Start(start))?;

    let mut entries = Vec::with_capacity(header.frame_count as usize);
    for _ in 0..header.frame_count {
        entries.push(FrameIndex::read_from(reader)?);
    }

    debug!(
        "Read {} index entries starting at byte {}",
        entries.len(),
        start
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::AnimationFlags;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn header(frame_count: u64) -> AnimationHeader {
        AnimationHeader {
            width: 2,
            height: 1,
            depth: 1,
            channels: 1,
            frame_count,
            dt: 0.5,
            flags: AnimationFlags::default(),
        }
    }

    /// Header, `payload_len` filler bytes, then an index describing them.
    fn container(frame_count: u64, payload_len: u64) -> Vec<u8> {
        let h = header(frame_count);
        let mut buf = Vec::new();
        h.write_to(&mut buf).unwrap();
        buf.resize(buf.len() + payload_len as usize, 0xAB);
        for i in 0..frame_count {
            FrameIndex {
                offset: AnimationHeader::SIZE as u64 + i,
                size: i * 3,
            }
            .write_to(&mut buf)
            .unwrap();
        }
        buf
    }

    #[test]
    fn test_reads_entries_in_order() {
        let buf = container(4, 40);
        let mut cursor = Cursor::new(&buf);
        let entries = read_index_table(&mut cursor, &header(4), buf.len() as u64).unwrap();

        assert_eq!(entries.len(), 4);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.offset, AnimationHeader::SIZE as u64 + i as u64);
            assert_eq!(entry.size, i as u64 * 3);
        }
    }

    #[test]
    fn test_index_may_directly_follow_header() {
        let buf = container(2, 0);
        let start = index_table_start(&header(2), buf.len() as u64).unwrap();
        assert_eq!(start, AnimationHeader::SIZE as u64);
    }

    #[test]
    fn test_shrunk_file_is_truncated() {
        let buf = container(3, 0);
        let err = index_table_start(&header(3), buf.len() as u64 - 1).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedIndex { frame_count: 3, .. }));
    }

    #[test]
    fn test_huge_frame_count_is_truncated() {
        let err = index_table_start(&header(u64::MAX), 1024).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedIndex { .. }));
    }

    proptest! {
        #[test]
        fn prop_start_matches_table_position(frame_count in 0u64..64, payload_len in 0u64..256) {
            let buf = container(frame_count, payload_len);
            let h = header(frame_count);
            let start = index_table_start(&h, buf.len() as u64).unwrap();
            prop_assert_eq!(start, AnimationHeader::SIZE as u64 + payload_len);

            if frame_count > 0 && payload_len == 0 {
                prop_assert!(index_table_start(&h, buf.len() as u64 - 1).is_err());
            }
        }
    }
}
