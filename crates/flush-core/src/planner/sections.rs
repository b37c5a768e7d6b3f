//! Section type, connection-count clipping and range partitioning.

use std::path::{Path, PathBuf};

/// Hard ceiling on concurrent connections, regardless of what the server allows.
pub const MAX_CONNECTIONS: usize = 1000;

/// Digits in a temp-file section index. Wide enough for `MAX_CONNECTIONS - 1`,
/// so lexical order of temp paths equals index order.
pub const SECTION_INDEX_WIDTH: usize = 4;

/// Inclusive byte range `[start, end]` of the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered (both ends inclusive).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for curl's range option: `start-end`.
    pub fn curl_value(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// One independently fetched piece of the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Position in the output, 0-based.
    pub index: usize,
    /// Bytes to request; `None` fetches the whole body without a Range header.
    pub range: Option<ByteRange>,
    /// Where the fetcher stores this section's bytes until assembly.
    pub temp_path: PathBuf,
}

/// Temp file for section `index`: `<output>.sec<NNNN>` next to the output.
pub fn temp_path(output: &Path, index: usize) -> PathBuf {
    let mut o = output.as_os_str().to_owned();
    o.push(format!(".sec{:0width$}", index, width = SECTION_INDEX_WIDTH));
    PathBuf::from(o)
}

/// Effective connection count for a probed resource.
///
/// The request is clipped to `[1, MAX_CONNECTIONS]`, collapses to 1 when the
/// server does not advertise ranges or the size is unknown, and never exceeds
/// the size so that every section holds at least one byte.
pub fn effective_connections(
    requested: usize,
    accept_ranges: bool,
    content_length: Option<u64>,
) -> usize {
    let clipped = requested.clamp(1, MAX_CONNECTIONS);
    match content_length {
        Some(len) if accept_ranges && len > 0 => {
            let cap = usize::try_from(len).unwrap_or(usize::MAX);
            clipped.min(cap)
        }
        _ => 1,
    }
}

/// Partitions the resource into `connections` sections.
///
/// Each section is `len / connections` bytes wide and the last one absorbs the
/// remainder. With an unknown length or a single connection, one section with
/// no range is returned. `legacy_final_end` ends the last section at `len`
/// instead of `len - 1`, matching the historical partition.
///
/// Callers pass `connections <= len` (see [`effective_connections`]).
pub fn plan_sections(
    output: &Path,
    content_length: Option<u64>,
    connections: usize,
    legacy_final_end: bool,
) -> Vec<Section> {
    let len = match content_length {
        Some(len) if connections > 1 && len >= connections as u64 => len,
        _ => {
            return vec![Section {
                index: 0,
                range: None,
                temp_path: temp_path(output, 0),
            }]
        }
    };

    let count = connections as u64;
    let width = len / count;
    (0..connections)
        .map(|index| {
            let i = index as u64;
            let start = i * width;
            let end = if i + 1 < count {
                (i + 1) * width - 1
            } else if legacy_final_end {
                len
            } else {
                len - 1
            };
            Section {
                index,
                range: Some(ByteRange { start, end }),
                temp_path: temp_path(output, index),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(sections: &[Section]) -> Vec<(u64, u64)> {
        sections
            .iter()
            .map(|s| {
                let r = s.range.expect("bounded range");
                (r.start, r.end)
            })
            .collect()
    }

    #[test]
    fn plan_sections_even() {
        let secs = plan_sections(Path::new("/d/f.bin"), Some(1000), 4, false);
        assert_eq!(
            ranges(&secs),
            vec![(0, 249), (250, 499), (500, 749), (750, 999)]
        );
        let total: u64 = secs.iter().map(|s| s.range.unwrap().len()).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn plan_sections_remainder_goes_to_last() {
        let secs = plan_sections(Path::new("/d/f.bin"), Some(10), 4, false);
        assert_eq!(ranges(&secs), vec![(0, 1), (2, 3), (4, 5), (6, 9)]);
    }

    #[test]
    fn plan_sections_cover_without_gaps_or_overlaps() {
        for len in [1u64, 2, 7, 100, 1001, 65_537] {
            for n in [1usize, 2, 3, 8, 16, 1000] {
                if (n as u64) > len {
                    continue;
                }
                let secs = plan_sections(Path::new("/d/f.bin"), Some(len), n, false);
                assert_eq!(secs.len(), n, "len={len} n={n}");
                if n == 1 {
                    assert!(secs[0].range.is_none());
                    continue;
                }
                let mut next = 0u64;
                for (i, s) in secs.iter().enumerate() {
                    assert_eq!(s.index, i);
                    let r = s.range.unwrap();
                    assert_eq!(r.start, next, "gap or overlap at len={len} n={n} i={i}");
                    assert!(r.end >= r.start);
                    next = r.end + 1;
                }
                assert_eq!(next, len, "len={len} n={n}");
            }
        }
    }

    /// Known discrepancy: the historical partition ends the final section one
    /// byte past the resource. Kept behind `legacy_final_end` only.
    #[test]
    fn legacy_final_end_overshoots_by_one() {
        let secs = plan_sections(Path::new("/d/f.bin"), Some(1000), 4, true);
        assert_eq!(secs[3].range.unwrap(), ByteRange { start: 750, end: 1000 });
        assert_eq!(secs[2].range.unwrap(), ByteRange { start: 500, end: 749 });
    }

    #[test]
    fn unknown_length_single_unbounded_section() {
        let secs = plan_sections(Path::new("/d/f.bin"), None, 1, false);
        assert_eq!(secs.len(), 1);
        assert!(secs[0].range.is_none());
        assert_eq!(secs[0].temp_path, PathBuf::from("/d/f.bin.sec0000"));
    }

    #[test]
    fn temp_paths_sort_like_indices() {
        let secs = plan_sections(Path::new("/d/f.bin"), Some(5000), 1000, false);
        let mut paths: Vec<_> = secs.iter().map(|s| s.temp_path.clone()).collect();
        paths.reverse();
        paths.sort();
        for (i, p) in paths.iter().enumerate() {
            assert_eq!(p, &secs[i].temp_path);
            assert_ne!(p, Path::new("/d/f.bin"));
        }
        assert_eq!(secs[999].temp_path, PathBuf::from("/d/f.bin.sec0999"));
    }

    #[test]
    fn effective_connections_rules() {
        assert_eq!(effective_connections(8, true, Some(1 << 20)), 8);
        assert_eq!(effective_connections(5000, true, Some(1 << 30)), MAX_CONNECTIONS);
        assert_eq!(effective_connections(0, true, Some(100)), 1);
        assert_eq!(effective_connections(8, false, Some(1 << 20)), 1);
        assert_eq!(effective_connections(8, true, None), 1);
        assert_eq!(effective_connections(8, true, Some(0)), 1);
        assert_eq!(effective_connections(8, true, Some(3)), 3);
    }

    #[test]
    fn range_values() {
        let r = ByteRange { start: 250, end: 499 };
        assert_eq!(r.len(), 250);
        assert_eq!(r.curl_value(), "250-499");
        assert_eq!(r.header_value(), "bytes=250-499");
    }
}
