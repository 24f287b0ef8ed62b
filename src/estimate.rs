//! Sampling-based row count estimation.
//!
//! Reads at most [`SAMPLE_LINE_CAP`] lines across all files, measures their
//! average size, and extrapolates from the combined file length. The result is
//! an optimisation hint: any I/O failure degrades the whole estimate to
//! [`RowCountEstimate::Unknown`] instead of surfacing an error.
//!
//! When the sample does not reach the cap, the sampled byte total is replaced
//! by the total file length. This compensates for `\r\n` terminators being
//! counted as one byte, but it is an approximation: it only applies to small
//! inputs and does not model other line-ending conventions.

use std::{
    fmt,
    fs::{self, File},
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use log::debug;

pub const SAMPLE_LINE_CAP: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCountEstimate {
    Estimated(u64),
    Unknown,
}

impl RowCountEstimate {
    pub fn rows(self) -> Option<u64> {
        match self {
            RowCountEstimate::Estimated(rows) => Some(rows),
            RowCountEstimate::Unknown => None,
        }
    }
}

impl fmt::Display for RowCountEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCountEstimate::Estimated(rows) => write!(f, "{rows}"),
            RowCountEstimate::Unknown => write!(f, "unknown"),
        }
    }
}

/// A file the estimator can size and read.
pub trait SampleSource {
    type Reader: Read;

    fn location(&self) -> String;
    fn byte_len(&self) -> io::Result<u64>;
    fn open(&self) -> io::Result<Self::Reader>;
}

impl SampleSource for Path {
    type Reader = File;

    fn location(&self) -> String {
        self.display().to_string()
    }

    fn byte_len(&self) -> io::Result<u64> {
        Ok(fs::metadata(self)?.len())
    }

    fn open(&self) -> io::Result<File> {
        File::open(self)
    }
}

impl SampleSource for PathBuf {
    type Reader = File;

    fn location(&self) -> String {
        self.as_path().location()
    }

    fn byte_len(&self) -> io::Result<u64> {
        self.as_path().byte_len()
    }

    fn open(&self) -> io::Result<File> {
        self.as_path().open()
    }
}

impl<T: SampleSource + ?Sized> SampleSource for &T {
    type Reader = T::Reader;

    fn location(&self) -> String {
        (**self).location()
    }

    fn byte_len(&self) -> io::Result<u64> {
        (**self).byte_len()
    }

    fn open(&self) -> io::Result<T::Reader> {
        (**self).open()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub total_file_bytes: u64,
    pub sampled_row_count: u64,
    pub sampled_row_bytes: u64,
}

impl SampleStats {
    pub fn estimate(&self) -> RowCountEstimate {
        let sampled_row_bytes = if self.sampled_row_count < SAMPLE_LINE_CAP {
            self.total_file_bytes
        } else {
            self.sampled_row_bytes
        };
        if sampled_row_bytes == 0 {
            return RowCountEstimate::Unknown;
        }
        let sampled_rows = self.sampled_row_count.min(SAMPLE_LINE_CAP);
        let rows = u128::from(self.total_file_bytes) * u128::from(sampled_rows)
            / u128::from(sampled_row_bytes);
        RowCountEstimate::Estimated(u64::try_from(rows).unwrap_or(u64::MAX))
    }
}

/// Sizes every file and samples lines until the global cap is reached. Each
/// file handle is dropped before the next file is opened.
pub fn sample<I>(files: I) -> io::Result<SampleStats>
where
    I: IntoIterator,
    I::Item: SampleSource,
{
    let mut stats = SampleStats::default();
    let mut line = Vec::new();
    for file in files {
        let len = file.byte_len()?;
        stats.total_file_bytes += len;
        if stats.sampled_row_count >= SAMPLE_LINE_CAP {
            continue;
        }
        let before = stats.sampled_row_count;
        let mut reader = BufReader::new(file.open()?);
        while stats.sampled_row_count < SAMPLE_LINE_CAP {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            stats.sampled_row_count += 1;
            stats.sampled_row_bytes += content_len(&line) + 1;
        }
        debug!(
            "Sampled {} line(s) from {} ({len} bytes)",
            stats.sampled_row_count - before,
            file.location()
        );
    }
    Ok(stats)
}

/// Estimates the number of rows in `files`; never fails.
pub fn estimate<I>(files: I) -> RowCountEstimate
where
    I: IntoIterator,
    I::Item: SampleSource,
{
    match sample(files) {
        Ok(stats) => stats.estimate(),
        Err(err) => {
            debug!("Row count estimation unavailable: {err}");
            RowCountEstimate::Unknown
        }
    }
}

/// Line length without its `\n` or `\r\n` terminator.
fn content_len(line: &[u8]) -> u64 {
    let trimmed = line.strip_suffix(b"\n").unwrap_or(line);
    let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
    trimmed.len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InMemory(Vec<u8>);

    impl SampleSource for InMemory {
        type Reader = io::Cursor<Vec<u8>>;

        fn location(&self) -> String {
            "memory".to_string()
        }

        fn byte_len(&self) -> io::Result<u64> {
            Ok(self.0.len() as u64)
        }

        fn open(&self) -> io::Result<Self::Reader> {
            Ok(io::Cursor::new(self.0.clone()))
        }
    }

    struct Unreadable;

    impl SampleSource for Unreadable {
        type Reader = io::Empty;

        fn location(&self) -> String {
            "unreadable".to_string()
        }

        fn byte_len(&self) -> io::Result<u64> {
            Ok(10)
        }

        fn open(&self) -> io::Result<io::Empty> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn lines(count: usize, line: &str) -> InMemory {
        InMemory(line.repeat(count).into_bytes())
    }

    #[test]
    fn content_len_strips_both_terminators() {
        assert_eq!(content_len(b"abc\n"), 3);
        assert_eq!(content_len(b"abc\r\n"), 3);
        assert_eq!(content_len(b"abc"), 3);
    }

    #[test]
    fn small_sample_is_exact() {
        let file = lines(40, "12345678\n");
        assert_eq!(estimate([file]), RowCountEstimate::Estimated(40));
    }

    #[test]
    fn crlf_files_below_the_cap_count_exactly() {
        let file = lines(7, "a,b\r\n");
        assert_eq!(estimate([file]), RowCountEstimate::Estimated(7));
    }

    #[test]
    fn sample_stops_at_the_cap_across_files() {
        let files = vec![
            lines(60, "1234\n"),
            lines(60, "1234\n"),
            lines(60, "1234\n"),
        ];
        let stats = sample(&files).unwrap();
        assert_eq!(stats.sampled_row_count, SAMPLE_LINE_CAP);
        assert_eq!(stats.sampled_row_bytes, 500);
        assert_eq!(stats.total_file_bytes, 900);
        assert_eq!(stats.estimate(), RowCountEstimate::Estimated(180));
    }

    #[test]
    fn empty_inputs_are_unknown() {
        assert_eq!(estimate(Vec::<InMemory>::new()), RowCountEstimate::Unknown);
        assert_eq!(
            estimate([InMemory(Vec::new()), InMemory(Vec::new())]),
            RowCountEstimate::Unknown
        );
    }

    #[test]
    fn io_failure_degrades_to_unknown() {
        assert!(sample([Unreadable]).is_err());
        assert_eq!(estimate([Unreadable]), RowCountEstimate::Unknown);
    }

    #[test]
    fn estimate_does_not_overflow_on_huge_lengths() {
        let stats = SampleStats {
            total_file_bytes: u64::MAX,
            sampled_row_count: SAMPLE_LINE_CAP,
            sampled_row_bytes: 1,
        };
        assert_eq!(stats.estimate(), RowCountEstimate::Estimated(u64::MAX));
    }
}
