//! Append-only two-column log backing the latency store.
//!
//! Each line is `hash,value`. A persisted record takes two consecutive lines for the same
//! hash, `start` first and `root_end` second. There is no header.
//!
//! A hash that appears on any row is never appended again, so an orphan row left by an
//! interrupted flush cannot be paired with rows written later.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::iter::Peekable;
use std::path::Path;

use finality_scraper_types::{LatencyRecord, TransactionHash, UnixMillis};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("I/O error on latency log: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed latency log line {line_number}: `{content}`")]
    Malformed { line_number: usize, content: String },
}

struct Row {
    line_number: usize,
    hash: TransactionHash,
    value: UnixMillis,
}

/// Contents of the log at open time.
#[derive(Debug, Default)]
pub(crate) struct LogContents {
    /// Complete records, in log order.
    pub records: Vec<(TransactionHash, LatencyRecord)>,
    /// Every hash present on any row, orphans included.
    pub hashes: HashSet<TransactionHash>,
}

/// Reads the log, creating the file if it does not exist.
///
/// A `start` row without a matching `root_end` row (left behind by an interrupted flush)
/// yields no record, but its hash is still reported in [`LogContents::hashes`].
pub(crate) fn read(path: &Path) -> Result<LogContents, LogError> {
    let file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?;

    let mut rows = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(index + 1, &line)?);
    }

    let mut contents = LogContents::default();
    let mut rows = rows.into_iter().peekable();
    while let Some(start) = rows.next() {
        contents.hashes.insert(start.hash.clone());
        match next_for(&mut rows, &start.hash) {
            Some(root_end) => contents
                .records
                .push((start.hash, LatencyRecord::new(start.value, root_end.value))),
            None => tracing::warn!(
                hash = %start.hash,
                line_number = start.line_number,
                "skipping latency log row without a matching root_end row"
            ),
        }
    }
    Ok(contents)
}

fn next_for(
    rows: &mut Peekable<impl Iterator<Item = Row>>,
    hash: &TransactionHash,
) -> Option<Row> {
    rows.next_if(|row| &row.hash == hash)
}

fn parse_row(line_number: usize, line: &str) -> Result<Row, LogError> {
    let malformed = || LogError::Malformed {
        line_number,
        content: line.to_owned(),
    };
    let (hash, value) = line.split_once(',').ok_or_else(malformed)?;
    let hash = hash.trim();
    if hash.is_empty() {
        return Err(malformed());
    }
    let value = value.trim().parse().map_err(|_| malformed())?;
    Ok(Row {
        line_number,
        hash: hash.into(),
        value,
    })
}

/// Appends the records to the log, two rows per record.
pub(crate) fn append<'a>(
    path: &Path,
    records: impl IntoIterator<Item = (&'a TransactionHash, UnixMillis, UnixMillis)>,
) -> io::Result<()> {
    let mut file: File = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?;
    let needs_newline = !ends_with_newline(&mut file)?;
    let mut writer = BufWriter::new(file);
    if needs_newline {
        writeln!(writer)?;
    }
    for (hash, start, root_end) in records {
        writeln!(writer, "{hash},{start}")?;
        writeln!(writer, "{hash},{root_end}")?;
    }
    writer.flush()
}

/// `true` for an empty file, so nothing is prepended to the first row.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        assert!(read(&path).unwrap().records.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn pairs_rows_and_skips_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "0xa,100\n0xa,300\n0xorphan,5\n\n0xb,0\n0xb,500\n0xtail,7\n",
        )
        .unwrap();

        let contents = read(&path).unwrap();
        assert_eq!(
            contents.records,
            vec![
                ("0xa".into(), LatencyRecord::new(100, 300)),
                ("0xb".into(), LatencyRecord::new(0, 500)),
            ]
        );
        let mut hashes: Vec<_> = contents.hashes.iter().map(|hash| hash.to_string()).collect();
        hashes.sort();
        assert_eq!(hashes, ["0xa", "0xb", "0xorphan", "0xtail"]);
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "0xa,100\n0xa,not-a-number\n").unwrap();

        assert!(matches!(
            read(&path),
            Err(LogError::Malformed { line_number: 2, .. })
        ));
    }

    #[test]
    fn append_writes_two_rows_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let hash = TransactionHash::from("0xc");
        append(&path, [(&hash, 1, 2)]).unwrap();
        append(&path, [(&hash, 3, 4)]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "0xc,1\n0xc,2\n0xc,3\n0xc,4\n");
    }

    #[test]
    fn append_terminates_truncated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "0xa,100\n0xa,300\n0xb,4").unwrap();
        append(&path, [(&TransactionHash::from("0xc"), 1, 2)]).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "0xa,100\n0xa,300\n0xb,4\n0xc,1\n0xc,2\n"
        );
        let contents = read(&path).unwrap();
        assert_eq!(contents.records.len(), 2);
        assert!(contents.hashes.contains(&"0xb".into()));
    }
}
