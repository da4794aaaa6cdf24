//! Neighbor log codec.
//!
//! One line per broadcast timestamp:
//!
//! ```text
//! 12.5 $ adA # 3 | adB # 17 | adA # 4
//! ```
//!
//! Entries keep rank order. Distances are not persisted and read back as
//! 0.0, which is all the tracker needs.

use std::path::Path;

use spotscan_models::{parse_seconds, NeighborList, NeighborMatch, TimedNeighbors};
use tracing::debug;

use crate::error::{LineError, MediaError, MediaResult};

/// Render one neighbor-log line (without trailing newline).
pub fn format_neighbor_line(timestamp: f64, neighbors: &NeighborList) -> String {
    let entries = neighbors
        .iter()
        .map(|m| format!("{} # {}", m.reference, m.index))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{:?} $ {}", timestamp, entries)
}

/// Parse one neighbor-log line. Whitespace around separators is optional.
pub fn parse_neighbor_line(line: &str) -> Result<TimedNeighbors, LineError> {
    let (time, data) = line
        .split_once('$')
        .ok_or(LineError::MissingSeparator("$"))?;
    let timestamp = parse_seconds(time)?;

    if data.trim().is_empty() {
        return Err(LineError::NoEntries);
    }

    let matches = data
        .split('|')
        .map(parse_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TimedNeighbors::new(timestamp, matches))
}

fn parse_entry(entry: &str) -> Result<NeighborMatch, LineError> {
    let (name, index) = entry
        .rsplit_once('#')
        .ok_or(LineError::MissingSeparator("#"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(LineError::EmptyName);
    }
    let index = index.trim();
    let index = index
        .parse::<usize>()
        .map_err(|_| LineError::InvalidIndex(index.to_string()))?;

    Ok(NeighborMatch::new(name, index, 0.0))
}

/// Write a whole neighbor log, creating the parent directory if needed.
pub async fn write_neighbor_log(
    path: impl AsRef<Path>,
    sequence: &[TimedNeighbors],
) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut content = String::new();
    for frame in sequence {
        content.push_str(&format_neighbor_line(frame.timestamp, &frame.neighbors));
        content.push('\n');
    }
    tokio::fs::write(path, content).await?;

    debug!(path = %path.display(), lines = sequence.len(), "Wrote neighbor log");
    Ok(())
}

/// Read a whole neighbor log. Blank lines are skipped; any malformed line
/// aborts the read. Every line must carry as many pairs as the first one.
pub async fn read_neighbor_log(path: impl AsRef<Path>) -> MediaResult<Vec<TimedNeighbors>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MediaError::on_read(path, e))?;

    let mut sequence: Vec<TimedNeighbors> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let frame =
            parse_neighbor_line(line).map_err(|e| MediaError::at_line(path, number + 1, e))?;

        if let Some(expected) = sequence.first().map(|first| first.neighbors.len()) {
            if frame.neighbors.len() != expected {
                return Err(MediaError::at_line(
                    path,
                    number + 1,
                    LineError::PairCount {
                        expected,
                        found: frame.neighbors.len(),
                    },
                ));
            }
        }
        sequence.push(frame);
    }
    Ok(sequence)
}
