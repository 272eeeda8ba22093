use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use super::record::parse_line;
use super::types::{ChunkDescriptor, ChunkStats, GridTally};
use crate::error::TallyError;
use crate::grid::GridIndex;

const READ_BUFFER: usize = 1 << 20;

/// What one worker hands back to the coordinator.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub tally: GridTally,
    pub stats: ChunkStats,
}

/// Fold regional variants and retired codes onto one language code.
pub fn canonical_category(code: &str) -> &str {
    match code {
        "zh-cn" | "zh-tw" => "zh",
        "in" => "id",
        other => other,
    }
}

fn tally_line(line: &[u8], grid: &GridIndex, tally: &mut GridTally, stats: &mut ChunkStats) {
    let record = match parse_line(line) {
        Ok(Some(record)) => record,
        Ok(None) => {
            stats.skipped += 1;
            return;
        }
        Err(err) => {
            stats.malformed += 1;
            warn!(
                %err,
                line = %String::from_utf8_lossy(line).trim_end(),
                "ignoring unreadable line"
            );
            return;
        }
    };

    match tally.cell_mut(grid.cell_of(record.lng, record.lat)) {
        Some(cell) => {
            cell.add(canonical_category(&record.category));
            stats.counted += 1;
        }
        None => stats.outside += 1,
    }
}

/// Tally `length` bytes of whole lines from `reader`'s current position.
///
/// The line that crosses `length` is read to its end, the same rule the
/// planner uses to place boundaries.
pub fn aggregate_reader<R: BufRead>(
    reader: &mut R,
    length: u64,
    grid: &GridIndex,
) -> std::io::Result<(GridTally, ChunkStats)> {
    let mut tally = GridTally::new(grid.cell_count());
    let mut stats = ChunkStats::default();
    let mut line = Vec::with_capacity(4096);
    let mut consumed = 0u64;

    while consumed < length {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("input ended {} bytes short of the chunk", length - consumed),
            ));
        }
        consumed += n as u64;
        stats.lines += 1;
        tally_line(&line, grid, &mut tally, &mut stats);
    }

    Ok((tally, stats))
}

/// Open `path` read-only and tally the byte range described by `chunk`.
pub fn aggregate_chunk(
    path: &Path,
    chunk: ChunkDescriptor,
    grid: &GridIndex,
) -> Result<ChunkResult, TallyError> {
    let io_err = |source: std::io::Error| TallyError::ChunkIo {
        path: path.to_path_buf(),
        offset: chunk.offset,
        length: chunk.length,
        source,
    };

    let mut f = File::open(path).map_err(io_err)?;
    f.seek(SeekFrom::Start(chunk.offset)).map_err(io_err)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER, f);
    let (tally, stats) = aggregate_reader(&mut reader, chunk.length, grid).map_err(io_err)?;

    debug!(
        offset = chunk.offset,
        end = chunk.end(),
        lines = stats.lines,
        counted = stats.counted,
        malformed = stats.malformed,
        "chunk done"
    );
    Ok(ChunkResult {
        tally,
        stats,
    })
}
