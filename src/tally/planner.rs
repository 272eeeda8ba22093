use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::types::ChunkDescriptor;
use crate::error::TallyError;

/// Split `path` into at most `workers` line-aligned byte ranges.
pub fn plan_chunks(path: &Path, workers: usize) -> Result<Vec<ChunkDescriptor>, TallyError> {
    if workers == 0 {
        return Err(TallyError::planning("worker count must be at least 1"));
    }
    let io_err = |what: &str, source: std::io::Error| TallyError::Planning {
        message: format!("{what} {}", path.display()),
        source: Some(source),
    };
    let f = File::open(path).map_err(|e| io_err("open", e))?;
    let file_size = f.metadata().map_err(|e| io_err("stat", e))?.len();
    plan_reader(f, file_size, workers).map_err(|e| io_err("scan", e))
}

/// Planning over any seekable source of `file_size` bytes.
///
/// Each chunk starts where the previous one ended, jumps `file_size / workers`
/// bytes ahead and then runs through the end of that line, so the remainder
/// of the division ends up in the last chunk.
pub fn plan_reader<R: Read + Seek>(
    source: R,
    file_size: u64,
    workers: usize,
) -> std::io::Result<Vec<ChunkDescriptor>> {
    let workers = workers.max(1) as u64;
    let target = file_size / workers;
    let mut reader = BufReader::new(source);

    // only an empty file yields an empty chunk, so there are at most `file_size` chunks
    let mut chunks = Vec::with_capacity(workers.min(file_size.max(1)) as usize);
    let mut end = 0u64;
    loop {
        let start = end;
        let mark = start + target;
        reader.seek(SeekFrom::Start(mark))?;
        // past EOF this consumes nothing and the clamp below applies
        let consumed = reader.skip_until(b'\n')? as u64;
        end = (mark + consumed).min(file_size);

        chunks.push(ChunkDescriptor {
            offset: start,
            length: end - start,
        });
        if end == file_size {
            break;
        }
    }

    debug!(
        file_size,
        workers,
        chunks = chunks.len(),
        "planned chunks of ~{target} bytes"
    );
    Ok(chunks)
}
