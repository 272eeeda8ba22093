use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use super::aggregate::{ChunkResult, aggregate_chunk};
use super::planner::plan_chunks;
use super::reduce::reduce;
use super::types::{ChunkDescriptor, ChunkStats, GridTally};
use crate::error::TallyError;
use crate::grid::GridIndex;

#[derive(Debug)]
pub struct RunSummary {
    pub global: GridTally,
    pub stats: ChunkStats,
    pub chunks: usize,
    pub t_plan: f64,
    pub t_tally: f64,
    pub wall: Duration,
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} chunks {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

/// Tally every chunk of `data` on the pool, then reduce the partials.
///
/// Any chunk that cannot be read fails the whole call; nothing is reduced
/// from an incomplete set of partials.
pub fn tally_chunks(
    data: &Path,
    chunks: &[ChunkDescriptor],
    grid: &GridIndex,
    show_progress: bool,
) -> Result<(GridTally, ChunkStats), TallyError> {
    // grid and plan are fixed from here on; workers only borrow them
    let pb = progress_bar(chunks.len(), show_progress);
    let partials: Result<Vec<ChunkResult>, TallyError> = chunks
        .par_iter()
        .map(|&chunk| {
            let res = aggregate_chunk(data, chunk, grid);
            pb.inc(1);
            res
        })
        .collect();
    pb.finish_and_clear();
    let partials = partials?;

    let mut stats = ChunkStats::default();
    for p in &partials {
        stats.absorb(&p.stats);
    }
    let global = reduce(partials.iter().map(|p| &p.tally))?;
    Ok((global, stats))
}

/// Plan `data` into `workers` chunks, tally them in parallel and combine.
///
/// Any chunk that cannot be read fails the whole run; nothing is reduced
/// from an incomplete set of partials.
pub fn run_tally(
    data: &Path,
    grid: &GridIndex,
    workers: usize,
    show_progress: bool,
) -> Result<RunSummary, TallyError> {
    let t0 = Instant::now();

    let chunks = plan_chunks(data, workers)?;
    let t_plan = t0.elapsed().as_secs_f64();
    info!(
        chunks = chunks.len(),
        workers,
        cells = grid.cell_count(),
        "plan ready in {t_plan:.3}s"
    );

    let t_tally0 = Instant::now();
    let (global, stats) = tally_chunks(data, &chunks, grid, show_progress)?;
    let t_tally = t_tally0.elapsed().as_secs_f64();

    info!(
        lines = stats.lines,
        counted = stats.counted,
        malformed = stats.malformed,
        skipped = stats.skipped,
        outside = stats.outside,
        "tallied in {t_tally:.3}s"
    );

    Ok(RunSummary {
        global,
        stats,
        chunks: chunks.len(),
        t_plan,
        t_tally,
        wall: t0.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    fn grid() -> GridIndex {
        GridIndex::from_lines(vec![10.0, 5.0, 0.0], vec![0.0, 5.0, 10.0]).unwrap()
    }

    const LANGS: [&str; 7] = ["en", "ja", "zh-cn", "zh-tw", "in", "es", "und"];

    // CouchDB export layout: header, comma-separated rows, closing "]}"
    fn couch_export(rows: usize) -> String {
        let mut out = String::from("{\"total_rows\":999,\"offset\":0,\"rows\":[\n");
        for i in 0..rows {
            if i % 13 == 5 {
                out.push_str("{\"id\":\"broken\",\"doc\":{\"coordin\n");
                continue;
            }
            let lng = (i * 37 % 120) as f64 / 10.0 - 1.0; // some fall outside
            let lat = (i * 53 % 110) as f64 / 10.0;
            let coords = if i % 11 == 0 {
                "null".to_string()
            } else {
                format!("{{\"type\":\"Point\",\"coordinates\":[{lng},{lat}]}}")
            };
            let sep = if i + 1 == rows { "]}" } else { "," };
            write!(
                out,
                "{{\"id\":\"{i}\",\"doc\":{{\"coordinates\":{coords},\"metadata\":{{\"iso_language_code\":\"{}\"}}}}}}{sep}\n",
                LANGS[i % LANGS.len()]
            )
            .unwrap();
        }
        out
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.json");
        std::fs::write(&path, couch_export(500)).unwrap();
        let grid = grid();

        let one = run_tally(&path, &grid, 1, false).unwrap();
        assert_eq!(one.chunks, 1);
        assert!(one.global.total() > 0);
        assert!(one.stats.malformed > 0);
        for workers in [2, 4, 10, 37] {
            let many = run_tally(&path, &grid, workers, false).unwrap();
            assert_eq!(many.global, one.global, "{workers} workers");
            assert_eq!(many.stats, one.stats, "{workers} workers");
        }
    }

    #[test]
    fn every_counted_line_is_seen_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.json");
        let text = couch_export(200);
        std::fs::write(&path, &text).unwrap();

        let summary = run_tally(&path, &grid(), 6, false).unwrap();
        assert_eq!(summary.stats.lines, text.lines().count() as u64);
        assert_eq!(summary.stats.counted, summary.global.total());
        assert_eq!(
            summary.stats.lines,
            summary.stats.counted + summary.stats.malformed + summary.stats.skipped + summary.stats.outside
        );
    }

    #[test]
    fn empty_input_gives_zeroed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "").unwrap();
        let summary = run_tally(&path, &grid(), 4, false).unwrap();
        assert_eq!(summary.global.cell_count(), 4);
        assert_eq!(summary.global.total(), 0);
    }

    #[test]
    fn unreadable_chunk_aborts_the_gather() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.json");
        let line = r#"{"doc":{"coordinates":{"coordinates":[1.0,1.0]},"metadata":{"iso_language_code":"en"}}}"#;
        std::fs::write(&path, format!("{line}\n")).unwrap();
        let len = line.len() as u64 + 1;

        let good = [ChunkDescriptor { offset: 0, length: len }];
        let (global, stats) = tally_chunks(&path, &good, &grid(), false).unwrap();
        assert_eq!(global.total(), 1);
        assert_eq!(stats.counted, 1);

        // second range runs past EOF, as if the file shrank after planning
        let chunks = [
            ChunkDescriptor { offset: 0, length: len },
            ChunkDescriptor { offset: len, length: 100 },
        ];
        let err = tally_chunks(&path, &chunks, &grid(), false).unwrap_err();
        assert!(matches!(err, TallyError::ChunkIo { offset, length: 100, .. } if offset == len));
        assert!(err.to_string().starts_with("chunk read"), "{err}");
    }

    #[test]
    fn planning_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_tally(&dir.path().join("missing.json"), &grid(), 2, false).unwrap_err();
        assert!(err.to_string().starts_with("planning"));
    }
}
