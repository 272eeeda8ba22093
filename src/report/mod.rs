//! Result tables: tweet and language counts per cell, and each cell's most
//! used languages.

pub mod lang;
pub mod top;

use std::io::{self, Write};

use crate::grid::GridIndex;
use crate::tally::{GridTally, RunSummary};
use lang::LanguageTable;
use top::top_languages;

#[derive(Debug, Clone, PartialEq)]
pub struct CellRow {
    pub label: String,
    pub total: u64,
    pub languages: usize,
    pub top: Vec<(String, u64)>,
}

pub fn build_rows(
    grid: &GridIndex,
    global: &GridTally,
    names: &LanguageTable,
    limit: usize,
) -> Vec<CellRow> {
    global
        .iter()
        .map(|(cell_id, cell)| CellRow {
            label: grid.label(cell_id).unwrap_or_else(|| cell_id.to_string()),
            total: cell.total,
            languages: cell.distinct_categories(),
            top: top_languages(cell, names, limit),
        })
        .collect()
}

fn format_top(top: &[(String, u64)]) -> String {
    top.iter()
        .map(|(name, n)| format!("({name}, {n})"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn write_report<W: Write>(out: &mut W, rows: &[CellRow], limit: usize) -> io::Result<()> {
    let h_cell = "Cell";
    let h_total = "#Tweets";
    let h_langs = "#Number of Languages Used";
    let h_top = format!("#Top {limit} Languages & #Tweets");

    let w_cell = rows.iter().map(|r| r.label.len()).chain([h_cell.len()]).max().unwrap_or(0);
    let w_total = rows
        .iter()
        .map(|r| r.total.to_string().len())
        .chain([h_total.len()])
        .max()
        .unwrap_or(0);

    writeln!(out, "{h_cell:>w_cell$}  {h_total:>w_total$}  {h_langs}")?;
    for r in rows {
        writeln!(
            out,
            "{:>w_cell$}  {:>w_total$}  {:>w_langs$}",
            r.label,
            r.total,
            r.languages,
            w_langs = h_langs.len()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{h_cell:>w_cell$}  {h_top}")?;
    for r in rows {
        writeln!(out, "{:>w_cell$}  {}", r.label, format_top(&r.top))?;
    }
    Ok(())
}

/// Line accounting and timings printed under the tables.
pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    let stats = &summary.stats;
    writeln!(
        out,
        "\nTweets counted = {} of {} lines (malformed={}, skipped={}, outside={})",
        summary.global.total(),
        stats.lines,
        stats.malformed,
        stats.skipped,
        stats.outside
    )?;
    writeln!(
        out,
        "Total processing time = {:.3}s (plan={:.3}s, tally={:.3}s, chunks={})",
        summary.wall.as_secs_f64(),
        summary.t_plan,
        summary.t_tally,
        summary.chunks
    )
}
