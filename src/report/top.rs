use itertools::Itertools;

use super::lang::LanguageTable;
use crate::tally::CellTally;

pub const DEFAULT_TOP: usize = 10;

/// A cell's most used languages by display name, most frequent first.
///
/// Codes missing from `names` are dropped before truncating to `limit`.
/// Equal counts are ordered by name.
pub fn top_languages(cell: &CellTally, names: &LanguageTable, limit: usize) -> Vec<(String, u64)> {
    cell.categories
        .iter()
        .filter_map(|(code, &n)| names.name(code).map(|name| (name, n)))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(limit)
        .map(|(name, n)| (name.to_string(), n))
        .collect()
}
