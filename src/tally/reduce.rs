use std::borrow::Borrow;

use super::types::GridTally;
use crate::error::TallyError;

/// Sum per-worker tallies cell by cell.
///
/// The cell universe comes from the first partial and every other partial
/// must agree with it. Order of `partials` does not affect the result.
pub fn reduce<I>(partials: I) -> Result<GridTally, TallyError>
where
    I: IntoIterator,
    I::Item: Borrow<GridTally>,
{
    let mut partials = partials.into_iter();
    let first = partials
        .next()
        .ok_or_else(|| TallyError::Reduce("no partial results to combine".to_string()))?;
    let first: &GridTally = first.borrow();

    let mut global = GridTally::new(first.cell_count());
    absorb(&mut global, first, 0)?;
    for (idx, partial) in partials.enumerate() {
        absorb(&mut global, partial.borrow(), idx + 1)?;
    }
    Ok(global)
}

fn absorb(global: &mut GridTally, partial: &GridTally, idx: usize) -> Result<(), TallyError> {
    if partial.cell_count() != global.cell_count() {
        return Err(TallyError::Reduce(format!(
            "partial #{idx} covers {} cells, expected {}",
            partial.cell_count(),
            global.cell_count()
        )));
    }
    for (cell_id, cell) in partial.iter() {
        if let Some(slot) = global.cell_mut(cell_id) {
            slot.merge(cell);
        }
    }
    Ok(())
}
