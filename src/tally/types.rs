use ahash::AHashMap;

/// Contiguous, line-aligned byte range of the input handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub offset: u64,
    pub length: u64,
}

impl ChunkDescriptor {
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// One parsed tweet: where it was sent from and its language code.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub lng: f64,
    pub lat: f64,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTally {
    pub total: u64,
    pub categories: AHashMap<String, u64>, // language code -> count
}

impl CellTally {
    pub fn add(&mut self, category: &str) {
        self.total += 1;
        match self.categories.get_mut(category) {
            Some(n) => *n += 1,
            None => {
                self.categories.insert(category.to_string(), 1);
            }
        }
    }

    pub fn merge(&mut self, other: &CellTally) {
        self.total += other.total;
        for (code, &n) in &other.categories {
            *self.categories.entry(code.clone()).or_insert(0) += n;
        }
    }

    #[inline]
    pub fn distinct_categories(&self) -> usize {
        self.categories.len()
    }
}

/// Dense per-cell counters: `cells[cell_id - 1]`, one slot for every cell of
/// the grid whether or not anything landed there.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTally {
    cells: Vec<CellTally>,
}

impl GridTally {
    pub fn new(cell_count: usize) -> Self {
        Self {
            cells: vec![CellTally::default(); cell_count],
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub fn cell(&self, cell_id: u32) -> Option<&CellTally> {
        (cell_id as usize).checked_sub(1).and_then(|i| self.cells.get(i))
    }

    pub fn cell_mut(&mut self, cell_id: u32) -> Option<&mut CellTally> {
        (cell_id as usize)
            .checked_sub(1)
            .and_then(|i| self.cells.get_mut(i))
    }

    /// `(cell_id, tally)` in ascending cell order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &CellTally)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| ((i + 1) as u32, c))
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| c.total).sum()
    }
}

/// Line-level bookkeeping for one chunk; summed across chunks for the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub lines: u64,
    pub counted: u64,
    pub malformed: u64,
    pub skipped: u64,
    pub outside: u64,
}

impl ChunkStats {
    pub fn absorb(&mut self, other: &ChunkStats) {
        self.lines += other.lines;
        self.counted += other.counted;
        self.malformed += other.malformed;
        self.skipped += other.skipped;
        self.outside += other.outside;
    }
}
