//! Rectangular lat/lng grid and point → cell lookup.
//!
//! A grid is described only by its gridlines: latitudes sorted north to south
//! and longitudes sorted west to east. Cells are numbered from 1 in row-major
//! order starting at the north-west corner; 0 is reserved for "outside".

pub mod io;

use std::cmp::Ordering;

use crate::error::TallyError;

/// Cell id reserved for points that fall outside the grid.
pub const OUTSIDE: u32 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct GridIndex {
    lat_lines: Vec<f64>, // strictly descending
    lng_lines: Vec<f64>, // strictly ascending
}

// (lng ascending, lat descending): the minimum of a ring is its north-west
// corner, the maximum its south-east corner.
fn corner_order(a: &[f64; 2], b: &[f64; 2]) -> Ordering {
    a[0].total_cmp(&b[0]).then_with(|| b[1].total_cmp(&a[1]))
}

impl GridIndex {
    /// Build from explicit gridlines. `lat_lines` must be strictly descending
    /// and `lng_lines` strictly ascending, each with at least two entries.
    pub fn from_lines(lat_lines: Vec<f64>, lng_lines: Vec<f64>) -> Result<Self, TallyError> {
        check_lines("latitude", &lat_lines, |a, b| a > b)?;
        check_lines("longitude", &lng_lines, |a, b| a < b)?;
        Ok(Self {
            lat_lines,
            lng_lines,
        })
    }

    /// Derive gridlines from the outer ring of every cell, without knowing
    /// the number of rows or columns up front.
    pub fn from_cell_rings<R: AsRef<[[f64; 2]]>>(rings: &[R]) -> Result<Self, TallyError> {
        let mut lats = Vec::with_capacity(rings.len() * 2);
        let mut lngs = Vec::with_capacity(rings.len() * 2);
        for (idx, ring) in rings.iter().enumerate() {
            let ring = ring.as_ref();
            let (Some(nw), Some(se)) = (
                ring.iter().min_by(|a, b| corner_order(a, b)),
                ring.iter().max_by(|a, b| corner_order(a, b)),
            ) else {
                return Err(TallyError::Grid(format!("cell #{idx} has an empty ring")));
            };
            lngs.extend([nw[0], se[0]]);
            lats.extend([nw[1], se[1]]);
        }

        lats.sort_by(|a, b| b.total_cmp(a));
        lats.dedup();
        lngs.sort_by(|a, b| a.total_cmp(b));
        lngs.dedup();

        Self::from_lines(lats, lngs)
    }

    pub fn lat_lines(&self) -> &[f64] {
        &self.lat_lines
    }

    pub fn lng_lines(&self) -> &[f64] {
        &self.lng_lines
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.lat_lines.len() - 1
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.lng_lines.len() - 1
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Cell containing `(lng, lat)`, or [`OUTSIDE`].
    ///
    /// Edges are resolved the same way everywhere: a point on an interior
    /// meridian belongs to the column west of it, a point on an interior
    /// parallel to the row south of it. Points on the southern boundary are
    /// outside.
    pub fn cell_of(&self, lng: f64, lat: f64) -> u32 {
        if !lng.is_finite() || !lat.is_finite() {
            return OUTSIDE;
        }
        let (lng_first, lng_last) = (self.lng_lines[0], self.lng_lines[self.cols()]);
        let (lat_top, lat_bottom) = (self.lat_lines[0], self.lat_lines[self.rows()]);
        if lng < lng_first || lng > lng_last || lat > lat_top || lat < lat_bottom {
            return OUTSIDE;
        }

        // first i >= 1 with lng <= lng_lines[i]
        let col = self.lng_lines.partition_point(|&l| l < lng).max(1);
        // first j >= 1 with lat > lat_lines[j]
        let row = self.lat_lines.partition_point(|&l| l >= lat);
        if row >= self.lat_lines.len() {
            return OUTSIDE;
        }

        (col + (row - 1) * self.cols()) as u32
    }

    /// Display label such as `A1` (row letters, then 1-based column).
    pub fn label(&self, cell_id: u32) -> Option<String> {
        if cell_id == OUTSIDE || cell_id as usize > self.cell_count() {
            return None;
        }
        let idx = cell_id as usize - 1;
        let row = idx / self.cols();
        let col = idx % self.cols() + 1;
        Some(format!("{}{}", row_letters(row), col))
    }
}

fn check_lines(what: &str, lines: &[f64], ordered: impl Fn(f64, f64) -> bool) -> Result<(), TallyError> {
    if lines.len() < 2 {
        return Err(TallyError::Grid(format!(
            "need at least 2 {what} lines, got {}",
            lines.len()
        )));
    }
    if let Some(bad) = lines.iter().find(|v| !v.is_finite()) {
        return Err(TallyError::Grid(format!("non-finite {what} line {bad}")));
    }
    if let Some(w) = lines.windows(2).find(|w| !ordered(w[0], w[1])) {
        return Err(TallyError::Grid(format!(
            "{what} lines not strictly monotonic near {} / {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

// 0 -> A, 25 -> Z, 26 -> AA
fn row_letters(mut row: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (row % 26) as u8);
        if row < 26 {
            break;
        }
        row = row / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> GridIndex {
        GridIndex::from_lines(vec![10.0, 5.0, 0.0], vec![0.0, 5.0, 10.0]).unwrap()
    }

    fn square(west: f64, north: f64, side: f64) -> Vec<[f64; 2]> {
        vec![
            [west, north],
            [west + side, north],
            [west + side, north - side],
            [west, north - side],
            [west, north],
        ]
    }

    #[test]
    fn one_row_two_columns() {
        let grid = GridIndex::from_lines(vec![10.0, 0.0], vec![0.0, 5.0, 10.0]).unwrap();
        assert_eq!(grid.cell_count(), 2);
        assert_eq!(grid.cell_of(3.0, 5.0), 1);
        assert_eq!(grid.cell_of(7.0, 5.0), 2);
    }

    #[test]
    fn interior_lines_resolve_west_and_south() {
        let grid = two_by_two();
        // on the middle meridian: western column
        assert_eq!(grid.cell_of(5.0, 7.0), 1);
        assert_eq!(grid.cell_of(5.0, 2.0), 3);
        // on the middle parallel: southern row
        assert_eq!(grid.cell_of(3.0, 5.0), 3);
        assert_eq!(grid.cell_of(7.0, 5.0), 4);
        // both at once
        assert_eq!(grid.cell_of(5.0, 5.0), 3);
    }

    #[test]
    fn outer_boundaries() {
        let grid = two_by_two();
        assert_eq!(grid.cell_of(0.0, 10.0), 1);
        assert_eq!(grid.cell_of(10.0, 10.0), 2);
        assert_eq!(grid.cell_of(10.0, 3.0), 4);
        // the southern boundary is not part of any cell
        assert_eq!(grid.cell_of(3.0, 0.0), OUTSIDE);
        assert_eq!(grid.cell_of(10.0, 0.0), OUTSIDE);
    }

    #[test]
    fn points_outside_the_grid() {
        let grid = two_by_two();
        assert_eq!(grid.cell_of(-0.1, 5.0), OUTSIDE);
        assert_eq!(grid.cell_of(10.1, 5.0), OUTSIDE);
        assert_eq!(grid.cell_of(5.0, 10.1), OUTSIDE);
        assert_eq!(grid.cell_of(5.0, -0.1), OUTSIDE);
        assert_eq!(grid.cell_of(f64::NAN, 5.0), OUTSIDE);
        assert_eq!(grid.cell_of(5.0, f64::INFINITY), OUTSIDE);
    }

    #[test]
    fn binary_search_matches_linear_scan() {
        let grid = GridIndex::from_lines(
            vec![-33.55, -33.70, -33.85, -34.00],
            vec![150.70, 150.85, 151.00, 151.15, 151.30],
        )
        .unwrap();

        let linear = |x: f64, y: f64| -> u32 {
            let lat = grid.lat_lines();
            let lng = grid.lng_lines();
            if x < lng[0] || -y < -lat[0] || x > lng[lng.len() - 1] || -y > -lat[lat.len() - 1] {
                return 0;
            }
            for i in 1..lng.len() {
                if x <= lng[i] {
                    for j in 1..lat.len() {
                        if -y < -lat[j] {
                            return (i + (j - 1) * (lng.len() - 1)) as u32;
                        }
                    }
                    return 0;
                }
            }
            0
        };

        let mut points = Vec::new();
        for &x in grid.lng_lines() {
            for &y in grid.lat_lines() {
                points.push((x, y));
            }
        }
        for step_x in 0..=40 {
            for step_y in 0..=40 {
                points.push((150.65 + step_x as f64 * 0.0175, -33.5 - step_y as f64 * 0.0125));
            }
        }
        for (x, y) in points {
            assert_eq!(grid.cell_of(x, y), linear(x, y), "point ({x}, {y})");
        }
    }

    #[test]
    fn gridlines_from_cell_rings() {
        let rings = vec![
            square(0.0, 10.0, 5.0),
            square(5.0, 10.0, 5.0),
            square(0.0, 5.0, 5.0),
            square(5.0, 5.0, 5.0),
        ];
        let grid = GridIndex::from_cell_rings(&rings).unwrap();
        assert_eq!(grid, two_by_two());
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(GridIndex::from_lines(vec![10.0], vec![0.0, 1.0]).is_err());
        assert!(GridIndex::from_lines(vec![0.0, 10.0], vec![0.0, 1.0]).is_err());
        assert!(GridIndex::from_lines(vec![10.0, 0.0], vec![0.0, 0.0]).is_err());
        assert!(GridIndex::from_lines(vec![10.0, f64::NAN], vec![0.0, 1.0]).is_err());
        let empty: Vec<Vec<[f64; 2]>> = vec![vec![]];
        assert!(GridIndex::from_cell_rings(&empty).is_err());
    }

    #[test]
    fn labels_are_row_letter_then_column() {
        let grid = GridIndex::from_lines(
            vec![4.0, 3.0, 2.0, 1.0, 0.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        assert_eq!(grid.label(1).as_deref(), Some("A1"));
        assert_eq!(grid.label(4).as_deref(), Some("A4"));
        assert_eq!(grid.label(5).as_deref(), Some("B1"));
        assert_eq!(grid.label(16).as_deref(), Some("D4"));
        assert_eq!(grid.label(0), None);
        assert_eq!(grid.label(17), None);
        assert_eq!(row_letters(25), "Z");
        assert_eq!(row_letters(26), "AA");
        assert_eq!(row_letters(27), "AB");
    }
}
