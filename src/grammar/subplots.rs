//! Subplot grid construction from facet and pair specifications.
//!
//! Faceting spreads categories of `col`/`row` across the grid, pairing
//! spreads variables along `x`/`y`. A wrap width folds a single dimension
//! into several lines of cells.

use std::fmt;
use std::str::FromStr;

use super::data::DataValue;
use super::facet::FacetSpec;
use super::pair::PairSpec;
use super::properties::Axis;
use crate::error::{Error, Result};
use crate::render::{AxesId, Figure};

/// Axis sharing across subplots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Share {
    /// Every subplot shares the axis.
    #[default]
    All,
    /// Each subplot has its own axis.
    None,
    /// Subplots in the same grid row share.
    Row,
    /// Subplots in the same grid column share.
    Col,
}

impl From<bool> for Share {
    fn from(shared: bool) -> Self {
        if shared {
            Share::All
        } else {
            Share::None
        }
    }
}

impl FromStr for Share {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" | "true" => Ok(Share::All),
            "none" | "false" => Ok(Share::None),
            "row" => Ok(Share::Row),
            "col" => Ok(Share::Col),
            other => Err(Error::config(format!("axis sharing must be all, none, row or col, not `{other}`"))),
        }
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Share::All => "all",
            Share::None => "none",
            Share::Row => "row",
            Share::Col => "col",
        })
    }
}

/// One cell of the grid and what it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SubplotView {
    /// Drawable surface of the cell.
    pub axes: AxesId,
    /// Row facet level, if faceting rows.
    pub row: Option<DataValue>,
    /// Column facet level, if faceting columns.
    pub col: Option<DataValue>,
    /// Coordinate variable on the horizontal axis (`x` or `x{i}`).
    pub x: String,
    /// Coordinate variable on the vertical axis (`y` or `y{i}`).
    pub y: String,
    /// Cell is on the top edge.
    pub top: bool,
    /// Cell is on the bottom edge.
    pub bottom: bool,
    /// Cell is on the left edge.
    pub left: bool,
    /// Cell is on the right edge.
    pub right: bool,
}

impl SubplotView {
    /// Facet level of `dim` (`"col"` or `"row"`).
    #[must_use]
    pub fn facet(&self, dim: &str) -> Option<&DataValue> {
        match dim {
            "col" => self.col.as_ref(),
            "row" => self.row.as_ref(),
            _ => None,
        }
    }

    /// Coordinate variable on `axis`.
    #[must_use]
    pub fn coordinate(&self, axis: Axis) -> &str {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapDim {
    Col,
    Row,
}

/// Grid layout resolved from facet and pair specs.
#[derive(Debug, Clone)]
pub struct Subplots {
    nrows: usize,
    ncols: usize,
    n_subplots: usize,
    wrap: Option<WrapDim>,
    cartesian: bool,
    paired: [bool; 2],
    col_levels: Vec<Option<DataValue>>,
    row_levels: Vec<Option<DataValue>>,
    sharex: Share,
    sharey: Share,
    views: Vec<SubplotView>,
}

impl Subplots {
    /// Lay out the grid.
    ///
    /// `sharex`/`sharey` override the default sharing when given.
    ///
    /// # Errors
    ///
    /// Fails for facet/pair combinations that would put two variables on
    /// the same grid dimension.
    pub fn new(sharex: Option<Share>, sharey: Option<Share>, facet: &FacetSpec, pair: &PairSpec) -> Result<Self> {
        check_dimension_uniqueness(facet, pair)?;

        let dimension = |dim: &str, axis: Axis| -> Vec<Option<DataValue>> {
            if facet.has(dim) {
                facet.levels(dim).unwrap_or_default().iter().cloned().map(Some).collect()
            } else if let Some(keys) = pair.keys(axis) {
                vec![None; keys.len()]
            } else {
                vec![None]
            }
        };
        let mut col_levels = dimension("col", Axis::X);
        let row_levels = dimension("row", Axis::Y);
        if !pair.cartesian && !pair.is_empty() && !facet.has("col") {
            // zipped cells flow along one row, indexing both axes by position
            col_levels = vec![None; pair.zipped_len()];
        }

        let mut ncols = col_levels.len();
        let mut nrows = if pair.cartesian { row_levels.len() } else { 1 };
        let mut n_subplots = ncols * nrows;

        let wrap_width = facet.wrap.or(pair.wrap).filter(|w| *w > 0);
        let wrap = wrap_width.map(|width| {
            let dim = if nrows > 1 { WrapDim::Row } else { WrapDim::Col };
            let (wrapped, flowing) = match dim {
                WrapDim::Row => (&mut nrows, &mut ncols),
                WrapDim::Col => (&mut ncols, &mut nrows),
            };
            n_subplots = *wrapped;
            *flowing = n_subplots.div_ceil(width);
            if width < *wrapped {
                *wrapped = width;
            }
            dim
        });

        let default_share = |axis: Axis| {
            if pair.is_paired(axis) {
                match (wrap, pair.cartesian, axis) {
                    (None, true, Axis::X) => Share::Col,
                    (None, true, Axis::Y) => Share::Row,
                    _ => Share::None,
                }
            } else {
                Share::All
            }
        };

        Ok(Self {
            nrows,
            ncols,
            n_subplots,
            wrap,
            cartesian: pair.cartesian,
            paired: [pair.is_paired(Axis::X), pair.is_paired(Axis::Y)],
            col_levels,
            row_levels,
            sharex: sharex.unwrap_or_else(|| default_share(Axis::X)),
            sharey: sharey.unwrap_or_else(|| default_share(Axis::Y)),
            views: Vec::new(),
        })
    }

    /// Grid shape `(nrows, ncols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of cells actually drawn.
    #[must_use]
    pub fn n_subplots(&self) -> usize {
        self.n_subplots
    }

    /// Whether the grid wraps.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.wrap.is_some()
    }

    /// Sharing of `axis`.
    #[must_use]
    pub fn share(&self, axis: Axis) -> Share {
        match axis {
            Axis::X => self.sharex,
            Axis::Y => self.sharey,
        }
    }

    /// Create the grid on `figure` and record one view per cell.
    ///
    /// # Errors
    ///
    /// Fails if the figure cannot host the grid.
    pub fn init_figure(&mut self, figure: &mut Figure) -> Result<()> {
        let indices = self.cell_indices();
        let cells: Vec<(usize, usize)> = indices.iter().map(|&(_, pos)| pos).collect();
        let handles = figure.build_grid(self.nrows, self.ncols, &cells, self.sharex, self.sharey)?;

        self.views = indices
            .into_iter()
            .zip(handles)
            .map(|((ij, _), axes)| self.view(ij, axes))
            .collect();
        Ok(())
    }

    /// Facet/pair indices `(i, j)` of each cell with its grid position.
    fn cell_indices(&self) -> Vec<((usize, usize), (usize, usize))> {
        let n = self.n_subplots;
        let ncols = self.ncols.max(1);
        let nrows = self.nrows.max(1);
        if !self.cartesian {
            return (0..n).map(|k| ((k, k), (k / ncols, k % ncols))).collect();
        }
        match self.wrap {
            Some(WrapDim::Col) => (0..n).map(|j| ((0, j), (j / ncols, j % ncols))).collect(),
            Some(WrapDim::Row) => (0..n).map(|i| ((i, 0), (i % nrows, i / nrows))).collect(),
            None => (0..self.nrows)
                .flat_map(|i| (0..self.ncols).map(move |j| ((i, j), (i, j))))
                .collect(),
        }
    }

    fn view(&self, (i, j): (usize, usize), axes: AxesId) -> SubplotView {
        let (nrows, ncols, n) = (self.nrows, self.ncols.max(1), self.n_subplots);
        let (mut top, mut bottom, left, right) = match self.wrap {
            None => (i == 0, i + 1 == nrows, j % ncols == 0, (j + 1) % ncols == 0),
            Some(WrapDim::Col) => (
                j < ncols,
                j + ncols >= n,
                j % ncols == 0,
                (j + 1) % ncols == 0 || j + 1 == n,
            ),
            Some(WrapDim::Row) => (
                i % nrows.max(1) == 0,
                (i + 1) % nrows.max(1) == 0 || i + 1 == n,
                i < nrows,
                i + nrows >= n,
            ),
        };
        if !self.cartesian {
            top = j < ncols;
            bottom = j + ncols >= n;
        }

        let coordinate = |axis: Axis, idx: usize| {
            if self.paired[axis as usize] {
                format!("{axis}{idx}")
            } else {
                axis.to_string()
            }
        };

        SubplotView {
            axes,
            row: self.row_levels.get(i).cloned().flatten(),
            col: self.col_levels.get(j).cloned().flatten(),
            x: coordinate(Axis::X, j),
            y: coordinate(Axis::Y, i),
            top,
            bottom,
            left,
            right,
        }
    }

    /// Views in grid order.
    #[must_use]
    pub fn views(&self) -> &[SubplotView] {
        &self.views
    }

    /// Iterate over the views.
    pub fn iter(&self) -> std::slice::Iter<'_, SubplotView> {
        self.views.iter()
    }

    /// Number of views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True before the figure is initialized or for an empty grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl<'a> IntoIterator for &'a Subplots {
    type Item = &'a SubplotView;
    type IntoIter = std::slice::Iter<'a, SubplotView>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

fn check_dimension_uniqueness(facet: &FacetSpec, pair: &PairSpec) -> Result<()> {
    let facet_wrap = facet.wrap.is_some_and(|w| w > 0);
    let pair_wrap = pair.wrap.is_some_and(|w| w > 0);
    let n_paired = |axis| pair.keys(axis).map_or(0, <[String]>::len);

    if facet_wrap && facet.has("col") && facet.has("row") {
        return Err(Error::config("cannot wrap facets when specifying both `col` and `row`"));
    }
    if pair_wrap && pair.cartesian && n_paired(Axis::X) > 1 && n_paired(Axis::Y) > 1 {
        return Err(Error::config("cannot wrap subplots when pairing on both `x` and `y`"));
    }

    for (axis, multi, wrapped) in [(Axis::X, "columns", "rows"), (Axis::Y, "rows", "columns")] {
        if !pair.is_paired(axis) {
            continue;
        }
        if facet.has(&multi[..3]) {
            return Err(Error::config(format!("cannot facet the {multi} while pairing on `{axis}`")));
        }
        if facet.has(&wrapped[..3]) && facet_wrap {
            return Err(Error::config(format!("cannot wrap the {wrapped} while pairing on `{axis}`")));
        }
        if facet.has(&wrapped[..3]) && pair_wrap {
            return Err(Error::config(format!("cannot wrap the {multi} while faceting the {wrapped}")));
        }
    }
    Ok(())
}
