//! Declarative statistical graphics.
//!
//! A [`Plot`] binds semantic variables (`x`, `y`, `color`, ...) to data,
//! adds [`Layer`]s of marks with optional stats and moves, and may facet or
//! pair its subplots. [`Plot::plot`] resolves all of it into a [`Plotter`]
//! holding the drawn [`Figure`](crate::render::Figure).
//!
//! # Components
//!
//! - **Data**: tabular [`DataFrame`]s and [`PlotData`] bindings
//! - **Marks**: visual representations ([`Dot`], [`Line`], [`Bar`])
//! - **Stats**: grouped transformations ([`Count`], [`Agg`])
//! - **Moves**: position adjustments ([`Dodge`], [`Stack`], [`Shift`])
//! - **Layout**: small multiples via [`Facet`] and [`Pair`]
//!
//! # Example
//!
//! ```rust
//! use trueno_plot::grammar::{DataFrame, Dot, Layer, Plot};
//!
//! let data = DataFrame::new()
//!     .with_column("a", [1.0, 2.0, 3.0])
//!     .unwrap()
//!     .with_column("b", [4.0, 5.0, 6.0])
//!     .unwrap();
//! let plotter = Plot::from_data(data).var("x", "a").var("y", "b").add(Layer::new(Dot::new())).plot().unwrap();
//! assert_eq!(plotter.figure().axes()[0].artists().len(), 3);
//! ```
//!
//! # References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." Journal of Computational
//!   and Graphical Statistics.

pub(crate) mod data;
pub(crate) mod facet;
pub(crate) mod geom;
pub(crate) mod groupby;
pub(crate) mod legend;
pub(crate) mod mark;
pub(crate) mod moves;
pub(crate) mod pair;
mod plot;
mod plotter;
pub(crate) mod properties;
pub(crate) mod stat;
pub(crate) mod subplots;

pub use data::{
    categorical_order, Bindings, DataFrame, DataValue, Frames, PairKey, PlotData, VariableId, VariableSpec, Vector,
};
pub use facet::{Facet, FacetOrder, FacetSpec};
pub use geom::{Bar, Dot, Line, PointShape};
pub use groupby::{Group, GroupBy};
pub use legend::{LegendContents, LegendKey};
pub use mark::{infer_orient, Mark, Split, Visual};
pub use moves::{Dodge, DodgeEmpty, Move, Shift, Stack};
pub use pair::{Pair, PairSpec};
pub use plot::{Layer, Plot, PlotArg};
pub use plotter::{Plotter, SaveOptions, DEFAULT_DPI};
pub use properties::{Axis, Mapped, Property, SEMANTIC_PROPERTIES, STRUCTURAL_VARIABLES};
pub use stat::{Agg, AggFunc, Count, Stat};
pub use subplots::{Share, SubplotView, Subplots};
