//! The declarative plot specification.
//!
//! A [`Plot`] accumulates shared data, layers, faceting, pairing, scales
//! and layout options. Every builder method consumes the plot and returns
//! the extended value; call `clone()` first to branch a specification.
//! Nothing is resolved until [`Plot::plot`] hands the finished
//! specification to the [`Plotter`].
//!
//! # Example
//!
//! ```rust
//! use trueno_plot::grammar::{Bar, Count, DataFrame, Layer, Plot};
//!
//! let data = DataFrame::new().with_column("day", ["mon", "tue", "mon"]).unwrap();
//! let plotter = Plot::from_data(data)
//!     .var("x", "day")
//!     .add(Layer::new(Bar::new()).stat(Count::new()))
//!     .plot()
//!     .unwrap();
//! assert_eq!(plotter.figure().axes().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::data::{Bindings, DataFrame, PlotData, Vector, VariableSpec};
use super::facet::{Facet, FacetSpec};
use super::mark::Mark;
use super::moves::Move;
use super::pair::{Pair, PairSpec};
use super::plotter::{Plotter, SaveOptions};
use super::properties::Axis;
use super::stat::Stat;
use super::subplots::Share;
use crate::config::PlotConfig;
use crate::error::{Error, Result};
use crate::render::Figure;
use crate::scale::ScaleSpec;

/// A positional constructor argument: the data source or a variable.
#[derive(Debug, Clone)]
pub enum PlotArg {
    /// A data source.
    Data(Arc<DataFrame>),
    /// A variable binding for the next free coordinate slot.
    Var(VariableSpec),
}

impl From<DataFrame> for PlotArg {
    fn from(data: DataFrame) -> Self {
        PlotArg::Data(Arc::new(data))
    }
}

impl From<Arc<DataFrame>> for PlotArg {
    fn from(data: Arc<DataFrame>) -> Self {
        PlotArg::Data(data)
    }
}

impl From<&str> for PlotArg {
    fn from(key: &str) -> Self {
        PlotArg::Var(key.into())
    }
}

impl From<String> for PlotArg {
    fn from(key: String) -> Self {
        PlotArg::Var(key.into())
    }
}

impl From<Vector> for PlotArg {
    fn from(vector: Vector) -> Self {
        PlotArg::Var(vector.into())
    }
}

impl From<VariableSpec> for PlotArg {
    fn from(spec: VariableSpec) -> Self {
        PlotArg::Var(spec)
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One mark, with an optional stat and moves, drawn onto the shared grid.
#[derive(Debug, Clone)]
pub struct Layer {
    mark: Arc<dyn Mark>,
    stat: Option<Arc<dyn Stat>>,
    moves: Vec<Arc<dyn Move>>,
    orient: Option<Axis>,
    data: Option<Arc<DataFrame>>,
    vars: Bindings,
}

impl Layer {
    /// Layer drawing `mark` with the plot's shared data.
    pub fn new(mark: impl Mark + 'static) -> Self {
        Self { mark: Arc::new(mark), stat: None, moves: Vec::new(), orient: None, data: None, vars: Vec::new() }
    }

    /// Transform the data with `stat` before drawing.
    #[must_use]
    pub fn stat(mut self, stat: impl Stat + 'static) -> Self {
        self.stat = Some(Arc::new(stat));
        self
    }

    /// Append a position adjustment; moves apply in the order added.
    #[must_use]
    pub fn with_move(mut self, mv: impl Move + 'static) -> Self {
        self.moves.push(Arc::new(mv));
        self
    }

    /// Fix the orientation instead of inferring it.
    #[must_use]
    pub fn orient(mut self, orient: Axis) -> Self {
        self.orient = Some(orient);
        self
    }

    /// Use a layer-specific data source.
    #[must_use]
    pub fn data(mut self, data: impl Into<Arc<DataFrame>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Bind `var` for this layer, replacing an earlier binding of it.
    #[must_use]
    pub fn var(mut self, var: impl Into<String>, spec: impl Into<VariableSpec>) -> Self {
        bind(&mut self.vars, var.into(), spec.into());
        self
    }

    /// Bind `x`.
    #[must_use]
    pub fn x(self, spec: impl Into<VariableSpec>) -> Self {
        self.var("x", spec)
    }

    /// Bind `y`.
    #[must_use]
    pub fn y(self, spec: impl Into<VariableSpec>) -> Self {
        self.var("y", spec)
    }

    /// The mark.
    #[must_use]
    pub fn mark(&self) -> &dyn Mark {
        self.mark.as_ref()
    }

    /// The stat, if any.
    #[must_use]
    pub fn stat_ref(&self) -> Option<&dyn Stat> {
        self.stat.as_deref()
    }

    /// The moves, in application order.
    pub fn moves(&self) -> impl Iterator<Item = &dyn Move> {
        self.moves.iter().map(AsRef::as_ref)
    }

    /// Explicit orientation, if set.
    #[must_use]
    pub fn orientation(&self) -> Option<Axis> {
        self.orient
    }

    /// Layer-specific data source, if set.
    #[must_use]
    pub fn source(&self) -> Option<&Arc<DataFrame>> {
        self.data.as_ref()
    }

    /// Layer variable bindings.
    #[must_use]
    pub fn vars(&self) -> &[(String, VariableSpec)] {
        &self.vars
    }
}

fn bind(vars: &mut Bindings, var: String, spec: VariableSpec) {
    match vars.iter_mut().find(|(v, _)| *v == var) {
        Some((_, existing)) => *existing = spec,
        None => vars.push((var, spec)),
    }
}

// ============================================================================
// Plot
// ============================================================================

/// A layered, possibly faceted and paired, plot specification.
#[derive(Debug, Clone, Default)]
pub struct Plot {
    data: Option<Arc<DataFrame>>,
    variables: Bindings,
    layers: Vec<Layer>,
    scales: BTreeMap<String, ScaleSpec>,
    facet: FacetSpec,
    pair: PairSpec,
    sharex: Option<Share>,
    sharey: Option<Share>,
    figsize: Option<(f64, f64)>,
    config: PlotConfig,
    target: Option<Figure>,
}

impl Plot {
    /// Empty plot without shared data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plot over a shared data source.
    pub fn from_data(data: impl Into<Arc<DataFrame>>) -> Self {
        Self { data: Some(data.into()), ..Self::default() }
    }

    /// Plot from positional arguments plus named data and bindings.
    ///
    /// Up to three positionals are accepted, read as `(data, x, y)`. A
    /// leading data source is taken as the data; the rest fill `x` then
    /// `y`. Positional `x`/`y` come first in the variable order.
    ///
    /// # Errors
    ///
    /// Fails for more than three positionals, a data source in a variable
    /// slot, or a slot given both by position and by name.
    pub fn from_args(args: Vec<PlotArg>, data: Option<Arc<DataFrame>>, variables: Bindings) -> Result<Self> {
        if args.len() > 3 {
            return Err(Error::config("Plot accepts no more than 3 positional arguments (data, x, y)"));
        }

        let mut args = args.into_iter().peekable();
        let data = match args.next_if(|arg| matches!(arg, PlotArg::Data(_))) {
            Some(PlotArg::Data(positional)) => {
                if data.is_some() {
                    return Err(Error::config("`data` given by both name and position"));
                }
                Some(positional)
            }
            _ => data,
        };

        let mut positional = Bindings::new();
        for (slot, arg) in ["x", "y"].into_iter().zip(args.by_ref()) {
            let PlotArg::Var(spec) = arg else {
                return Err(Error::config(format!("positional `{slot}` must be a variable, not a data source")));
            };
            if variables.iter().any(|(v, _)| v == slot) {
                return Err(Error::config(format!("`{slot}` given by both name and position")));
            }
            positional.push((slot.to_string(), spec));
        }
        if args.next().is_some() {
            return Err(Error::config("Plot accepts no more than 3 positional arguments (data, x, y)"));
        }

        positional.extend(variables);
        Ok(Self { data, variables: positional, ..Self::default() })
    }

    /// Bind a shared variable, replacing an earlier binding of it.
    #[must_use]
    pub fn var(mut self, var: impl Into<String>, spec: impl Into<VariableSpec>) -> Self {
        bind(&mut self.variables, var.into(), spec.into());
        self
    }

    /// Add a layer.
    #[must_use]
    pub fn add(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Spread variables across the grid along `x` and/or `y`.
    ///
    /// # Errors
    ///
    /// Default pairing needs shared data; zipped pairing needs lists of
    /// equal length.
    pub fn pair(mut self, pair: Pair) -> Result<Self> {
        let common = PlotData::new(self.data.clone(), &self.variables)?;
        self.pair = pair.resolve(&common)?;
        Ok(self)
    }

    /// Split the grid by levels of `col` and/or `row`.
    ///
    /// # Errors
    ///
    /// A flat level order is ambiguous when both dimensions are faceted.
    pub fn facet(mut self, facet: Facet) -> Result<Self> {
        self.facet = facet.resolve()?;
        Ok(self)
    }

    /// Declare the scale of a variable (`x`, `x0`, `color`, ...).
    #[must_use]
    pub fn scale(mut self, var: impl Into<String>, spec: impl Into<ScaleSpec>) -> Self {
        self.scales.insert(var.into(), spec.into());
        self
    }

    /// Set the figure size and axis sharing; `None` keeps the current value.
    #[must_use]
    pub fn configure(mut self, figsize: Option<(f64, f64)>, sharex: Option<Share>, sharey: Option<Share>) -> Self {
        self.figsize = figsize.or(self.figsize);
        self.sharex = sharex.or(self.sharex);
        self.sharey = sharey.or(self.sharey);
        self
    }

    /// Draw onto an existing figure instead of a new one.
    #[must_use]
    pub fn on(mut self, figure: Figure) -> Self {
        self.target = Some(figure);
        self
    }

    /// Attach figure defaults and drawing style.
    #[must_use]
    pub fn with_config(mut self, config: PlotConfig) -> Self {
        self.config = config;
        self
    }

    /// Plot-specific themes.
    ///
    /// # Errors
    ///
    /// Always fails: themes are not supported.
    pub fn theme(self) -> Result<Self> {
        Err(Error::Unimplemented("plot-specific themes"))
    }

    /// Resolve the specification into a drawn figure.
    ///
    /// # Errors
    ///
    /// Fails on any configuration or data error; nothing is drawn then.
    pub fn plot(&self) -> Result<Plotter> {
        Plotter::resolve(self)
    }

    /// Resolve and write a PNG to `path`.
    ///
    /// # Errors
    ///
    /// Fails if resolution, rasterization or writing fails.
    pub fn save(self, path: impl AsRef<Path>, options: SaveOptions) -> Result<Self> {
        self.plot()?.save(path, options)?;
        Ok(self)
    }

    /// Rasterize for inline display; see [`Plotter::repr_png`].
    ///
    /// # Errors
    ///
    /// Fails if resolution or rasterization fails.
    pub fn repr_png(&self) -> Result<(Vec<u8>, (f64, f64))> {
        self.plot()?.repr_png()
    }

    /// Save options at the configured resolution.
    #[must_use]
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::new().dpi(self.config.dpi)
    }

    /// Shared data source.
    #[must_use]
    pub fn data(&self) -> Option<&Arc<DataFrame>> {
        self.data.as_ref()
    }

    /// Shared variable bindings, in order.
    #[must_use]
    pub fn variables(&self) -> &[(String, VariableSpec)] {
        &self.variables
    }

    /// Layers, in drawing order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Declared scales.
    #[must_use]
    pub fn scales(&self) -> &BTreeMap<String, ScaleSpec> {
        &self.scales
    }

    /// Faceting state.
    #[must_use]
    pub fn facet_spec(&self) -> &FacetSpec {
        &self.facet
    }

    /// Pairing state.
    #[must_use]
    pub fn pair_spec(&self) -> &PairSpec {
        &self.pair
    }

    /// Axis sharing overrides `(x, y)`.
    #[must_use]
    pub fn sharing(&self) -> (Option<Share>, Option<Share>) {
        (self.sharex, self.sharey)
    }

    /// Figure size in inches: the configured size unless overridden.
    #[must_use]
    pub fn figsize(&self) -> (f64, f64) {
        self.figsize.unwrap_or(self.config.figsize)
    }

    /// Attached configuration.
    #[must_use]
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Target figure, if drawing onto an existing one.
    #[must_use]
    pub fn target(&self) -> Option<&Figure> {
        self.target.as_ref()
    }

    /// Every variable named anywhere in the specification, first-seen order.
    pub(crate) fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let shared = self.variables.iter().chain(&self.pair.variables).chain(&self.facet.variables);
        let layered = self.layers.iter().flat_map(|layer| layer.vars.iter());
        for (var, _) in shared.chain(layered) {
            if !names.contains(var) {
                names.push(var.clone());
            }
        }
        names
    }
}
