//! Resolution of a [`Plot`] specification into a drawn [`Figure`].
//!
//! The phases run once, in order: join layer data, build the subplot grid,
//! transform coordinates, compute stats, fit the remaining scales, then
//! move, unscale, split and draw every layer before collecting legends.

use std::path::Path;

use base64::Engine;
use tracing::{debug, info_span};

use super::data::{categorical_order, DataFrame, DataValue, Frames, PlotData};
use super::groupby::GroupBy;
use super::legend::LegendContents;
use super::mark::{Mark, Split};
use super::moves::Move;
use super::plot::{Layer, Plot};
use super::properties::{Axis, Property, SEMANTIC_PROPERTIES, STRUCTURAL_VARIABLES};
use super::subplots::{Share, SubplotView, Subplots};
use crate::error::{Error, Result};
use crate::framebuffer::Framebuffer;
use crate::output::PngEncoder;
use crate::render::{AxesId, Axes, Figure};
use crate::scale::{Scale, ScaleSpec, Scales};

/// Resolution used when saving unless overridden.
pub const DEFAULT_DPI: f64 = 96.0;

/// Display size of inline images relative to their nominal size.
const INLINE_SCALING: f64 = 0.85;

/// Options for [`Plotter::save`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveOptions {
    /// Pixels per inch.
    pub dpi: f64,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl SaveOptions {
    /// Default options (96 dpi).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution.
    #[must_use]
    pub fn dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }
}

/// A resolved plot: the drawn figure plus the state that produced it.
#[derive(Debug)]
pub struct Plotter {
    figure: Figure,
    subplots: Subplots,
    common: PlotData,
    layers: Vec<PlotData>,
    scales: Scales,
    legend: LegendContents,
}

impl Plotter {
    /// Run the resolution pipeline over `plot`.
    pub(crate) fn resolve(plot: &Plot) -> Result<Self> {
        let span = info_span!("resolve_plot", layers = plot.layers().len());
        let _guard = span.enter();

        let (common, layers) = extract_data(plot)?;
        debug!(layers = layers.len(), shared_rows = common.frame().flat().map_or(0, DataFrame::nrow), "extracted data");

        let mut facet = plot.facet_spec().clone();
        if let Some(frame) = common.frame().flat() {
            for dim in ["col", "row"] {
                if let Some(values) = frame.column(dim) {
                    facet.default_levels(dim, categorical_order(values, None));
                }
            }
        }
        let (sharex, sharey) = plot.sharing();
        let mut subplots = Subplots::new(sharex, sharey, &facet, plot.pair_spec())?;

        let mut figure = match plot.target() {
            Some(target) => target.clone(),
            None => {
                let mut figure = Figure::new(plot.figsize());
                figure.set_style(plot.config().style.clone());
                figure
            }
        };
        subplots.init_figure(&mut figure)?;
        debug!(
            shape = ?subplots.shape(),
            subplots = subplots.len(),
            sharex = %subplots.share(Axis::X),
            sharey = %subplots.share(Axis::Y),
            "built subplot grid"
        );

        let mut plotter = Self {
            figure,
            subplots,
            common,
            layers,
            scales: Scales::new(),
            legend: LegendContents::new(),
        };
        plotter.annotate_axes(plot)?;
        plotter.transform_coords(plot)?;
        plotter.compute_stats(plot)?;
        plotter.setup_scales(plot)?;
        for (index, layer) in plot.layers().iter().enumerate() {
            plotter.plot_layer(plot, layer, index)?;
        }
        plotter.autoscale();
        plotter.make_legend();
        Ok(plotter)
    }

    // ========================================================================
    // Figure setup
    // ========================================================================

    /// Label the axes and title the facets of every subplot.
    fn annotate_axes(&mut self, plot: &Plot) -> Result<()> {
        let pair = plot.pair_spec();
        let facet_wrapped = plot.facet_spec().wrap.is_some();

        for view in self.subplots.views() {
            let axes = axes_mut(&mut self.figure, view.axes)?;

            for axis in Axis::BOTH {
                let key = view.coordinate(axis);
                let label = std::iter::once(&self.common)
                    .chain(&self.layers)
                    .find_map(|data| data.name(key))
                    .map(str::to_string);

                let on_edge = match axis {
                    Axis::X => view.bottom,
                    Axis::Y => view.left,
                };
                let show_label = on_edge || (pair.is_paired(axis) && pair.wrap.is_some()) || !pair.cartesian;
                let aligned = match axis {
                    Axis::X => Share::Col,
                    Axis::Y => Share::Row,
                };
                let share = self.subplots.share(axis);
                let show_ticks = show_label || !(share == Share::All || share == aligned);

                let state = axes.axis_mut(axis);
                state.set_label(label);
                state.set_label_visible(show_label);
                state.set_tick_labels_visible(show_ticks);
            }

            let parts: Vec<String> = ["row", "col"]
                .into_iter()
                .filter_map(|dim| {
                    let level = view.facet(dim)?;
                    let name = self.common.name(dim).unwrap_or(dim);
                    Some(format!("{name} = {level}"))
                })
                .collect();
            if !parts.is_empty() {
                let (has_col, has_row) = (view.col.is_some(), view.row.is_some());
                let show_title = (has_col && has_row)
                    || ((has_col || has_row) && facet_wrapped)
                    || (has_col && view.top)
                    || has_row;
                axes.set_title(Some(parts.join(" | ")));
                axes.set_title_visible(show_title);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Coordinates
    // ========================================================================

    /// Fit coordinate scales per sharing group and transform layer data.
    fn transform_coords(&mut self, plot: &Plot) -> Result<()> {
        for var in plot.variable_names() {
            if !Axis::is_base_coordinate(&var) {
                continue;
            }
            let Some((axis, _)) = Axis::parse_coordinate(&var) else {
                continue;
            };

            let pooled: Vec<DataFrame> = std::iter::once(&self.common)
                .chain(&self.layers)
                .filter_map(|data| data.frame().flat())
                .filter(|df| df.has_column(&var))
                .map(|df| df.select(&[var.as_str(), "col", "row"]))
                .collect();
            if pooled.is_empty() {
                continue;
            }
            let refs: Vec<&DataFrame> = pooled.iter().collect();
            let var_df = DataFrame::concat(&refs, true);
            let values = var_df.column(&var).unwrap_or_default();

            let property = Property::Coordinate(axis);
            let spec = scale_spec(plot, &var, property, values);
            self.scales.insert(var.clone(), spec.setup(values, property)?);

            let share = self.subplots.share(axis);
            let mut transformed: Vec<Option<Vec<DataValue>>> = self
                .layers
                .iter()
                .map(|data| {
                    data.frame().flat().filter(|df| df.has_column(&var)).map(|df| vec![DataValue::Null; df.nrow()])
                })
                .collect();

            for view in self.subplots.views().iter().filter(|v| v.coordinate(axis) == var) {
                let seed_rows = match share {
                    Share::All => (0..var_df.nrow()).collect(),
                    Share::None => subplot_rows(&var_df, view),
                    Share::Row | Share::Col => {
                        let dim = if share == Share::Row { "row" } else { "col" };
                        match (var_df.column(dim), view.facet(dim)) {
                            (Some(column), Some(level)) => var_df.positions_where(|i| column[i] == *level),
                            _ => (0..var_df.nrow()).collect(),
                        }
                    }
                };
                let seed: Vec<DataValue> = seed_rows.iter().map(|&i| values[i].clone()).collect();
                let scale = spec.setup(&seed, property)?;

                for (data, out) in self.layers.iter().zip(transformed.iter_mut()) {
                    let (Some(df), Some(out)) = (data.frame().flat(), out.as_mut()) else {
                        continue;
                    };
                    let column = df.column(&var).unwrap_or_default();
                    for row in subplot_rows(df, view) {
                        out[row] = finite(scale.forward(&column[row]));
                    }
                }

                let state = axes_mut(&mut self.figure, view.axes)?.axis_mut(axis);
                state.set_transform(scale.transform());
                if let Some(levels) = scale.order() {
                    state.set_categories(levels.iter().map(ToString::to_string).collect());
                }
            }

            for (data, out) in self.layers.iter_mut().zip(transformed) {
                if let (Some(df), Some(values)) = (data.frame_mut().flat_mut(), out) {
                    df.add_column(var.clone(), values)?;
                }
            }
            debug!(var = %var, kind = ?self.scales.get(&var).map(Scale::kind), share = %share, "transformed coordinate");
        }
        Ok(())
    }

    // ========================================================================
    // Stats and scales
    // ========================================================================

    /// Run each layer's stat once per `(x, y)` pairing.
    fn compute_stats(&mut self, plot: &Plot) -> Result<()> {
        let pair = plot.pair_spec();
        let grouping: Vec<&str> = SEMANTIC_PROPERTIES.iter().chain(&STRUCTURAL_VARIABLES).copied().collect();

        for (layer, data) in plot.layers().iter().zip(self.layers.iter_mut()) {
            let Some(stat) = layer.stat_ref() else {
                continue;
            };
            let Some(old) = data.frame().flat().cloned() else {
                continue;
            };

            let mut flat = None;
            let mut keyed = Vec::new();
            for (x, y) in pair.combinations() {
                let df = pair_frame(&old, &x, &y);
                let scales: Scales = [(Axis::X, &x), (Axis::Y, &y)]
                    .into_iter()
                    .filter(|(axis, _)| df.has_column(axis.as_str()))
                    .filter_map(|(axis, var)| self.scales.get(var.as_str()).map(|s| (axis.to_string(), s.clone())))
                    .collect();
                let orient = layer.orientation().unwrap_or_else(|| layer.mark().infer_orient(&scales));

                let mut vars: Vec<&str> = Vec::with_capacity(grouping.len() + 1);
                if stat.group_by_orient() {
                    vars.push(orient.as_str());
                }
                vars.extend(&grouping);

                let res = stat.compute(&df, &GroupBy::new(vars), orient, &scales)?;
                debug!(stat = stat.name(), x = %x, y = %y, orient = %orient, rows = res.nrow(), "computed stat");
                if pair.is_empty() {
                    flat = Some(res);
                } else {
                    keyed.push(((x, y), res));
                }
            }

            data.set_frame(match flat {
                Some(df) => Frames::Flat(df),
                None => Frames::Keyed(keyed),
            });
        }
        Ok(())
    }

    /// Fit one scale per variable not covered by a coordinate scale.
    fn setup_scales(&mut self, plot: &Plot) -> Result<()> {
        let mut variables: Vec<String> = Vec::new();
        for data in &self.layers {
            for df in data.frame().all() {
                for name in df.column_names() {
                    if !variables.iter().any(|v| v == name) {
                        variables.push(name.to_string());
                    }
                }
            }
        }

        for var in variables {
            if self.scales.contains_key(&var) {
                continue;
            }
            let parts: Vec<&[DataValue]> = self
                .layers
                .iter()
                .flat_map(|data| data.frame().all())
                .filter_map(|df| df.column(&var))
                .collect();
            let values: Vec<DataValue> = parts.concat();

            let property = Property::for_variable(&var);
            let key = Axis::parse_coordinate(&var).map_or(var.as_str(), |(_, prefix)| prefix);
            let spec = scale_spec(plot, key, property, &values);
            let scale = spec.setup(&values, property)?;
            debug!(var = %var, kind = ?scale.kind(), "set up scale");
            self.scales.insert(var, scale);
        }
        Ok(())
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Move, unscale, split and draw one layer, then collect its legend.
    fn plot_layer(&mut self, plot: &Plot, layer: &Layer, index: usize) -> Result<()> {
        let mark = layer.mark();
        let mut n_splits = 0usize;

        for (x, y) in plot.pair_spec().combinations() {
            let views: Vec<&SubplotView> =
                self.subplots.views().iter().filter(|v| v.x == x && v.y == y).collect();

            let frames = self.layers[index].frame();
            let Some(source) = frames.flat().or_else(|| frames.get(&(x.clone(), y.clone()))) else {
                continue;
            };

            let mut scales = self.scales.clone();
            for (axis, var) in [("x", &x), ("y", &y)] {
                if axis != var.as_str() {
                    if let Some(scale) = self.scales.get(var.as_str()) {
                        scales.insert(axis.to_string(), scale.clone());
                    }
                }
            }

            let mut df = pair_frame(source, &x, &y);
            let orient = layer.orientation().unwrap_or_else(|| mark.infer_orient(&scales));
            resolve_width(&mut df, mark, &scales, orient)?;
            if let Some(baseline) = mark.baseline() {
                if !df.has_column("baseline") {
                    df.add_column("baseline", vec![DataValue::Number(baseline); df.nrow()])?;
                }
            }

            for mv in layer.moves() {
                df = mv.apply(&df, &move_groupby(mv, &scales, orient), orient)?;
                debug!(mark = mark.name(), movement = mv.name(), rows = df.nrow(), "applied move");
            }

            let df = unscale_coords(&self.figure, &views, &df, orient)?;
            let grouping = split_grouping(mark, &df, &self.scales);
            let mut splits = split_generator(&df, &views, grouping).inspect(|_| n_splits += 1);
            mark.plot(&mut splits, &scales, orient, &mut self.figure)?;
        }

        self.legend.update(&self.layers[index], mark, &self.scales);
        debug!(mark = mark.name(), splits = n_splits, "plotted layer");
        Ok(())
    }

    /// Fit every subplot's view limits to all the layers drawn into it.
    fn autoscale(&mut self) {
        for view in self.subplots.views() {
            self.figure.autoscale(view.axes);
        }
        debug!(subplots = self.subplots.len(), "autoscaled views");
    }

    /// Attach the merged legend blocks to the figure.
    fn make_legend(&mut self) {
        let blocks = self.legend.blocks();
        debug!(blocks = blocks.len(), "made legend");
        for block in blocks {
            self.figure.add_legend(block);
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The drawn figure.
    #[must_use]
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Take the drawn figure.
    #[must_use]
    pub fn into_figure(self) -> Figure {
        self.figure
    }

    /// The subplot grid.
    #[must_use]
    pub fn subplots(&self) -> &Subplots {
        &self.subplots
    }

    /// Shared data, with facet and pair variables joined in.
    #[must_use]
    pub fn common_data(&self) -> &PlotData {
        &self.common
    }

    /// Resolved data of layer `index`, after stats.
    #[must_use]
    pub fn layer_data(&self, index: usize) -> Option<&PlotData> {
        self.layers.get(index)
    }

    /// Resolved scales by variable.
    #[must_use]
    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    /// Legend entries collected from every layer.
    #[must_use]
    pub fn legend(&self) -> &LegendContents {
        &self.legend
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Rasterize the figure at `dpi`.
    ///
    /// # Errors
    ///
    /// Fails for a figure too small to rasterize or a malformed style.
    pub fn render(&self, dpi: f64) -> Result<Framebuffer> {
        self.figure.render(dpi)
    }

    /// Encode the figure as PNG bytes at `dpi`.
    ///
    /// # Errors
    ///
    /// Fails if rasterization or encoding fails.
    pub fn to_png(&self, dpi: f64) -> Result<Vec<u8>> {
        PngEncoder::to_bytes(&self.render(dpi)?, Some(dpi))
    }

    /// Write the figure to a PNG file.
    ///
    /// # Errors
    ///
    /// Fails if rasterization, encoding or writing fails.
    pub fn save(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<&Self> {
        let path = path.as_ref();
        PngEncoder::write_to_file(&self.render(options.dpi)?, path, options.dpi)?;
        debug!(path = %path.display(), dpi = options.dpi, "saved figure");
        Ok(self)
    }

    /// PNG for inline display: rendered at twice the default resolution,
    /// with the display size `(width, height)` in pixels.
    ///
    /// # Errors
    ///
    /// Fails if rasterization or encoding fails.
    pub fn repr_png(&self) -> Result<(Vec<u8>, (f64, f64))> {
        let bytes = self.to_png(DEFAULT_DPI * 2.0)?;
        let (w, h) = self.figure.size();
        Ok((bytes, (w * DEFAULT_DPI * INLINE_SCALING, h * DEFAULT_DPI * INLINE_SCALING)))
    }

    /// `data:image/png;base64,...` URI of the inline PNG.
    ///
    /// # Errors
    ///
    /// Fails if rasterization or encoding fails.
    pub fn data_uri(&self) -> Result<String> {
        let (bytes, _) = self.repr_png()?;
        Ok(format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes)))
    }
}

// ============================================================================
// Pipeline helpers
// ============================================================================

/// Join shared, facet and pair bindings, then each layer's data onto them.
fn extract_data(plot: &Plot) -> Result<(PlotData, Vec<PlotData>)> {
    let common = PlotData::new(plot.data().cloned(), plot.variables())?
        .join(None, &plot.facet_spec().variables)?
        .join(None, &plot.pair_spec().variables)?;
    let layers = plot
        .layers()
        .iter()
        .map(|layer| common.join(layer.source().cloned(), layer.vars()))
        .collect::<Result<Vec<_>>>()?;
    Ok((common, layers))
}

fn axes_mut(figure: &mut Figure, id: AxesId) -> Result<&mut Axes> {
    figure.get_mut(id).ok_or_else(|| Error::Rendering(format!("figure has no axes #{}", id.index())))
}

fn finite(value: f64) -> DataValue {
    if value.is_finite() {
        DataValue::Number(value)
    } else {
        DataValue::Null
    }
}

/// Declared scale of `var`, or the default for its values.
fn scale_spec(plot: &Plot, var: &str, property: Property, values: &[DataValue]) -> ScaleSpec {
    plot.scales().get(var).cloned().unwrap_or_else(|| property.default_scale(values))
}

/// Rows of `df` that belong to the subplot `view`.
fn subplot_rows(df: &DataFrame, view: &SubplotView) -> Vec<usize> {
    let dims: Vec<(&[DataValue], &DataValue)> = ["col", "row"]
        .into_iter()
        .filter_map(|dim| Some((df.column(dim)?, view.facet(dim)?)))
        .collect();
    df.positions_where(|i| dims.iter().all(|(column, level)| column[i] == **level))
}

/// True for `x0`, `x12min`, ...: pairing variants of `axis`.
fn is_pair_variant(name: &str, axis: &str) -> bool {
    name.strip_prefix(axis).and_then(|rest| rest.chars().next()).is_some_and(|c| c.is_ascii_digit())
}

/// View of `df` with the pairing `(x, y)` renamed to plain `x`/`y`.
fn pair_frame(df: &DataFrame, x: &str, y: &str) -> DataFrame {
    let mut out = df.clone();
    for (axis, var) in [("x", x), ("y", y)] {
        if axis != var {
            out.rename_column(var, axis);
            let variants: Vec<String> =
                out.column_names().into_iter().filter(|c| is_pair_variant(c, axis)).map(str::to_string).collect();
            let variants: Vec<&str> = variants.iter().map(String::as_str).collect();
            out = out.drop_columns(&variants);
        }
    }
    out
}

/// Set `width` to the mark's width in units of orientation-axis spacing.
fn resolve_width(df: &mut DataFrame, mark: &dyn Mark, scales: &Scales, orient: Axis) -> Result<()> {
    let Some(positions) = df.column(orient.as_str()) else {
        return Ok(());
    };
    let spacing = scales.get(orient.as_str()).map_or(1.0, |scale| scale.spacing(positions));
    let n = df.nrow();
    let widths: Vec<DataValue> = match (mark.width(), df.column("width")) {
        (Some(width), _) => vec![DataValue::Number(width * spacing); n],
        (None, Some(column)) => column
            .iter()
            .map(|w| w.as_f64().map_or(DataValue::Null, |w| DataValue::Number(w * spacing)))
            .collect(),
        (None, None) => vec![DataValue::Number(0.8 * spacing); n],
    };
    df.add_column("width", widths)
}

/// Grouping for a move: orientation, the move's variables, structure.
fn move_groupby(mv: &dyn Move, scales: &Scales, orient: Axis) -> GroupBy {
    let mut vars: Vec<String> = vec![orient.as_str().to_string()];
    match mv.by() {
        Some(by) => vars.extend(by.iter().cloned()),
        None => vars.extend(SEMANTIC_PROPERTIES.iter().map(|v| (*v).to_string())),
    }
    vars.extend(STRUCTURAL_VARIABLES.iter().map(|v| (*v).to_string()));

    let order = vars
        .into_iter()
        .map(|var| {
            let levels = if var == "x" || var == "y" {
                None
            } else {
                scales.get(&var).and_then(Scale::order).map(<[DataValue]>::to_vec)
            };
            (var, levels)
        })
        .collect();
    GroupBy::with_orders(order)
}

/// Invert base coordinates to data space through each subplot's axis
/// transforms; the orientation width is inverted around its center.
fn unscale_coords(figure: &Figure, views: &[&SubplotView], df: &DataFrame, orient: Axis) -> Result<DataFrame> {
    let n = df.nrow();
    let coords: Vec<Axis> = Axis::BOTH.into_iter().filter(|axis| df.has_column(axis.as_str())).collect();
    let mut columns: Vec<Vec<DataValue>> = vec![vec![DataValue::Null; n]; coords.len()];
    let mut widths = df.has_column("width").then(|| vec![DataValue::Null; n]);

    for view in views {
        let axes = figure.get(view.axes).ok_or_else(|| Error::Rendering(format!("figure has no axes #{}", view.axes.index())))?;
        let rows = subplot_rows(df, view);
        for (axis, column) in coords.iter().zip(columns.iter_mut()) {
            let transform = axes.axis(*axis).transform();
            let values = df.column(axis.as_str()).unwrap_or_default();
            for &row in &rows {
                let Some(center) = values[row].as_f64() else {
                    continue;
                };
                column[row] = finite(transform.inverse(center));
                if *axis != orient {
                    continue;
                }
                if let (Some(widths), Some(w)) = (widths.as_mut(), df.value("width", row).and_then(DataValue::as_f64)) {
                    widths[row] =
                        finite(transform.inverse(center + w / 2.0) - transform.inverse(center - w / 2.0));
                }
            }
        }
    }

    let mut out = df.clone();
    for (axis, column) in coords.into_iter().zip(columns) {
        out.add_column(axis.as_str(), column)?;
    }
    if let Some(widths) = widths {
        out.add_column("width", widths)?;
    }
    Ok(out)
}

/// Grouping variables the mark splits by, with their level orders.
fn split_grouping(mark: &dyn Mark, df: &DataFrame, scales: &Scales) -> GroupBy {
    let order = mark
        .grouping_vars()
        .iter()
        .chain(&STRUCTURAL_VARIABLES)
        .filter(|var| df.has_column(var) && !matches!(**var, "col" | "row"))
        .map(|&var| {
            let levels = scales
                .get(var)
                .and_then(Scale::order)
                .map_or_else(|| categorical_order(df.column(var).unwrap_or_default(), None), <[DataValue]>::to_vec);
            (var.to_string(), Some(levels))
        })
        .collect();
    GroupBy::with_orders(order)
}

/// Lazily yield one [`Split`] per subplot and non-empty group.
fn split_generator<'a>(
    df: &'a DataFrame,
    views: &'a [&'a SubplotView],
    grouping: GroupBy,
) -> impl Iterator<Item = Split> + 'a {
    let ungrouped = grouping.order().iter().all(|(_, levels)| levels.as_ref().map_or(true, Vec::is_empty));
    views.iter().flat_map(move |view| {
        let axes_df = df.take(&subplot_rows(df, view));
        let subplot_keys: Vec<(String, DataValue)> = ["col", "row"]
            .into_iter()
            .filter_map(|dim| view.facet(dim).map(|level| (dim.to_string(), level.clone())))
            .collect();

        if ungrouped {
            return vec![Split { keys: subplot_keys, data: axes_df, axes: view.axes }];
        }
        grouping
            .groups(&axes_df)
            .into_iter()
            .filter(|group| !group.rows.is_empty())
            .map(|group| {
                let mut keys = group.key;
                keys.extend(subplot_keys.iter().cloned());
                Split { keys, data: axes_df.take(&group.rows), axes: view.axes }
            })
            .collect()
    })
}
