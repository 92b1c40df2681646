//! End-to-end resolution tests.
//!
//! Each test builds a plot through the public builder API, resolves it and
//! checks the resulting grid, scales, layer data, legends or output.
//!
//! Run: cargo test --test pipeline_test

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use approx::assert_relative_eq;
use trueno_plot::grammar::FacetOrder;
use trueno_plot::prelude::*;
use trueno_plot::render::Artist;
use trueno_plot::scale::ScaleKind;

fn letters() -> DataFrame {
    DataFrame::new().with_column("v", ["a", "b", "a"]).unwrap()
}

fn wide() -> Arc<DataFrame> {
    Arc::new(
        DataFrame::new()
            .with_column("a", [1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_column("b", [2.0, 1.0, 4.0, 3.0])
            .unwrap()
            .with_column("c", [5.0, 6.0, 7.0, 8.0])
            .unwrap()
            .with_column("d", [0.5, 0.1, 0.9, 0.3])
            .unwrap()
            .with_column("g", ["u", "v", "u", "v"])
            .unwrap(),
    )
}

fn numbers(values: &[DataValue]) -> Vec<f64> {
    values.iter().map(|v| v.as_f64().unwrap()).collect()
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_count_of_nominal_column() {
    let plotter = Plot::from_data(letters())
        .var("x", "v")
        .add(Layer::new(Bar::new()).stat(Count::new()))
        .plot()
        .unwrap();

    assert_eq!(plotter.subplots().len(), 1);
    assert_eq!(plotter.figure().axes().len(), 1);

    let x = plotter.scales().get("x").unwrap();
    assert_eq!(x.kind(), ScaleKind::Nominal);
    assert_eq!(x.order().unwrap(), &[DataValue::from("a"), DataValue::from("b")]);

    let counted = plotter.layer_data(0).unwrap().frame().flat().unwrap();
    assert_eq!(numbers(counted.column("x").unwrap()), vec![0.0, 1.0]);
    assert_eq!(numbers(counted.column("y").unwrap()), vec![2.0, 1.0]);

    let axes = &plotter.figure().axes()[0];
    assert_eq!(axes.artists().len(), 2);
    assert_eq!(axes.axis(Axis::X).categories(), &["a", "b"]);
    assert_eq!(axes.axis(Axis::X).label(), Some("v"));
}

#[test]
fn test_horizontal_count() {
    let plotter = Plot::from_data(letters())
        .var("y", "v")
        .add(Layer::new(Bar::new()).stat(Count::new()))
        .plot()
        .unwrap();
    let counted = plotter.layer_data(0).unwrap().frame().flat().unwrap();
    assert_eq!(numbers(counted.column("x").unwrap()), vec![2.0, 1.0]);
}

#[test]
fn test_mean_per_category() {
    let plotter = Plot::from_data(wide())
        .var("x", "g")
        .var("y", "a")
        .add(Layer::new(Bar::new()).stat(Agg::new()))
        .plot()
        .unwrap();
    let agg = plotter.layer_data(0).unwrap().frame().flat().unwrap();
    assert_eq!(numbers(agg.column("y").unwrap()), vec![2.0, 3.0]);
}

// ============================================================================
// Grid
// ============================================================================

#[test]
fn test_cartesian_pairing_builds_every_combination() {
    let plotter = Plot::from_data(wide())
        .pair(Pair::new().x(["a", "b"]).y(["c", "d"]))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();

    assert_eq!(plotter.subplots().shape(), (2, 2));
    let combos: Vec<(&str, &str)> =
        plotter.subplots().views().iter().map(|v| (v.x.as_str(), v.y.as_str())).collect();
    for combo in [("x0", "y0"), ("x0", "y1"), ("x1", "y0"), ("x1", "y1")] {
        assert!(combos.contains(&combo), "missing {combo:?}");
    }
    for axes in plotter.figure().axes() {
        assert_eq!(axes.artists().len(), 4);
    }
}

#[test]
fn test_zipped_pairing_matches_by_index() {
    let plotter = Plot::from_data(wide())
        .pair(Pair::new().x(["a", "b"]).y(["c", "d"]).cartesian(false))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();

    let combos: Vec<(&str, &str)> =
        plotter.subplots().views().iter().map(|v| (v.x.as_str(), v.y.as_str())).collect();
    assert_eq!(combos, vec![("x0", "y0"), ("x1", "y1")]);
    // labels show on every zipped subplot
    for axes in plotter.figure().axes() {
        assert!(axes.axis(Axis::X).label_visible());
        assert!(axes.axis(Axis::Y).label_visible());
    }
}

#[test]
fn test_zipped_pairing_rejects_uneven_lists() {
    let err = Plot::from_data(wide())
        .pair(Pair::new().x(["a", "b"]).y(["c"]).cartesian(false))
        .and_then(|plot| plot.plot().map(|_| plot))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_zipped_pairing_on_one_axis_draws_every_variable() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .pair(Pair::new().y(["b", "c"]).cartesian(false))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();

    let combos: Vec<(&str, &str)> =
        plotter.subplots().views().iter().map(|v| (v.x.as_str(), v.y.as_str())).collect();
    assert_eq!(combos, vec![("x", "y0"), ("x", "y1")]);
    for axes in plotter.figure().axes() {
        assert_eq!(axes.artists().len(), 4);
    }

    let err = Plot::from_data(wide()).pair(Pair::new().y(["b", "c"]).cartesian(false)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_facet_wrap_folds_seven_levels() {
    let data = DataFrame::new()
        .with_column("k", ["a", "b", "c", "d", "e", "f", "g"])
        .unwrap()
        .with_column("v", [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
        .unwrap();
    let plotter = Plot::from_data(data)
        .var("x", "v")
        .var("y", "v")
        .facet(Facet::new().col("k").wrap(3))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();

    assert_eq!(plotter.subplots().shape(), (3, 3));
    assert_eq!(plotter.subplots().len(), 7);
    assert_eq!(plotter.figure().axes().len(), 7);
    for axes in plotter.figure().axes() {
        assert_eq!(axes.artists().len(), 1);
        assert!(axes.title_visible());
    }
    let last = plotter.subplots().views().last().unwrap();
    assert_eq!(last.col, Some(DataValue::from("g")));
}

#[test]
fn test_facet_order_controls_columns() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .facet(Facet::new().col("g").order(FacetOrder::flat(["v", "u"])))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();
    assert_eq!(plotter.figure().axes()[0].title(), Some("g = v"));
    assert_eq!(plotter.figure().axes()[1].title(), Some("g = u"));
}

#[test]
fn test_row_and_col_titles_join() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .facet(Facet::new().col("g").row("g"))
        .unwrap()
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();
    assert_eq!(plotter.subplots().shape(), (2, 2));
    assert_eq!(plotter.figure().axes()[0].title(), Some("g = u | g = u"));
}

// ============================================================================
// Scales
// ============================================================================

#[test]
fn test_row_sharing_fits_per_row() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .facet(Facet::new().row("g"))
        .unwrap()
        .configure(None, None, Some(Share::Row))
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();
    let axes = plotter.figure().axes();
    // rows u: b in {2, 4}; v: b in {1, 3}
    let (lo_u, hi_u) = axes[0].data_limits(Axis::Y).unwrap();
    let (lo_v, hi_v) = axes[1].data_limits(Axis::Y).unwrap();
    assert_eq!((lo_u, hi_u), (2.0, 4.0));
    assert_eq!((lo_v, hi_v), (1.0, 3.0));
}

#[test]
fn test_user_scale_order() {
    let plotter = Plot::from_data(letters())
        .var("x", "v")
        .scale("x", ScaleSpec::nominal_order(["b", "a"]))
        .add(Layer::new(Bar::new()).stat(Count::new()))
        .plot()
        .unwrap();
    let counted = plotter.layer_data(0).unwrap().frame().flat().unwrap();
    // b sits at 0, a at 1
    assert_eq!(numbers(counted.column("y").unwrap()), vec![1.0, 2.0]);
    assert_eq!(plotter.figure().axes()[0].axis(Axis::X).categories(), &["b", "a"]);
}

#[test]
fn test_log_axis_draws_in_data_space() {
    let data = DataFrame::new()
        .with_column("a", [1.0, 10.0, 100.0])
        .unwrap()
        .with_column("b", [1.0, 2.0, 3.0])
        .unwrap();
    let plotter = Plot::from_data(data)
        .var("x", "a")
        .var("y", "b")
        .scale("x", Transform::Log { base: 10.0 })
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();

    let layer = plotter.layer_data(0).unwrap().frame().flat().unwrap();
    assert_eq!(numbers(layer.column("x").unwrap()), vec![0.0, 1.0, 2.0]);
    // limits are reported in axis coordinates
    let (lo, hi) = plotter.figure().axes()[0].data_limits(Axis::X).unwrap();
    assert_relative_eq!(lo, 0.0, epsilon = 1e-12);
    assert_relative_eq!(hi, 2.0, epsilon = 1e-12);
}

// ============================================================================
// Legends
// ============================================================================

#[test]
fn test_shared_color_column_gives_one_legend() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .var("color", "g")
        .add(Layer::new(Dot::new()))
        .add(Layer::new(Line::new()))
        .plot()
        .unwrap();

    let legends = plotter.figure().legends();
    assert_eq!(legends.len(), 1);
    assert_eq!(legends[0].title.as_deref(), Some("g"));
    assert_eq!(legends[0].entries.len(), 2);
    assert!(matches!(legends[0].entries[0].0, Artist::Composite(ref parts) if parts.len() == 2));
}

#[test]
fn test_distinct_columns_give_separate_legends() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .add(Layer::new(Dot::new()).var("color", "g"))
        .add(Layer::new(Dot::new()).var("pointsize", "c"))
        .plot()
        .unwrap();
    let titles: Vec<Option<&str>> = plotter.figure().legends().iter().map(|b| b.title.as_deref()).collect();
    assert_eq!(titles, vec![Some("g"), Some("c")]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_layer_data_shorter_than_shared_fails() {
    let short = DataFrame::new().with_column("z", [1.0, 2.0]).unwrap();
    let err = Plot::from_data(wide())
        .var("x", "a")
        .add(Layer::new(Dot::new()).data(short).y("z"))
        .plot()
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 4, found: 2, .. }));
}

#[test]
fn test_missing_column_is_reported() {
    let err = Plot::from_data(wide()).var("x", "nope").plot().unwrap_err();
    assert!(matches!(err, Error::MissingVariable { ref key, .. } if key == "nope"));
}

#[test]
fn test_ambiguous_facet_order() {
    let err = Plot::from_data(wide())
        .facet(Facet::new().col("g").row("g").order(FacetOrder::flat(["u", "v"])))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_invalid_grid_combination() {
    let err = Plot::from_data(wide())
        .facet(Facet::new().col("g"))
        .unwrap()
        .pair(Pair::new().x(["a", "b"]))
        .unwrap()
        .plot()
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_save_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plot.png");
    let plot = Plot::from_data(wide()).var("x", "a").var("y", "b").add(Layer::new(Dot::new()));
    let options = plot.save_options();
    assert_eq!(options.dpi, 96.0);

    let plot = plot.save(&path, options).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    // the plot survives saving and can be resolved again
    assert!(plot.plot().is_ok());
}

#[test]
fn test_save_resolution_sets_pixel_size() {
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .configure(Some((2.0, 1.5)), None, None)
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();
    let fb = plotter.render(100.0).unwrap();
    assert_eq!((fb.width(), fb.height()), (200, 150));
}

#[test]
fn test_inline_png_and_data_uri() {
    let plot = Plot::from_data(wide()).var("x", "a").var("y", "b").add(Layer::new(Dot::new()));
    let (bytes, (w, h)) = plot.repr_png().unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
    assert_relative_eq!(w, 6.4 * 96.0 * 0.85);
    assert_relative_eq!(h, 4.8 * 96.0 * 0.85);

    let uri = plot.plot().unwrap().data_uri().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
}

#[test]
fn test_draw_on_existing_figure() {
    let target = Figure::with_single_axes((3.0, 2.0));
    let plotter = Plot::from_data(wide())
        .var("x", "a")
        .var("y", "b")
        .on(target)
        .add(Layer::new(Dot::new()))
        .plot()
        .unwrap();
    assert_eq!(plotter.figure().size(), (3.0, 2.0));
    assert_eq!(plotter.figure().axes()[0].artists().len(), 4);
}
