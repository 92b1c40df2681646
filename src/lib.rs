//! # Trueno-Plot
//!
//! Declarative statistical plotting: bind data to semantic variables, add
//! layers of marks, and let the plot compile into a rasterized figure.
//!
//! Built on the [trueno](https://crates.io/crates/trueno) core library for
//! SIMD-accelerated framebuffer operations. Output is pure Rust PNG with no
//! JavaScript/HTML dependencies.
//!
//! ## Features
//!
//! - **Layered grammar**: marks, stats and moves composed per layer
//! - **Small multiples**: facet grids and wrapped facets, paired axes
//! - **Scales**: nominal, continuous (linear, log, sqrt) and identity scales
//!   with shared or per-subplot fitting
//! - **Legends**: merged across layers by variable identity
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_plot::prelude::*;
//!
//! let data = DataFrame::new().with_column("day", ["thu", "fri", "thu"]).unwrap();
//! let plotter = Plot::from_data(data)
//!     .var("x", "day")
//!     .add(Layer::new(Bar::new()).stat(Count::new()))
//!     .plot()
//!     .unwrap();
//! let png = plotter.to_png(96.0).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```
//!
//! ## Academic References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." Journal of Computational
//!   and Graphical Statistics.
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code (Cloudflare incident 2025-11-18)
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics/visualization code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color types and palettes.
pub mod color;

/// Core framebuffer for pixel rendering.
pub mod framebuffer;

/// Pixel-space points, lines and rectangles.
pub mod geometry;

/// Scales mapping data values to coordinates and visual properties.
pub mod scale;

/// Figure and style configuration loaded from YAML.
pub mod config;

// ============================================================================
// Visualization Modules
// ============================================================================

/// Plot specification and resolution.
pub mod grammar;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Figures, axes and rasterization.
pub mod render;

/// Output encoders (PNG).
pub mod output;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for trueno-plot operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use trueno_plot::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::Rgba;
    pub use crate::config::{PlotConfig, StyleConfig};
    pub use crate::error::{Error, Result};
    pub use crate::framebuffer::Framebuffer;
    pub use crate::grammar::{
        Agg, AggFunc, Axis, Bar, Count, DataFrame, DataValue, Dodge, Dot, Facet, FacetOrder, Layer, Line, Mark,
        Move, Pair, Plot, Plotter, SaveOptions, Share, Shift, Stack, Stat, VariableSpec, Vector,
    };
    pub use crate::render::Figure;
    pub use crate::scale::{Scale, ScaleSpec, Transform};
}

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export trueno for direct access to SIMD operations.
pub use trueno;
