//! Rendering: the figure model the plot compiles into, and the rasterizer
//! that turns it into pixels.
//!
//! Lines use Bresenham for axes and grid, Wu's anti-aliased algorithm for
//! data paths and marker strokes; discs and circles use the midpoint
//! algorithm.
//!
//! # References
//!
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.
//! - Bresenham, J. E. (1965). "Algorithm for computer control of a digital plotter."

mod figure;
mod primitives;

pub use figure::{Artist, Axes, AxesId, AxisState, Figure, LegendBlock};
pub use primitives::{
    draw_line, draw_line_aa, fill_circle, fill_rect, stroke_circle, stroke_rect, Drawable,
};
