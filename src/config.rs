//! Plot configuration.
//!
//! Figure defaults and drawing style, loadable from YAML. Fields missing
//! from a file keep their defaults.

use crate::color::Rgba;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Colours and spacing used when rasterizing a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Figure background (hex).
    #[serde(default = "default_background")]
    pub background: String,

    /// Panel background (hex).
    #[serde(default = "default_panel_background")]
    pub panel_background: String,

    /// Grid line colour (hex).
    #[serde(default = "default_grid_color")]
    pub grid_color: String,

    /// Axis line colour (hex).
    #[serde(default = "default_axis_color")]
    pub axis_color: String,

    /// Draw grid lines at tick positions.
    #[serde(default = "default_show_grid")]
    pub show_grid: bool,

    /// Figure margin as a fraction of the smaller figure side.
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Share of the figure width reserved for legends, when present.
    #[serde(default = "default_legend_width")]
    pub legend_width: f64,
}

fn default_background() -> String {
    "#ffffff".to_string()
}
fn default_panel_background() -> String {
    "#eaeaf2".to_string()
}
fn default_grid_color() -> String {
    "#ffffff".to_string()
}
fn default_axis_color() -> String {
    "#333333".to_string()
}
fn default_show_grid() -> bool {
    true
}
fn default_margin() -> f64 {
    0.04
}
fn default_legend_width() -> f64 {
    0.18
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            panel_background: default_panel_background(),
            grid_color: default_grid_color(),
            axis_color: default_axis_color(),
            show_grid: default_show_grid(),
            margin: default_margin(),
            legend_width: default_legend_width(),
        }
    }
}

/// Parsed style colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Figure background.
    pub background: Rgba,
    /// Panel background.
    pub panel_background: Rgba,
    /// Grid lines.
    pub grid: Rgba,
    /// Axis lines.
    pub axis: Rgba,
}

impl StyleConfig {
    /// Parse the configured colours.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for a malformed hex string.
    pub fn palette(&self) -> Result<Palette> {
        Ok(Palette {
            background: Rgba::from_hex(&self.background)?,
            panel_background: Rgba::from_hex(&self.panel_background)?,
            grid: Rgba::from_hex(&self.grid_color)?,
            axis: Rgba::from_hex(&self.axis_color)?,
        })
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Figure size in inches (width, height).
    #[serde(default = "default_figsize")]
    pub figsize: (f64, f64),

    /// Raster resolution used by `save`.
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// Drawing style.
    #[serde(default)]
    pub style: StyleConfig,
}

fn default_figsize() -> (f64, f64) {
    (6.4, 4.8)
}
fn default_dpi() -> f64 {
    96.0
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self { figsize: default_figsize(), dpi: default_dpi(), style: StyleConfig::default() }
    }
}

impl PlotConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails, or
    /// [`Error::InvalidColor`] if a style colour is malformed.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse { line, message: e.to_string() }
        })?;
        config.style.palette()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = PlotConfig::new();
        assert_eq!(config.figsize, (6.4, 4.8));
        assert_eq!(config.dpi, 96.0);
        assert!(config.style.show_grid);
    }

    #[test]
    fn test_config_parse_partial() {
        let config = PlotConfig::parse("dpi: 150\nstyle:\n  show_grid: false\n").unwrap();
        assert_eq!(config.dpi, 150.0);
        assert!(!config.style.show_grid);
        assert_eq!(config.style.panel_background, "#eaeaf2");
        assert_eq!(config.figsize, (6.4, 4.8));
    }

    #[test]
    fn test_config_parse_error_line() {
        let err = PlotConfig::parse("dpi: 96\nfigsize: [oops\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { line, .. } if line >= 2));
    }

    #[test]
    fn test_config_invalid_color() {
        let err = PlotConfig::parse("style:\n  background: '#zz0000'\n").unwrap_err();
        assert!(matches!(err, Error::InvalidColor(_)));
    }

    #[test]
    fn test_config_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "figsize: [4.0, 3.0]").unwrap();
        let config = PlotConfig::load(file.path()).unwrap();
        assert_eq!(config.figsize, (4.0, 3.0));
    }

    #[test]
    fn test_config_load_missing() {
        let err = PlotConfig::load("/nonexistent/plot.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
        assert_eq!(PlotConfig::load_or_default("/nonexistent/plot.yaml"), PlotConfig::default());
    }

    #[test]
    fn test_palette() {
        let palette = StyleConfig::default().palette().unwrap();
        assert_eq!(palette.background, Rgba::WHITE);
    }
}
