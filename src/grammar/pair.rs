//! Pairing: drawing several variables against a shared axis in separate cells.

use super::data::{Bindings, PlotData, VariableSpec};
use super::properties::Axis;
use crate::error::{Error, Result};

/// Pairing request, as passed to [`Plot::pair`](super::Plot::pair).
#[derive(Debug, Clone)]
pub struct Pair {
    x: Option<Vec<VariableSpec>>,
    y: Option<Vec<VariableSpec>>,
    wrap: Option<usize>,
    cartesian: bool,
}

impl Default for Pair {
    fn default() -> Self {
        Self { x: None, y: None, wrap: None, cartesian: true }
    }
}

impl Pair {
    /// Pair every unbound source column (when neither axis is given).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables to spread along `x`.
    #[must_use]
    pub fn x<I, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariableSpec>,
    {
        self.x = Some(vars.into_iter().map(Into::into).collect());
        self
    }

    /// Variables to spread along `y`.
    #[must_use]
    pub fn y<I, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariableSpec>,
    {
        self.y = Some(vars.into_iter().map(Into::into).collect());
        self
    }

    /// Wrap the paired dimension after `n` cells.
    #[must_use]
    pub fn wrap(mut self, n: usize) -> Self {
        self.wrap = Some(n);
        self
    }

    /// Cross every `x` with every `y` (`true`, default) or zip them.
    #[must_use]
    pub fn cartesian(mut self, cartesian: bool) -> Self {
        self.cartesian = cartesian;
        self
    }

    /// Resolve the request against the plot's constructor data.
    ///
    /// With neither axis given, every source column not bound in the
    /// constructor is paired on each axis the constructor left unbound.
    ///
    /// # Errors
    ///
    /// Default pairing needs constructor data; zipped pairing needs lists
    /// of equal length.
    pub fn resolve(self, data: &PlotData) -> Result<PairSpec> {
        let (mut x, mut y) = (self.x, self.y);

        if x.is_none() && y.is_none() {
            let source = data
                .source_data()
                .ok_or_else(|| Error::config("you must pass `data` in the constructor to use default pairing"))?;
            let bound: Vec<&str> = data.names().values().filter_map(|n| n.as_deref()).collect();
            let unused: Vec<VariableSpec> = source
                .column_names()
                .into_iter()
                .filter(|key| !bound.contains(key))
                .map(VariableSpec::from)
                .collect();
            if !data.names().contains_key("x") {
                x = Some(unused.clone());
            }
            if !data.names().contains_key("y") {
                y = Some(unused);
            }
        }

        let x = x.unwrap_or_default();
        let y = y.unwrap_or_default();
        if !self.cartesian {
            check_zip(&x, &y, data)?;
        }

        let mut variables = Bindings::new();
        let mut structure = Vec::new();
        for (axis, specs) in [(Axis::X, x), (Axis::Y, y)] {
            let keys: Vec<String> = (0..specs.len()).map(|i| format!("{axis}{i}")).collect();
            variables.extend(keys.iter().cloned().zip(specs));
            if !keys.is_empty() {
                structure.push((axis, keys));
            }
        }

        Ok(PairSpec { variables, structure, cartesian: self.cartesian, wrap: self.wrap })
    }
}

/// Zipped lists must match in length. One side may be empty only when the
/// plot binds that axis, which then appears in every cell.
fn check_zip(x: &[VariableSpec], y: &[VariableSpec], data: &PlotData) -> Result<()> {
    let fits = match (x.len(), y.len()) {
        (0, 0) => true,
        (0, _) => data.names().contains_key("x"),
        (_, 0) => data.names().contains_key("y"),
        (nx, ny) => nx == ny,
    };
    if fits {
        return Ok(());
    }
    Err(Error::config(format!(
        "non-cartesian pairing needs lists of equal length, got {} `x` and {} `y` variables",
        x.len(),
        y.len()
    )))
}

/// Validated pairing state stored on a plot.
#[derive(Debug, Clone)]
pub struct PairSpec {
    /// `x0`, `x1`, ..., `y0`, ... bindings.
    pub variables: Bindings,
    /// Paired variable names per axis.
    pub structure: Vec<(Axis, Vec<String>)>,
    /// Cross (`true`) or zip (`false`) the axes.
    pub cartesian: bool,
    /// Wrap width.
    pub wrap: Option<usize>,
}

impl Default for PairSpec {
    fn default() -> Self {
        Self { variables: Bindings::new(), structure: Vec::new(), cartesian: true, wrap: None }
    }
}

impl PairSpec {
    /// Paired variable names on `axis`, if that axis is paired.
    #[must_use]
    pub fn keys(&self, axis: Axis) -> Option<&[String]> {
        self.structure.iter().find(|(a, _)| *a == axis).map(|(_, k)| k.as_slice())
    }

    /// True if `axis` is paired.
    #[must_use]
    pub fn is_paired(&self, axis: Axis) -> bool {
        self.keys(axis).is_some()
    }

    /// True if no axis is paired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    /// Number of cells a zipped pairing lays out.
    #[must_use]
    pub fn zipped_len(&self) -> usize {
        self.structure.iter().map(|(_, keys)| keys.len()).max().unwrap_or(1)
    }

    /// Every `(x, y)` coordinate combination a cell can plot.
    ///
    /// Cartesian pairings cross the axes with `x` varying slowest; zipped
    /// pairings match them index-wise. Unpaired axes contribute their plain
    /// name.
    #[must_use]
    pub fn combinations(&self) -> Vec<(String, String)> {
        let xs = self.keys(Axis::X).map_or_else(|| vec!["x".to_string()], <[String]>::to_vec);
        let ys = self.keys(Axis::Y).map_or_else(|| vec!["y".to_string()], <[String]>::to_vec);
        if self.cartesian {
            return xs.iter().flat_map(|x| ys.iter().map(move |y| (x.clone(), y.clone()))).collect();
        }
        (0..self.zipped_len())
            .map(|i| (xs[i.min(xs.len() - 1)].clone(), ys[i.min(ys.len() - 1)].clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::data::DataFrame;
    use std::sync::Arc;

    fn data() -> PlotData {
        let source = DataFrame::new()
            .with_column("a", [1.0, 2.0])
            .unwrap()
            .with_column("b", [3.0, 4.0])
            .unwrap()
            .with_column("c", [5.0, 6.0])
            .unwrap();
        PlotData::new(Some(Arc::new(source)), &[("y".to_string(), VariableSpec::from("c"))]).unwrap()
    }

    #[test]
    fn test_explicit_pairing_keys() {
        let spec = Pair::new().x(["a", "b"]).y(["c"]).resolve(&data()).unwrap();
        assert_eq!(spec.keys(Axis::X).unwrap(), &["x0".to_string(), "x1".to_string()]);
        assert_eq!(spec.keys(Axis::Y).unwrap(), &["y0".to_string()]);
        assert_eq!(spec.variables.len(), 3);
    }

    #[test]
    fn test_default_pairing_uses_unbound_columns() {
        let spec = Pair::new().resolve(&data()).unwrap();
        assert_eq!(spec.keys(Axis::X).unwrap().len(), 2);
        assert!(!spec.is_paired(Axis::Y));
    }

    #[test]
    fn test_default_pairing_requires_data() {
        let err = Pair::new().resolve(&PlotData::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_non_cartesian_length_mismatch() {
        let err = Pair::new().x(["a", "b"]).y(["c"]).cartesian(false).resolve(&data()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_non_cartesian_one_sided() {
        // `y` is bound by the plot, so pairing only `x` zips against it
        let spec = Pair::new().x(["a", "b"]).cartesian(false).resolve(&data()).unwrap();
        assert_eq!(spec.zipped_len(), 2);
        assert_eq!(
            spec.combinations(),
            vec![("x0".to_string(), "y".to_string()), ("x1".to_string(), "y".to_string())]
        );

        // nothing binds `x`, so the second `y` would have no partner
        let err = Pair::new().y(["a", "b"]).cartesian(false).resolve(&data()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_zipped_combinations() {
        let spec = Pair::new().x(["a", "b"]).y(["c", "a"]).cartesian(false).resolve(&data()).unwrap();
        assert_eq!(
            spec.combinations(),
            vec![("x0".to_string(), "y0".to_string()), ("x1".to_string(), "y1".to_string())]
        );
    }

    #[test]
    fn test_combinations() {
        let spec = Pair::new().x(["a", "b"]).resolve(&data()).unwrap();
        assert_eq!(
            spec.combinations(),
            vec![("x0".to_string(), "y".to_string()), ("x1".to_string(), "y".to_string())]
        );
        assert_eq!(PairSpec::default().combinations(), vec![("x".to_string(), "y".to_string())]);
    }
}
