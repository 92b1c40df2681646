//! Faceting for Grammar of Graphics.
//!
//! Creates small multiples by splitting data on a `col` and/or `row`
//! variable.

use super::data::{Bindings, DataValue, VariableSpec};
use crate::error::{Error, Result};

/// Level order for faceted dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetOrder {
    /// One list, applied to whichever single dimension is faceted.
    Flat(Vec<DataValue>),
    /// Separate lists per dimension.
    ByDim {
        /// Column levels.
        col: Option<Vec<DataValue>>,
        /// Row levels.
        row: Option<Vec<DataValue>>,
    },
}

impl FacetOrder {
    /// Flat order from any values.
    pub fn flat<I, V>(levels: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        FacetOrder::Flat(levels.into_iter().map(Into::into).collect())
    }
}

/// Faceting request, as passed to [`Plot::facet`](super::Plot::facet).
#[derive(Debug, Clone, Default)]
pub struct Facet {
    col: Option<VariableSpec>,
    row: Option<VariableSpec>,
    order: Option<FacetOrder>,
    wrap: Option<usize>,
}

impl Facet {
    /// Empty facet request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Facet the columns by a variable.
    #[must_use]
    pub fn col(mut self, var: impl Into<VariableSpec>) -> Self {
        self.col = Some(var.into());
        self
    }

    /// Facet the rows by a variable.
    #[must_use]
    pub fn row(mut self, var: impl Into<VariableSpec>) -> Self {
        self.row = Some(var.into());
        self
    }

    /// Set the level order.
    #[must_use]
    pub fn order(mut self, order: FacetOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Wrap the single faceted dimension after `n` cells.
    #[must_use]
    pub fn wrap(mut self, n: usize) -> Self {
        self.wrap = Some(n);
        self
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// A flat order is ambiguous when both `col` and `row` are faceted.
    pub fn resolve(self) -> Result<FacetSpec> {
        let mut variables = Bindings::new();
        if let Some(col) = self.col.clone() {
            variables.push(("col".to_string(), col));
        }
        if let Some(row) = self.row.clone() {
            variables.push(("row".to_string(), row));
        }

        let mut structure = Vec::new();
        match self.order {
            Some(FacetOrder::ByDim { col, row }) => {
                structure.extend(col.map(|levels| ("col".to_string(), levels)));
                structure.extend(row.map(|levels| ("row".to_string(), levels)));
            }
            Some(FacetOrder::Flat(levels)) => match (&self.col, &self.row) {
                (Some(_), Some(_)) => {
                    return Err(Error::config(
                        "using a flat facet order is ambiguous when faceting on both `col` and `row`; \
                         pass per-dimension orders instead",
                    ));
                }
                (Some(_), None) => structure.push(("col".to_string(), levels)),
                (None, Some(_)) => structure.push(("row".to_string(), levels)),
                (None, None) => {}
            },
            None => {}
        }

        Ok(FacetSpec { variables, structure, wrap: self.wrap })
    }
}

/// Validated faceting state stored on a plot.
#[derive(Debug, Clone, Default)]
pub struct FacetSpec {
    /// `col`/`row` bindings.
    pub variables: Bindings,
    /// Explicit level order per dimension.
    pub structure: Vec<(String, Vec<DataValue>)>,
    /// Wrap width.
    pub wrap: Option<usize>,
}

impl FacetSpec {
    /// True if `dim` (`"col"` or `"row"`) is faceted.
    #[must_use]
    pub fn has(&self, dim: &str) -> bool {
        self.variables.iter().any(|(v, _)| v == dim)
    }

    /// Level order of `dim`, if known.
    #[must_use]
    pub fn levels(&self, dim: &str) -> Option<&[DataValue]> {
        self.structure.iter().find(|(d, _)| d == dim).map(|(_, l)| l.as_slice())
    }

    /// Set the level order of `dim` unless one is already present.
    pub fn default_levels(&mut self, dim: &str, levels: Vec<DataValue>) {
        if self.levels(dim).is_none() {
            self.structure.push((dim.to_string(), levels));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_order_single_dim() {
        let spec = Facet::new().col("species").order(FacetOrder::flat(["b", "a"])).resolve().unwrap();
        assert_eq!(spec.levels("col").unwrap(), &[DataValue::from("b"), DataValue::from("a")]);
        assert!(spec.has("col"));
        assert!(!spec.has("row"));
    }

    #[test]
    fn test_flat_order_both_dims_is_ambiguous() {
        let err = Facet::new().col("a").row("b").order(FacetOrder::flat(["x"])).resolve().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_order_by_dim() {
        let order = FacetOrder::ByDim { col: None, row: Some(vec![DataValue::from(2.0)]) };
        let spec = Facet::new().col("a").row("b").order(order).resolve().unwrap();
        assert!(spec.levels("col").is_none());
        assert_eq!(spec.levels("row").unwrap().len(), 1);
    }

    #[test]
    fn test_default_levels_keep_explicit() {
        let mut spec = Facet::new().row("r").order(FacetOrder::flat([1.0])).resolve().unwrap();
        spec.default_levels("row", vec![DataValue::from(5.0)]);
        assert_eq!(spec.levels("row").unwrap(), &[DataValue::from(1.0)]);
    }

    #[test]
    fn test_wrap() {
        let spec = Facet::new().col("c").wrap(3).resolve().unwrap();
        assert_eq!(spec.wrap, Some(3));
    }
}
