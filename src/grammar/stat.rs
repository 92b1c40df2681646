//! Statistical transformations applied to layer data before drawing.

use std::fmt;
use std::str::FromStr;

use super::data::{DataFrame, DataValue};
use super::groupby::GroupBy;
use super::properties::Axis;
use crate::error::{Error, Result};
use crate::scale::Scales;

/// A transformation of a layer's data, applied per group.
pub trait Stat: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the orientation variable is prepended to the grouping keys.
    fn group_by_orient(&self) -> bool {
        false
    }

    /// Transform `data`.
    ///
    /// # Errors
    ///
    /// Fails when a variable the stat needs is missing.
    fn compute(&self, data: &DataFrame, groupby: &GroupBy, orient: Axis, scales: &Scales) -> Result<DataFrame>;
}

/// Keep the rows where every named column that exists is non-missing, relabelled `0..n`.
pub(crate) fn drop_missing(data: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let keep = data.positions_where(|row| {
        columns.iter().all(|c| data.value(c, row).map_or(true, |v| !v.is_null()))
    });
    let out = data.take(&keep);
    let n = out.nrow();
    out.with_index((0..n).collect())
}

// ============================================================================
// Count
// ============================================================================

/// Count the observations at each position of the orientation axis.
///
/// The count goes into the other coordinate variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count;

impl Count {
    /// Count stat.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Stat for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn group_by_orient(&self) -> bool {
        true
    }

    fn compute(&self, data: &DataFrame, groupby: &GroupBy, orient: Axis, _scales: &Scales) -> Result<DataFrame> {
        let var = orient.other().as_str();
        let positions = data.column(orient.as_str()).ok_or_else(|| Error::MissingVariable {
            var: orient.to_string(),
            key: orient.to_string(),
        })?;

        let mut input = data.clone();
        input.add_column(var, positions.to_vec())?;
        let counted = groupby.agg(&input, var, |values| DataValue::Number(values.len() as f64))?;
        drop_missing(&counted, &["x", "y"])
    }
}

// ============================================================================
// Agg
// ============================================================================

/// Reduction applied by [`Agg`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggFunc {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Median.
    Median,
    /// Sum.
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

impl AggFunc {
    /// Reduce the numeric values of a group; `Null` when there are none.
    #[must_use]
    pub fn reduce(self, values: &[DataValue]) -> DataValue {
        let mut xs: Vec<f64> = values.iter().filter_map(DataValue::as_f64).filter(|v| !v.is_nan()).collect();
        if xs.is_empty() {
            return DataValue::Null;
        }
        let n = xs.len() as f64;
        let out = match self {
            AggFunc::Mean => xs.iter().sum::<f64>() / n,
            AggFunc::Sum => xs.iter().sum(),
            AggFunc::Min => xs.iter().copied().fold(f64::INFINITY, f64::min),
            AggFunc::Max => xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggFunc::Median => {
                xs.sort_by(f64::total_cmp);
                let mid = xs.len() / 2;
                if xs.len() % 2 == 0 {
                    (xs[mid - 1] + xs[mid]) / 2.0
                } else {
                    xs[mid]
                }
            }
        };
        DataValue::Number(out)
    }
}

impl FromStr for AggFunc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(AggFunc::Mean),
            "median" => Ok(AggFunc::Median),
            "sum" => Ok(AggFunc::Sum),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            other => Err(Error::config(format!("unknown aggregation `{other}`"))),
        }
    }
}

/// Aggregate the value axis at each position of the orientation axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Agg {
    func: AggFunc,
}

impl Agg {
    /// Mean aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregation with the given reduction.
    #[must_use]
    pub fn with_func(func: AggFunc) -> Self {
        Self { func }
    }
}

impl Stat for Agg {
    fn name(&self) -> &'static str {
        "agg"
    }

    fn group_by_orient(&self) -> bool {
        true
    }

    fn compute(&self, data: &DataFrame, groupby: &GroupBy, orient: Axis, _scales: &Scales) -> Result<DataFrame> {
        let var = orient.other().as_str();
        let func = self.func;
        let res = groupby.agg(data, var, |values| func.reduce(values))?;
        drop_missing(&res, &[var])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> DataFrame {
        DataFrame::new()
            .with_column("x", ["a", "b", "a", "a"])
            .unwrap()
            .with_column("y", [1.0, 2.0, 3.0, 8.0])
            .unwrap()
            .with_column("color", ["u", "u", "u", "v"])
            .unwrap()
    }

    #[test]
    fn test_count_per_position() {
        let input = data().select(&["x"]);
        let res = Count::new().compute(&input, &GroupBy::new(["x"]), Axis::X, &Scales::new()).unwrap();
        assert_eq!(res.column("x").unwrap(), &[DataValue::from("a"), DataValue::from("b")]);
        assert_eq!(res.column("y").unwrap(), &[DataValue::from(3.0), DataValue::from(1.0)]);
        assert_eq!(res.index(), &[0, 1]);
    }

    #[test]
    fn test_count_drops_empty_combinations() {
        let res = Count::new()
            .compute(&data(), &GroupBy::new(["x", "color"]), Axis::X, &Scales::new())
            .unwrap();
        // (b, v) never occurs
        assert_eq!(res.nrow(), 3);
        assert_eq!(res.column_names(), vec!["x", "y", "color"]);
    }

    #[test]
    fn test_count_horizontal() {
        let input = DataFrame::new().with_column("y", [1.0, 1.0, 2.0]).unwrap();
        let res = Count::new().compute(&input, &GroupBy::new(["y"]), Axis::Y, &Scales::new()).unwrap();
        assert_eq!(res.column("x").unwrap(), &[DataValue::from(2.0), DataValue::from(1.0)]);
    }

    #[test]
    fn test_agg_mean_and_median() {
        let groupby = GroupBy::new(["x"]);
        let mean = Agg::new().compute(&data(), &groupby, Axis::X, &Scales::new()).unwrap();
        assert_eq!(mean.column("y").unwrap(), &[DataValue::from(4.0), DataValue::from(2.0)]);
        let median =
            Agg::with_func(AggFunc::Median).compute(&data(), &groupby, Axis::X, &Scales::new()).unwrap();
        assert_eq!(median.column("y").unwrap(), &[DataValue::from(3.0), DataValue::from(2.0)]);
    }

    #[test]
    fn test_agg_func_reduce() {
        let values = vec![DataValue::from(2.0), DataValue::Null, DataValue::from(6.0)];
        assert_eq!(AggFunc::Sum.reduce(&values), DataValue::from(8.0));
        assert_eq!(AggFunc::Min.reduce(&values), DataValue::from(2.0));
        assert_eq!(AggFunc::Max.reduce(&[]), DataValue::Null);
        assert_eq!("median".parse::<AggFunc>().unwrap(), AggFunc::Median);
        assert!("mode".parse::<AggFunc>().is_err());
    }

    #[test]
    fn test_count_missing_orient_column() {
        let input = DataFrame::new().with_column("y", [1.0]).unwrap();
        let err = Count::new().compute(&input, &GroupBy::new(["x"]), Axis::X, &Scales::new()).unwrap_err();
        assert!(matches!(err, Error::MissingVariable { .. }));
    }
}
