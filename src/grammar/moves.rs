//! Position adjustments applied after stats, in transformed coordinates.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::data::{DataFrame, DataValue};
use super::groupby::GroupBy;
use super::properties::Axis;
use crate::error::{Error, Result};

/// A repositioning of a layer's rows.
pub trait Move: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Variables to group by instead of the semantic properties.
    fn by(&self) -> Option<&[String]> {
        None
    }

    /// Reposition `data`.
    ///
    /// # Errors
    ///
    /// Fails when the data cannot be moved as requested.
    fn apply(&self, data: &DataFrame, groupby: &GroupBy, orient: Axis) -> Result<DataFrame>;
}

fn number(value: &DataValue) -> Option<f64> {
    value.as_f64().filter(|v| !v.is_nan())
}

// ============================================================================
// Dodge
// ============================================================================

/// What [`Dodge`] does with group combinations absent at a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DodgeEmpty {
    /// Reserve space for them.
    #[default]
    Keep,
    /// Reserve space but let present groups keep their share.
    Drop,
    /// Let present groups fill the space.
    Fill,
}

impl FromStr for DodgeEmpty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep" => Ok(DodgeEmpty::Keep),
            "drop" => Ok(DodgeEmpty::Drop),
            "fill" => Ok(DodgeEmpty::Fill),
            other => Err(Error::config(format!("dodge empty mode must be keep, drop or fill, not `{other}`"))),
        }
    }
}

/// Place groups side by side within each position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dodge {
    empty: DodgeEmpty,
    gap: f64,
    by: Option<Vec<String>>,
}

impl Dodge {
    /// Dodge keeping space for empty groups, without gaps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handling of empty group combinations.
    #[must_use]
    pub fn empty(mut self, empty: DodgeEmpty) -> Self {
        self.empty = empty;
        self
    }

    /// Fraction of each dodged width left empty.
    #[must_use]
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    /// Dodge by these variables only.
    #[must_use]
    pub fn by<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by = Some(vars.into_iter().map(Into::into).collect());
        self
    }

    /// New widths for the groups at one position.
    fn scale_widths(&self, widths: &[Option<f64>]) -> Vec<Option<f64>> {
        let present: Vec<f64> = widths.iter().flatten().copied().collect();
        let fill = match self.empty {
            DodgeEmpty::Fill => 0.0,
            _ if present.is_empty() => 0.0,
            _ => present.iter().sum::<f64>() / present.len() as f64,
        };
        let filled: Vec<f64> = widths.iter().map(|w| w.unwrap_or(fill)).collect();
        let scale = filled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = filled.iter().sum();
        if norm == 0.0 {
            return widths.to_vec();
        }
        widths
            .iter()
            .zip(&filled)
            .map(|(w, f)| {
                let w = if self.empty == DodgeEmpty::Keep { Some(*f) } else { *w };
                w.map(|w| w / norm * scale)
            })
            .collect()
    }
}

/// Offsets that place consecutive widths edge to edge, centred on zero.
fn widths_to_offsets(widths: &[Option<f64>]) -> Vec<Option<f64>> {
    let total: f64 = widths.iter().flatten().sum();
    let mut before = 0.0;
    widths
        .iter()
        .map(|w| {
            let offset = w.map(|w| before + (w - total) / 2.0);
            before += w.unwrap_or(0.0);
            offset
        })
        .collect()
}

impl Move for Dodge {
    fn name(&self) -> &'static str {
        "dodge"
    }

    fn by(&self) -> Option<&[String]> {
        self.by.as_deref()
    }

    fn apply(&self, data: &DataFrame, groupby: &GroupBy, orient: Axis) -> Result<DataFrame> {
        let grouping: Vec<&str> =
            groupby.order().iter().map(|(v, _)| v.as_str()).filter(|v| data.has_column(v)).collect();
        let mut groups = groupby.agg(data, "width", |values| {
            values.iter().filter_map(number).reduce(f64::max).map_or(DataValue::Null, DataValue::Number)
        })?;
        if self.empty == DodgeEmpty::Fill {
            groups = super::stat::drop_missing(&groups, &["width"])?;
        }

        // Partition the aggregated rows by position, in first-seen order.
        let position_vars: Vec<&str> =
            [orient.as_str(), "col", "row"].into_iter().filter(|v| data.has_column(v)).collect();
        let mut positions: Vec<(Vec<DataValue>, Vec<usize>)> = Vec::new();
        for row in 0..groups.nrow() {
            let key: Vec<DataValue> =
                position_vars.iter().map(|v| groups.value(v, row).cloned().unwrap_or_default()).collect();
            match positions.iter_mut().find(|(k, _)| *k == key) {
                Some((_, rows)) => rows.push(row),
                None => positions.push((key, vec![row])),
            }
        }

        let widths: Vec<Option<f64>> =
            (0..groups.nrow()).map(|r| groups.value("width", r).and_then(number)).collect();
        let mut new_widths = vec![None; groups.nrow()];
        let mut offsets = vec![None; groups.nrow()];
        for (_, rows) in &positions {
            let at: Vec<Option<f64>> = rows.iter().map(|&r| widths[r]).collect();
            let scaled = self.scale_widths(&at);
            for ((&r, w), o) in rows.iter().zip(&scaled).zip(widths_to_offsets(&scaled)) {
                new_widths[r] = w.map(|w| w * (1.0 - self.gap));
                offsets[r] = o;
            }
        }

        let mut lookup: HashMap<Vec<DataValue>, (DataValue, DataValue)> = HashMap::new();
        for row in 0..groups.nrow() {
            let key: Vec<DataValue> =
                grouping.iter().map(|v| groups.value(v, row).cloned().unwrap_or_default()).collect();
            let center = groups.value(orient.as_str(), row).and_then(number);
            let dodged = match (center, offsets[row]) {
                (Some(c), Some(o)) => DataValue::Number(c + o),
                _ => DataValue::Null,
            };
            let width = new_widths[row].map_or(DataValue::Null, DataValue::Number);
            lookup.insert(key, (dodged, width));
        }

        let mut dodged = Vec::with_capacity(data.nrow());
        let mut width = Vec::with_capacity(data.nrow());
        for row in 0..data.nrow() {
            let key: Vec<DataValue> =
                grouping.iter().map(|v| data.value(v, row).cloned().unwrap_or_default()).collect();
            let (d, w) = lookup.get(&key).cloned().unwrap_or((DataValue::Null, DataValue::Null));
            dodged.push(d);
            width.push(w);
        }

        let mut out = data.clone();
        out.add_column(orient.as_str(), dodged)?;
        out.add_column("width", width)?;
        Ok(out)
    }
}

// ============================================================================
// Stack
// ============================================================================

/// Stack groups at the same position on top of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stack;

impl Stack {
    /// Stack move.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Move for Stack {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn apply(&self, data: &DataFrame, _groupby: &GroupBy, orient: Axis) -> Result<DataFrame> {
        let other = orient.other().as_str();
        GroupBy::new(["col", "row", orient.as_str()]).apply(data, |df| {
            let baselines = df.column("baseline").unwrap_or_default();
            let mut distinct = baselines.iter().filter(|b| !b.is_null()).collect::<Vec<_>>();
            distinct.sort();
            distinct.dedup();
            if distinct.len() > 1 {
                return Err(Error::config("stack cannot be used when baselines are already heterogeneous"));
            }

            let mut top = Vec::with_capacity(df.nrow());
            let mut base = Vec::with_capacity(df.nrow());
            let mut running = 0.0;
            for row in 0..df.nrow() {
                let baseline = df.value("baseline", row).and_then(number).unwrap_or(0.0);
                match df.value(other, row).and_then(number) {
                    Some(value) => {
                        base.push(DataValue::Number(baseline + running));
                        running += value - baseline;
                        top.push(DataValue::Number(running));
                    }
                    None => {
                        top.push(DataValue::Null);
                        base.push(DataValue::Null);
                    }
                }
            }

            let mut out = df.clone();
            out.add_column(other, top)?;
            out.add_column("baseline", base)?;
            Ok(out)
        })
    }
}

// ============================================================================
// Shift
// ============================================================================

/// Displace every row by a constant amount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shift {
    dx: f64,
    dy: f64,
}

impl Shift {
    /// Shift by `(dx, dy)`.
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

impl Move for Shift {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn apply(&self, data: &DataFrame, _groupby: &GroupBy, _orient: Axis) -> Result<DataFrame> {
        let mut out = data.clone();
        for (var, delta) in [("x", self.dx), ("y", self.dy)] {
            if let Some(values) = data.column(var) {
                let shifted = values.iter().map(|v| number(v).map_or(DataValue::Null, |n| DataValue::Number(n + delta)));
                out.add_column(var, shifted.collect())?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars() -> DataFrame {
        DataFrame::new()
            .with_column("x", [0.0, 0.0, 1.0])
            .unwrap()
            .with_column("y", [2.0, 3.0, 4.0])
            .unwrap()
            .with_column("color", ["a", "b", "a"])
            .unwrap()
            .with_column("width", [0.8, 0.8, 0.8])
            .unwrap()
            .with_column("baseline", [0.0, 0.0, 0.0])
            .unwrap()
    }

    fn f64s(df: &DataFrame, var: &str) -> Vec<f64> {
        df.column_f64(var).unwrap()
    }

    #[test]
    fn test_dodge_keep_reserves_space() {
        let out = Dodge::new().apply(&bars(), &GroupBy::new(["x", "color"]), Axis::X).unwrap();
        let x = f64s(&out, "x");
        assert_relative_eq!(x[0], -0.2, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.2, epsilon = 1e-12);
        assert_relative_eq!(x[2], 0.8, epsilon = 1e-12);
        assert_eq!(f64s(&out, "width"), vec![0.4, 0.4, 0.4]);
    }

    #[test]
    fn test_dodge_fill_uses_full_width() {
        let out = Dodge::new()
            .empty(DodgeEmpty::Fill)
            .apply(&bars(), &GroupBy::new(["x", "color"]), Axis::X)
            .unwrap();
        let x = f64s(&out, "x");
        assert_relative_eq!(x[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(f64s(&out, "width")[2], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_dodge_gap_shrinks_width() {
        let out = Dodge::new().gap(0.5).apply(&bars(), &GroupBy::new(["x", "color"]), Axis::X).unwrap();
        assert_relative_eq!(f64s(&out, "width")[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(f64s(&out, "x")[0], -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_stack_accumulates() {
        let out = Stack::new().apply(&bars(), &GroupBy::new(["x"]), Axis::X).unwrap();
        assert_eq!(f64s(&out, "y"), vec![2.0, 5.0, 4.0]);
        assert_eq!(f64s(&out, "baseline"), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_stack_rejects_heterogeneous_baselines() {
        let mut data = bars();
        data.add_column("baseline", vec![0.0.into(), 1.0.into(), 0.0.into()]).unwrap();
        let err = Stack::new().apply(&data, &GroupBy::new(["x"]), Axis::X).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_shift() {
        let out = Shift::new(0.5, -1.0).apply(&bars(), &GroupBy::default(), Axis::X).unwrap();
        assert_eq!(f64s(&out, "x"), vec![0.5, 0.5, 1.5]);
        assert_eq!(f64s(&out, "y"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_widths_to_offsets_centres() {
        let offsets = widths_to_offsets(&[Some(0.2), Some(0.2), Some(0.4)]);
        assert_relative_eq!(offsets[0].unwrap(), -0.3, epsilon = 1e-12);
        assert_relative_eq!(offsets[1].unwrap(), -0.1, epsilon = 1e-12);
        assert_relative_eq!(offsets[2].unwrap(), 0.2, epsilon = 1e-12);
    }
}
