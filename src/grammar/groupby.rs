//! Ordered group-by over categorical key columns.
//!
//! Partitions are always visited in the cartesian product of the per-key
//! level orders, first key varying slowest, never in hash order.

use std::collections::{BTreeMap, HashMap};

use super::data::{categorical_order, DataFrame, DataValue};
use crate::error::{Error, Result};

/// Grouping key variables, each with an optional explicit level order.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
    order: Vec<(String, Option<Vec<DataValue>>)>,
    allow_empty: bool,
}

/// One partition: its key values and the row positions it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// `(variable, level)` for every grouping variable present in the data.
    pub key: Vec<(String, DataValue)>,
    /// Row positions in the grouped frame.
    pub rows: Vec<usize>,
}

impl GroupBy {
    /// Group by variables whose levels are derived from the data.
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_orders(vars.into_iter().map(|v| (v.into(), None)).collect())
    }

    /// Group by variables with explicit level orders where given.
    #[must_use]
    pub fn with_orders(order: Vec<(String, Option<Vec<DataValue>>)>) -> Self {
        let mut deduped: Vec<(String, Option<Vec<DataValue>>)> = Vec::with_capacity(order.len());
        for (var, levels) in order {
            if !deduped.iter().any(|(v, _)| *v == var) {
                deduped.push((var, levels));
            }
        }
        Self { order: deduped, allow_empty: false }
    }

    /// Also yield partitions for level combinations absent from the data.
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// The grouping variables and their explicit orders.
    #[must_use]
    pub fn order(&self) -> &[(String, Option<Vec<DataValue>>)] {
        &self.order
    }

    /// Resolved levels of the grouping variables present in `data`.
    #[must_use]
    pub fn levels(&self, data: &DataFrame) -> Vec<(String, Vec<DataValue>)> {
        self.order
            .iter()
            .filter_map(|(var, order)| {
                data.column(var).map(|col| (var.clone(), categorical_order(col, order.as_deref())))
            })
            .collect()
    }

    /// Partition the rows of `data`.
    ///
    /// Rows whose key value is missing or not among the levels are dropped.
    #[must_use]
    pub fn groups(&self, data: &DataFrame) -> Vec<Group> {
        let levels = self.levels(data);
        if levels.is_empty() {
            return vec![Group { key: Vec::new(), rows: (0..data.nrow()).collect() }];
        }

        let partitions = partition(data, &levels);
        let make_key = |idx: &[usize]| -> Vec<(String, DataValue)> {
            levels.iter().zip(idx).map(|((var, lv), &i)| (var.clone(), lv[i].clone())).collect()
        };

        if self.allow_empty {
            let sizes: Vec<usize> = levels.iter().map(|(_, lv)| lv.len()).collect();
            product(&sizes)
                .into_iter()
                .map(|idx| Group {
                    rows: partitions.get(&idx).cloned().unwrap_or_default(),
                    key: make_key(&idx),
                })
                .collect()
        } else {
            partitions.into_iter().map(|(idx, rows)| Group { key: make_key(&idx), rows }).collect()
        }
    }

    /// Apply `func` to every partition and stack the results.
    ///
    /// Each result gets the partition's key values assigned as columns.
    /// Columns of `data` keep their relative order at the front.
    pub fn apply<F>(&self, data: &DataFrame, mut func: F) -> Result<DataFrame>
    where
        F: FnMut(&DataFrame) -> Result<DataFrame>,
    {
        if self.levels(data).is_empty() {
            return Ok(func(data)?.reorder_columns(&data.column_names()));
        }

        let mut parts = Vec::new();
        for group in self.groups(data) {
            if group.rows.is_empty() && !self.allow_empty {
                continue;
            }
            let mut res = func(&data.take(&group.rows))?;
            let n = res.nrow();
            for (var, value) in group.key {
                res.add_column(var, vec![value; n])?;
            }
            parts.push(res);
        }

        let refs: Vec<&DataFrame> = parts.iter().collect();
        Ok(DataFrame::concat(&refs, true).reorder_columns(&data.column_names()))
    }

    /// Reduce `var` within every level combination.
    ///
    /// The result has one row per combination in the full level product;
    /// combinations without rows get `Null`.
    ///
    /// # Errors
    ///
    /// Fails when no grouping variable or `var` itself is missing.
    pub fn agg<F>(&self, data: &DataFrame, var: &str, func: F) -> Result<DataFrame>
    where
        F: Fn(&[DataValue]) -> DataValue,
    {
        let levels = self.levels(data);
        if levels.is_empty() {
            return Err(Error::config("no grouping variables are present in the data"));
        }
        let values = data.column(var).ok_or_else(|| Error::MissingVariable {
            var: var.to_string(),
            key: var.to_string(),
        })?;

        let partitions = partition(data, &levels);
        let sizes: Vec<usize> = levels.iter().map(|(_, lv)| lv.len()).collect();
        let combos = product(&sizes);

        let mut key_columns: Vec<Vec<DataValue>> = vec![Vec::with_capacity(combos.len()); levels.len()];
        let mut reduced = Vec::with_capacity(combos.len());
        for idx in &combos {
            for (col, ((_, lv), &i)) in key_columns.iter_mut().zip(levels.iter().zip(idx)) {
                col.push(lv[i].clone());
            }
            reduced.push(match partitions.get(idx) {
                Some(rows) => {
                    let subset: Vec<DataValue> = rows.iter().map(|&r| values[r].clone()).collect();
                    func(&subset)
                }
                None => DataValue::Null,
            });
        }

        let mut out = DataFrame::new();
        for ((name, _), col) in levels.iter().zip(key_columns) {
            out.add_column(name.clone(), col)?;
        }
        out.add_column(var, reduced)?;
        Ok(out.reorder_columns(&data.column_names()))
    }
}

/// Map each row to its level-index key; BTreeMap order is the product order.
fn partition(data: &DataFrame, levels: &[(String, Vec<DataValue>)]) -> BTreeMap<Vec<usize>, Vec<usize>> {
    let lookups: Vec<(&[DataValue], HashMap<&DataValue, usize>)> = levels
        .iter()
        .filter_map(|(var, lv)| {
            let col = data.column(var)?;
            Some((col, lv.iter().enumerate().map(|(i, v)| (v, i)).collect()))
        })
        .collect();

    let mut partitions: BTreeMap<Vec<usize>, Vec<usize>> = BTreeMap::new();
    'rows: for row in 0..data.nrow() {
        let mut key = Vec::with_capacity(lookups.len());
        for (col, lookup) in &lookups {
            match lookup.get(&col[row]) {
                Some(&i) => key.push(i),
                None => continue 'rows,
            }
        }
        partitions.entry(key).or_default().push(row);
    }
    partitions
}

/// Every index combination for the given level counts, last index fastest.
fn product(sizes: &[usize]) -> Vec<Vec<usize>> {
    if sizes.iter().any(|&n| n == 0) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx = vec![0; sizes.len()];
    loop {
        out.push(idx.clone());
        let mut pos = sizes.len();
        loop {
            if pos == 0 {
                return out;
            }
            pos -= 1;
            idx[pos] += 1;
            if idx[pos] < sizes[pos] {
                break;
            }
            idx[pos] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("g", ["b", "a", "b", "a", "c"])
            .unwrap()
            .with_column("h", [1.0, 1.0, 2.0, 1.0, 2.0])
            .unwrap()
            .with_column("v", [1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
    }

    fn sum(values: &[DataValue]) -> DataValue {
        DataValue::Number(values.iter().filter_map(DataValue::as_f64).sum())
    }

    #[test]
    fn test_product_order() {
        assert_eq!(product(&[2, 2]), vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert!(product(&[3, 0]).is_empty());
        assert_eq!(product(&[]), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_groups_follow_level_order() {
        let groups = GroupBy::new(["g"]).groups(&frame());
        let keys: Vec<String> = groups.iter().map(|g| g.key[0].1.to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(groups[0].rows, vec![0, 2]);
    }

    #[test]
    fn test_groups_explicit_order() {
        let order = vec![DataValue::from("c"), DataValue::from("a"), DataValue::from("b")];
        let groups = GroupBy::with_orders(vec![("g".to_string(), Some(order))]).groups(&frame());
        let keys: Vec<String> = groups.iter().map(|g| g.key[0].1.to_string()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_groups_allow_empty() {
        let grouper = GroupBy::new(["g", "h"]);
        assert_eq!(grouper.groups(&frame()).len(), 4);
        let all = grouper.allow_empty(true).groups(&frame());
        assert_eq!(all.len(), 6);
        assert!(all.iter().any(|g| g.rows.is_empty()));
    }

    #[test]
    fn test_groups_ignores_absent_vars() {
        let groups = GroupBy::new(["missing", "g"]).groups(&frame());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key.len(), 1);
    }

    #[test]
    fn test_apply_assigns_keys_and_orders_columns() {
        let out = GroupBy::new(["g"])
            .apply(&frame(), |df| DataFrame::new().with_column("v", [sum(df.column("v").unwrap())]))
            .unwrap();
        assert_eq!(out.column_names(), vec!["g", "v"]);
        assert_eq!(out.column_f64("v").unwrap(), vec![4.0, 6.0, 5.0]);
        assert_eq!(out.index(), &[0, 1, 2]);
    }

    #[test]
    fn test_apply_without_groupers_runs_once() {
        let mut calls = 0;
        let out = GroupBy::new(["missing"])
            .apply(&frame(), |df| {
                calls += 1;
                Ok(df.clone())
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(out.nrow(), 5);
    }

    #[test]
    fn test_agg_reindexes_full_product() {
        let out = GroupBy::new(["g", "h"]).agg(&frame(), "v", sum).unwrap();
        assert_eq!(out.nrow(), 6);
        assert_eq!(out.column_names(), vec!["g", "h", "v"]);
        // (b, 1) then (b, 2)
        assert_eq!(out.value("v", 0), Some(&DataValue::from(1.0)));
        assert_eq!(out.value("v", 1), Some(&DataValue::from(3.0)));
        // (c, 1) has no rows
        assert!(out.value("v", 4).unwrap().is_null());
    }

    #[test]
    fn test_agg_requires_groupers() {
        assert!(GroupBy::new(["missing"]).agg(&frame(), "v", sum).is_err());
    }

    #[test]
    fn test_agg_missing_value_column() {
        let err = GroupBy::new(["g"]).agg(&frame(), "w", sum).unwrap_err();
        assert!(matches!(err, Error::MissingVariable { .. }));
    }
}
