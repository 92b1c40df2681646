//! Tabular data for plot specifications.
//!
//! [`DataFrame`] is a small ordered, index-labelled column store. [`PlotData`]
//! wraps one together with the semantic variable bookkeeping the resolution
//! pipeline needs: a display name and an identity token per variable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::error::{Error, Result};

// ============================================================================
// Values
// ============================================================================

/// A value in a data frame.
///
/// Values are totally ordered so they can key groups: `Null` sorts first,
/// then numbers (by value), then text (lexically).
#[derive(Debug, Clone, Default)]
pub enum DataValue {
    /// A numeric value.
    Number(f64),
    /// A text value.
    Text(String),
    /// A missing value.
    #[default]
    Null,
}

impl DataValue {
    /// Get as f64, or None if not a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True for [`DataValue::Null`] and NaN numbers.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            DataValue::Null => true,
            DataValue::Number(n) => n.is_nan(),
            DataValue::Text(_) => false,
        }
    }

    /// True for numeric values.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, DataValue::Number(_))
    }

    fn rank(&self) -> u8 {
        match self {
            DataValue::Null => 0,
            DataValue::Number(_) => 1,
            DataValue::Text(_) => 2,
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DataValue {}

impl PartialOrd for DataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DataValue::Number(a), DataValue::Number(b)) => {
                if a == b {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (DataValue::Text(a), DataValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            // 0.0 and -0.0 compare equal, so they must hash alike
            DataValue::Number(n) => {
                let n = if *n == 0.0 { 0.0 } else { *n };
                n.to_bits().hash(state);
            }
            DataValue::Text(s) => s.hash(state),
            DataValue::Null => {}
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            DataValue::Number(n) => write!(f, "{n}"),
            DataValue::Text(s) => f.write_str(s),
            DataValue::Null => Ok(()),
        }
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<f32> for DataValue {
    fn from(v: f32) -> Self {
        DataValue::Number(f64::from(v))
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Number(f64::from(v))
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DataValue::Null, Into::into)
    }
}

/// Resolve the category order of a column.
///
/// An explicit `order` wins. Otherwise numeric columns are sorted and any
/// other column keeps first-appearance order. Missing values never appear.
#[must_use]
pub fn categorical_order(values: &[DataValue], order: Option<&[DataValue]>) -> Vec<DataValue> {
    if let Some(order) = order {
        return order.to_vec();
    }

    let mut seen = HashSet::new();
    let mut levels: Vec<DataValue> = values
        .iter()
        .filter(|v| !v.is_null() && seen.insert(*v))
        .cloned()
        .collect();

    if levels.iter().all(DataValue::is_number) {
        levels.sort();
    }
    levels
}

// ============================================================================
// Data frame
// ============================================================================

/// A columnar data frame with ordered columns and labelled rows.
///
/// Row labels (the index) survive slicing, so frames derived from the same
/// source can be aligned positionally by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<(String, Vec<DataValue>)>,
    index: Vec<usize>,
}

impl DataFrame {
    /// Create a new empty data frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns have different lengths.
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<DataValue>)>,
    {
        let mut df = Self::new();
        for (name, values) in columns {
            df.add_column(name, values)?;
        }
        Ok(df)
    }

    /// Add a column built from anything convertible to [`DataValue`].
    ///
    /// # Errors
    ///
    /// Returns an error if the column length does not match the frame.
    pub fn with_column<N, I, V>(mut self, name: N, values: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        self.add_column(name, values.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Replace the row labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the label count does not match the row count.
    pub fn with_index(mut self, index: Vec<usize>) -> Result<Self> {
        if !self.columns.is_empty() && index.len() != self.nrow() {
            return Err(Error::LengthMismatch {
                var: "index".to_string(),
                expected: self.nrow(),
                found: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Add or replace a column.
    ///
    /// The first column added to an empty frame defines the row count.
    ///
    /// # Errors
    ///
    /// Returns an error if the column length does not match the frame.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<DataValue>) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            if self.index.len() != values.len() {
                self.index = (0..values.len()).collect();
            }
        } else if values.len() != self.nrow() {
            return Err(Error::LengthMismatch {
                var: name,
                expected: self.nrow(),
                found: values.len(),
            });
        }

        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Get a column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[DataValue]> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    /// Get a column as f64 values, with NaN for anything non-numeric.
    #[must_use]
    pub fn column_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|col| col.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
    }

    /// Get a single cell.
    #[must_use]
    pub fn value(&self, name: &str, row: usize) -> Option<&DataValue> {
        self.column(name).and_then(|col| col.get(row))
    }

    /// Get number of rows.
    #[must_use]
    pub fn nrow(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.index.len()
        }
    }

    /// Get number of columns.
    #[must_use]
    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    /// True when the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nrow() == 0
    }

    /// Check if a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Get column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Get the row labels.
    #[must_use]
    pub fn index(&self) -> &[usize] {
        if self.columns.is_empty() {
            &[]
        } else {
            &self.index
        }
    }

    /// Select rows by position, keeping their labels.
    #[must_use]
    pub fn take(&self, positions: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(n, v)| (n.clone(), positions.iter().map(|&p| v[p].clone()).collect()))
            .collect();
        let index = positions.iter().map(|&p| self.index[p]).collect();
        Self { columns, index }
    }

    /// Positions of the rows matching a predicate over the row position.
    #[must_use]
    pub fn positions_where(&self, mut keep: impl FnMut(usize) -> bool) -> Vec<usize> {
        (0..self.nrow()).filter(|&i| keep(i)).collect()
    }

    /// Keep only the named columns that exist, in frame order.
    #[must_use]
    pub fn select(&self, names: &[&str]) -> Self {
        let columns: Vec<_> =
            self.columns.iter().filter(|(n, _)| names.contains(&n.as_str())).cloned().collect();
        let index = if columns.is_empty() { Vec::new() } else { self.index.clone() };
        Self { columns, index }
    }

    /// Drop the named columns (missing names are ignored).
    #[must_use]
    pub fn drop_columns(&self, names: &[&str]) -> Self {
        let columns: Vec<_> =
            self.columns.iter().filter(|(n, _)| !names.contains(&n.as_str())).cloned().collect();
        let index = if columns.is_empty() { Vec::new() } else { self.index.clone() };
        Self { columns, index }
    }

    /// Remove a column in place, returning its values.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<DataValue>> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        let (_, values) = self.columns.remove(pos);
        if self.columns.is_empty() {
            self.index.clear();
        }
        Some(values)
    }

    /// Rename a column in place, replacing any column already called `to`.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if from == to || !self.has_column(from) {
            return;
        }
        let existing = self.columns.iter().position(|(n, _)| n == to);
        if let Some(pos) = existing {
            self.columns.remove(pos);
        }
        if let Some((name, _)) = self.columns.iter_mut().find(|(n, _)| n == from) {
            *name = to.to_string();
        }
    }

    /// Reorder columns so those named in `first` lead, in that order.
    #[must_use]
    pub fn reorder_columns(&self, first: &[&str]) -> Self {
        let mut columns: Vec<(String, Vec<DataValue>)> = first
            .iter()
            .filter_map(|name| self.columns.iter().find(|(n, _)| n == name).cloned())
            .collect();
        columns.extend(self.columns.iter().filter(|(n, _)| !first.contains(&n.as_str())).cloned());
        Self { columns, index: self.index.clone() }
    }

    /// Stack frames vertically.
    ///
    /// Columns are the union in first-seen order; cells a frame lacks are
    /// `Null`. With `ignore_index` the result is relabelled `0..n`.
    #[must_use]
    pub fn concat(frames: &[&DataFrame], ignore_index: bool) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for frame in frames {
            for name in frame.column_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let total: usize = frames.iter().map(|f| f.nrow()).sum();
        let columns: Vec<(String, Vec<DataValue>)> = names
            .iter()
            .map(|&name| {
                let mut values = Vec::with_capacity(total);
                for frame in frames {
                    match frame.column(name) {
                        Some(col) => values.extend_from_slice(col),
                        None => values.extend(std::iter::repeat(DataValue::Null).take(frame.nrow())),
                    }
                }
                (name.to_string(), values)
            })
            .collect();

        let index = if columns.is_empty() {
            Vec::new()
        } else if ignore_index {
            (0..total).collect()
        } else {
            frames.iter().flat_map(|f| f.index().iter().copied()).collect()
        };
        Self { columns, index }
    }
}

// ============================================================================
// Variable bindings
// ============================================================================

static NEXT_VECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// A data vector bound directly to a variable instead of by column key.
///
/// Every vector gets a process-unique identity when created; clones share it,
/// which is how two layers binding the same vector are recognised.
#[derive(Debug, Clone)]
pub struct Vector {
    id: u64,
    name: Option<String>,
    values: Arc<[DataValue]>,
}

impl Vector {
    /// Create a new vector with a fresh identity.
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DataValue>,
    {
        Self {
            id: NEXT_VECTOR_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Identity token.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The values.
    #[must_use]
    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How a semantic variable is bound to data.
#[derive(Debug, Clone)]
pub enum VariableSpec {
    /// A column key in the data source.
    Key(String),
    /// A vector supplied directly.
    Vector(Vector),
    /// Explicitly unbound: removes an inherited binding.
    Unset,
}

impl From<&str> for VariableSpec {
    fn from(key: &str) -> Self {
        VariableSpec::Key(key.to_string())
    }
}

impl From<String> for VariableSpec {
    fn from(key: String) -> Self {
        VariableSpec::Key(key)
    }
}

impl From<Vector> for VariableSpec {
    fn from(v: Vector) -> Self {
        VariableSpec::Vector(v)
    }
}

/// Ordered variable name to binding list.
pub type Bindings = Vec<(String, VariableSpec)>;

/// Token identifying the data behind a variable, independent of its role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableId {
    /// Bound by column key.
    Key(String),
    /// Bound by vector identity.
    Vector(u64),
}

// ============================================================================
// Plot data
// ============================================================================

/// Key of a per-pairing frame: the `(x, y)` coordinate variables.
pub type PairKey = (String, String);

/// Layer table storage: one flat table or one table per paired `(x, y)`.
#[derive(Debug, Clone)]
pub enum Frames {
    /// A single table.
    Flat(DataFrame),
    /// Stat results computed separately for each `(x, y)` pairing.
    Keyed(Vec<(PairKey, DataFrame)>),
}

impl Frames {
    /// The single table, if not split by pairing.
    #[must_use]
    pub fn flat(&self) -> Option<&DataFrame> {
        match self {
            Frames::Flat(df) => Some(df),
            Frames::Keyed(_) => None,
        }
    }

    /// Mutable access to the single table.
    pub fn flat_mut(&mut self) -> Option<&mut DataFrame> {
        match self {
            Frames::Flat(df) => Some(df),
            Frames::Keyed(_) => None,
        }
    }

    /// The table for one pairing.
    #[must_use]
    pub fn get(&self, key: &PairKey) -> Option<&DataFrame> {
        match self {
            Frames::Flat(_) => None,
            Frames::Keyed(frames) => frames.iter().find(|(k, _)| k == key).map(|(_, df)| df),
        }
    }

    /// All tables.
    #[must_use]
    pub fn all(&self) -> Vec<&DataFrame> {
        match self {
            Frames::Flat(df) => vec![df],
            Frames::Keyed(frames) => frames.iter().map(|(_, df)| df).collect(),
        }
    }

    /// True if any table has the column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.all().iter().any(|df| df.has_column(name))
    }
}

/// A table of semantic variables plus their names and identities.
#[derive(Debug, Clone)]
pub struct PlotData {
    frame: Frames,
    names: BTreeMap<String, Option<String>>,
    ids: BTreeMap<String, VariableId>,
    source_data: Option<Arc<DataFrame>>,
    source_vars: Bindings,
}

impl Default for PlotData {
    fn default() -> Self {
        Self {
            frame: Frames::Flat(DataFrame::new()),
            names: BTreeMap::new(),
            ids: BTreeMap::new(),
            source_data: None,
            source_vars: Vec::new(),
        }
    }
}

impl PlotData {
    /// Resolve variable bindings against an optional data source.
    ///
    /// # Errors
    ///
    /// Fails if a key is not a column of `data` or a vector does not match
    /// the row count.
    pub fn new(data: Option<Arc<DataFrame>>, variables: &[(String, VariableSpec)]) -> Result<Self> {
        let mut frame = DataFrame::new();
        let mut names = BTreeMap::new();
        let mut ids = BTreeMap::new();

        for (var, spec) in variables {
            match spec {
                VariableSpec::Unset => continue,
                VariableSpec::Key(key) => {
                    let values = data.as_ref().and_then(|d| d.column(key)).ok_or_else(|| {
                        Error::MissingVariable { var: var.clone(), key: key.clone() }
                    })?;
                    frame.add_column(var.clone(), values.to_vec())?;
                    names.insert(var.clone(), Some(key.clone()));
                    ids.insert(var.clone(), VariableId::Key(key.clone()));
                }
                VariableSpec::Vector(vector) => {
                    let expected = match &data {
                        Some(d) if d.ncol() > 0 => Some(d.nrow()),
                        _ if frame.ncol() > 0 => Some(frame.nrow()),
                        _ => None,
                    };
                    if let Some(expected) = expected.filter(|&n| n != vector.len()) {
                        return Err(Error::LengthMismatch {
                            var: var.clone(),
                            expected,
                            found: vector.len(),
                        });
                    }
                    frame.add_column(var.clone(), vector.values().to_vec())?;
                    names.insert(var.clone(), vector.name().map(str::to_string));
                    ids.insert(var.clone(), VariableId::Vector(vector.id()));
                }
            }
        }

        if let Some(source) = data.as_ref().filter(|d| d.ncol() > 0 && frame.ncol() > 0) {
            frame = frame.with_index(source.index().to_vec())?;
        }

        Ok(Self {
            frame: Frames::Flat(frame),
            names,
            ids,
            source_data: data,
            source_vars: variables.to_vec(),
        })
    }

    /// Join another source and bindings onto this data.
    ///
    /// A missing source falls back to this data's source and empty bindings
    /// fall back to this data's bindings. New bindings replace inherited
    /// columns of the same name, and [`VariableSpec::Unset`] removes them.
    /// Rows are aligned by label, so the inherited and new columns must
    /// share an index.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable bindings or when the row labels disagree.
    pub fn join(
        &self,
        data: Option<Arc<DataFrame>>,
        variables: &[(String, VariableSpec)],
    ) -> Result<Self> {
        let data = data.or_else(|| self.source_data.clone());
        let variables = if variables.is_empty() { self.source_vars.as_slice() } else { variables };
        let disinherit: Vec<&str> = variables
            .iter()
            .filter(|(_, spec)| matches!(spec, VariableSpec::Unset))
            .map(|(var, _)| var.as_str())
            .collect();

        let mut new = Self::new(data, variables)?;
        let base = self
            .frame
            .flat()
            .ok_or_else(|| Error::config("cannot join onto frames already split by pairing"))?;
        let added = new.frame.flat().cloned().unwrap_or_default();

        let drop: Vec<&str> = base
            .column_names()
            .into_iter()
            .filter(|c| added.has_column(c) || disinherit.contains(c))
            .collect();
        let kept = base.drop_columns(&drop);

        let frame = if kept.ncol() == 0 {
            added
        } else if added.ncol() == 0 {
            kept
        } else {
            if kept.index() != added.index() {
                let var = added.column_names().first().map_or_else(String::new, |s| (*s).to_string());
                return Err(Error::LengthMismatch {
                    var,
                    expected: kept.nrow(),
                    found: added.nrow(),
                });
            }
            let mut merged = kept;
            for (name, values) in added.columns {
                merged.add_column(name, values)?;
            }
            merged
        };

        let mut names: BTreeMap<_, _> = self
            .names
            .iter()
            .filter(|(k, _)| !disinherit.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        names.append(&mut new.names);
        let mut ids: BTreeMap<_, _> = self
            .ids
            .iter()
            .filter(|(k, _)| !disinherit.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        ids.append(&mut new.ids);

        Ok(Self {
            frame: Frames::Flat(frame),
            names,
            ids,
            source_data: self.source_data.clone(),
            source_vars: self.source_vars.clone(),
        })
    }

    /// The table(s).
    #[must_use]
    pub fn frame(&self) -> &Frames {
        &self.frame
    }

    /// Mutable table access.
    pub fn frame_mut(&mut self) -> &mut Frames {
        &mut self.frame
    }

    /// Replace the table(s).
    pub fn set_frame(&mut self, frame: Frames) {
        self.frame = frame;
    }

    /// Display name of a variable, if it has one.
    #[must_use]
    pub fn name(&self, var: &str) -> Option<&str> {
        self.names.get(var).and_then(|n| n.as_deref())
    }

    /// All display names, including variables without one.
    #[must_use]
    pub fn names(&self) -> &BTreeMap<String, Option<String>> {
        &self.names
    }

    /// Identity token of a variable.
    #[must_use]
    pub fn id(&self, var: &str) -> Option<&VariableId> {
        self.ids.get(var)
    }

    /// True if any table holds the variable.
    #[must_use]
    pub fn contains(&self, var: &str) -> bool {
        self.frame.has_column(var)
    }

    /// The data source the bindings were resolved against.
    #[must_use]
    pub fn source_data(&self) -> Option<&Arc<DataFrame>> {
        self.source_data.as_ref()
    }

    /// The bindings as originally given.
    #[must_use]
    pub fn source_vars(&self) -> &[(String, VariableSpec)] {
        &self.source_vars
    }
}
