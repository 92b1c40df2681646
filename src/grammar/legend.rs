//! Legend contents collected across layers.
//!
//! Each layer contributes one entry per distinct data identity among its
//! legend-bearing variables. Entries with the same title and identity are
//! merged so overlaid layers share one legend block.

use super::data::{PlotData, VariableId};
use super::mark::Mark;
use crate::render::{Artist, LegendBlock};
use crate::scale::Scales;

/// Identity of a legend block: its title and the data it represents.
pub type LegendKey = (Option<String>, VariableId);

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: LegendKey,
    artists: Vec<Artist>,
    labels: Vec<String>,
}

/// Ordered legend entries from every drawn layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegendContents {
    entries: Vec<Entry>,
}

impl LegendContents {
    /// Empty contents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of per-layer entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no layer contributed an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the legend entries of one layer.
    ///
    /// Variables of the layer that share a data identity are represented by
    /// a single entry whose artists show all of them.
    pub fn update(&mut self, data: &PlotData, mark: &dyn Mark, scales: &Scales) {
        let mut legend_vars: Vec<&str> = Vec::new();
        for frame in data.frame().all() {
            for var in frame.column_names() {
                if scales.contains_key(var) && !legend_vars.contains(&var) {
                    legend_vars.push(var);
                }
            }
        }

        let mut schema: Vec<(LegendKey, Vec<String>, &crate::scale::Legend)> = Vec::new();
        for var in legend_vars {
            let Some(legend) = scales.get(var).and_then(|s| s.legend()) else {
                continue;
            };
            let id = data.id(var).cloned().unwrap_or_else(|| VariableId::Key(var.to_string()));
            match schema.iter_mut().find(|((_, part_id), _, _)| *part_id == id) {
                Some((_, vars, _)) => vars.push(var.to_string()),
                None => {
                    let title = data.name(var).map(str::to_string);
                    schema.push(((title, id), vec![var.to_string()], legend));
                }
            }
        }

        for (key, variables, legend) in schema {
            let artists: Vec<Artist> =
                legend.values.iter().map(|value| mark.legend_artist(&variables, value, scales)).collect();
            if !artists.is_empty() {
                self.entries.push(Entry { key, artists, labels: legend.labels.clone() });
            }
        }
    }

    /// Merge entries by key into legend blocks, in first-seen order.
    ///
    /// Artists of merged entries are overlaid position by position.
    #[must_use]
    pub fn blocks(&self) -> Vec<LegendBlock> {
        let mut merged: Vec<(&LegendKey, Vec<Artist>, &[String])> = Vec::new();
        for entry in &self.entries {
            match merged.iter_mut().find(|(key, _, _)| **key == entry.key) {
                Some((_, artists, _)) => {
                    for (i, artist) in entry.artists.iter().enumerate() {
                        match artists.get_mut(i) {
                            Some(existing) => *existing = existing.clone().overlay(artist.clone()),
                            None => artists.push(artist.clone()),
                        }
                    }
                }
                None => merged.push((&entry.key, entry.artists.clone(), &entry.labels)),
            }
        }

        merged
            .into_iter()
            .map(|((title, _), artists, labels)| LegendBlock {
                title: title.clone(),
                entries: artists.into_iter().zip(labels.iter().cloned()).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::data::{DataFrame, DataValue, VariableSpec};
    use crate::grammar::geom::{Bar, Dot};
    use crate::grammar::properties::Property;
    use crate::scale::Scale;
    use std::sync::Arc;

    fn layer(bindings: &[(&str, &str)]) -> PlotData {
        let source = DataFrame::new()
            .with_column("a", [1.0, 2.0])
            .unwrap()
            .with_column("g", ["p", "q"])
            .unwrap()
            .with_column("h", ["r", "s"])
            .unwrap();
        let vars: Vec<(String, VariableSpec)> =
            bindings.iter().map(|(v, k)| ((*v).to_string(), VariableSpec::from(*k))).collect();
        PlotData::new(Some(Arc::new(source)), &vars).unwrap()
    }

    fn scales() -> Scales {
        let levels = vec![DataValue::from("p"), DataValue::from("q")];
        let mut scales = Scales::new();
        scales.insert("color".into(), Scale::nominal(Property::Color, levels.clone()));
        scales.insert("marker".into(), Scale::nominal(Property::Marker, levels));
        scales.insert("x".into(), Scale::nominal(Property::Coordinate(crate::grammar::properties::Axis::X), vec![]));
        scales
    }

    #[test]
    fn test_same_column_across_layers_merges() {
        let mut contents = LegendContents::new();
        let data = layer(&[("x", "a"), ("color", "g")]);
        contents.update(&data, &Dot::new(), &scales());
        contents.update(&data, &Bar::new(), &scales());
        assert_eq!(contents.len(), 2);

        let blocks = contents.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title.as_deref(), Some("g"));
        assert_eq!(blocks[0].entries.len(), 2);
        assert!(matches!(&blocks[0].entries[0].0, Artist::Composite(parts) if parts.len() == 2));
        assert_eq!(blocks[0].entries[1].1, "q");
    }

    #[test]
    fn test_variables_sharing_data_form_one_entry() {
        let mut contents = LegendContents::new();
        contents.update(&layer(&[("color", "g"), ("marker", "g")]), &Dot::new(), &scales());
        assert_eq!(contents.len(), 1);
        assert_eq!(contents.blocks().len(), 1);
    }

    #[test]
    fn test_distinct_columns_stay_separate_in_order() {
        let mut contents = LegendContents::new();
        contents.update(&layer(&[("marker", "h")]), &Dot::new(), &scales());
        contents.update(&layer(&[("color", "g")]), &Dot::new(), &scales());
        let titles: Vec<Option<String>> = contents.blocks().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec![Some("h".to_string()), Some("g".to_string())]);
    }

    #[test]
    fn test_coordinate_scales_have_no_legend() {
        let mut contents = LegendContents::new();
        contents.update(&layer(&[("x", "a")]), &Dot::new(), &scales());
        assert!(contents.is_empty());
    }
}
