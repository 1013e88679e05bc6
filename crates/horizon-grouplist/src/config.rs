//! Grouping configuration snapshots and model construction.
//!
//! A [`GroupingConfig`] captures every column, role, order, label and pixmap
//! setting of a [`GroupModel`], so a view can persist how the user grouped
//! and sorted a list and restore it later:
//!
//! ```ignore
//! let saved = model.config().to_toml()?;
//! // ... later
//! model.apply_config(&GroupingConfig::from_toml(&saved)?)?;
//! ```
//!
//! Comparators and labelers are code and are not part of the snapshot.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    ColumnRole, CompareFn, GroupLabelFn, GroupModel, ItemData, ItemModel, ItemRole, SortOrder,
};

fn default_pixmap_role() -> ItemRole {
    ItemRole::Decoration
}

fn default_labels() -> Vec<ColumnRole> {
    vec![ColumnRole::default()]
}

/// Serializable settings of a [`GroupModel`].
///
/// Columns set to `None` disable the feature: no grouping (one ungrouped
/// group), no sorting (provider order), no pixmaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_column: Option<usize>,
    pub grouping_role: ItemRole,
    pub grouping_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting_column: Option<usize>,
    pub sorting_role: ItemRole,
    pub sorting_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixmap_column: Option<usize>,
    #[serde(default = "default_pixmap_role")]
    pub pixmap_role: ItemRole,
    /// Label columns; the first entry is the primary label.
    #[serde(default = "default_labels")]
    pub labels: Vec<ColumnRole>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            grouping_column: None,
            grouping_role: ItemRole::Display,
            grouping_order: SortOrder::Ascending,
            sorting_column: None,
            sorting_role: ItemRole::Display,
            sorting_order: SortOrder::Ascending,
            pixmap_column: None,
            pixmap_role: default_pixmap_role(),
            labels: default_labels(),
        }
    }
}

impl GroupingConfig {
    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parses from TOML. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Builder pattern for creating grouping models.
///
/// # Example
///
/// ```ignore
/// let model = GroupModelBuilder::new(provider)
///     .grouping_column(0)
///     .sorting_column(2)
///     .sorting_order(SortOrder::Descending)
///     .label(1, ItemRole::Display)
///     .build()?;
/// ```
pub struct GroupModelBuilder {
    provider: Arc<dyn ItemModel>,
    config: GroupingConfig,
    grouping_fn: Option<CompareFn>,
    sorting_fn: Option<CompareFn>,
    labeler: Option<GroupLabelFn>,
}

impl GroupModelBuilder {
    /// Creates a new builder over the given provider.
    pub fn new(provider: Arc<dyn ItemModel>) -> Self {
        Self {
            provider,
            config: GroupingConfig::default(),
            grouping_fn: None,
            sorting_fn: None,
            labeler: None,
        }
    }

    /// Starts from a saved configuration.
    pub fn config(mut self, config: GroupingConfig) -> Self {
        self.config = config;
        self
    }

    /// Groups rows by this column.
    pub fn grouping_column(mut self, column: usize) -> Self {
        self.config.grouping_column = Some(column);
        self
    }

    /// Reads group keys under this role.
    pub fn grouping_role(mut self, role: ItemRole) -> Self {
        self.config.grouping_role = role;
        self
    }

    /// Presents groups in this order.
    pub fn grouping_order(mut self, order: SortOrder) -> Self {
        self.config.grouping_order = order;
        self
    }

    /// Sorts rows inside groups by this column.
    pub fn sorting_column(mut self, column: usize) -> Self {
        self.config.sorting_column = Some(column);
        self
    }

    /// Reads sort keys under this role.
    pub fn sorting_role(mut self, role: ItemRole) -> Self {
        self.config.sorting_role = role;
        self
    }

    /// Presents rows inside groups in this order.
    pub fn sorting_order(mut self, order: SortOrder) -> Self {
        self.config.sorting_order = order;
        self
    }

    /// Reads row pixmaps from this column and role.
    pub fn pixmap(mut self, column: usize, role: ItemRole) -> Self {
        self.config.pixmap_column = Some(column);
        self.config.pixmap_role = role;
        self
    }

    /// Adds an additional label.
    pub fn label(mut self, column: usize, role: ItemRole) -> Self {
        self.config.labels.push(ColumnRole::new(column, role));
        self
    }

    /// Uses a custom grouping comparator.
    pub fn grouping_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ItemModel, usize, &ItemData, &ItemData) -> Ordering + Send + Sync + 'static,
    {
        self.grouping_fn = Some(Arc::new(f));
        self
    }

    /// Uses a custom sorting comparator.
    pub fn sorting_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ItemModel, usize, &ItemData, &ItemData) -> Ordering + Send + Sync + 'static,
    {
        self.sorting_fn = Some(Arc::new(f));
        self
    }

    /// Uses a custom group labeler.
    pub fn group_labeler<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ItemModel, usize, &ItemData) -> String + Send + Sync + 'static,
    {
        self.labeler = Some(Arc::new(f));
        self
    }

    /// Builds the model and its groups.
    ///
    /// Fails if the configuration does not fit the provider.
    pub fn build(self) -> Result<Arc<GroupModel>> {
        let model = GroupModel::new();
        if let Some(compare) = self.grouping_fn {
            model.replace_grouping_func(compare);
        }
        if let Some(compare) = self.sorting_fn {
            model.replace_sorting_func(compare);
        }
        if self.labeler.is_some() {
            model.replace_group_labeler(self.labeler);
        }
        model.install(Some(Some(self.provider)), self.config)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::SimpleTableModel;

    #[test]
    fn test_default_config() {
        let config = GroupingConfig::default();
        assert_eq!(config.labels, vec![ColumnRole::new(0, ItemRole::Display)]);
        assert_eq!(config.pixmap_role, ItemRole::Decoration);
        assert!(config.grouping_column.is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let config = GroupingConfig {
            grouping_column: Some(2),
            sorting_column: Some(1),
            sorting_order: SortOrder::Descending,
            labels: vec![ColumnRole::default(), ColumnRole::new(3, ItemRole::User(4))],
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"descending\""));
        assert_eq!(GroupingConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GroupingConfig {
            grouping_column: Some(0),
            grouping_order: SortOrder::Descending,
            pixmap_column: Some(4),
            labels: vec![ColumnRole::default(), ColumnRole::new(1, ItemRole::ToolTip)],
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert!(!text.contains("sorting_column"));
        assert_eq!(GroupingConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_documents_use_defaults() {
        let config = GroupingConfig::from_toml("grouping_column = 1\n").unwrap();
        assert_eq!(config.grouping_column, Some(1));
        assert_eq!(config.labels, default_labels());

        let config = GroupingConfig::from_json(r#"{"sorting_order": "descending"}"#).unwrap();
        assert_eq!(config.sorting_order, SortOrder::Descending);
        assert_eq!(config.pixmap_role, ItemRole::Decoration);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            GroupingConfig::from_json("{"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GroupingConfig::from_toml("grouping_column = \"x\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builder() {
        let provider = Arc::new(SimpleTableModel::from_data(vec![
            vec![ItemData::from("x"), ItemData::from(2)],
            vec![ItemData::from("y"), ItemData::from(1)],
            vec![ItemData::from("x"), ItemData::from(1)],
        ]));
        let model = GroupModelBuilder::new(provider)
            .grouping_column(0)
            .sorting_column(1)
            .grouping_order(SortOrder::Descending)
            .label(1, ItemRole::Display)
            .group_labeler(|_, _, key| format!("Key {key}"))
            .build()
            .unwrap();

        assert_eq!(model.group_count(), 2);
        assert_eq!(model.group_label(0).as_deref(), Some("Key y"));
        assert_eq!(model.group(1).unwrap().mapping(), vec![2, 0]);
        assert_eq!(model.label_count(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let provider = Arc::new(SimpleTableModel::from_column(["a"]));
        let result = GroupModel::builder(provider).sorting_column(3).build();
        assert_eq!(result.err(), Some(Error::column_out_of_range(3, 1)));
    }
}
