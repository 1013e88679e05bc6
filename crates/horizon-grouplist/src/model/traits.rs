//! Core traits for data providers.
//!
//! This module defines the trait a tabular data source implements so that a
//! [`GroupModel`](super::GroupModel) can partition it, and the signals the
//! source emits to keep the grouping consistent.

use horizon_grouplist_core::Signal;
use serde::{Deserialize, Serialize};

use super::index::CellIndex;
use super::role::{ItemData, ItemRole};

/// Direction used when presenting groups or rows within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Maps a presentation index onto a stored index for a sequence of
    /// `count` elements kept in ascending order.
    ///
    /// Returns `None` if `index` is out of range.
    #[inline]
    pub fn map_index(self, index: usize, count: usize) -> Option<usize> {
        if index >= count {
            return None;
        }
        Some(match self {
            SortOrder::Ascending => index,
            SortOrder::Descending => count - 1 - index,
        })
    }
}

/// A flat table of cells, read by row, column and role.
///
/// This is the data provider protocol: a [`GroupModel`](super::GroupModel)
/// reads grouping keys, sort keys, labels and pixmaps through
/// [`data`](ItemModel::data) and follows the provider's [`ModelSignals`].
/// Each [`Group`](super::Group) implements it too, so a view shows one bucket
/// like any other list.
///
/// Providers must emit the matching signal after every mutation, otherwise
/// groups go stale. Providers that allow deletion override
/// [`remove_row`](ItemModel::remove_row).
///
/// # Example
///
/// ```ignore
/// use horizon_grouplist::model::{ItemData, ItemModel, ItemRole, ModelSignals};
///
/// struct Names {
///     items: Vec<String>,
///     signals: ModelSignals,
/// }
///
/// impl ItemModel for Names {
///     fn row_count(&self) -> usize {
///         self.items.len()
///     }
///
///     fn column_count(&self) -> usize {
///         1
///     }
///
///     fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData {
///         match (self.items.get(row), column, role) {
///             (Some(name), 0, ItemRole::Display) => ItemData::from(name.as_str()),
///             _ => ItemData::None,
///         }
///     }
///
///     fn signals(&self) -> &ModelSignals {
///         &self.signals
///     }
/// }
/// ```
pub trait ItemModel: Send + Sync {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// The value of a cell under `role`.
    ///
    /// Cells out of range and roles the provider does not answer read as
    /// `ItemData::None`.
    fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData;

    fn signals(&self) -> &ModelSignals;

    /// Header of a column (`Horizontal`) or row (`Vertical`). Empty by default.
    fn header_data(&self, _section: usize, _orientation: Orientation, _role: ItemRole) -> ItemData {
        ItemData::None
    }

    /// Deletes a row, announcing it through `rows_about_to_be_removed` and
    /// `rows_removed`.
    ///
    /// Returns `false` if the row was not removed; read-only providers keep
    /// the default.
    fn remove_row(&self, _row: usize) -> bool {
        false
    }

    /// `data(row, column, Display)` as a string, when it is one.
    fn display_text(&self, row: usize, column: usize) -> Option<String> {
        self.data(row, column, ItemRole::Display).into_string()
    }
}

/// Which header [`ItemModel::header_data`] is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Column headers.
    Horizontal,
    /// Row headers.
    Vertical,
}

/// Change notifications of an [`ItemModel`].
///
/// Row ranges are inclusive `(first, last)` pairs. Structural changes come
/// in pairs: the `about_to` signal fires before the provider mutates, the
/// other one after. Anything too large to describe row by row is a reset.
pub struct ModelSignals {
    pub rows_about_to_be_inserted: Signal<(usize, usize)>,
    /// Rows `first..=last` now exist.
    pub rows_inserted: Signal<(usize, usize)>,
    pub rows_about_to_be_removed: Signal<(usize, usize)>,
    /// Rows `first..=last` are gone; rows after them moved up.
    pub rows_removed: Signal<(usize, usize)>,
    /// Cells between two corners changed under the listed roles. An empty
    /// role list means any role may have changed.
    pub data_changed: Signal<(CellIndex, CellIndex, Vec<ItemRole>)>,
    pub model_about_to_reset: Signal<()>,
    /// Everything may have changed; re-read the model.
    pub model_reset: Signal<()>,
}

impl Default for ModelSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSignals")
            .field("rows_inserted", &self.rows_inserted.connection_count())
            .field("rows_removed", &self.rows_removed.connection_count())
            .field("data_changed", &self.data_changed.connection_count())
            .field("model_reset", &self.model_reset.connection_count())
            .finish_non_exhaustive()
    }
}

impl ModelSignals {
    pub fn new() -> Self {
        Self {
            rows_about_to_be_inserted: Signal::new(),
            rows_inserted: Signal::new(),
            rows_about_to_be_removed: Signal::new(),
            rows_removed: Signal::new(),
            data_changed: Signal::new(),
            model_about_to_reset: Signal::new(),
            model_reset: Signal::new(),
        }
    }

    /// Runs `insert` between the two row insertion signals.
    pub fn emit_rows_inserted<F: FnOnce()>(&self, first: usize, last: usize, insert: F) {
        self.rows_about_to_be_inserted.emit((first, last));
        insert();
        self.rows_inserted.emit((first, last));
    }

    /// Runs `remove` between the two row removal signals.
    pub fn emit_rows_removed<F: FnOnce()>(&self, first: usize, last: usize, remove: F) {
        self.rows_about_to_be_removed.emit((first, last));
        remove();
        self.rows_removed.emit((first, last));
    }

    /// Announces a change of one cell.
    pub fn emit_data_changed_single(&self, index: CellIndex, roles: Vec<ItemRole>) {
        self.data_changed.emit((index, index, roles));
    }

    /// Runs `reset` between the two reset signals.
    pub fn emit_reset<F: FnOnce()>(&self, reset: F) {
        self.model_about_to_reset.emit(());
        reset();
        self.model_reset.emit(());
    }
}
