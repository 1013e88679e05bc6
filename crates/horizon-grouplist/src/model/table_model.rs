//! In-memory table providers.
//!
//! `TableModel` and `SimpleTableModel` are ready-made data providers a
//! [`GroupModel`](super::GroupModel) can partition. Both emit the row and
//! reset signals the grouping layer subscribes to.

use std::ops::Deref;
use std::sync::Arc;

use horizon_grouplist_core::logging::targets;
use parking_lot::RwLock;

use super::index::CellIndex;
use super::role::{ItemData, ItemRole};
use super::traits::{ItemModel, ModelSignals, Orientation};

/// Reads one cell of a typed row: `(row, column, role) -> value`.
pub type CellExtractor<T> = Arc<dyn Fn(&T, usize, ItemRole) -> ItemData + Send + Sync>;

/// Answers header queries: `(section, orientation, role) -> value`.
pub type HeaderExtractor = Arc<dyn Fn(usize, Orientation, ItemRole) -> ItemData + Send + Sync>;

/// A provider over a vector of typed rows.
///
/// Cells are produced on demand by a [`CellExtractor`], so one row type can
/// answer several roles from the same column: a display string, a sort key,
/// a thumbnail.
///
/// # Example
///
/// ```ignore
/// use horizon_grouplist::model::{ItemData, ItemRole, Orientation, TableModel};
///
/// struct Photo {
///     album: String,
///     title: String,
///     taken: i64,
/// }
///
/// let model = TableModel::new(photos, 3, |photo: &Photo, column, role| {
///     match (column, role) {
///         (0, ItemRole::Display) => ItemData::from(photo.album.as_str()),
///         (1, ItemRole::Display) => ItemData::from(photo.title.as_str()),
///         (2, ItemRole::Display) => ItemData::from(photo.taken),
///         _ => ItemData::None,
///     }
/// })
/// .with_headers(|section, orientation, role| match (orientation, role) {
///     (Orientation::Horizontal, ItemRole::Display) => {
///         ["Album", "Title", "Taken"].get(section).copied().map_or(ItemData::None, ItemData::from)
///     }
///     _ => ItemData::None,
/// });
/// ```
pub struct TableModel<T> {
    rows: RwLock<Vec<T>>,
    column_count: usize,
    cells: CellExtractor<T>,
    headers: Option<HeaderExtractor>,
    signals: ModelSignals,
}

impl<T: Send + Sync + 'static> TableModel<T> {
    /// Creates a provider over `rows` exposing `column_count` columns.
    pub fn new<F>(rows: Vec<T>, column_count: usize, cells: F) -> Self
    where
        F: Fn(&T, usize, ItemRole) -> ItemData + Send + Sync + 'static,
    {
        Self {
            rows: RwLock::new(rows),
            column_count,
            cells: Arc::new(cells),
            headers: None,
            signals: ModelSignals::new(),
        }
    }

    /// Answers header queries with `headers`. Without it headers are empty.
    pub fn with_headers<F>(mut self, headers: F) -> Self
    where
        F: Fn(usize, Orientation, ItemRole) -> ItemData + Send + Sync + 'static,
    {
        self.headers = Some(Arc::new(headers));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Appends `row`, announcing it as inserted.
    pub fn push_row(&self, row: T) {
        let at = self.rows.read().len();
        self.signals.emit_rows_inserted(at, at, || self.rows.write().push(row));
    }

    /// Inserts `row` before `index`; indices past the end append.
    pub fn insert_row(&self, index: usize, row: T) {
        let at = index.min(self.rows.read().len());
        self.signals
            .emit_rows_inserted(at, at, || self.rows.write().insert(at, row));
    }

    /// Removes the row at `index` and hands it back.
    pub fn take_row(&self, index: usize) -> Option<T> {
        if index >= self.rows.read().len() {
            return None;
        }
        let mut taken = None;
        self.signals
            .emit_rows_removed(index, index, || taken = Some(self.rows.write().remove(index)));
        taken
    }

    /// Swaps in a new set of rows inside one reset.
    pub fn set_rows(&self, rows: Vec<T>) {
        self.signals.emit_reset(|| *self.rows.write() = rows);
    }

    pub fn clear(&self) {
        self.signals.emit_reset(|| self.rows.write().clear());
    }

    /// Read access to the rows. Holds a read lock while alive.
    pub fn rows(&self) -> impl Deref<Target = Vec<T>> + '_ {
        self.rows.read()
    }

    /// Edits the row at `index` in place.
    ///
    /// Every column of the row is announced as changed under `Display`,
    /// since the provider cannot tell which cells `edit` touched.
    pub fn modify_row<F, R>(&self, index: usize, edit: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let result = edit(self.rows.write().get_mut(index)?);
        let first = CellIndex::new(index, 0);
        let last = CellIndex::new(index, self.column_count.saturating_sub(1));
        self.signals
            .data_changed
            .emit((first, last, vec![ItemRole::Display]));
        Some(result)
    }
}

impl<T: Send + Sync + 'static> ItemModel for TableModel<T> {
    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData {
        if column >= self.column_count {
            return ItemData::None;
        }
        self.rows
            .read()
            .get(row)
            .map_or(ItemData::None, |item| (self.cells)(item, column, role))
    }

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemData {
        match &self.headers {
            Some(headers) => headers(section, orientation, role),
            None => ItemData::None,
        }
    }

    fn remove_row(&self, row: usize) -> bool {
        self.take_row(row).is_some()
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}

/// A provider over a grid of [`ItemData`].
///
/// Cells answer the `Display` and `Edit` roles with the stored value. The
/// column count is fixed at construction; rows shorter than it read as
/// `ItemData::None` in the missing columns.
pub struct SimpleTableModel {
    cells: RwLock<Vec<Vec<ItemData>>>,
    column_count: usize,
    headers: RwLock<Vec<String>>,
    signals: ModelSignals,
}

impl SimpleTableModel {
    /// Creates an empty grid with `column_count` columns.
    pub fn new(column_count: usize) -> Self {
        Self::with_columns(Vec::new(), column_count)
    }

    /// Creates a grid from rows; the first row fixes the column count.
    pub fn from_data(data: Vec<Vec<ItemData>>) -> Self {
        let column_count = data.first().map_or(0, Vec::len);
        Self::with_columns(data, column_count)
    }

    /// Creates a single-column grid, one row per value.
    pub fn from_column<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ItemData>,
    {
        Self::from_data(values.into_iter().map(|v| vec![v.into()]).collect())
    }

    fn with_columns(cells: Vec<Vec<ItemData>>, column_count: usize) -> Self {
        Self {
            cells: RwLock::new(cells),
            column_count,
            headers: RwLock::new(vec![String::new(); column_count]),
            signals: ModelSignals::new(),
        }
    }

    /// Replaces the horizontal header texts.
    pub fn set_headers(&self, headers: Vec<String>) {
        *self.headers.write() = headers;
    }

    /// Stores `value` in one cell and announces the change.
    ///
    /// Cells outside the grid are ignored.
    pub fn set_cell(&self, row: usize, column: usize, value: ItemData) {
        {
            let mut cells = self.cells.write();
            let Some(cell) = cells.get_mut(row).and_then(|r| r.get_mut(column)) else {
                tracing::debug!(target: targets::MODEL, row, column, "set_cell out of range");
                return;
            };
            *cell = value;
        }
        self.signals
            .emit_data_changed_single(CellIndex::new(row, column), vec![ItemRole::Display]);
    }

    /// Appends a row, announcing it as inserted.
    pub fn append_row(&self, row: Vec<ItemData>) {
        let at = self.cells.read().len();
        self.signals.emit_rows_inserted(at, at, || self.cells.write().push(row));
    }

    /// Removes the rows `first..=last` in one notification.
    ///
    /// Returns `false` without notifying if the range is empty or out of range.
    pub fn remove_rows(&self, first: usize, last: usize) -> bool {
        if first > last || last >= self.cells.read().len() {
            return false;
        }
        self.signals.emit_rows_removed(first, last, || {
            self.cells.write().drain(first..=last);
        });
        true
    }

    /// Swaps in new rows inside one reset.
    pub fn set_data(&self, data: Vec<Vec<ItemData>>) {
        self.signals.emit_reset(|| *self.cells.write() = data);
    }

    pub fn clear(&self) {
        self.signals.emit_reset(|| self.cells.write().clear());
    }
}

impl ItemModel for SimpleTableModel {
    fn row_count(&self) -> usize {
        self.cells.read().len()
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData {
        if !matches!(role, ItemRole::Display | ItemRole::Edit) || column >= self.column_count {
            return ItemData::None;
        }
        self.cells
            .read()
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemData {
        if orientation != Orientation::Horizontal || role != ItemRole::Display {
            return ItemData::None;
        }
        self.headers
            .read()
            .get(section)
            .map_or(ItemData::None, |text| ItemData::from(text.as_str()))
    }

    fn remove_row(&self, row: usize) -> bool {
        self.remove_rows(row, row)
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}
