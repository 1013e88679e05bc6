//! A single bucket of a [`GroupModel`].
//!
//! A `Group` holds the provider rows sharing one group key, in the order
//! dictated by the owner's sorting configuration. It is itself an
//! [`ItemModel`], so a list view can display one bucket directly.

use std::cmp::Ordering;
use std::sync::Weak;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use parking_lot::RwLock;

use super::compare::CompareFn;
use super::group_model::GroupModel;
use super::role::{ItemData, ItemRole};
use super::traits::{ItemModel, ModelSignals, Orientation, SortOrder};

/// What a group needs to read sort keys while its owner is being mutated.
pub(crate) struct SortContext<'a> {
    pub provider: &'a dyn ItemModel,
    pub column: Option<usize>,
    pub role: ItemRole,
    pub compare: &'a CompareFn,
}

impl SortContext<'_> {
    fn value(&self, column: usize, row: usize) -> ItemData {
        self.provider.data(row, column, self.role)
    }

    fn compare(&self, column: usize, a: &ItemData, b: &ItemData) -> Ordering {
        (self.compare)(self.provider, column, a, b)
    }
}

/// An ordered set of provider rows sharing one group key.
///
/// Groups are created and destroyed by their [`GroupModel`]; callers only
/// ever receive them as `Arc<Group>`. A group keeps a weak back-reference to
/// its owner to reach the data provider and the current configuration, so
/// holding a group does not keep the owner alive. Once the owner is gone, or
/// the group has been discarded by a rebuild, the group still answers
/// `row_count` but `data` returns `ItemData::None`.
///
/// # Row order
///
/// `mapping()` is the stored order: ascending by sort key (ties by row), or
/// provider order when no sorting column is set. The row order seen through
/// [`ItemModel::data`] and [`map_row_to_base_model`](Group::map_row_to_base_model)
/// is that order reversed when the owner's sorting order is descending.
pub struct Group {
    owner: Weak<GroupModel>,
    key: ItemData,
    label: RwLock<String>,
    map: RwLock<Vec<usize>>,
    list_index: AtomicUsize,
    signals: ModelSignals,
}

impl Group {
    pub(crate) fn new(owner: Weak<GroupModel>, key: ItemData, label: String) -> Self {
        Self {
            owner,
            key,
            label: RwLock::new(label),
            map: RwLock::new(Vec::new()),
            list_index: AtomicUsize::new(0),
            signals: ModelSignals::new(),
        }
    }

    /// The key shared by every row of this group.
    pub fn key(&self) -> &ItemData {
        &self.key
    }

    /// The user-visible label.
    pub fn label(&self) -> String {
        self.label.read().clone()
    }

    /// Changes the user-visible label.
    ///
    /// Labels are regenerated when the owner rebuilds its groups.
    pub fn set_label(&self, label: impl Into<String>) {
        *self.label.write() = label.into();
    }

    /// Rank of this group among all groups, in ascending key order, as
    /// assigned by the last build.
    pub fn list_index(&self) -> usize {
        self.list_index.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn set_list_index(&self, index: usize) {
        self.list_index.store(index, AtomicOrdering::Relaxed);
    }

    /// Position of this group as presented by the owner, taking the
    /// grouping order into account.
    ///
    /// Returns `None` if the owner is gone or no longer holds this group.
    pub fn visible_index(&self) -> Option<usize> {
        let owner = self.owner.upgrade()?;
        owner
            .grouping_order()
            .map_index(self.list_index(), owner.group_count())
    }

    /// Snapshot of the stored row order.
    pub fn mapping(&self) -> Vec<usize> {
        self.map.read().clone()
    }

    /// Returns `true` if the group holds no rows.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Returns `true` if `row` belongs to this group.
    pub fn contains(&self, row: usize) -> bool {
        self.map.read().contains(&row)
    }

    /// Maps a row of this group onto the provider row it shows.
    ///
    /// Returns `None` if `local` is out of range or the owner is gone.
    pub fn map_row_to_base_model(&self, local: usize) -> Option<usize> {
        let owner = self.owner.upgrade()?;
        self.base_row(local, owner.sorting_order())
    }

    pub(crate) fn base_row(&self, local: usize, order: SortOrder) -> Option<usize> {
        let map = self.map.read();
        order.map_index(local, map.len()).map(|i| map[i])
    }

    /// Stored position of a provider row.
    pub(crate) fn position_of(&self, row: usize) -> Option<usize> {
        self.map.read().iter().position(|&r| r == row)
    }

    // -------------------------------------------------------------------------
    // Mutation, driven by the owner
    // -------------------------------------------------------------------------

    pub(crate) fn append_record(&self, row: usize) {
        self.map.write().push(row);
    }

    /// Inserts `row` at its sorted position.
    ///
    /// Without a sorting column, the row goes before the first stored row
    /// greater than it. Only stored rows are scanned, so a group fed rows
    /// out of order is not globally ascending.
    ///
    /// With a sorting column, the row goes before the first stored entry it
    /// compares smaller than, or right after the first entry it compares
    /// equal to, whichever the scan meets first.
    pub(crate) fn insert_sorted_record(&self, row: usize, ctx: &SortContext<'_>) {
        let mut map = self.map.write();
        let position = match ctx.column {
            None => map.iter().position(|&existing| existing > row),
            Some(column) => {
                let value = ctx.value(column, row);
                map.iter().enumerate().find_map(|(idx, &existing)| {
                    match ctx.compare(column, &value, &ctx.value(column, existing)) {
                        Ordering::Equal => Some(idx + 1),
                        Ordering::Less => Some(idx),
                        Ordering::Greater => None,
                    }
                })
            }
        };
        match position {
            Some(idx) => map.insert(idx, row),
            None => map.push(row),
        }
    }

    /// Re-sorts the stored rows by the sorting column.
    ///
    /// Each sort key is read from the provider exactly once. Equal keys are
    /// ordered by ascending provider row.
    ///
    /// # Panics
    ///
    /// Panics if no sorting column is configured.
    pub(crate) fn perform_sorting(&self, ctx: &SortContext<'_>) {
        let Some(column) = ctx.column else {
            panic!("perform_sorting requires a sorting column");
        };
        let mut map = self.map.write();
        let mut values: Vec<ItemData> = map.iter().map(|&row| ctx.value(column, row)).collect();
        let count = map.len();
        for n in 0..count {
            for i in (n + 1)..count {
                let exchange = match ctx.compare(column, &values[n], &values[i]) {
                    Ordering::Equal => map[n] > map[i],
                    Ordering::Less => false,
                    Ordering::Greater => true,
                };
                if exchange {
                    values.swap(n, i);
                    map.swap(n, i);
                }
            }
        }
    }

    /// Restores ascending provider-row order.
    pub(crate) fn perform_unsorting(&self) {
        self.map.write().sort_unstable();
    }

    /// Adjusts the stored rows after the provider removed `first..=last`.
    ///
    /// Rows in the range are dropped and rows above it shift down. Returns
    /// `true` if any row of this group was dropped.
    pub(crate) fn remove_range(&self, first: usize, last: usize) -> bool {
        let removed = last - first + 1;
        let mut map = self.map.write();
        let before = map.len();
        map.retain(|&row| row < first || row > last);
        for row in map.iter_mut().filter(|row| **row > last) {
            *row -= removed;
        }
        map.len() != before
    }

    pub(crate) fn intersects(&self, first: usize, last: usize) -> bool {
        self.map.read().iter().any(|&row| (first..=last).contains(&row))
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("key", &self.key)
            .field("label", &*self.label.read())
            .field("map", &*self.map.read())
            .field("list_index", &self.list_index())
            .finish()
    }
}

impl ItemModel for Group {
    fn row_count(&self) -> usize {
        self.map.read().len()
    }

    fn column_count(&self) -> usize {
        self.owner
            .upgrade()
            .and_then(|owner| owner.base_model())
            .map_or(0, |provider| provider.column_count())
    }

    /// Column 0 is the group's list column: `Decoration` reads the pixmap
    /// column, label roles read the configured label columns, and any other
    /// role reads the primary label column. Other columns forward to the
    /// provider unchanged.
    fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData {
        let Some(owner) = self.owner.upgrade() else {
            return ItemData::None;
        };
        let Some(cell) = owner.resolve_cell(column, role) else {
            return ItemData::None;
        };
        match self.base_row(row, cell.sorting_order) {
            Some(base) => cell.provider.data(base, cell.column, cell.role),
            None => {
                tracing::debug!(
                    target: horizon_grouplist_core::logging::targets::MODEL,
                    row,
                    label = %self.label(),
                    "data requested for non-existing group row"
                );
                ItemData::None
            }
        }
    }

    fn header_data(&self, section: usize, orientation: Orientation, role: ItemRole) -> ItemData {
        if orientation == Orientation::Vertical {
            return ItemData::String((section + 1).to_string());
        }
        self.owner
            .upgrade()
            .and_then(|owner| owner.base_model())
            .map_or(ItemData::None, |provider| {
                provider.header_data(section, orientation, role)
            })
    }

    fn remove_row(&self, row: usize) -> bool {
        let Some(owner) = self.owner.upgrade() else {
            return false;
        };
        match self.base_row(row, owner.sorting_order()) {
            Some(base) => owner.remove(base),
            None => false,
        }
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}

static_assertions::assert_impl_all!(Group: Send, Sync);
