//! Grouping model that partitions a data provider into buckets.
//!
//! A [`GroupModel`] reads one "grouping" column of a flat [`ItemModel`] and
//! collects rows sharing a key into [`Group`]s. Rows inside a group are
//! ordered by a separate "sorting" column. Both use pluggable comparators.
//!
//! Groups are stored in ascending key order. The grouping order and sorting
//! order only change how groups and rows are presented, never how they are
//! stored.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use horizon_grouplist::model::{GroupModel, ItemModel, SimpleTableModel, SortOrder};
//!
//! let provider = Arc::new(SimpleTableModel::from_column(["b", "a", "a", "c", "b"]));
//! let model = GroupModel::new();
//! model.set_base_model(Some(provider), Some(0), None, SortOrder::Ascending, SortOrder::Ascending)?;
//!
//! assert_eq!(model.group_count(), 3);
//! assert_eq!(model.group_label(0).as_deref(), Some("a"));
//! assert_eq!(model.group(0).unwrap().mapping(), vec![1, 2]);
//!
//! model.signals().grouping_changed.connect(|_| println!("regrouped"));
//! ```

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use horizon_grouplist_core::logging::{span_names, targets};
use horizon_grouplist_core::{ConnectionId, PerfSpan, Signal};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::compare::{CompareFn, default_compare};
use super::group::{Group, SortContext};
use super::index::CellIndex;
use super::role::{ItemData, ItemRole};
use super::traits::{ItemModel, SortOrder};
use crate::config::GroupingConfig;
use crate::error::{Error, Result};

/// Label given to the single group built when grouping is disabled.
pub const UNGROUPED_LABEL: &str = "(ungrouped)";

/// Produces the label of a new group from the provider, the first row
/// found for the group, and the group key.
pub type GroupLabelFn = Arc<dyn Fn(&dyn ItemModel, usize, &ItemData) -> String + Send + Sync>;

/// A column read under a specific role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRole {
    /// Provider column.
    pub column: usize,
    /// Role read from the column.
    pub role: ItemRole,
}

impl ColumnRole {
    pub const fn new(column: usize, role: ItemRole) -> Self {
        Self { column, role }
    }
}

impl Default for ColumnRole {
    fn default() -> Self {
        Self::new(0, ItemRole::Display)
    }
}

/// Lifecycle of a [`GroupModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelPhase {
    /// No data provider installed.
    Unconfigured,
    /// Groups reflect the provider and configuration.
    Built,
    /// Groups are being rebuilt; observable from reset notifications.
    Rebuilding,
    /// Rows are being re-ordered inside groups.
    Resorting,
    /// Groups were cleared and not rebuilt yet. Queries return nothing.
    TornDown,
}

/// Signals emitted by a [`GroupModel`].
///
/// Reset signals bracket any change of the group set. Each [`Group`] has
/// its own [`ModelSignals`](super::ModelSignals) for changes inside a bucket.
pub struct GroupModelSignals {
    /// Emitted before the set of groups changes.
    pub model_about_to_reset: Signal<()>,
    /// Emitted after the set of groups changed.
    pub model_reset: Signal<()>,
    /// Emitted when the grouping column, role, order or comparator changed.
    pub grouping_changed: Signal<()>,
    /// Emitted when the sorting column, role, order or comparator changed.
    pub sorting_changed: Signal<()>,
}

impl GroupModelSignals {
    fn new() -> Self {
        Self {
            model_about_to_reset: Signal::new(),
            model_reset: Signal::new(),
            grouping_changed: Signal::new(),
            sorting_changed: Signal::new(),
        }
    }
}

/// Provider output resolved for one group cell.
pub(crate) struct ResolvedCell {
    pub provider: Arc<dyn ItemModel>,
    pub column: usize,
    pub role: ItemRole,
    pub sorting_order: SortOrder,
}

/// Slots connected to the installed provider.
struct ProviderConnections {
    about_to_reset: ConnectionId,
    reset: ConnectionId,
    data_changed: ConnectionId,
    rows_removed: ConnectionId,
    rows_inserted: ConnectionId,
}

impl ProviderConnections {
    fn disconnect(self, provider: &dyn ItemModel) {
        let signals = provider.signals();
        signals.model_about_to_reset.disconnect(self.about_to_reset);
        signals.model_reset.disconnect(self.reset);
        signals.data_changed.disconnect(self.data_changed);
        signals.rows_removed.disconnect(self.rows_removed);
        signals.rows_inserted.disconnect(self.rows_inserted);
    }
}

struct GroupState {
    provider: Option<Arc<dyn ItemModel>>,
    connections: Option<ProviderConnections>,
    config: GroupingConfig,
    grouping_fn: CompareFn,
    sorting_fn: CompareFn,
    labeler: Option<GroupLabelFn>,
    groups: Vec<Arc<Group>>,
    phase: ModelPhase,
}

impl GroupState {
    fn new() -> Self {
        Self {
            provider: None,
            connections: None,
            config: GroupingConfig::default(),
            grouping_fn: default_compare(),
            sorting_fn: default_compare(),
            labeler: None,
            groups: Vec::new(),
            phase: ModelPhase::Unconfigured,
        }
    }

    fn provider(&self) -> Option<&dyn ItemModel> {
        self.provider.as_deref()
    }

    fn visible(&self, index: usize) -> Option<&Arc<Group>> {
        self.config
            .grouping_order
            .map_index(index, self.groups.len())
            .map(|i| &self.groups[i])
    }

    fn sort_context<'a>(&'a self, provider: &'a dyn ItemModel) -> SortContext<'a> {
        SortContext {
            provider,
            column: self.config.sorting_column,
            role: self.config.sorting_role,
            compare: &self.sorting_fn,
        }
    }

    fn new_group_label(&self, provider: &dyn ItemModel, row: usize, key: &ItemData) -> String {
        match &self.labeler {
            Some(labeler) => labeler(provider, row, key),
            None => key.to_string(),
        }
    }

    fn clear_all_groups(&mut self) {
        self.groups.clear();
        if self.provider.is_some() {
            self.phase = ModelPhase::TornDown;
        }
    }

    fn build_all_groups(&mut self, owner: &Weak<GroupModel>) {
        let Some(provider) = self.provider.clone() else {
            panic!("build_all_groups requires a data provider");
        };
        let Some(column) = self.config.grouping_column else {
            panic!("build_all_groups requires a grouping column");
        };
        assert!(
            column < provider.column_count(),
            "grouping column {column} out of range"
        );
        assert!(self.groups.is_empty(), "build_all_groups on a built model");

        let _perf = PerfSpan::new(span_names::REBUILD);
        let role = self.config.grouping_role;
        let grouping_fn = self.grouping_fn.clone();
        let mut groups: Vec<Arc<Group>> = Vec::new();
        {
            let ctx = self.sort_context(&*provider);
            for row in 0..provider.row_count() {
                let key = provider.data(row, column, role);
                let mut slot = groups.len();
                let mut existing = None;
                for (idx, group) in groups.iter().enumerate() {
                    match grouping_fn(&*provider, column, &key, group.key()) {
                        Ordering::Equal => {
                            existing = Some(idx);
                            break;
                        }
                        Ordering::Less => {
                            slot = idx;
                            break;
                        }
                        Ordering::Greater => {}
                    }
                }
                match existing {
                    Some(idx) => groups[idx].insert_sorted_record(row, &ctx),
                    None => {
                        let label = self.new_group_label(&*provider, row, &key);
                        let group = Group::new(owner.clone(), key, label);
                        group.append_record(row);
                        groups.insert(slot, Arc::new(group));
                    }
                }
            }
        }
        for (idx, group) in groups.iter().enumerate() {
            group.set_list_index(idx);
        }
        tracing::debug!(
            target: targets::GROUPING,
            column,
            rows = provider.row_count(),
            groups = groups.len(),
            "built groups"
        );
        self.groups = groups;
        self.phase = ModelPhase::Built;
    }

    fn build_no_grouping_group(&mut self, owner: &Weak<GroupModel>) {
        let Some(provider) = self.provider.clone() else {
            panic!("build_no_grouping_group requires a data provider");
        };
        assert!(self.groups.is_empty(), "build_no_grouping_group on a built model");

        let _perf = PerfSpan::new(span_names::REBUILD);
        let group = Group::new(owner.clone(), ItemData::None, UNGROUPED_LABEL.to_string());
        {
            let ctx = self.sort_context(&*provider);
            for row in 0..provider.row_count() {
                group.insert_sorted_record(row, &ctx);
            }
        }
        tracing::debug!(
            target: targets::GROUPING,
            rows = group.row_count(),
            "built ungrouped group"
        );
        self.groups = vec![Arc::new(group)];
        self.phase = ModelPhase::Built;
    }

    /// Clears and rebuilds for the current provider and grouping column.
    fn rebuild(&mut self, owner: &Weak<GroupModel>) {
        self.groups.clear();
        match (&self.provider, self.config.grouping_column) {
            (None, _) => self.phase = ModelPhase::Unconfigured,
            (Some(_), Some(_)) => self.build_all_groups(owner),
            (Some(_), None) => self.build_no_grouping_group(owner),
        }
    }

    fn resort_group(&self, group: &Group) {
        let Some(provider) = self.provider() else {
            return;
        };
        if self.config.sorting_column.is_some() {
            group.perform_sorting(&self.sort_context(provider));
        } else {
            group.perform_unsorting();
        }
    }

    /// Finds the group holding `row` and the row's visible position in it.
    fn group_for_row(&self, row: usize) -> Option<(Arc<Group>, usize)> {
        self.groups.iter().find_map(|group| {
            let position = group.position_of(row)?;
            let local = match self.config.sorting_order {
                SortOrder::Ascending => position,
                SortOrder::Descending => group.row_count() - 1 - position,
            };
            Some((group.clone(), local))
        })
    }
}

/// Checks a configuration against a provider.
fn validate(provider: Option<&dyn ItemModel>, config: &GroupingConfig) -> Result<()> {
    let keyed = [
        (config.grouping_column, config.grouping_role),
        (config.sorting_column, config.sorting_role),
    ];
    for column in [config.grouping_column, config.sorting_column, config.pixmap_column]
        .into_iter()
        .flatten()
    {
        let Some(provider) = provider else {
            return Err(Error::NoProvider);
        };
        let column_count = provider.column_count();
        if column >= column_count {
            return Err(Error::column_out_of_range(column, column_count));
        }
    }
    if let Some(pixmap) = config.pixmap_column {
        let role = config.pixmap_role;
        if keyed.contains(&(Some(pixmap), role)) {
            return Err(Error::ReservedPixmapColumn {
                column: pixmap,
                role,
            });
        }
    }
    Ok(())
}

/// Sets a flag for as long as it lives and restores the previous value on
/// drop, unwinding included.
struct SuppressGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> SuppressGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, AtomicOrdering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, AtomicOrdering::SeqCst);
    }
}

/// Partitions the rows of a data provider into sorted [`Group`]s.
///
/// `GroupModel` is always handled through an `Arc` (see [`GroupModel::new`]);
/// the groups and the slots connected to the provider hold weak references
/// back to it.
///
/// # Notifications
///
/// Signals are emitted with no internal lock held, so slots may query the
/// model. Operations that rebuild the groups emit exactly one
/// `model_about_to_reset`/`model_reset` pair; nested steps are suppressed.
///
/// # Errors
///
/// Setters that take a column validate it against the installed provider
/// and return an [`Error`] without changing anything when it is out of range
/// or collides with the pixmap column under the same role.
///
/// # Panics
///
/// The un-notified building blocks ([`build_all_groups`](Self::build_all_groups),
/// [`build_no_grouping_group`](Self::build_no_grouping_group)) panic when
/// their preconditions are not met. The default comparator panics on values
/// of different families; see [`compare_values`](super::compare_values).
pub struct GroupModel {
    this: Weak<GroupModel>,
    state: RwLock<GroupState>,
    suppressed: AtomicBool,
    signals: GroupModelSignals,
}

impl GroupModel {
    /// Creates an empty model with no provider installed.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            state: RwLock::new(GroupState::new()),
            suppressed: AtomicBool::new(false),
            signals: GroupModelSignals::new(),
        })
    }

    /// Creates a builder for a model over `provider`.
    pub fn builder(provider: Arc<dyn ItemModel>) -> crate::config::GroupModelBuilder {
        crate::config::GroupModelBuilder::new(provider)
    }

    /// Returns the signals of this model.
    pub fn signals(&self) -> &GroupModelSignals {
        &self.signals
    }

    /// Returns `true` while nested notifications are being suppressed.
    pub fn notifications_suppressed(&self) -> bool {
        self.suppressed.load(AtomicOrdering::SeqCst)
    }

    fn suppress(&self) -> SuppressGuard<'_> {
        SuppressGuard::new(&self.suppressed)
    }

    fn notify(&self, signal: &Signal<()>) {
        if !self.notifications_suppressed() {
            signal.emit(());
        }
    }

    /// Emits `model_about_to_reset`, runs `f` under the state lock, then
    /// emits `model_reset`.
    fn reset_with<R>(&self, f: impl FnOnce(&mut GroupState) -> R) -> R {
        self.state.write().phase = ModelPhase::Rebuilding;
        self.notify(&self.signals.model_about_to_reset);
        let result = {
            let _guard = self.suppress();
            f(&mut self.state.write())
        };
        self.notify(&self.signals.model_reset);
        result
    }

    /// Announces a re-ordering of the given groups, applying `f` to each
    /// between its reset pair.
    fn reset_groups(&self, groups: &[Arc<Group>], f: impl Fn(&GroupState, &Group)) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.phase, ModelPhase::Resorting)
        };
        for group in groups {
            self.notify(&group.signals().model_about_to_reset);
            f(&self.state.read(), group);
            self.notify(&group.signals().model_reset);
        }
        self.state.write().phase = previous;
    }

    fn all_groups(&self) -> Vec<Arc<Group>> {
        self.state.read().groups.clone()
    }

    fn resort_all(&self) {
        let _perf = PerfSpan::new(span_names::RESORT);
        let groups = self.all_groups();
        self.reset_groups(&groups, |state, group| state.resort_group(group));
    }

    // -------------------------------------------------------------------------
    // Provider
    // -------------------------------------------------------------------------

    /// Returns the installed data provider.
    pub fn base_model(&self) -> Option<Arc<dyn ItemModel>> {
        self.state.read().provider.clone()
    }

    /// Installs a data provider together with the grouping and sorting
    /// configuration, rebuilding all groups.
    ///
    /// Installing the provider that is already installed does nothing.
    /// The columns are validated against the new provider first; on error
    /// nothing changes and no notification is emitted.
    pub fn set_base_model(
        &self,
        provider: Option<Arc<dyn ItemModel>>,
        grouping_column: Option<usize>,
        sorting_column: Option<usize>,
        grouping_order: SortOrder,
        sorting_order: SortOrder,
    ) -> Result<()> {
        let mut config = {
            let state = self.state.read();
            let same = match (&state.provider, &provider) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if same {
                tracing::debug!(target: targets::PROVIDER, "provider already installed");
                return Ok(());
            }
            state.config.clone()
        };
        config.grouping_column = grouping_column;
        config.sorting_column = sorting_column;
        config.grouping_order = grouping_order;
        config.sorting_order = sorting_order;
        if provider.is_none() {
            config.pixmap_column = None;
        }
        self.install(Some(provider), config)
    }

    /// Validates and applies `config`, swapping the provider too when
    /// `provider` is `Some`.
    pub(crate) fn install(
        &self,
        provider: Option<Option<Arc<dyn ItemModel>>>,
        config: GroupingConfig,
    ) -> Result<()> {
        {
            let state = self.state.read();
            let target = match &provider {
                Some(p) => p.as_deref(),
                None => state.provider(),
            };
            let checked = validate(target, &config).and_then(|()| {
                config
                    .labels
                    .iter()
                    .try_for_each(|label| check_label_column(target, label.column))
            });
            if let Err(err) = checked {
                tracing::warn!(target: targets::GROUPING, %err, "configuration rejected");
                return Err(err);
            }
        }

        self.reset_with(|state| {
            if let Some(provider) = provider {
                if let (Some(old), Some(connections)) = (&state.provider, state.connections.take()) {
                    connections.disconnect(&**old);
                }
                state.connections = provider.as_deref().map(|p| self.connect_provider(p));
                state.provider = provider;
                tracing::debug!(
                    target: targets::PROVIDER,
                    installed = state.provider.is_some(),
                    "data provider changed"
                );
            }
            state.config = config;
            state.rebuild(&self.this);
        });
        Ok(())
    }

    fn connect_provider(&self, provider: &dyn ItemModel) -> ProviderConnections {
        let signals = provider.signals();

        let this = self.this.clone();
        let about_to_reset = signals.model_about_to_reset.connect(move |_| {
            if let Some(model) = this.upgrade() {
                model.on_provider_about_to_reset();
            }
        });
        let this = self.this.clone();
        let reset = signals.model_reset.connect(move |_| {
            if let Some(model) = this.upgrade() {
                model.on_provider_reset();
            }
        });
        let this = self.this.clone();
        let data_changed = signals.data_changed.connect(move |(top_left, bottom_right, roles)| {
            if let Some(model) = this.upgrade() {
                model.on_provider_data_changed(*top_left, *bottom_right, roles);
            }
        });
        let this = self.this.clone();
        let rows_removed = signals.rows_removed.connect(move |(first, last)| {
            if let Some(model) = this.upgrade() {
                model.on_provider_rows_removed(*first, *last);
            }
        });
        let this = self.this.clone();
        let rows_inserted = signals.rows_inserted.connect(move |(first, last)| {
            if let Some(model) = this.upgrade() {
                tracing::debug!(target: targets::PROVIDER, first, last, "rows inserted");
                model.regroup();
            }
        });

        ProviderConnections {
            about_to_reset,
            reset,
            data_changed,
            rows_removed,
            rows_inserted,
        }
    }

    fn on_provider_about_to_reset(&self) {
        tracing::debug!(target: targets::PROVIDER, "provider about to reset");
        self.notify(&self.signals.model_about_to_reset);
        self.state.write().clear_all_groups();
    }

    fn on_provider_reset(&self) {
        tracing::debug!(target: targets::PROVIDER, "provider reset");
        {
            let mut state = self.state.write();
            let column_count = state.provider().map_or(0, |p| p.column_count());
            let config = &mut state.config;
            for column in [
                &mut config.grouping_column,
                &mut config.sorting_column,
                &mut config.pixmap_column,
            ] {
                if column.is_some_and(|c| c >= column_count) {
                    tracing::warn!(
                        target: targets::PROVIDER,
                        column = ?*column,
                        column_count,
                        "column vanished with provider reset; disabling it"
                    );
                    *column = None;
                }
            }
            state.rebuild(&self.this);
        }
        self.notify(&self.signals.model_reset);
    }

    fn on_provider_data_changed(&self, top_left: CellIndex, bottom_right: CellIndex, roles: &[ItemRole]) {
        let first = top_left.row().min(bottom_right.row());
        let last = top_left.row().max(bottom_right.row());
        let touches = |column: Option<usize>, role: ItemRole| {
            column.is_some_and(|c| top_left.spans_column(c, &bottom_right))
                && (roles.is_empty() || roles.contains(&role))
        };

        let (grouping_hit, sorting_hit, owners) = {
            let state = self.state.read();
            if state.phase != ModelPhase::Built {
                return;
            }
            let config = &state.config;
            let owners: Vec<(Arc<Group>, usize)> =
                (first..=last).filter_map(|row| state.group_for_row(row)).collect();
            (
                touches(config.grouping_column, config.grouping_role),
                touches(config.sorting_column, config.sorting_role),
                owners,
            )
        };

        if grouping_hit {
            tracing::debug!(target: targets::PROVIDER, first, last, "grouping key changed");
            self.regroup();
        } else if sorting_hit {
            tracing::debug!(target: targets::PROVIDER, first, last, "sort key changed");
            let mut groups: Vec<Arc<Group>> = Vec::new();
            for (group, _) in owners {
                if !groups.iter().any(|g| Arc::ptr_eq(g, &group)) {
                    groups.push(group);
                }
            }
            self.reset_groups(&groups, |state, group| state.resort_group(group));
        } else {
            for (group, local) in owners {
                if !self.notifications_suppressed() {
                    group
                        .signals()
                        .emit_data_changed_single(CellIndex::new(local, 0), roles.to_vec());
                }
            }
        }
    }

    fn on_provider_rows_removed(&self, first: usize, last: usize) {
        if first > last {
            return;
        }
        tracing::debug!(target: targets::PROVIDER, first, last, "rows removed");
        let touched: Vec<Arc<Group>> = {
            let state = self.state.read();
            if state.phase != ModelPhase::Built {
                return;
            }
            state
                .groups
                .iter()
                .filter(|g| g.intersects(first, last))
                .cloned()
                .collect()
        };
        for group in &touched {
            self.notify(&group.signals().model_about_to_reset);
        }
        for group in &self.state.read().groups {
            group.remove_range(first, last);
        }
        for group in &touched {
            self.notify(&group.signals().model_reset);
        }
    }

    // -------------------------------------------------------------------------
    // Grouping
    // -------------------------------------------------------------------------

    /// The column whose values partition the rows, if grouping is enabled.
    pub fn grouping_column(&self) -> Option<usize> {
        self.state.read().config.grouping_column
    }

    /// The role read from the grouping column.
    pub fn grouping_role(&self) -> ItemRole {
        self.state.read().config.grouping_role
    }

    /// The order in which groups are presented.
    pub fn grouping_order(&self) -> SortOrder {
        self.state.read().config.grouping_order
    }

    /// Changes the grouping column and rebuilds every group.
    ///
    /// `None` collapses all rows into one ungrouped group. Setting the
    /// current column does nothing.
    pub fn set_grouping_column(&self, column: Option<usize>) -> Result<()> {
        self.update_grouping(|config| config.grouping_column = column)
    }

    /// Changes the role read from the grouping column and rebuilds every group.
    pub fn set_grouping_role(&self, role: ItemRole) -> Result<()> {
        self.update_grouping(|config| config.grouping_role = role)
    }

    fn update_grouping(&self, update: impl FnOnce(&mut GroupingConfig)) -> Result<()> {
        let config = {
            let state = self.state.read();
            let mut config = state.config.clone();
            update(&mut config);
            if let Err(err) = validate(state.provider(), &config) {
                tracing::warn!(target: targets::GROUPING, %err, "grouping change rejected");
                return Err(err);
            }
            if config == state.config {
                tracing::debug!(target: targets::GROUPING, "grouping unchanged");
                return Ok(());
            }
            config
        };
        tracing::debug!(
            target: targets::GROUPING,
            column = ?config.grouping_column,
            role = ?config.grouping_role,
            "grouping changed"
        );
        self.reset_with(|state| {
            state.config = config;
            state.rebuild(&self.this);
        });
        self.notify(&self.signals.grouping_changed);
        Ok(())
    }

    /// Changes the order in which groups are presented.
    ///
    /// The stored order is untouched; only `group(idx)` and friends change.
    pub fn set_grouping_order(&self, order: SortOrder) {
        {
            let mut state = self.state.write();
            if state.config.grouping_order == order {
                return;
            }
            state.config.grouping_order = order;
        }
        tracing::debug!(target: targets::GROUPING, ?order, "grouping order changed");
        self.notify(&self.signals.grouping_changed);
    }

    /// Replaces the comparator deciding group membership and group order.
    ///
    /// Groups are rebuilt with the new comparator. Like the labeler, the
    /// comparator must not call back into this model.
    pub fn set_grouping_func<F>(&self, compare: F)
    where
        F: Fn(&dyn ItemModel, usize, &ItemData, &ItemData) -> Ordering + Send + Sync + 'static,
    {
        self.replace_grouping_func(Arc::new(compare));
    }

    /// Restores the built-in grouping comparator.
    pub fn reset_grouping_func(&self) {
        self.replace_grouping_func(default_compare());
    }

    pub(crate) fn replace_grouping_func(&self, compare: CompareFn) {
        let built = {
            let mut state = self.state.write();
            state.grouping_fn = compare;
            state.phase == ModelPhase::Built
        };
        if built {
            self.regroup();
        }
        self.notify(&self.signals.grouping_changed);
    }

    /// Replaces how new groups are labelled. Existing groups are relabelled.
    ///
    /// The labeler runs while groups are being built and must not call back
    /// into this model.
    pub fn set_group_labeler<F>(&self, labeler: F)
    where
        F: Fn(&dyn ItemModel, usize, &ItemData) -> String + Send + Sync + 'static,
    {
        self.replace_group_labeler(Some(Arc::new(labeler)));
    }

    /// Restores the default labels: the key's display text.
    pub fn reset_group_labeler(&self) {
        self.replace_group_labeler(None);
    }

    pub(crate) fn replace_group_labeler(&self, labeler: Option<GroupLabelFn>) {
        {
            let mut state = self.state.write();
            state.labeler = labeler;
            if let (Some(provider), Some(_)) = (state.provider(), state.config.grouping_column) {
                for group in &state.groups {
                    let first = group.mapping().first().copied().unwrap_or(0);
                    group.set_label(state.new_group_label(provider, first, group.key()));
                }
            }
        }
        self.notify(&self.signals.grouping_changed);
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// The column ordering rows inside each group, if sorting is enabled.
    pub fn sorting_column(&self) -> Option<usize> {
        self.state.read().config.sorting_column
    }

    /// The role read from the sorting column.
    pub fn sorting_role(&self) -> ItemRole {
        self.state.read().config.sorting_role
    }

    /// The order in which rows inside a group are presented.
    pub fn sorting_order(&self) -> SortOrder {
        self.state.read().config.sorting_order
    }

    /// Changes the sorting column and re-sorts every group in place.
    ///
    /// Group membership is preserved; each non-empty group announces a
    /// reset, followed by `sorting_changed`. `None` restores provider order.
    /// Setting the current column does nothing.
    pub fn set_sorting_column(&self, column: Option<usize>) -> Result<()> {
        self.update_sorting(|config| config.sorting_column = column)
    }

    /// Changes the role read from the sorting column and re-sorts every group.
    pub fn set_sorting_role(&self, role: ItemRole) -> Result<()> {
        self.update_sorting(|config| config.sorting_role = role)
    }

    fn update_sorting(&self, update: impl FnOnce(&mut GroupingConfig)) -> Result<()> {
        {
            let mut state = self.state.write();
            let mut config = state.config.clone();
            update(&mut config);
            if let Err(err) = validate(state.provider(), &config) {
                tracing::warn!(target: targets::SORTING, %err, "sorting change rejected");
                return Err(err);
            }
            if config == state.config {
                tracing::debug!(target: targets::SORTING, "sorting unchanged");
                return Ok(());
            }
            tracing::debug!(
                target: targets::SORTING,
                column = ?config.sorting_column,
                role = ?config.sorting_role,
                "sorting changed"
            );
            state.config = config;
        }
        self.resort_all();
        self.notify(&self.signals.sorting_changed);
        Ok(())
    }

    /// Changes the order in which rows inside a group are presented.
    ///
    /// No row moves, but every group announces a reset since its visible
    /// order flips. Groups emptied by row removal are included.
    pub fn set_sorting_order(&self, order: SortOrder) {
        {
            let mut state = self.state.write();
            if state.config.sorting_order == order {
                return;
            }
            state.config.sorting_order = order;
        }
        tracing::debug!(target: targets::SORTING, ?order, "sorting order changed");
        let groups = self.all_groups();
        self.reset_groups(&groups, |_, _| {});
        self.notify(&self.signals.sorting_changed);
    }

    /// Replaces the comparator ordering rows inside groups.
    pub fn set_sorting_func<F>(&self, compare: F)
    where
        F: Fn(&dyn ItemModel, usize, &ItemData, &ItemData) -> Ordering + Send + Sync + 'static,
    {
        self.replace_sorting_func(Arc::new(compare));
    }

    /// Restores the built-in sorting comparator.
    pub fn reset_sorting_func(&self) {
        self.replace_sorting_func(default_compare());
    }

    pub(crate) fn replace_sorting_func(&self, compare: CompareFn) {
        let resort = {
            let mut state = self.state.write();
            state.sorting_fn = compare;
            state.config.sorting_column.is_some()
        };
        if resort {
            self.resort_all();
        }
        self.notify(&self.signals.sorting_changed);
    }

    // -------------------------------------------------------------------------
    // Building blocks
    // -------------------------------------------------------------------------

    /// Partitions every provider row into groups by the grouping column.
    ///
    /// Emits no notification.
    ///
    /// # Panics
    ///
    /// Panics if no provider is installed, the grouping column is disabled
    /// or out of range, or groups already exist.
    pub fn build_all_groups(&self) {
        self.state.write().build_all_groups(&self.this);
    }

    /// Puts every provider row into a single ungrouped group.
    ///
    /// Emits no notification.
    ///
    /// # Panics
    ///
    /// Panics if no provider is installed or groups already exist.
    pub fn build_no_grouping_group(&self) {
        self.state.write().build_no_grouping_group(&self.this);
    }

    /// Discards every group without rebuilding.
    ///
    /// Emits no notification. The model answers no queries until it is
    /// rebuilt.
    pub fn clear_all_groups(&self) {
        self.state.write().clear_all_groups();
    }

    /// Discards and rebuilds every group inside one reset pair.
    pub fn regroup(&self) {
        if self.state.read().provider.is_none() {
            tracing::debug!(target: targets::GROUPING, "regroup without provider");
            return;
        }
        self.reset_with(|state| state.rebuild(&self.this));
    }

    /// Removes a provider row, then regroups.
    ///
    /// Returns `false` if the provider refused the removal.
    pub fn remove(&self, row: usize) -> bool {
        let Some(provider) = self.base_model() else {
            return false;
        };
        if !provider.remove_row(row) {
            tracing::debug!(target: targets::PROVIDER, row, "provider refused row removal");
            return false;
        }
        self.regroup();
        true
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ModelPhase {
        self.state.read().phase
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.state.read().groups.len()
    }

    /// The group at a presentation index.
    ///
    /// With a descending grouping order, index 0 is the group with the
    /// largest key.
    pub fn group(&self, index: usize) -> Option<Arc<Group>> {
        self.state.read().visible(index).cloned()
    }

    /// Label of the group at a presentation index.
    pub fn group_label(&self, index: usize) -> Option<String> {
        self.state.read().visible(index).map(|g| g.label())
    }

    /// All groups, in presentation order.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let state = self.state.read();
        let mut groups = state.groups.clone();
        if state.config.grouping_order == SortOrder::Descending {
            groups.reverse();
        }
        groups
    }

    /// Presentation index of the first group with the given label.
    pub fn group_index_by_label(&self, label: &str) -> Option<usize> {
        self.groups().iter().position(|g| g.label() == label)
    }

    /// Finds the group holding a provider row.
    ///
    /// Returns the group and the row's position in it as presented (the
    /// sorting order applied). This scans every group.
    pub fn group_for_row(&self, row: usize) -> Option<(Arc<Group>, usize)> {
        self.state.read().group_for_row(row)
    }

    /// Resolves which provider column and role a group cell reads.
    pub(crate) fn resolve_cell(&self, column: usize, role: ItemRole) -> Option<ResolvedCell> {
        let state = self.state.read();
        let provider = state.provider.clone()?;
        let config = &state.config;
        let (column, role) = if column != 0 {
            (column, role)
        } else if role == ItemRole::Decoration {
            (config.pixmap_column?, config.pixmap_role)
        } else if let Some(index) = role.label_index() {
            let label = config.labels.get(index)?;
            (label.column, label.role)
        } else {
            (config.labels.first().map_or(0, |l| l.column), role)
        };
        Some(ResolvedCell {
            provider,
            column,
            role,
            sorting_order: config.sorting_order,
        })
    }

    // -------------------------------------------------------------------------
    // Labels and pixmaps
    // -------------------------------------------------------------------------

    /// Number of configured labels, the primary one included.
    pub fn label_count(&self) -> usize {
        self.state.read().config.labels.len()
    }

    /// The label at `index`; index 0 is the primary label.
    pub fn label(&self, index: usize) -> Option<ColumnRole> {
        self.state.read().config.labels.get(index).copied()
    }

    /// Adds a label and returns its index.
    ///
    /// Group rows answer it under `ItemRole::label(index)`.
    pub fn add_label(&self, column: usize, role: ItemRole) -> Result<usize> {
        let index = {
            let mut state = self.state.write();
            check_label_column(state.provider(), column)?;
            state.config.labels.push(ColumnRole::new(column, role));
            state.config.labels.len() - 1
        };
        self.refresh_rows();
        Ok(index)
    }

    /// Replaces the label at `index`.
    pub fn set_label(&self, index: usize, column: usize, role: ItemRole) -> Result<()> {
        {
            let mut state = self.state.write();
            let count = state.config.labels.len();
            if index >= count {
                return Err(Error::LabelOutOfRange { index, count });
            }
            check_label_column(state.provider(), column)?;
            state.config.labels[index] = ColumnRole::new(column, role);
        }
        self.refresh_rows();
        Ok(())
    }

    /// Removes the label at `index`. The primary label cannot be removed.
    pub fn remove_label(&self, index: usize) -> Result<()> {
        {
            let mut state = self.state.write();
            let count = state.config.labels.len();
            if index == 0 {
                return Err(Error::PrimaryLabel);
            }
            if index >= count {
                return Err(Error::LabelOutOfRange { index, count });
            }
            state.config.labels.remove(index);
        }
        self.refresh_rows();
        Ok(())
    }

    /// The column providing group row pixmaps, if any.
    pub fn pixmap_column(&self) -> Option<usize> {
        self.state.read().config.pixmap_column
    }

    /// The role read from the pixmap column.
    pub fn pixmap_role(&self) -> ItemRole {
        self.state.read().config.pixmap_role
    }

    /// Changes the pixmap column. `None` turns pixmaps off.
    pub fn set_pixmap_column(&self, column: Option<usize>) -> Result<()> {
        self.update_pixmap(|config| config.pixmap_column = column)
    }

    /// Changes the role read from the pixmap column.
    pub fn set_pixmap_role(&self, role: ItemRole) -> Result<()> {
        self.update_pixmap(|config| config.pixmap_role = role)
    }

    fn update_pixmap(&self, update: impl FnOnce(&mut GroupingConfig)) -> Result<()> {
        {
            let mut state = self.state.write();
            let mut config = state.config.clone();
            update(&mut config);
            validate(state.provider(), &config)?;
            if config == state.config {
                return Ok(());
            }
            state.config = config;
        }
        self.refresh_rows();
        Ok(())
    }

    /// Tells every group view to re-read its rows.
    fn refresh_rows(&self) {
        let groups = self.all_groups();
        self.reset_groups(&groups, |_, _| {});
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Snapshot of every column, role, order, label and pixmap setting.
    pub fn config(&self) -> GroupingConfig {
        self.state.read().config.clone()
    }

    /// Applies a configuration snapshot to the installed provider.
    ///
    /// The whole snapshot is validated first; on error nothing changes.
    /// Otherwise all groups are rebuilt inside one reset pair.
    pub fn apply_config(&self, config: &GroupingConfig) -> Result<()> {
        if config.labels.is_empty() {
            return Err(Error::config("at least the primary label is required"));
        }
        self.install(None, config.clone())
    }
}

fn check_label_column(provider: Option<&dyn ItemModel>, column: usize) -> Result<()> {
    match provider {
        Some(p) if column >= p.column_count() => {
            Err(Error::column_out_of_range(column, p.column_count()))
        }
        _ => Ok(()),
    }
}

impl Drop for GroupModel {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let (Some(provider), Some(connections)) = (&state.provider, state.connections.take()) {
            connections.disconnect(&**provider);
        }
    }
}

impl std::fmt::Debug for GroupModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("GroupModel")
            .field("config", &state.config)
            .field("groups", &state.groups.len())
            .field("phase", &state.phase)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(GroupModel: Send, Sync);
