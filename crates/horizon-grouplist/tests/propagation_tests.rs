//! Provider changes flowing into `GroupModel` and its groups.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use horizon_grouplist::model::UNGROUPED_LABEL;
use horizon_grouplist::prelude::*;

type Log = Arc<Mutex<Vec<String>>>;

fn row(key: &str, value: i64, name: &str) -> Vec<ItemData> {
    vec![ItemData::from(key), ItemData::from(value), ItemData::from(name)]
}

fn provider() -> Arc<SimpleTableModel> {
    Arc::new(SimpleTableModel::from_data(vec![
        row("b", 10, "r0"),
        row("a", 0, "r1"),
        row("a", 0, "r2"),
        row("c", 0, "r3"),
        row("b", 5, "r4"),
    ]))
}

fn grouped(sorting_column: Option<usize>) -> (Arc<SimpleTableModel>, Arc<GroupModel>) {
    let data = provider();
    let model = GroupModel::new();
    model
        .set_base_model(
            Some(data.clone()),
            Some(0),
            sorting_column,
            SortOrder::Ascending,
            SortOrder::Ascending,
        )
        .unwrap();
    (data, model)
}

fn watch(model: &GroupModel) -> Log {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let signals = model.signals();
    for (signal, name) in [
        (&signals.model_about_to_reset, "about"),
        (&signals.model_reset, "reset"),
        (&signals.grouping_changed, "grouping"),
        (&signals.sorting_changed, "sorting"),
    ] {
        let log = log.clone();
        signal.connect(move |_| log.lock().push(name.to_string()));
    }
    log
}

/// Records the reset pair and cell changes of every current group.
fn watch_groups(model: &GroupModel, log: &Log) {
    for group in model.groups() {
        let name = group.label();
        let signals = group.signals();

        let (recv, tag) = (log.clone(), format!("{name}:about"));
        signals.model_about_to_reset.connect(move |_| recv.lock().push(tag.clone()));
        let (recv, tag) = (log.clone(), format!("{name}:reset"));
        signals.model_reset.connect(move |_| recv.lock().push(tag.clone()));
        let (recv, tag) = (log.clone(), name.clone());
        signals.data_changed.connect(move |(top_left, _, _)| {
            recv.lock().push(format!("{tag}:changed {top_left}"));
        });
    }
}

fn mappings(model: &GroupModel) -> Vec<(String, Vec<usize>)> {
    model.groups().iter().map(|g| (g.label(), g.mapping())).collect()
}

#[test]
fn test_plain_cell_change_notifies_owning_group() {
    let (data, model) = grouped(None);
    let log = watch(&model);
    watch_groups(&model, &log);

    data.set_cell(4, 2, ItemData::from("renamed"));

    assert_eq!(*log.lock(), ["b:changed (1, 0)"]);
    assert_eq!(model.group(1).unwrap().data(1, 2, ItemRole::Display).as_string(), Some("renamed"));
}

#[test]
fn test_cell_change_under_descending_sorting_order() {
    let (data, model) = grouped(None);
    model.set_sorting_order(SortOrder::Descending);
    let log = watch(&model);
    watch_groups(&model, &log);

    data.set_cell(4, 2, ItemData::from("renamed"));

    assert_eq!(*log.lock(), ["b:changed (0, 0)"]);
}

#[test]
fn test_grouping_key_change_regroups() {
    let (data, model) = grouped(None);
    let log = watch(&model);

    data.set_cell(1, 0, ItemData::from("c"));

    assert_eq!(*log.lock(), ["about", "reset"]);
    assert_eq!(
        mappings(&model),
        [
            ("a".to_string(), vec![2]),
            ("b".to_string(), vec![0, 4]),
            ("c".to_string(), vec![1, 3]),
        ]
    );
}

#[test]
fn test_grouping_key_change_can_drop_a_group() {
    let (data, model) = grouped(None);
    data.set_cell(3, 0, ItemData::from("a"));

    assert_eq!(model.group_count(), 2);
    assert_eq!(model.group_index_by_label("c"), None);
    assert_eq!(model.group(0).unwrap().mapping(), vec![1, 2, 3]);
}

#[test]
fn test_sort_key_change_resorts_owning_group() {
    let (data, model) = grouped(Some(1));
    assert_eq!(model.group(1).unwrap().mapping(), vec![4, 0]);
    let log = watch(&model);
    watch_groups(&model, &log);

    data.set_cell(0, 1, ItemData::from(1));

    assert_eq!(*log.lock(), ["b:about", "b:reset"]);
    assert_eq!(model.group(1).unwrap().mapping(), vec![0, 4]);
    assert_eq!(model.phase(), ModelPhase::Built);
}

#[test]
fn test_removed_rows_shift_groups_in_place() {
    let (data, model) = grouped(None);
    let before = model.groups();
    let log = watch(&model);
    watch_groups(&model, &log);

    assert!(data.remove_rows(1, 2));

    let after = model.groups();
    assert_eq!(after.len(), 3);
    for (a, b) in before.iter().zip(&after) {
        assert!(Arc::ptr_eq(a, b));
    }
    assert!(after[0].is_empty());
    assert_eq!(after[1].mapping(), vec![0, 2]);
    assert_eq!(after[2].mapping(), vec![1]);
    assert_eq!(*log.lock(), ["a:about", "a:reset"]);

    assert_eq!(after[1].data(1, 2, ItemRole::Display).as_string(), Some("r4"));
    assert_eq!(after[2].data(0, 0, ItemRole::Display).as_string(), Some("c"));
}

#[test]
fn test_sorting_order_resets_emptied_groups() {
    let (data, model) = grouped(None);
    assert!(data.remove_rows(1, 2));
    assert!(model.group(0).unwrap().is_empty());

    let log = watch(&model);
    watch_groups(&model, &log);
    model.set_sorting_order(SortOrder::Descending);

    assert_eq!(
        *log.lock(),
        ["a:about", "a:reset", "b:about", "b:reset", "c:about", "c:reset", "sorting"]
    );
    assert_eq!(model.group(1).unwrap().map_row_to_base_model(0), Some(2));
}

#[test]
fn test_remove_through_model_regroups() {
    let (data, model) = grouped(None);
    let log = watch(&model);

    assert!(model.remove(3));

    assert_eq!(data.row_count(), 4);
    assert_eq!(*log.lock(), ["about", "reset"]);
    assert_eq!(
        mappings(&model),
        [("a".to_string(), vec![1, 2]), ("b".to_string(), vec![0, 3])]
    );
    assert!(!model.remove(9));
}

#[test]
fn test_remove_through_group() {
    let (data, model) = grouped(Some(1));
    let b = model.group(1).unwrap();
    assert_eq!(b.mapping(), vec![4, 0]);

    // Local row 0 shows provider row 4.
    assert!(b.remove_row(0));
    assert_eq!(data.row_count(), 4);
    assert_eq!(model.group(1).unwrap().mapping(), vec![0]);
    assert!(!model.group(1).unwrap().remove_row(5));
}

#[test]
fn test_inserted_rows_regroup() {
    let (data, model) = grouped(None);
    let log = watch(&model);

    data.append_row(row("a", 2, "r5"));
    data.append_row(row("d", 2, "r6"));

    assert_eq!(*log.lock(), ["about", "reset", "about", "reset"]);
    assert_eq!(model.group(0).unwrap().mapping(), vec![1, 2, 5]);
    assert_eq!(model.group_label(3).as_deref(), Some("d"));
}

#[test]
fn test_provider_reset_rebuilds() {
    let (data, model) = grouped(None);
    let log = watch(&model);
    let phases = Arc::new(Mutex::new(Vec::new()));
    {
        let weak = Arc::downgrade(&model);
        let phases = phases.clone();
        model.signals().model_reset.connect(move |_| {
            if let Some(model) = weak.upgrade() {
                phases.lock().push(model.phase());
            }
        });
    }

    data.set_data(vec![row("x", 1, "n0"), row("y", 2, "n1"), row("x", 3, "n2")]);

    assert_eq!(*log.lock(), ["about", "reset"]);
    assert_eq!(*phases.lock(), [ModelPhase::Built]);
    assert_eq!(mappings(&model), [("x".to_string(), vec![0, 2]), ("y".to_string(), vec![1])]);

    data.clear();
    assert_eq!(model.group_count(), 0);
    assert_eq!(model.phase(), ModelPhase::Built);
}

/// A provider whose column count changes with its contents.
struct Sheet {
    columns: AtomicUsize,
    rows: RwLock<Vec<Vec<ItemData>>>,
    signals: ModelSignals,
}

impl Sheet {
    fn new(rows: Vec<Vec<ItemData>>) -> Self {
        Self {
            columns: AtomicUsize::new(rows.first().map_or(0, Vec::len)),
            rows: RwLock::new(rows),
            signals: ModelSignals::new(),
        }
    }

    fn replace(&self, rows: Vec<Vec<ItemData>>) {
        self.signals.emit_reset(|| {
            self.columns.store(rows.first().map_or(0, Vec::len), Ordering::SeqCst);
            *self.rows.write() = rows;
        });
    }
}

impl ItemModel for Sheet {
    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn column_count(&self) -> usize {
        self.columns.load(Ordering::SeqCst)
    }

    fn data(&self, row: usize, column: usize, role: ItemRole) -> ItemData {
        if role != ItemRole::Display {
            return ItemData::None;
        }
        self.rows
            .read()
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}

#[test]
fn test_vanished_columns_are_disabled() {
    let sheet = Arc::new(Sheet::new(vec![
        row("b", 2, "x"),
        row("a", 1, "y"),
        row("b", 1, "x"),
    ]));
    let model = GroupModel::builder(sheet.clone())
        .grouping_column(2)
        .sorting_column(1)
        .build()
        .unwrap();
    assert_eq!(model.group_count(), 2);
    assert_eq!(model.group(1).unwrap().mapping(), vec![1]);
    let log = watch(&model);

    sheet.replace(vec![
        vec![ItemData::from("q")],
        vec![ItemData::from("p")],
    ]);

    assert_eq!(*log.lock(), ["about", "reset"]);
    assert_eq!(model.grouping_column(), None);
    assert_eq!(model.sorting_column(), None);
    assert_eq!(model.group_count(), 1);
    let group = model.group(0).unwrap();
    assert_eq!(group.label(), UNGROUPED_LABEL);
    assert_eq!(group.mapping(), vec![0, 1]);
    assert_eq!(group.column_count(), 1);
}

#[derive(Debug)]
struct Photo {
    album: &'static str,
    title: &'static str,
    taken: i64,
    thumbnail: Arc<Vec<u8>>,
}

fn photo(album: &'static str, title: &'static str, taken: i64) -> Photo {
    Photo {
        album,
        title,
        taken,
        thumbnail: Arc::new(title.bytes().collect()),
    }
}

fn album_model() -> Arc<TableModel<Photo>> {
    Arc::new(
        TableModel::new(
            vec![
                photo("Summer", "beach", 30),
                photo("Winter", "snow", 10),
                photo("Summer", "pier", 20),
            ],
            4,
            |p: &Photo, column, role| match (column, role) {
                (0, ItemRole::Display) => ItemData::from(p.album),
                (1, ItemRole::Display) => ItemData::from(p.title),
                (2, ItemRole::Display) => ItemData::from(p.taken),
                (3, ItemRole::Decoration) => ItemData::new(p.thumbnail.clone()),
                _ => ItemData::None,
            },
        )
        .with_headers(|section, orientation, role| match (orientation, role) {
            (Orientation::Horizontal, ItemRole::Display) => {
                ItemData::from(["Album", "Title", "Taken", "Thumbnail"][section.min(3)])
            }
            _ => ItemData::None,
        }),
    )
}

#[test]
fn test_group_rows_show_labels_and_pixmaps() {
    let photos = album_model();
    let model = GroupModel::builder(photos.clone())
        .grouping_column(0)
        .sorting_column(2)
        .pixmap(3, ItemRole::Decoration)
        .label(1, ItemRole::Display)
        .build()
        .unwrap();

    let summer = model.group(0).unwrap();
    assert_eq!(summer.mapping(), vec![2, 0]);
    assert_eq!(summer.data(0, 0, ItemRole::Display).as_string(), Some("Summer"));
    assert_eq!(summer.data(0, 0, ItemRole::label(1)).as_string(), Some("pier"));
    assert_eq!(summer.data(1, 0, ItemRole::label(1)).as_string(), Some("beach"));
    assert!(summer.data(0, 0, ItemRole::label(2)).is_none());

    let thumbnail = summer.data(1, 0, ItemRole::Decoration);
    assert_eq!(
        thumbnail.downcast::<Arc<Vec<u8>>>().map(|b| b.as_slice()),
        Some(&b"beach"[..])
    );

    assert_eq!(
        summer.header_data(1, Orientation::Horizontal, ItemRole::Display).as_string(),
        Some("Title")
    );
    assert_eq!(
        summer.header_data(1, Orientation::Vertical, ItemRole::Display).as_string(),
        Some("2")
    );
}

#[test]
fn test_typed_provider_changes() {
    let photos = album_model();
    let model = GroupModel::builder(photos.clone())
        .grouping_column(0)
        .sorting_column(2)
        .build()
        .unwrap();
    let log = watch(&model);

    // A whole-row change spans the grouping column.
    photos.modify_row(1, |p| p.album = "Summer");
    assert_eq!(*log.lock(), ["about", "reset"]);
    assert_eq!(model.group_count(), 1);
    assert_eq!(model.group(0).unwrap().mapping(), vec![1, 2, 0]);

    photos.push_row(photo("Autumn", "leaves", 5));
    assert_eq!(model.group_index_by_label("Autumn"), Some(0));

    assert!(photos.take_row(0).is_some());
    assert_eq!(model.group(1).unwrap().mapping(), vec![0, 1]);
}

#[test]
fn test_dropped_model_stops_listening() {
    let (data, model) = grouped(None);
    let group = model.group(0).unwrap();
    drop(model);

    assert_eq!(data.signals().data_changed.connection_count(), 0);
    data.set_cell(1, 0, ItemData::from("z"));

    // The group outlives its owner but no longer reaches the provider.
    assert_eq!(group.row_count(), 2);
    assert!(group.data(0, 0, ItemRole::Display).is_none());
    assert_eq!(group.map_row_to_base_model(0), None);
    assert_eq!(group.visible_index(), None);
}
