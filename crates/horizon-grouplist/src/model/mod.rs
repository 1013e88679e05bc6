//! Model layer for grouped lists.
//!
//! This module provides the types a grouped list view is built on:
//!
//! - A flat data provider protocol ([`ItemModel`], [`ModelSignals`])
//! - A dynamically typed cell value ([`ItemData`]) read under an [`ItemRole`]
//! - A three-way comparator protocol ([`CompareFn`], [`compare_values`])
//! - Buckets of rows sharing a key ([`Group`]), each usable as a list model
//! - The container partitioning a provider into buckets ([`GroupModel`])
//!
//! # Core Types
//!
//! - `CellIndex`: Identifies a cell in a flat model
//! - `ItemRole`: Specifies what type of data to access
//! - `ItemData`: Type-erased container for cell data
//! - `ItemModel`: The trait that providers implement
//! - `ModelSignals`: Signals for change notifications
//!
//! # Model Implementations
//!
//! - `TableModel`: Typed rows with closure-based data extraction
//! - `SimpleTableModel`: 2D grid of `ItemData`
//! - `Group`: One bucket of a `GroupModel`
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Provider   │────>│  GroupModel  │────>│    View     │
//! │ (ItemModel) │     │  (Signals)   │     │             │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │                    │
//!                            │   ┌─────────────┐  │
//!                            └──>│ Group (per  │<─┘
//!                                │ bucket list)│
//!                                └─────────────┘
//! ```
//!
//! The provider's signals drive the `GroupModel`; views observe the
//! `GroupModel` for structural changes and each `Group` for row changes.

mod compare;
mod group;
mod group_model;
mod index;
mod role;
mod table_model;
mod traits;

pub use compare::{CompareFn, compare_values, default_compare, try_compare_values};
pub use group::Group;
pub use group_model::{
    ColumnRole, GroupLabelFn, GroupModel, GroupModelSignals, ModelPhase, UNGROUPED_LABEL,
};
pub use index::CellIndex;
pub use role::{ItemData, ItemRole, LABEL_ROLE_BASE, ValueFamily};
pub use table_model::{CellExtractor, HeaderExtractor, SimpleTableModel, TableModel};
pub use traits::{ItemModel, ModelSignals, Orientation, SortOrder};
