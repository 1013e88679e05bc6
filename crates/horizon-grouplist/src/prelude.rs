//! Prelude module for Horizon Grouplist.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_grouplist::prelude::*;
//! ```

// ============================================================================
// Signal/Slot System
// ============================================================================

pub use crate::{ConnectionId, Signal};

// ============================================================================
// Data Providers
// ============================================================================

pub use crate::model::{
    CellIndex, ItemData, ItemModel, ItemRole, ModelSignals, Orientation, SimpleTableModel,
    TableModel,
};

// ============================================================================
// Grouping
// ============================================================================

pub use crate::model::{ColumnRole, CompareFn, Group, GroupModel, ModelPhase, SortOrder};
pub use crate::{Error, GroupModelBuilder, GroupingConfig};
