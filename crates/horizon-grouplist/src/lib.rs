//! Horizon Grouplist - grouping and sorting models for grouped list views.
//!
//! This is the main umbrella crate. It partitions the rows of a flat
//! [`ItemModel`](model::ItemModel) into [`Group`](model::Group)s keyed by a
//! column value, keeps each group sorted by another column, and follows the
//! provider's change notifications so views stay in sync.
//!
//! Rendering, delegates and event handling are left to the host toolkit;
//! it reaches this crate through the model queries and [`Signal`]s.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_grouplist::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let photos = Arc::new(SimpleTableModel::from_data(vec![
//!         vec![ItemData::from("Holidays"), ItemData::from("beach.jpg")],
//!         vec![ItemData::from("Family"), ItemData::from("dinner.jpg")],
//!         vec![ItemData::from("Holidays"), ItemData::from("boat.jpg")],
//!     ]));
//!
//!     let model = GroupModel::builder(photos)
//!         .grouping_column(0)
//!         .sorting_column(1)
//!         .label(1, ItemRole::Display)
//!         .build()?;
//!
//!     for group in model.groups() {
//!         println!("{} ({} photos)", group.label(), group.row_count());
//!     }
//!     Ok(())
//! }
//! ```

pub use horizon_grouplist_core::*;

pub mod config;
pub mod error;
pub mod model;
pub mod prelude;

pub use config::{GroupModelBuilder, GroupingConfig};
pub use error::{Error, Result};
