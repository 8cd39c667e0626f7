//! Line items of a parent record and their display model.
//!
//! This crate contains the pure part of the pipeline: the records as fetched,
//! the derived display rows, and the data-only table/action descriptors handed
//! to a rendering collaborator (no IO, no async).

pub mod columns;
pub mod labels;
pub mod line_item;
pub mod view_model;

pub use columns::{
    CellClass, ColumnDescriptor, ColumnKind, RowAction, RowActionDescriptor, UnknownAction,
    action_set, columns,
};
pub use labels::Labels;
pub use line_item::{LineItem, Product};
pub use view_model::{DisplayRow, ListView, STOCK_ERROR_CLASS, has_stock_error, map_row, map_rows};
