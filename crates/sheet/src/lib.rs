//! Inventory transport: fetches the live cellar sheet's JSON export and turns
//! it into an [`cellarhand_core::InventorySnapshot`].
//!
//! The export is a spreadsheet published through an Apps Script endpoint, so
//! the payload shape drifts: sometimes a bare array, sometimes wrapped in a
//! `data`/`items`/`rows`/`content` envelope. This crate absorbs that drift and
//! nothing else; record contents are passed through unvalidated.

pub mod client;

pub use client::{SheetClient, SheetError};
