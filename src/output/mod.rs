//! User-facing output for the command line.
//!
//! Diagnostics go through `tracing`; this module prints what the user asked
//! for: inventories, project details, conversion and merge results.
//!
//! # Examples
//!
//! ```no_run
//! use pdfbinder::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, true);
//! formatter.section("Inventory");
//! formatter.inventory(&[]);
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter, inventory_row, project_line};
