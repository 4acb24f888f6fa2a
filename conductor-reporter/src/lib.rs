//! # conductor-reporter
//!
//! Progress reporters for the sequential loader: a live console reporter and
//! the end-of-run summary (table or JSON).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use conductor_loader::Suite;
//! use conductor_reporter::{summary, ConsoleReporter};
//!
//! async fn run(suite: Suite) {
//!     let suite = suite.with_observer(Arc::new(ConsoleReporter::stdout()));
//!     let result = suite.run().await;
//!     println!("{}", summary::render_table(&result));
//! }
//! ```

pub mod console;
pub mod error;
pub mod summary;

pub use console::{ComponentState, ConsoleReporter};
pub use error::ReportError;
pub use summary::{classification_label, render_table, to_json};
