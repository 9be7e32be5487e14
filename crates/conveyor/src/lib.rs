#![forbid(unsafe_code)]
//! Sequential async pipeline over newline-delimited subprocess output.
//!
//! A [`Conveyor`] launches an external process, splits its stdout into
//! trimmed, non-empty records (one per line, optionally parsed as JSON), and
//! feeds each record through a user handler with **at most one invocation in
//! flight at a time**. Once the source has exited and every buffered record
//! has been consumed, an optional finisher runs over the full ordered result
//! sequence and its value becomes the pipeline's return value.
//!
//! ```rust,no_run
//! use conveyor::Conveyor;
//! # #[tokio::main]
//! # async fn main() -> Result<(), conveyor::ConveyorError> {
//! let pipeline = Conveyor::builder("git").args(["log", "--oneline"]).build();
//! let commits = pipeline
//!     .run_lines_with(
//!         |line| async move { Ok::<_, std::convert::Infallible>(line) },
//!         |results| async move { results.len() },
//!     )
//!     .await?;
//! println!("{commits} commits");
//! # Ok(()) }
//! ```
//!
//! Known limitation: output after the final newline (or output that never
//! contains a newline) is discarded, never handed to the handler.

mod builder;
mod error;
mod pipeline;
mod process;
mod splitter;

pub use builder::ConveyorBuilder;
pub use error::ConveyorError;
pub use pipeline::Conveyor;
pub use splitter::{split_records, RecordSplitter};
