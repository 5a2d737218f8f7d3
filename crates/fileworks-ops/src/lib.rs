//! File operations and the task engine for fileworks.
//!
//! Batch operations (delete, copy, move) run item by item: a failing item is
//! recorded as an [`fileworks_core::OperationError`] and the batch moves on.
//! Cancellation is checked between items. Creating and renaming a single
//! entry are plain synchronous calls.
//!
//! [`TaskEngine`] puts every task kind, including search, measuring and the
//! archive engine, behind one `start`/`cancel`/event-stream surface.

mod batch;
mod conflict;
mod copy;
mod create;
mod delete;
mod executor;
mod move_op;
mod rename;
mod request;

pub use conflict::{Placement, auto_rename_path, place};
pub use copy::{CopyOptions, copy};
pub use create::create_folder;
pub use delete::delete;
pub use executor::TaskEngine;
pub use move_op::move_to;
pub use rename::{rename, validate_filename};
pub use request::TaskRequest;
