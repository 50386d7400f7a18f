//! Tools as the orchestrating model sees them.
//!
//! A [`Tool`] pairs a [`ToolDescriptor`] with an async invocation; a
//! [`ToolSet`] is the ordered, name-addressed collection handed to a single
//! model session.

pub mod registry;
pub mod tool;

pub use registry::ToolSet;
pub use tool::{Tool, ToolDescriptor};
