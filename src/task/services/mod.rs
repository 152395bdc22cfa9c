//! Application services for the task workflow.

mod workflow;

pub use workflow::{TaskWorkflowError, TaskWorkflowResult, TaskWorkflowService};
