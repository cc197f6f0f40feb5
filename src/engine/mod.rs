pub mod invoker;
pub mod orchestrator;
pub mod result_store;
#[cfg(test)]
mod integration_tests;

pub use invoker::{invoker_for, GenericInvoker, Invoker, StreamingInvoker};
pub use orchestrator::{Orchestrator, ScheduleOutput};
pub use result_store::{ByteStream, NodeOutput, ResultStore};
