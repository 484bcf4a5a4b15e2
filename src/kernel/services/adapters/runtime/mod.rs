//! Async runtime adapter: executes I/O effects and sends completions back to the store.

mod async_runtime;

pub use async_runtime::AsyncRuntime;
