//! Services layer (ports + adapters).
//!
//! - `ports`: collaborator contracts the kernel is written against.
//! - `adapters`: OS/runtime specific implementations (IO/async).

pub mod adapters;
pub mod bus;
pub mod ports;

pub use bus::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
