//! Development driver for the Pulse kernel: in-memory wiring of every
//! component plus synthetic history for simulations.

pub mod kernel;
pub mod simulate;
pub mod synthetic;

pub use kernel::Kernel;
