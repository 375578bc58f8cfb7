//! Background Tasks Module
//!
//! Optional maintenance tasks layered on top of the storage adapter.

mod sweep;

pub use sweep::spawn_sweep_task;
