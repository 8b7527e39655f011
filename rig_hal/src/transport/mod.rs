//! Concrete serial transports.
//!
//! - [`port`] - Real devices through the `serialport` crate
//! - [`loopback`] - In-memory TX→RX jumper for tests and bring-up
//! - [`simulated`] - Stand-in microcontroller for `--simulate`
//!
//! Every transport hands out [`rig_common::serial::LineLink`]s, so framing
//! behaves identically on hardware and in simulation.

pub mod loopback;
pub mod port;
pub mod simulated;

pub use loopback::{LoopbackOpener, LoopbackStream};
pub use port::{PortOpener, list_ports};
pub use simulated::{SimulatedMcu, SimulatedOpener};
