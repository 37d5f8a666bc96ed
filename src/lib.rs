//! Flowmarch is a driver for explicit time-integration of the compressible
//! inviscid Euler equations on a distributed mesh. It owns the stepping
//! loop: a fixed-step explicit integrator advances the conserved fields, a
//! timestep policy selects step sizes (fixed or CFL-derived) and lands the
//! run exactly on the final time, and a checkpoint reporter periodically
//! emits status text and visualization dumps and watches for divergence from
//! a reference solution. The discretization itself (flux computation,
//! boundary conditions, partitioning) lives behind narrow capability traits;
//! runs may be distributed with one process per mesh partition, in which
//! case a communicator designates the reporting rank and reconciles solution
//! errors across the group.

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod hydro;
pub mod initializers;
pub mod integrate;
pub mod message;
pub mod schedule;
pub mod state;
pub mod timestep;
pub mod viz;
