// src/core/mod.rs

pub mod backward;
pub mod net;

pub use backward::{read_backward, BackwardLines};
pub use net::{Http, NetError};
