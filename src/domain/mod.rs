// Domain layer: records, transform options and the ports every adapter implements.

pub mod model;
pub mod ports;
