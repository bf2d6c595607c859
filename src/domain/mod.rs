// Domain layer: request/collage models and the ports the core talks through.

pub mod model;
pub mod ports;
