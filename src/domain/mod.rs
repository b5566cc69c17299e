// Domain layer: core models, ports, and the pure retrieval rules (feed parsing, recency window).

pub mod feed;
pub mod model;
pub mod ports;
pub mod recency;
pub mod roles;
