// Domain layer: typed records, results and collaborator ports.

pub mod bilan;
pub mod merge;
pub mod model;
pub mod ports;
