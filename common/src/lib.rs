pub mod config;
pub mod range;
pub mod table;

/// Column written by the benchmark binaries for the measured bandwidth
pub const THROUGHPUT_FIELD: &str = "Throughput[GB/s]";
