//! Transport adapters

pub mod tcp;

pub use tcp::{SessionWorker, TcpAdapter};
