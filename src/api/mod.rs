//! API Module - Control surface exposed to the transport layer.

pub mod control;
