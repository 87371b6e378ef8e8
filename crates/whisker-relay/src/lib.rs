//! Message relay between simulation clients and a single decision-maker.
//!
//! Simulation clients register their agents and push [`ClientData`] toward the decision-maker;
//! the decision-maker answers with [`ServerData`] addressed to an agent (or to `"*"`, the first
//! registered agent). The relay holds no simulation state of its own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod registry;
pub mod sink;
pub mod wire;

pub use registry::{ClientId, Relay, RelayError};
pub use sink::RelaySink;
pub use wire::{
    decode_client_data, decode_server_data, encode_client_data, encode_server_data, ClientData,
    ServerData, Target, WireError,
};
