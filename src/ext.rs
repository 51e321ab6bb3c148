//! Extension contracts for attaching relay-issued credentials to outbound requests.

pub mod request_signer;

pub use request_signer::*;
