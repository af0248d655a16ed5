//! Scripts for deploying and initializing the Rfa token and Staking contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod interfaces;
pub mod rpc;
pub mod types;
pub mod utils;
