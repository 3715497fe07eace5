// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Client for the perfdash server: configuration, the JSON endpoints and the
//! measurement-set format.

pub mod client;
pub mod config;
pub mod measurement_set;

pub use client::{RemoteApiClient, measurement_set_path};
pub use config::{ClientConfig, URL_ENV_VAR};
pub use measurement_set::decode_measurement_set;
