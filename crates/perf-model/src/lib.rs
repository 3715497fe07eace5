// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Build requests and the dashboard objects they reference.

pub mod build_request;
pub mod entities;
pub mod payload;
pub mod status;
pub mod store;

pub use build_request::{BuildRequest, BuildRequestInit, format_waiting_time};
pub use entities::{Metric, Platform, Repository, Root, RootSet, Test, TestGroup, Triggerable};
pub use payload::{BuildRequestsPayload, ManifestPayload, TriggerablesPayload};
pub use status::BuildRequestStatus;
pub use store::ModelStore;
