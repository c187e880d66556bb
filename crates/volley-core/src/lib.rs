//! volley-core: dispatch engine and traits for Volley.
//!
//! # Overview
//!
//! Volley issues one fixed outbound call over and over, rotating through a
//! pool of credentials, until a target number of successful responses has
//! been observed. The core crate defines:
//!
//! - [`DispatchEngine`]: bounded worker pool, shared progress, stop condition
//! - [`RequestExecutor`]: the single-call seam every transport implements
//! - [`BatchCoordinator`]: request validation, credential loading, result assembly
//! - [`CredentialSource`] / [`CredentialSet`]: credential loading and rotation
//! - [`PayloadEncoder`] / [`ResponseDecoder`]: request body and response parsing,
//!   protobuf ([`wire`]) by default
//! - [`Region`]: region codes and their three routing classes

pub mod coordinator;
pub mod credential;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod executor;
pub mod payload;
pub mod region;
pub mod wire;

pub use coordinator::{
    BatchCoordinator, BatchParams, BatchReport, BatchRequest, CoordinatorConfig, RequestDefaults,
    RouteTable,
};
pub use credential::{CredentialSet, CredentialSource, JsonFileCredentialSource, StaticCredentialSource};
pub use decoder::{JsonProfileDecoder, ProfileRecord, ProtobufProfileDecoder, ResponseDecoder};
pub use engine::{BatchResult, DispatchEngine, EngineConfig};
pub use error::{AttemptError, CredentialError, DecodeError, DispatchError};
pub use executor::RequestExecutor;
pub use payload::{PayloadEncoder, ProtobufIdEncoder};
pub use region::{Region, RegionClass, DEFAULT_REGION_CODE};
pub use wire::{AccountInfo, ProfileEnvelope, ProfileRequest};
