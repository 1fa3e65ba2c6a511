#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod remote;
pub mod value;

#[doc(inline)]
pub use config::{BackoffConfig, RemoteStoreConfig, RemoteStoreConfigBuilder};
#[doc(inline)]
pub use error::{RemoteStoreError, RemoteStoreErrorCode, RemoteStoreResult};
#[doc(inline)]
pub use remote::RemoteStore;
