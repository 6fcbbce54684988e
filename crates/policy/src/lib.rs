//! Capability registry and declared policy.
//!
//! Core principle: **a program declares the capabilities it needs, and
//! anything broader is suspect.**
//!
//! This crate holds the pure data side of the guard: the closed set of
//! [`Capability`] values, descriptors with optional scopes, the
//! [`Grant`] shorthand callers write, and [`GuardConfig`] as loaded from TOML.

mod capability;
mod config;
mod error;
mod grant;
mod policy;

pub use capability::{Capability, CapabilityDescriptor, CapabilityState, CapabilityStatus};
pub use config::GuardConfig;
pub use error::{Error, Result};
pub use grant::{DescriptorGrant, Grant};
pub use policy::Policy;
