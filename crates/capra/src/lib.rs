//! # capra
//!
//! Reconstruction of rule-based equity indices: rebalance calendars,
//! constituent selection with iterative concentration capping, and
//! buy-and-hold replication of the resulting return path.
//!
//! This crate provides a unified interface to the capra ecosystem.
//! Individual components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `traits`: Trait abstractions
//! - `capping`: Iterative concentration capping
//! - `calendar`: Rebalance schedules
//! - `composition`: Constituent selection and weighting
//! - `replication`: Cumulative index replication
//!
//! ## Example
//!
//! ```rust,ignore
//! // With default features (all components):
//! use capra::capping;
//! use capra::replication;
//!
//! // Or with specific features only:
//! // [dependencies]
//! // capra = { version = "0.1", default-features = false, features = ["capping"] }
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use capra_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use capra_traits as traits;
#[cfg(feature = "capping")]
#[doc(inline)]
pub use capra_capping as capping;
#[cfg(feature = "calendar")]
#[doc(inline)]
pub use capra_calendar as calendar;
#[cfg(feature = "composition")]
#[doc(inline)]
pub use capra_composition as composition;
#[cfg(feature = "replication")]
#[doc(inline)]
pub use capra_replication as replication;
