#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capra/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::CompositionError;

mod composition;
pub use composition::Composition;

mod exclusions;
pub use exclusions::ExclusionRules;

mod snapshots;
pub use snapshots::{derive_returns, factor_snapshots};

mod table;
pub use table::record_table;

mod builder;
pub use builder::{CompositionBuilder, CompositionConfig};
