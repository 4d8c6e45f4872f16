#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capra/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod engine;
pub use engine::{
    CapConfig, DEFAULT_CONSERVATION_TOLERANCE, DEFAULT_TOLERANCE, IterativeCapper, Uncapped,
};

mod state;
pub use state::CapState;
