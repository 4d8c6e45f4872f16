#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capra/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod capper;
pub use capper::{CapError, CapOutcome, Capper, IntegrityCheck};

mod schedule;
pub use schedule::{RebalanceSchedule, ScheduleError};
