#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capra/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod date;
pub use date::date_from_unix_days;

mod entity;
pub use entity::EntityId;

mod factor;
pub use factor::{FactorName, MARKET_CAP};

mod record;
pub use record::EntityRecord;

mod series;
pub use series::{BASE_LEVEL, CumulativeIndex};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
