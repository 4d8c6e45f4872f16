#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capra/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod bday;
pub use bday::{is_business_day, next_business_day};

mod quarterly;
pub use quarterly::{DateShift, SecondFridaySchedule, second_friday_from_month_end};

mod annual;
pub use annual::MarchLastTradingDaySchedule;
