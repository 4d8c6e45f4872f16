//! Date conversion helpers.

use crate::Date;

/// Days between 0001-01-01 and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a day count since the Unix epoch (the physical representation of
/// dataframe date columns) into a [`Date`].
#[must_use]
pub fn date_from_unix_days(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}
