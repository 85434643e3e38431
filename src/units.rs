//! Fixed millisecond conversions. A month is 30 days and a year is 365 days.

use crate::clock::TimeT;

pub const SECOND: TimeT = 1000;
pub const MINUTE: TimeT = SECOND * 60;
pub const HOUR: TimeT = MINUTE * 60;
pub const DAY: TimeT = HOUR * 24;
pub const WEEK: TimeT = DAY * 7;
pub const MONTH: TimeT = DAY * 30;
pub const YEAR: TimeT = DAY * 365;
