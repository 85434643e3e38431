//! Timing primitives: a [`Stopwatch`] that accumulates active time, and a
//! countdown [`Timer`] built on it that calls back when it runs out.
//!
//! Time is read from an injected [`Clock`] and timer callbacks are run by an
//! injected [`Scheduler`], so both can be driven by hand in tests with
//! [`FakeClock`] and [`WheelScheduler::tick`].

mod clock;
pub use clock::{Clock, FakeClock, SystemClock, TimeT};

mod driver;
pub use driver::Driver;

mod entry;
pub use entry::Handle;

mod error;
pub use error::SchedulerError;

mod hook;
pub use hook::Hook;

mod scheduler;
pub use scheduler::{Callback, Scheduler, WheelScheduler};

mod stopwatch;
pub use stopwatch::Stopwatch;

mod store;

mod timer;
pub use timer::Timer;

pub mod units;
pub use units::{DAY, HOUR, MINUTE, MONTH, SECOND, WEEK, YEAR};

mod wheel;
pub use wheel::WheelConfig;
