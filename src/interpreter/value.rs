/// Formula results.
///
/// Defines [`zman_time::ZmanTime`], the local, second-rounded time a
/// successful evaluation returns, and the day window it must fall in.
pub mod zman_time;

pub mod core;
