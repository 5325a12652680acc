//! Code for adding the variables and constraints of each kind of component.
mod converter;
mod deadtime;
mod pool;
mod schedule;
mod sink;
mod slack;
mod source;
mod storage;
mod thermal;
mod trigger;

pub use converter::add_converter_constraints;
pub use deadtime::add_deadtime_constraints;
pub use pool::add_pool_constraints;
pub use schedule::add_schedule_constraints;
pub use sink::add_sink_constraints;
pub use slack::add_slack_costs;
pub use source::add_source_constraints;
pub use storage::add_storage_constraints;
pub use thermal::add_thermal_constraints;
pub use trigger::add_trigger_constraints;
