//! Core types: search window, meeting descriptor, tracing setup

pub mod meeting;
pub mod time;
pub mod tracing;

pub use meeting::MeetingDescriptor;
pub use time::TimeWindow;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
