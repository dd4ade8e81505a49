//! CLI presentation: pure formatters from flow reports to terminal text, plus the
//! progress bar sink.

mod creation;
mod deletion;
mod progress;
mod shared;
mod validation;

pub use creation::format_creation_report;
pub use deletion::format_deletion_report;
pub use progress::BarProgress;
pub use shared::{
    format_environment_report, format_runtime, format_section_heading, format_summary_table,
    tag_label,
};
pub use validation::{format_validation_json, format_validation_text};
