mod extract;
mod rules;

pub use extract::{run_extract, ExtractArgs};
pub use rules::run_rules;
