mod models;
mod preview;
mod report;
mod run;

pub use models::run_models;
pub use preview::run_preview;
pub use run::run_build;
