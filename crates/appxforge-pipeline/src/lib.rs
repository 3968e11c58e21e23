mod publisher;
mod run;
mod toolchain;

pub use publisher::{publisher_from_manifest, PLACEHOLDER_PUBLISHER};
pub use run::PipelineRun;
pub use toolchain::Toolchain;
