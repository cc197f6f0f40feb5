pub mod loader;

pub use loader::{build_orchestrator, load_config, load_orchestrator, PipelineConfig, ServiceConfig};
