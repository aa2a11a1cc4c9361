pub mod corpus;
pub mod orchestrator;

pub use corpus::CorpusInfo;
pub use orchestrator::{CorpusCounts, SimulationOrchestrator};
