mod agent;
mod pipeline;

pub use agent::{AgentError, AgentTransaction, JsonRpcSigningAgent, SigningAgent};
pub use pipeline::{PipelineStage, SigningPipeline};
