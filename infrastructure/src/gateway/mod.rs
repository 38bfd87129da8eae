//! Completion gateway adapters

mod openai;

pub use openai::{OpenAiCompatibleGateway, OpenAiGatewayConfig, SamplingParams};
