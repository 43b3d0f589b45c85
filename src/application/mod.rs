pub mod dto;
pub mod model_provider;
pub mod pipeline;
pub mod ports;
pub mod services;
