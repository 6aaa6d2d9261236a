pub mod data;

mod application;
mod runtime_config;

pub use application::{Application, ApplicationError};
pub use runtime_config::RuntimeConfig;
