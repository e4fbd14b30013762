pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod math;
pub mod register;
pub mod rule;
pub mod simulation;
pub mod variables;
pub mod zone;

pub use component::{Component, ModelComponent};
pub use config::BuildConfig;
pub use context::{BuildContext, ComponentId};
pub use error::{CombLayerError, Result};
pub use rule::HeadRule;
