//! Command line engines.
//!
//! An engine turns inputs and an encoding profile into a produced local file
//! by running an external program. The profile supplies the option string
//! (`<engine>.command`), the parameter table supplies the placeholder values
//! and the runner executes the resolved argument vector.

mod config;
mod embedder;
mod encoder;
mod error;
mod executor;
mod factory;
mod listener;
mod params;
mod runner;
pub mod template;
mod traits;

pub use config::EngineConfig;
pub use embedder::{caption_languages, caption_track_height, EmbedderEngine, EMBEDDER_ENGINE};
pub use encoder::{format_seconds, EncoderEngine, ENCODER_ENGINE};
pub use error::EngineError;
pub use factory::{CommandEngineFactory, EngineFactory};
pub use listener::{EngineEvent, EngineListener, Listeners};
pub use params::{EngineInputs, ParamMap, ParameterTable};
pub use runner::{CommandRunner, LineSink, ProcessRunner};
pub use traits::{Engine, LocalTrack};
