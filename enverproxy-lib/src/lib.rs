#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod reactor;
pub mod session;
pub mod telemetry;

pub use config::{load_from_path, Config, LogType};
pub use error::{ProxyError, Result};
pub use reactor::Reactor;
pub use session::{Session, SessionCounters, SessionSnapshot};
pub use telemetry::{init_tracing, MqttPublisher, PublishError, Publisher};
