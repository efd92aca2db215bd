//! MQTT publishing and logging setup: spec.md §4.4 and the ambient logging
//! stack carried over from the teacher regardless of spec.md's Non-goals.

mod publisher;
mod tracing;

pub use publisher::{MqttPublisher, PublishError, Publisher};
pub use tracing::{init_tracing, shutdown_tracing};
