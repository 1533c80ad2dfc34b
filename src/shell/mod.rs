// Composition root for the event store.
//
// Responsibilities
// - Read config from environment.
// - Instantiate the store with its clock, publisher and eviction policy.
// - Expose save and list over HTTP.
// - Spawn background workers (eviction runner, telemetry recorder).

pub mod config;
pub mod http;
pub mod state;
pub mod workers;
