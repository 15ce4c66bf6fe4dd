//! Custom Resource Definitions for the Nexus operator
//!
//! `Nexus` is the only CRD. Its spec is the raw user input: every optional
//! field is an `Option` so "not provided" stays distinct from "provided as
//! zero" until defaulting runs.

mod networking;
mod nexus;
mod persistence;
mod probes;
mod resources;

pub use networking::{ExposeAs, NetworkingSpec, TlsSpec};
pub use nexus::{AdminCredentials, Nexus, NexusSpec, PullPolicy, MAX_REPLICAS, MIN_REPLICAS};
pub use persistence::PersistenceSpec;
pub use probes::ProbeSpec;
pub use resources::{ResourceQuantity, ResourceRequirements};
