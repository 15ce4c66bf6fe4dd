//! Reconciliation core for Sonatype Nexus Repository Manager instances
//!
//! Turns a `Nexus` custom resource into the set of Kubernetes objects that
//! must exist, reads the set that does exist, and pairs them with the
//! comparator that decides whether each deployed object is up to date.
//!
//! Nothing here writes to the cluster. The [`supervisor::Supervisor`] returns
//! a [`supervisor::ReconcilePlan`]; applying it is the caller's business.

#![deny(missing_docs)]

pub mod comparator;
pub mod defaults;
pub mod image;
pub mod k8s;
pub mod managers;
pub mod resource;
pub mod store;
pub mod supervisor;

pub use comparator::{Action, Comparator, ComparatorRegistry, Verdict};
pub use defaults::{normalize, NormalizedSpec};
pub use managers::ResourceManager;
pub use resource::{ManagedResource, ResourceKind, ResourceSet};
pub use store::{KubeObjectStore, ObjectStore};
pub use supervisor::{ReconcilePlan, Supervisor};
