//! Read side of the object store
//!
//! The engine only ever reads deployed state; create/update/delete are left
//! to whoever applies the plan.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject};
use kube::Client;
#[cfg(test)]
use mockall::automock;
use nexus_common::Error;
use tracing::debug;

use crate::resource::{ManagedResource, ResourceKind};

/// Lookup of deployed objects
///
/// A missing object is `Ok(None)`, never an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object as raw JSON
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<serde_json::Value>, Error>;
}

/// Fetch one object and decode it into its typed form
pub async fn fetch(
    store: &dyn ObjectStore,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Result<Option<ManagedResource>, Error> {
    match store.get(kind, namespace, name).await? {
        Some(value) => Ok(Some(ManagedResource::from_json(kind, value)?)),
        None => {
            debug!(kind = %kind, namespace = %namespace, name = %name, "object not deployed");
            Ok(None)
        }
    }
}

/// [`fetch`] for an object named differently from the instance owning it.
///
/// Fetch failures are reported against `instance`, with the object name
/// kept in the message.
pub async fn fetch_owned(
    store: &dyn ObjectStore,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
    instance: &str,
) -> Result<Option<ManagedResource>, Error> {
    fetch(store, kind, namespace, name)
        .await
        .map_err(|err| match err {
            Error::Fetch { kind, message, .. } => {
                Error::fetch(kind, instance, format!("{name}: {message}"))
            }
            other => other,
        })
}

/// Object store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    /// Create a store over the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<serde_json::Value>, Error> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &kind.api_resource());

        match api.get(name).await {
            Ok(obj) => serde_json::to_value(obj).map(Some).map_err(|e| {
                Error::serialization_for_kind(kind.as_str(), format!("failed to encode: {e}"))
            }),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(Error::fetch(kind.as_str(), name, e.to_string())),
        }
    }
}
