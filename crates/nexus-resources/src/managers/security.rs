//! Identity manager: the ServiceAccount Nexus pods run as

use async_trait::async_trait;
use nexus_common::kube_utils::HasApiResource;
use nexus_common::Error;
use tracing::debug;

use super::ResourceManager;
use crate::comparator::{metadata_matches, typed_comparator, Comparator};
use crate::defaults::NormalizedSpec;
use crate::k8s::{ObjectMeta, PolicyRule, Role, RoleBinding, RoleRef, ServiceAccount, Subject};
use crate::resource::{ManagedResource, ResourceKind};
use crate::store::{fetch_owned, ObjectStore};

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

/// Produces the instance's ServiceAccount
pub struct IdentityManager<'a> {
    spec: &'a NormalizedSpec,
}

impl<'a> IdentityManager<'a> {
    /// Create a manager for the given spec
    pub fn new(spec: &'a NormalizedSpec) -> Self {
        Self { spec }
    }

    /// Build the ServiceAccount
    pub fn build_service_account(&self) -> ServiceAccount {
        ServiceAccount::new(ObjectMeta::for_instance(
            &self.spec.service_account_name,
            &self.spec.namespace,
            &self.spec.name,
        ))
    }
}

#[async_trait]
impl<'a> ResourceManager for IdentityManager<'a> {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::ServiceAccount]
    }

    fn required(&self) -> Result<Vec<ManagedResource>, Error> {
        Ok(vec![self.build_service_account().into()])
    }

    async fn deployed(&self, store: &dyn ObjectStore) -> Result<Vec<ManagedResource>, Error> {
        let account = fetch_owned(
            store,
            ResourceKind::ServiceAccount,
            &self.spec.namespace,
            &self.spec.service_account_name,
            &self.spec.name,
        )
        .await?;
        debug!(
            instance = %self.spec.name,
            service_account = %self.spec.service_account_name,
            found = account.is_some(),
            "fetched service account"
        );
        Ok(account.into_iter().collect())
    }

    fn comparators(&self) -> Vec<(ResourceKind, Comparator)> {
        vec![(
            ResourceKind::ServiceAccount,
            typed_comparator!(ServiceAccount, service_account_matches),
        )]
    }
}

/// A ServiceAccount carries nothing but metadata; annotations and labels
/// the platform adds (OpenShift's pull secret reference) are ignored.
pub fn service_account_matches(deployed: &ServiceAccount, requested: &ServiceAccount) -> bool {
    metadata_matches(&deployed.metadata, &requested.metadata)
}

/// Role and RoleBinding granting an identity read access to the objects
/// of its namespace. The rules are fixed; only the subject varies.
pub fn rbac_template(account: &ServiceAccount) -> (Role, RoleBinding) {
    let meta = ObjectMeta {
        name: account.metadata.name.clone(),
        namespace: account.metadata.namespace.clone(),
        labels: account.metadata.labels.clone(),
        annotations: Default::default(),
    };

    let role = Role::new(
        meta.clone(),
        vec![
            PolicyRule::new(
                &[""],
                &[
                    "pods",
                    "services",
                    "endpoints",
                    "persistentvolumeclaims",
                    "configmaps",
                    "secrets",
                    "events",
                ],
                &["get", "list", "watch"],
            ),
            PolicyRule::new(&["apps"], &["deployments"], &["get", "list", "watch"]),
        ],
    );

    let binding = RoleBinding::new(
        meta,
        RoleRef {
            api_group: RBAC_GROUP.to_string(),
            kind: Role::KIND.to_string(),
            name: role.metadata.name.clone(),
        },
        vec![Subject {
            kind: ServiceAccount::KIND.to_string(),
            name: account.metadata.name.clone(),
            namespace: Some(account.metadata.namespace.clone()),
        }],
    );

    (role, binding)
}
