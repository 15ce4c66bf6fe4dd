//! End-to-end reconciliation passes against an in-memory object store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use nexus_common::crd::{Nexus, NexusSpec};
use nexus_common::{Capabilities, Error, StaticCapabilityProbe};
use nexus_resources::k8s::{PersistentVolumeClaim, PvcSpec};
use nexus_resources::{
    Action, ManagedResource, ObjectStore, ReconcilePlan, ResourceKind, ResourceSet, Supervisor,
};

// =============================================================================
// Test harness
// =============================================================================

type Key = (ResourceKind, String, String);

/// Object store holding whatever was "applied" to it
#[derive(Default)]
struct InMemoryStore {
    objects: HashMap<Key, serde_json::Value>,
    failing: Option<ResourceKind>,
}

impl InMemoryStore {
    fn applied(set: &ResourceSet) -> Self {
        let mut store = Self::default();
        for object in set.iter() {
            store.insert(object);
        }
        store
    }

    fn insert(&mut self, object: &ManagedResource) {
        let value = serde_json::to_value(object).expect("object should encode");
        self.objects.insert(
            (
                object.kind(),
                object.namespace().to_string(),
                object.name().to_string(),
            ),
            value,
        );
    }

    fn failing_on(kind: ResourceKind) -> Self {
        Self {
            failing: Some(kind),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<serde_json::Value>, Error> {
        if self.failing == Some(kind) {
            return Err(Error::fetch(kind.as_str(), name, "connection reset"));
        }
        Ok(self
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }
}

fn nexus_from_yaml(yaml: &str) -> Nexus {
    let spec: NexusSpec = serde_yaml::from_str(yaml).expect("spec should parse");
    Nexus {
        metadata: ObjectMeta {
            name: Some("nexus3".to_string()),
            namespace: Some("tools".to_string()),
            ..Default::default()
        },
        spec,
    }
}

async fn plan(
    store: InMemoryStore,
    caps: Capabilities,
    nexus: &Nexus,
) -> Result<ReconcilePlan, Error> {
    Supervisor::new(Arc::new(store), Arc::new(StaticCapabilityProbe(caps)))
        .reconcile_plan(nexus)
        .await
}

const MINIMAL: &str = r#"
replicas: 1
persistence:
  persistent: false
networking:
  expose: false
"#;

const CLUSTERED: &str = r#"
replicas: 3
persistence:
  persistent: true
  volumeSize: 10Gi
"#;

// =============================================================================
// Story: Minimal instance
// =============================================================================

#[tokio::test]
async fn minimal_instance_needs_only_workload_and_endpoint() {
    let plan = plan(
        InMemoryStore::default(),
        Capabilities::default(),
        &nexus_from_yaml(MINIMAL),
    )
    .await
    .expect("plan should succeed");

    let required = &plan.required;
    assert_eq!(required.get(ResourceKind::Deployment).len(), 1);
    assert_eq!(required.get(ResourceKind::Service).len(), 1);
    assert!(required.get(ResourceKind::PersistentVolumeClaim).is_empty());
    assert!(required.get(ResourceKind::Route).is_empty());
    assert!(required.get(ResourceKind::Ingress).is_empty());

    let workload_and_exposure: usize = [
        ResourceKind::Deployment,
        ResourceKind::Service,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::Route,
        ResourceKind::Ingress,
    ]
    .into_iter()
    .map(|kind| required.get(kind).len())
    .sum();
    assert_eq!(workload_and_exposure, 2);

    // The pod identity is the only other object
    assert_eq!(required.len(), 3);
    assert_eq!(required.get(ResourceKind::ServiceAccount).len(), 1);
}

// =============================================================================
// Story: Clustered instance with shared storage
// =============================================================================

#[tokio::test]
async fn clustered_instance_shares_a_read_write_many_claim() {
    let plan = plan(
        InMemoryStore::default(),
        Capabilities::default(),
        &nexus_from_yaml(CLUSTERED),
    )
    .await
    .expect("plan should succeed");

    let claims = plan.required.get(ResourceKind::PersistentVolumeClaim);
    assert_eq!(claims.len(), 1);
    let ManagedResource::PersistentVolumeClaim(PersistentVolumeClaim { spec, .. }) = &claims[0]
    else {
        panic!("expected a claim");
    };
    assert_eq!(spec.access_modes, vec![PvcSpec::READ_WRITE_MANY.to_string()]);
    assert_eq!(spec.storage_request(), Some("10Gi"));
}

// =============================================================================
// Story: Converged state
// =============================================================================

#[tokio::test]
async fn applied_plan_converges_to_no_ops() {
    let caps = Capabilities {
        routes: true,
        ingress: true,
        openshift: true,
    };
    let nexus = nexus_from_yaml(
        r#"
replicas: 1
image: docker.io/sonatype/nexus3:3.70.1
persistence:
  persistent: true
networking:
  expose: true
  exposeAs: Route
  host: nexus.apps.example.com
  tls:
    mandatory: true
"#,
    );

    let first = plan(InMemoryStore::default(), caps, &nexus)
        .await
        .expect("first pass should succeed");
    assert!(first.verdicts().iter().all(|v| v.action == Action::Create));

    let second = plan(InMemoryStore::applied(&first.required), caps, &nexus)
        .await
        .expect("second pass should succeed");
    let verdicts = second.verdicts();
    assert_eq!(verdicts.len(), first.required.len());
    assert!(
        verdicts.iter().all(|v| v.action == Action::NoOp),
        "unexpected verdicts: {verdicts:?}"
    );
}

#[tokio::test]
async fn switching_exposure_deletes_the_stale_object() {
    let caps = Capabilities {
        routes: true,
        ingress: true,
        openshift: false,
    };
    let ingress = nexus_from_yaml(
        r#"
networking:
  expose: true
  exposeAs: Ingress
  host: nexus.example.com
"#,
    );
    let first = plan(InMemoryStore::default(), caps, &ingress)
        .await
        .expect("first pass should succeed");

    let route = nexus_from_yaml(
        r#"
networking:
  expose: true
  exposeAs: Route
  host: nexus.example.com
"#,
    );
    let second = plan(InMemoryStore::applied(&first.required), caps, &route)
        .await
        .expect("second pass should succeed");

    let verdicts = second.verdicts();
    let action_for = |kind: ResourceKind| {
        verdicts
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.action)
            .expect("verdict should exist")
    };
    assert_eq!(action_for(ResourceKind::Route), Action::Create);
    assert_eq!(action_for(ResourceKind::Ingress), Action::Delete);
    assert_eq!(action_for(ResourceKind::Deployment), Action::NoOp);
}

#[tokio::test]
async fn scaling_up_updates_workload_and_claim() {
    let single = nexus_from_yaml("replicas: 1\npersistence:\n  persistent: true\n");
    let first = plan(InMemoryStore::default(), Capabilities::default(), &single)
        .await
        .expect("first pass should succeed");

    let scaled = nexus_from_yaml("replicas: 2\npersistence:\n  persistent: true\n");
    let second = plan(
        InMemoryStore::applied(&first.required),
        Capabilities::default(),
        &scaled,
    )
    .await
    .expect("second pass should succeed");

    for verdict in second.verdicts() {
        let expected = match verdict.kind {
            ResourceKind::Deployment | ResourceKind::PersistentVolumeClaim => Action::Update,
            _ => Action::NoOp,
        };
        assert_eq!(verdict.action, expected, "{}", verdict.kind);
    }
}

// =============================================================================
// Story: Failures
// =============================================================================

#[tokio::test]
async fn route_without_route_capability_is_unavailable() {
    let nexus = nexus_from_yaml(
        r#"
networking:
  expose: true
  exposeAs: Route
  host: nexus.example.com
"#,
    );
    let err = plan(InMemoryStore::default(), Capabilities::default(), &nexus)
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::CapabilityUnavailable { .. }));
    assert_eq!(err.instance(), Some("nexus3"));
}

#[tokio::test]
async fn fetch_failure_is_returned() {
    let err = plan(
        InMemoryStore::failing_on(ResourceKind::Deployment),
        Capabilities::default(),
        &nexus_from_yaml(MINIMAL),
    )
    .await
    .expect_err("should fail");
    assert_eq!(err.kind(), Some("Deployment"));
    assert!(err.is_retryable());
}
