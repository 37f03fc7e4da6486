//! Local apply/destroy/import driver
//!
//! Converges one index towards a desired-state record and keeps the tracked
//! state file in step with what exists remotely. Desired state is validated
//! in full before any plan is made, so an invalid value never reaches the
//! control plane and never triggers a replacement.

use crate::resource::{plan, Diagnostics, IndexConfig, IndexResource, IndexState, Plan, ReadOutcome};
use crate::statefile;
use anyhow::Result;
use std::path::Path;

/// Apply `desired` and persist the resulting state
///
/// Returns the state tracked afterwards. When validation or the refresh fails
/// the state file is left untouched.
pub async fn apply(
    resource: &IndexResource,
    desired: &IndexConfig,
    state_path: &Path,
    diags: &mut Diagnostics,
) -> Result<Option<IndexState>> {
    let tracked = statefile::load_state(state_path)?;

    if desired.to_create_request(diags).is_none() {
        tracing::warn!("Desired state for {} is invalid; nothing applied", desired.name);
        return Ok(tracked);
    }

    let prior = match &tracked {
        Some(current) => match resource.read(current, diags).await {
            Some(ReadOutcome::Present(refreshed)) => Some(refreshed),
            Some(ReadOutcome::Removed) => {
                diags.add_warning(
                    "Index removed outside of management",
                    format!("Index {} no longer exists and will be recreated.", current.name),
                );
                None
            }
            None => return Ok(tracked.clone()),
        },
        None => None,
    };

    let next = match (plan(prior.as_ref(), desired), prior) {
        (Plan::NoOp, prior) => {
            tracing::info!("Index {} is up to date", desired.name);
            prior
        }
        (Plan::Update(changed), Some(prior)) => {
            tracing::info!("Updating {} in place: {:?}", desired.name, changed);
            // a failed configure may have partially applied; the next refresh settles it
            match resource.update(desired, &prior, diags).await {
                Some(updated) => Some(updated),
                None => Some(prior),
            }
        }
        (Plan::Replace(forced_by), Some(prior)) => {
            tracing::info!("Replacing {}: {:?} cannot change in place", desired.name, forced_by);
            let errors = diags.errors().count();
            resource.delete(&prior, diags).await;
            if diags.errors().count() > errors {
                // prior may still exist; keep tracking it
                Some(prior)
            } else {
                resource.create(desired, diags).await
            }
        }
        (_, _) => resource.create(desired, diags).await,
    };

    statefile::save_state(state_path, next.as_ref())?;
    Ok(next)
}

/// Delete the tracked index; returns the state that was destroyed
pub async fn destroy(
    resource: &IndexResource,
    state_path: &Path,
    diags: &mut Diagnostics,
) -> Result<Option<IndexState>> {
    let Some(tracked) = statefile::load_state(state_path)? else {
        diags.add_warning("Nothing to destroy", format!("No state found at {:?}.", state_path));
        return Ok(None);
    };

    let errors = diags.errors().count();
    resource.delete(&tracked, diags).await;
    if diags.errors().count() > errors {
        return Ok(None);
    }

    statefile::save_state(state_path, None)?;
    Ok(Some(tracked))
}

/// Start tracking an existing index by name
pub async fn import(
    resource: &IndexResource,
    name: &str,
    state_path: &Path,
    diags: &mut Diagnostics,
) -> Result<Option<IndexState>> {
    let imported = resource.import_state(name, diags).await;
    if let Some(imported) = &imported {
        statefile::save_state(state_path, Some(imported))?;
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinecone::{ControlPlane, InMemoryControlPlane, Metric};
    use crate::resource::Reconciler;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        client: Arc<InMemoryControlPlane>,
        resource: IndexResource,
        _dir: tempfile::TempDir,
        state: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(InMemoryControlPlane::new("test", "key").with_convergence_polls(1));
        let resource = IndexResource::new(client.clone(), Reconciler::new(Duration::from_millis(5)));
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("prod.json");
        Fixture { client, resource, _dir: dir, state }
    }

    fn prod() -> IndexConfig {
        IndexConfig::new("prod", 8)
    }

    #[tokio::test]
    async fn test_apply_creates_and_tracks() {
        let f = fixture();
        let mut diags = Diagnostics::new();

        let state = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap().unwrap();
        assert!(diags.is_empty());
        assert_eq!(state.metric, Metric::Cosine);
        assert_eq!(statefile::load_state(&f.state).unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_apply_unchanged_only_refreshes() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        let created = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();
        let requests = f.client.requests().await;

        let again = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();
        assert!(diags.is_empty());
        assert_eq!(again, created);
        // one describe for the refresh, nothing else
        assert_eq!(f.client.requests().await, requests + 1);
    }

    #[tokio::test]
    async fn test_apply_scales_in_place() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();

        let desired = IndexConfig {
            replicas: Some(3),
            ..prod()
        };
        let state = apply(&f.resource, &desired, &f.state, &mut diags).await.unwrap().unwrap();
        assert!(diags.is_empty());
        assert_eq!(state.replicas, 3);
        assert_eq!(statefile::load_state(&f.state).unwrap().unwrap().replicas, 3);
    }

    #[tokio::test]
    async fn test_apply_replaces_on_dimension_change() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();

        let state = apply(&f.resource, &IndexConfig::new("prod", 16), &f.state, &mut diags)
            .await
            .unwrap()
            .unwrap();
        assert!(diags.is_empty());
        assert_eq!(state.dimension, 16);
        assert_eq!(f.client.describe_index("prod").await.unwrap().unwrap().database.dimension, 16);
    }

    #[tokio::test]
    async fn test_invalid_desired_state_leaves_index_alone() {
        let invalid = [
            IndexConfig {
                metric: Some("Cosine".into()),
                ..prod()
            },
            IndexConfig::new("prod", 0),
        ];

        for desired in invalid {
            let f = fixture();
            let mut diags = Diagnostics::new();
            let created = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();
            let requests = f.client.requests().await;

            let after = apply(&f.resource, &desired, &f.state, &mut diags).await.unwrap();
            assert!(diags.has_error());
            assert_eq!(after, created);
            assert_eq!(f.client.requests().await, requests);
            assert!(f.client.describe_index("prod").await.unwrap().is_some());
            assert_eq!(statefile::load_state(&f.state).unwrap(), created);
        }
    }

    #[tokio::test]
    async fn test_apply_recreates_index_removed_outside() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();
        f.client.delete_index("prod").await.unwrap();
        while f.client.describe_index("prod").await.unwrap().is_some() {}

        let state = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();
        assert!(state.is_some());
        assert!(!diags.has_error());
        assert_eq!(diags.iter().next().unwrap().summary, "Index removed outside of management");
    }

    #[tokio::test]
    async fn test_failed_delete_during_replace_keeps_tracking() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        let created = apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let interrupted = IndexResource::new(
            f.client.clone(),
            Reconciler::new(Duration::from_millis(5)).with_cancellation(cancel),
        );

        let after = apply(&interrupted, &IndexConfig::new("prod", 16), &f.state, &mut diags)
            .await
            .unwrap();
        assert_eq!(diags.errors().next().unwrap().summary, "Error deleting index");
        assert_eq!(after, created);
        assert_eq!(statefile::load_state(&f.state).unwrap(), created);
        assert_eq!(f.client.describe_index("prod").await.unwrap().unwrap().database.dimension, 8);
    }

    #[tokio::test]
    async fn test_destroy_forgets_state() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        apply(&f.resource, &prod(), &f.state, &mut diags).await.unwrap();

        let destroyed = destroy(&f.resource, &f.state, &mut diags).await.unwrap();
        assert_eq!(destroyed.unwrap().name, "prod");
        assert!(!f.state.exists());
        assert!(f.client.describe_index("prod").await.unwrap().is_none());

        assert!(destroy(&f.resource, &f.state, &mut diags).await.unwrap().is_none());
        assert_eq!(diags.iter().last().unwrap().summary, "Nothing to destroy");
    }

    #[tokio::test]
    async fn test_import_writes_state() {
        let f = fixture();
        let mut diags = Diagnostics::new();
        f.client
            .create_index(&prod().to_create_request(&mut diags).unwrap())
            .await
            .unwrap();

        let imported = import(&f.resource, "prod", &f.state, &mut diags).await.unwrap();
        assert_eq!(statefile::load_state(&f.state).unwrap(), imported);

        assert!(import(&f.resource, "ghost", &f.state, &mut diags).await.unwrap().is_none());
        assert!(diags.has_error());
    }
}
