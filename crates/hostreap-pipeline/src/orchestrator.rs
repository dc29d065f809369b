//! Host removal orchestrator.
//!
//! Runs lookup → deactivate → delete against the cluster manager,
//! stopping at the first failure. A host is never deleted unless it
//! was deactivated first.

use tracing::{info, warn};

use hostreap_core::{ClusterControl, RemovalOutcome, RemovalStep};

/// Remove the host labelled with `instance_id` from the cluster manager.
///
/// When more than one host carries the label, the first one returned
/// is removed and the rest are left alone.
pub async fn remove_host<C>(cluster: &C, label_name: &str, instance_id: &str) -> RemovalOutcome
where
    C: ClusterControl + ?Sized,
{
    let hosts = match cluster.lookup_hosts_by_label(label_name, instance_id).await {
        Ok(hosts) => hosts,
        Err(cause) => {
            return RemovalOutcome::StepFailed {
                step: RemovalStep::Lookup,
                cause,
            };
        }
    };

    let Some(host) = hosts.first().cloned() else {
        return RemovalOutcome::NoHostFound;
    };

    if hosts.len() > 1 {
        warn!(
            %instance_id,
            label = %label_name,
            matches = hosts.len(),
            chosen = %host,
            "host label is not unique, removing the first match only"
        );
    }

    info!(%instance_id, host_id = %host, "deactivating host");
    if let Err(cause) = cluster.deactivate_host(&host).await {
        return RemovalOutcome::StepFailed {
            step: RemovalStep::Deactivate,
            cause,
        };
    }

    info!(%instance_id, host_id = %host, "deleting host");
    if let Err(cause) = cluster.delete_host(&host).await {
        return RemovalOutcome::StepFailed {
            step: RemovalStep::Delete,
            cause,
        };
    }

    info!(%instance_id, host_id = %host, "host removed from cluster manager");
    RemovalOutcome::Completed { host }
}
