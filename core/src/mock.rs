//! Call-recording test double for code written against the per-resource
//! traits.
//!
//! ```
//! use edgeworkers_core::{EdgeWorkerIds, GetEdgeWorkerIdRequest, MockEdgeworkers, Operation};
//!
//! let mock = MockEdgeworkers::new();
//! mock.stub::<edgeworkers_core::EdgeWorkerId>(
//!     Operation::GetEdgeWorkerId,
//!     Err(edgeworkers_core::Error::Transport {
//!         operation: Operation::GetEdgeWorkerId,
//!         source: edgeworkers_core::TransportError::new("offline"),
//!     }),
//! );
//! let err = mock.get_edgeworker_id(GetEdgeWorkerIdRequest { edge_worker_id: 42 }).unwrap_err();
//! assert_eq!(err.operation(), Operation::GetEdgeWorkerId);
//! assert_eq!(mock.calls(), vec![Operation::GetEdgeWorkerId]);
//! ```

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::edgekv::*;
use crate::edgeworkers::*;
use crate::error::{Error, Operation};
use crate::session::TransportError;

type Stubbed = Box<dyn Any + Send>;

/// Implements every resource trait without a session.
///
/// Each call records its operation and a clone of its request, then pops the
/// next result queued for that operation with [`stub`](Self::stub).
#[derive(Default)]
pub struct MockEdgeworkers {
    calls: Mutex<Vec<(Operation, Stubbed)>>,
    stubs: Mutex<HashMap<Operation, VecDeque<Stubbed>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockEdgeworkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `result` as the next answer for `operation`. `T` must be the
    /// operation's success type.
    pub fn stub<T: Send + 'static>(&self, operation: Operation, result: Result<T, Error>) -> &Self {
        lock(&self.stubs)
            .entry(operation)
            .or_default()
            .push_back(Box::new(result));
        self
    }

    /// Operations called so far, in call order.
    pub fn calls(&self) -> Vec<Operation> {
        lock(&self.calls).iter().map(|(operation, _)| *operation).collect()
    }

    /// Requests recorded for `operation`. Operations without parameters
    /// record `()`.
    pub fn requests<P: Clone + 'static>(&self, operation: Operation) -> Vec<P> {
        lock(&self.calls)
            .iter()
            .filter(|(called, _)| *called == operation)
            .filter_map(|(_, params)| params.downcast_ref::<P>().cloned())
            .collect()
    }

    /// Results queued but not yet consumed, across all operations.
    pub fn pending_stubs(&self) -> usize {
        lock(&self.stubs).values().map(VecDeque::len).sum()
    }

    fn call<P: Send + 'static, T: 'static>(&self, operation: Operation, params: P) -> Result<T, Error> {
        lock(&self.calls).push((operation, Box::new(params)));
        let next = lock(&self.stubs)
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        let Some(next) = next else {
            return Err(Error::Transport {
                operation,
                source: TransportError::new(format!("no result stubbed for {operation}")),
            });
        };
        match next.downcast::<Result<T, Error>>() {
            Ok(result) => *result,
            Err(_) => Err(Error::Transport {
                operation,
                source: TransportError::new(format!(
                    "result stubbed for {operation} is not a {}",
                    std::any::type_name::<T>()
                )),
            }),
        }
    }
}

impl std::fmt::Debug for MockEdgeworkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEdgeworkers")
            .field("calls", &self.calls())
            .field("pending_stubs", &self.pending_stubs())
            .finish()
    }
}

impl Activations for MockEdgeworkers {
    fn list_activations(&self, params: ListActivationsRequest) -> Result<ListActivationsResponse, Error> {
        self.call(Operation::ListActivations, params)
    }

    fn get_activation(&self, params: GetActivationRequest) -> Result<Activation, Error> {
        self.call(Operation::GetActivation, params)
    }

    fn activate_version(&self, params: ActivateVersionRequest) -> Result<Activation, Error> {
        self.call(Operation::ActivateVersion, params)
    }

    fn cancel_pending_activation(&self, params: CancelPendingActivationRequest) -> Result<Activation, Error> {
        self.call(Operation::CancelPendingActivation, params)
    }
}

impl Deactivations for MockEdgeworkers {
    fn list_deactivations(&self, params: ListDeactivationsRequest) -> Result<ListDeactivationsResponse, Error> {
        self.call(Operation::ListDeactivations, params)
    }

    fn get_deactivation(&self, params: GetDeactivationRequest) -> Result<Deactivation, Error> {
        self.call(Operation::GetDeactivation, params)
    }

    fn deactivate_version(&self, params: DeactivateVersionRequest) -> Result<Deactivation, Error> {
        self.call(Operation::DeactivateVersion, params)
    }
}

impl Contracts for MockEdgeworkers {
    fn list_contracts(&self) -> Result<ListContractsResponse, Error> {
        self.call(Operation::ListContracts, ())
    }
}

impl PermissionGroups for MockEdgeworkers {
    fn list_permission_groups(&self) -> Result<ListPermissionGroupsResponse, Error> {
        self.call(Operation::ListPermissionGroups, ())
    }

    fn get_permission_group(&self, params: GetPermissionGroupRequest) -> Result<PermissionGroup, Error> {
        self.call(Operation::GetPermissionGroup, params)
    }
}

impl Properties for MockEdgeworkers {
    fn list_properties(&self, params: ListPropertiesRequest) -> Result<ListPropertiesResponse, Error> {
        self.call(Operation::ListProperties, params)
    }
}

impl ResourceTiers for MockEdgeworkers {
    fn list_resource_tiers(&self, params: ListResourceTiersRequest) -> Result<ListResourceTiersResponse, Error> {
        self.call(Operation::ListResourceTiers, params)
    }

    fn get_resource_tier(&self, params: GetResourceTierRequest) -> Result<ResourceTier, Error> {
        self.call(Operation::GetResourceTier, params)
    }
}

impl EdgeWorkerIds for MockEdgeworkers {
    fn get_edgeworker_id(&self, params: GetEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        self.call(Operation::GetEdgeWorkerId, params)
    }

    fn list_edgeworker_ids(&self, params: ListEdgeWorkerIdsRequest) -> Result<ListEdgeWorkerIdsResponse, Error> {
        self.call(Operation::ListEdgeWorkerIds, params)
    }

    fn create_edgeworker_id(&self, params: CreateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        self.call(Operation::CreateEdgeWorkerId, params)
    }

    fn update_edgeworker_id(&self, params: UpdateEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        self.call(Operation::UpdateEdgeWorkerId, params)
    }

    fn clone_edgeworker_id(&self, params: CloneEdgeWorkerIdRequest) -> Result<EdgeWorkerId, Error> {
        self.call(Operation::CloneEdgeWorkerId, params)
    }

    fn delete_edgeworker_id(&self, params: DeleteEdgeWorkerIdRequest) -> Result<(), Error> {
        self.call(Operation::DeleteEdgeWorkerId, params)
    }
}

impl EdgeWorkerVersions for MockEdgeworkers {
    fn get_edgeworker_version(&self, params: GetEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error> {
        self.call(Operation::GetEdgeWorkerVersion, params)
    }

    fn list_edgeworker_versions(
        &self,
        params: ListEdgeWorkerVersionsRequest,
    ) -> Result<ListEdgeWorkerVersionsResponse, Error> {
        self.call(Operation::ListEdgeWorkerVersions, params)
    }

    fn get_edgeworker_version_content(&self, params: GetEdgeWorkerVersionContentRequest) -> Result<Bundle, Error> {
        self.call(Operation::GetEdgeWorkerVersionContent, params)
    }

    fn create_edgeworker_version(&self, params: CreateEdgeWorkerVersionRequest) -> Result<EdgeWorkerVersion, Error> {
        self.call(Operation::CreateEdgeWorkerVersion, params)
    }

    fn delete_edgeworker_version(&self, params: DeleteEdgeWorkerVersionRequest) -> Result<(), Error> {
        self.call(Operation::DeleteEdgeWorkerVersion, params)
    }
}

impl Validations for MockEdgeworkers {
    fn validate_bundle(&self, params: ValidateBundleRequest) -> Result<ValidateBundleResponse, Error> {
        self.call(Operation::ValidateBundle, params)
    }
}

impl Reports for MockEdgeworkers {
    fn list_reports(&self) -> Result<ListReportsResponse, Error> {
        self.call(Operation::ListReports, ())
    }

    fn get_summary_report(&self, params: GetSummaryReportRequest) -> Result<GetSummaryReportResponse, Error> {
        self.call(Operation::GetSummaryReport, params)
    }

    fn get_report(&self, params: GetReportRequest) -> Result<GetReportResponse, Error> {
        self.call(Operation::GetReport, params)
    }
}

impl SecureTokens for MockEdgeworkers {
    fn create_secure_token(&self, params: CreateSecureTokenRequest) -> Result<CreateSecureTokenResponse, Error> {
        self.call(Operation::CreateSecureToken, params)
    }
}

impl EdgeKvInitialize for MockEdgeworkers {
    fn initialize_edgekv(&self) -> Result<EdgeKvInitializationStatus, Error> {
        self.call(Operation::InitializeEdgeKv, ())
    }

    fn get_edgekv_initialization_status(&self) -> Result<EdgeKvInitializationStatus, Error> {
        self.call(Operation::GetEdgeKvInitializationStatus, ())
    }
}

impl EdgeKvNamespaces for MockEdgeworkers {
    fn list_edgekv_namespaces(&self, params: ListEdgeKvNamespacesRequest) -> Result<ListEdgeKvNamespacesResponse, Error> {
        self.call(Operation::ListEdgeKvNamespaces, params)
    }

    fn get_edgekv_namespace(&self, params: GetEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        self.call(Operation::GetEdgeKvNamespace, params)
    }

    fn create_edgekv_namespace(&self, params: CreateEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        self.call(Operation::CreateEdgeKvNamespace, params)
    }

    fn update_edgekv_namespace(&self, params: UpdateEdgeKvNamespaceRequest) -> Result<Namespace, Error> {
        self.call(Operation::UpdateEdgeKvNamespace, params)
    }

    fn delete_edgekv_namespace(
        &self,
        params: DeleteEdgeKvNamespaceRequest,
    ) -> Result<DeleteEdgeKvNamespaceResponse, Error> {
        self.call(Operation::DeleteEdgeKvNamespace, params)
    }

    fn get_namespace_scheduled_delete_time(
        &self,
        params: GetScheduledDeleteTimeRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error> {
        self.call(Operation::GetNamespaceScheduledDeleteTime, params)
    }

    fn reschedule_namespace_delete(
        &self,
        params: RescheduleNamespaceDeleteRequest,
    ) -> Result<ScheduledDeleteTimeResponse, Error> {
        self.call(Operation::RescheduleNamespaceDelete, params)
    }

    fn cancel_scheduled_namespace_delete(&self, params: CancelScheduledNamespaceDeleteRequest) -> Result<(), Error> {
        self.call(Operation::CancelScheduledNamespaceDelete, params)
    }
}

impl EdgeKvGroups for MockEdgeworkers {
    fn list_groups_within_namespace(&self, params: ListGroupsWithinNamespaceRequest) -> Result<Vec<String>, Error> {
        self.call(Operation::ListGroupsWithinNamespace, params)
    }
}

impl EdgeKvItems for MockEdgeworkers {
    fn list_items(&self, params: ListItemsRequest) -> Result<Vec<String>, Error> {
        self.call(Operation::ListItems, params)
    }

    fn get_item(&self, params: GetItemRequest) -> Result<String, Error> {
        self.call(Operation::GetItem, params)
    }

    fn upsert_item(&self, params: UpsertItemRequest) -> Result<String, Error> {
        self.call(Operation::UpsertItem, params)
    }

    fn delete_item(&self, params: DeleteItemRequest) -> Result<String, Error> {
        self.call(Operation::DeleteItem, params)
    }
}

impl EdgeKvAccessTokens for MockEdgeworkers {
    fn create_edgekv_access_token(
        &self,
        params: CreateEdgeKvAccessTokenRequest,
    ) -> Result<CreateEdgeKvAccessTokenResponse, Error> {
        self.call(Operation::CreateEdgeKvAccessToken, params)
    }

    fn get_edgekv_access_token(
        &self,
        params: GetEdgeKvAccessTokenRequest,
    ) -> Result<GetEdgeKvAccessTokenResponse, Error> {
        self.call(Operation::GetEdgeKvAccessToken, params)
    }

    fn list_edgekv_access_tokens(
        &self,
        params: ListEdgeKvAccessTokensRequest,
    ) -> Result<ListEdgeKvAccessTokensResponse, Error> {
        self.call(Operation::ListEdgeKvAccessTokens, params)
    }

    fn delete_edgekv_access_token(
        &self,
        params: DeleteEdgeKvAccessTokenRequest,
    ) -> Result<DeleteEdgeKvAccessTokenResponse, Error> {
        self.call(Operation::DeleteEdgeKvAccessToken, params)
    }
}
