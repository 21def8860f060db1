//! Settings screen controller.
//!
//! Owns one [`SnapshotStore`] per resource and drives every round-trip:
//! the initial load, saves with their cascades, and manual reloads. All
//! state sits behind one mutex that is never held across a transport call;
//! the calls themselves are the only suspension points.
//!
//! Responses are matched against a mount epoch. Unmounting bumps the epoch,
//! so anything still in flight resolves to `Unmounted` without touching
//! state or raising notifications.

use crate::config::ClientConfig;
use crate::notifier::Notifier;
use crate::transport::Transport;
use serde::Serialize;
use serde_json::Value;
use solarcfg_core::{
    log_op_end, log_op_error, log_op_start, CascadeCoordinator, CascadePolicy, CascadeState,
    CascadeStep, ChangeSet, Confirmation, EditGate, GateState, Notification, ReconcileError,
    ResourceId, Result, Snapshot, SnapshotStore, TransportError, WorkingCopy,
};
use solarcfg_core_types::schema::{OP_CASCADE_REFRESH, OP_LOAD, OP_SAVE};
use solarcfg_core_types::{RequestContext, TraceId};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Result of a save that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The working copy diffed to nothing; no request was made
    NoChanges,
    Saved {
        change_set: ChangeSet,
        /// Dependent resources re-fetched by the cascade
        refreshed: Vec<ResourceId>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub resource: ResourceId,
    pub label: &'static str,
    pub loaded: bool,
    pub dirty: bool,
    /// A load, save or cascade refresh is in flight
    pub busy: bool,
    pub confirmation: Option<Confirmation>,
    /// Edit-gate guarding this resource, if any
    pub gate: Option<GateState>,
    pub snapshot: Option<Snapshot>,
    pub working: Option<WorkingCopy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CascadeView {
    pub source: ResourceId,
    pub target: ResourceId,
    pub state: CascadeState,
}

/// Read-only projection of the screen
#[derive(Debug, Clone, Serialize)]
pub struct ScreenView {
    pub mounted: bool,
    pub notification: Option<Notification>,
    pub resources: Vec<ResourceView>,
    pub cascades: Vec<CascadeView>,
}

impl ScreenView {
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceView> {
        self.resources.iter().find(|r| r.resource == id)
    }
}

struct ScreenState {
    mounted: bool,
    epoch: u64,
    /// Indexed by `ResourceId as usize`
    stores: Vec<SnapshotStore>,
    busy: BTreeSet<ResourceId>,
    cascades: Vec<(&'static EditGate, CascadeCoordinator)>,
}

impl ScreenState {
    fn new(policy: CascadePolicy) -> Self {
        Self {
            mounted: false,
            epoch: 0,
            stores: ResourceId::ALL
                .into_iter()
                .map(|id| SnapshotStore::new(id.schema()))
                .collect(),
            busy: BTreeSet::new(),
            cascades: ResourceId::ALL
                .into_iter()
                .filter_map(ResourceId::gate)
                .map(|gate| (gate, CascadeCoordinator::new(policy)))
                .collect(),
        }
    }

    fn store(&self, id: ResourceId) -> &SnapshotStore {
        &self.stores[id as usize]
    }

    fn store_mut(&mut self, id: ResourceId) -> &mut SnapshotStore {
        &mut self.stores[id as usize]
    }

    fn cascade_mut(&mut self, target: ResourceId) -> Option<&mut CascadeCoordinator> {
        self.cascades
            .iter_mut()
            .find(|(gate, _)| gate.target == target)
            .map(|(_, coordinator)| coordinator)
    }

    fn gate_state(&self, target: ResourceId) -> Option<GateState> {
        target
            .gate()
            .map(|gate| gate.evaluate_store(self.store(gate.source)))
    }

    /// Fail unless a response issued in `epoch` may still be applied
    fn ensure_current(&self, epoch: u64, resource: ResourceId) -> Result<()> {
        if self.mounted && self.epoch == epoch {
            Ok(())
        } else {
            Err(ReconcileError::Unmounted {
                resource: resource.label().to_string(),
            })
        }
    }

    fn release(&mut self, resources: impl IntoIterator<Item = ResourceId>) {
        for id in resources {
            self.busy.remove(&id);
        }
    }
}

/// Controller of the charge-controller settings page
pub struct ConfigScreen {
    transport: Arc<dyn Transport>,
    prefix: String,
    notifier: Notifier,
    state: Mutex<ScreenState>,
}

impl ConfigScreen {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::with_options(
            transport,
            &config.api_prefix,
            config.cascade_policy,
            config.notification_ttl(),
        )
    }

    pub fn with_options(
        transport: Arc<dyn Transport>,
        prefix: &str,
        policy: CascadePolicy,
        notification_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            prefix: prefix.trim_end_matches('/').to_string(),
            notifier: Notifier::new(notification_ttl),
            state: Mutex::new(ScreenState::new(policy)),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScreenState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_mounted(&self) -> bool {
        self.state().mounted
    }

    /// Mount the screen and load every resource.
    ///
    /// The load is all-or-nothing: if any fetch fails, one load-error
    /// notification is raised and every store keeps its prior state.
    ///
    /// # Errors
    ///
    /// `LoadFailed` (including a record that is not a JSON object),
    /// `OperationInProgress` or `Unmounted`.
    pub async fn mount(&self) -> Result<()> {
        self.state().mounted = true;
        self.load(&ResourceId::ALL).await
    }

    /// Re-fetch one resource (manual retry)
    ///
    /// # Errors
    ///
    /// Same as [`mount`](Self::mount); `Unmounted` when not mounted.
    pub async fn reload(&self, resource: ResourceId) -> Result<()> {
        self.load(&[resource]).await
    }

    async fn load(&self, resources: &[ResourceId]) -> Result<()> {
        let ctx = RequestContext::new();
        let started = Instant::now();
        let Some(&first) = resources.first() else {
            return Ok(());
        };
        let labels = resources
            .iter()
            .map(|id| id.label())
            .collect::<Vec<_>>()
            .join(", ");

        let epoch = {
            let mut state = self.state();
            state.ensure_current(state.epoch, first)?;
            if let Some(busy) = resources.iter().find(|id| state.busy.contains(*id)) {
                return Err(ReconcileError::OperationInProgress {
                    resource: busy.label().to_string(),
                });
            }
            state.busy.extend(resources.iter().copied());
            state.epoch
        };
        self.notifier.dismiss_error();
        log_op_start!(
            OP_LOAD,
            ctx = &ctx,
            resource = labels.as_str()
        );

        let fetches: Vec<_> = resources
            .iter()
            .map(|id| {
                let transport = Arc::clone(&self.transport);
                let path = id.path(&self.prefix);
                async move { transport.fetch(&path).await }
            })
            .collect();
        let results = futures::future::join_all(fetches).await;

        let mut state = self.state();
        if let Err(err) = state.ensure_current(epoch, first) {
            tracing::debug!(resource = labels.as_str(), "load response dropped after unmount");
            return Err(err);
        }
        state.release(resources.iter().copied());

        match stage_loads(&state, resources.iter().copied().zip(results)) {
            Ok(staged) => {
                for (id, store) in staged {
                    *state.store_mut(id) = store;
                }
                log_op_end!(
                    OP_LOAD,
                    duration_ms = elapsed_ms(started),
                    ctx = &ctx,
                    resource = labels.as_str()
                );
                Ok(())
            }
            Err((id, err)) => {
                drop(state);
                Err(self.report(OP_LOAD, err, id, started, &ctx))
            }
        }
    }

    /// Write a raw value into a resource's working copy
    ///
    /// # Errors
    ///
    /// `UnknownField` or `NotLoaded`.
    pub fn set_field(&self, resource: ResourceId, name: &str, raw: Value) -> Result<()> {
        self.state().store_mut(resource).set_field(name, raw)
    }

    /// Reset a resource's working copy to its snapshot
    pub fn discard(&self, resource: ResourceId) {
        self.state().store_mut(resource).discard();
    }

    /// Change-set a save would submit right now, without side effects
    ///
    /// # Errors
    ///
    /// Every local error of [`save`](Self::save).
    pub fn preview(&self, resource: ResourceId) -> Result<ChangeSet> {
        let state = self.state();
        let gate = state.gate_state(resource).unwrap_or(GateState::Open);
        state.store(resource).change_set(&gate)
    }

    /// Save a resource and run its cascade.
    ///
    /// Local failures (coercion, rules, closed gate) are reported before
    /// any request is made. An empty change-set makes no request and raises
    /// no notification.
    ///
    /// # Errors
    ///
    /// - `OperationInProgress` while this resource (or a dependent) is busy
    /// - local validation errors, `NotLoaded`
    /// - `SaveFailed` / `InvalidPayload`; the working copy is untouched
    /// - `CascadeRefreshFailed`; the save itself was committed
    /// - `Unmounted` when the screen went away mid-flight
    pub async fn save(&self, resource: ResourceId) -> Result<SaveOutcome> {
        let ctx = RequestContext::new().with_trace_id(TraceId::new());
        let started = Instant::now();
        let label = resource.label();

        let (change_set, epoch, dependents) = {
            let mut state = self.state();
            let dependents: Vec<(&'static EditGate, bool)> = resource
                .dependents()
                .map(|gate| (gate, gate.outcome_for(state.store(resource).snapshot())))
                .collect();
            let involved = || {
                std::iter::once(resource).chain(dependents.iter().map(|(gate, _)| gate.target))
            };
            if involved().any(|id| state.busy.contains(&id)) {
                return Err(ReconcileError::OperationInProgress {
                    resource: label.to_string(),
                });
            }

            let gate = state.gate_state(resource).unwrap_or(GateState::Open);
            let change_set = match state.store(resource).change_set(&gate) {
                Ok(change_set) => change_set,
                Err(err) => return Err(self.report(OP_SAVE, err, resource, started, &ctx)),
            };
            if change_set.is_empty() {
                tracing::debug!(resource = label, "nothing to save");
                return Ok(SaveOutcome::NoChanges);
            }

            for (gate, _) in &dependents {
                if let Some(cascade) = state.cascade_mut(gate.target) {
                    if let Err(err) = cascade.begin_save() {
                        return Err(self.report(OP_SAVE, err, resource, started, &ctx));
                    }
                }
            }
            let busy: Vec<_> = involved().collect();
            state.busy.extend(busy);
            (change_set, state.epoch, dependents)
        };
        self.notifier.dismiss_error();
        log_op_start!(
            OP_SAVE,
            ctx = &ctx,
            resource = label,
            changed_fields = change_set.len() as u64
        );

        let result = self
            .transport
            .submit(&resource.path(&self.prefix), &change_set)
            .await;

        let refreshes = {
            let mut state = self.state();
            if let Err(err) = state.ensure_current(epoch, resource) {
                tracing::debug!(resource = label, "save response dropped after unmount");
                return Err(err);
            }

            let committed = match result {
                Ok(raw) => state.store_mut(resource).commit(raw).map(|_| ()),
                Err(cause) => Err(ReconcileError::SaveFailed {
                    resource: label.to_string(),
                    cause,
                }),
            };
            if let Err(err) = committed {
                state.release(std::iter::once(resource));
                for (gate, _) in &dependents {
                    state.release(std::iter::once(gate.target));
                    if let Some(cascade) = state.cascade_mut(gate.target) {
                        cascade.save_failed().ok();
                    }
                }
                drop(state);
                return Err(self.report(OP_SAVE, err, resource, started, &ctx));
            }

            let mut refreshes = Vec::new();
            for (gate, before) in &dependents {
                let after = gate.outcome_for(state.store(resource).snapshot());
                let step = state
                    .cascade_mut(gate.target)
                    .map(|cascade| cascade.save_succeeded(*before, after))
                    .unwrap_or(Ok(CascadeStep::Skip));
                match step {
                    Ok(CascadeStep::Refresh) => refreshes.push(gate.target),
                    Ok(CascadeStep::Skip) => state.release(std::iter::once(gate.target)),
                    Err(err) => {
                        tracing::warn!(resource = label, error = %err, "cascade out of step");
                        state.release(std::iter::once(gate.target));
                    }
                }
            }
            if refreshes.is_empty() {
                state.release(std::iter::once(resource));
            }
            refreshes
        };

        log_op_end!(
            OP_SAVE,
            duration_ms = elapsed_ms(started),
            ctx = &ctx,
            resource = label,
            changed_fields = change_set.len() as u64
        );
        self.notifier
            .success(format!("{} saved successfully!", sentence_case(label)));

        let mut refreshed = Vec::new();
        let mut outcome = Ok(());
        for &target in &refreshes {
            outcome = self.refresh_dependent(resource, target, epoch, &ctx).await;
            if outcome.is_err() {
                break;
            }
            refreshed.push(target);
        }
        if !refreshes.is_empty() {
            let mut state = self.state();
            if state.ensure_current(epoch, resource).is_ok() {
                state.release(std::iter::once(resource));
                state.release(refreshes.iter().copied());
            }
        }
        outcome.map(|()| SaveOutcome::Saved {
            change_set,
            refreshed,
        })
    }

    /// Re-fetch `target` after a successful save of `source`
    async fn refresh_dependent(
        &self,
        source: ResourceId,
        target: ResourceId,
        epoch: u64,
        parent: &RequestContext,
    ) -> Result<()> {
        let ctx = parent.child();
        let started = Instant::now();
        log_op_start!(
            OP_CASCADE_REFRESH,
            ctx = &ctx,
            resource = target.label()
        );

        let result = self.transport.fetch(&target.path(&self.prefix)).await;

        let mut state = self.state();
        state.ensure_current(epoch, target)?;
        let refreshed = result.and_then(|raw| {
            state
                .store_mut(target)
                .load_from(raw)
                .map(|_| ())
                .map_err(|err| TransportError::invalid_body(err.to_string()))
        });
        let cascade = state.cascade_mut(target);
        match refreshed {
            Ok(()) => {
                if let Some(cascade) = cascade {
                    cascade.refresh_succeeded()?;
                }
                log_op_end!(
                    OP_CASCADE_REFRESH,
                    duration_ms = elapsed_ms(started),
                    ctx = &ctx,
                    resource = target.label()
                );
                Ok(())
            }
            Err(cause) => {
                if let Some(cascade) = cascade {
                    cascade.refresh_failed().ok();
                }
                drop(state);
                let err = ReconcileError::CascadeRefreshFailed {
                    saved: sentence_case(source.label()),
                    resource: target.label().to_string(),
                    cause,
                };
                Err(self.report(OP_CASCADE_REFRESH, err, target, started, &ctx))
            }
        }
    }

    /// Tear the screen down: drop all state, cancel the pending
    /// notification, and orphan every in-flight response.
    pub fn unmount(&self) {
        {
            let mut state = self.state();
            state.mounted = false;
            state.epoch += 1;
            state.busy.clear();
            for store in &mut state.stores {
                store.clear();
            }
            for (_, cascade) in &mut state.cascades {
                cascade.reset();
            }
        }
        self.notifier.cancel();
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.live()
    }

    pub fn view(&self) -> ScreenView {
        let state = self.state();
        ScreenView {
            mounted: state.mounted,
            notification: self.notifier.live(),
            resources: ResourceId::ALL
                .into_iter()
                .map(|id| {
                    let store = state.store(id);
                    ResourceView {
                        resource: id,
                        label: id.label(),
                        loaded: store.is_loaded(),
                        dirty: store.is_dirty(),
                        busy: state.busy.contains(&id),
                        confirmation: store.confirmation(),
                        gate: state.gate_state(id),
                        snapshot: store.snapshot().cloned(),
                        working: store.working().cloned(),
                    }
                })
                .collect(),
            cascades: state
                .cascades
                .iter()
                .map(|(gate, cascade)| CascadeView {
                    source: gate.source,
                    target: gate.target,
                    state: cascade.state(),
                })
                .collect(),
        }
    }

    /// Log a failed operation and raise its error notification
    fn report(
        &self,
        op: &'static str,
        err: ReconcileError,
        resource: ResourceId,
        started: Instant,
        ctx: &RequestContext,
    ) -> ReconcileError {
        log_op_error!(
            op,
            err.clone(),
            duration_ms = elapsed_ms(started),
            ctx = ctx,
            resource = resource.label()
        );
        self.notifier.error(err.notification_text(resource.label()));
        err
    }
}

/// Apply fetched records to copies of the stores, failing on the first
/// error so that nothing is applied partially.
fn stage_loads(
    state: &ScreenState,
    results: impl Iterator<Item = (ResourceId, std::result::Result<Value, TransportError>)>,
) -> std::result::Result<Vec<(ResourceId, SnapshotStore)>, (ResourceId, ReconcileError)> {
    let mut staged = Vec::new();
    for (id, result) in results {
        let raw = result.map_err(|cause| {
            (
                id,
                ReconcileError::LoadFailed {
                    resource: id.label().to_string(),
                    cause,
                },
            )
        })?;
        let mut store = state.store(id).clone();
        // a record the store rejects is a failed load, not a local edit error
        store.load_from(raw).map_err(|err| {
            (
                id,
                ReconcileError::LoadFailed {
                    resource: id.label().to_string(),
                    cause: TransportError::invalid_body(err.to_string()),
                },
            )
        })?;
        staged.push((id, store));
    }
    Ok(staged)
}

fn sentence_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
