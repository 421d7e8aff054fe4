//! The lifecycle contract between the host runtime and per-resource
//! adapters: validate, plan, create, refresh, update, delete, import.
//!
//! The host owns scheduling, dependency ordering, and state persistence.
//! This module owns the fixed call contract of each operation: defaults and
//! validation before create, read-after-write for computed fields, 404 as
//! absence, per-operation timeouts, and partial-state reporting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::diff::{self, Plan};
use crate::lock::LockRegistry;
use crate::schema::validate::{apply_defaults, validate_config};
use crate::schema::ResourceSchema;
use crate::value::Value;

/// Opaque meta object handed to every callback: the authenticated client,
/// the per-family lock registry, and the host's cancellation token.
pub struct ProviderMeta {
    pub api: Arc<ApiClient>,
    pub locks: Arc<LockRegistry>,
    pub cancel: CancellationToken,
}

/// Per-resource CRUD+Import implementation against the remote API.
///
/// Contract (see also the engine methods below):
/// - `create` builds the request from configured values, POSTs, and calls
///   `set_id` on success. Adapters that might have partially created server
///   objects must record the ID before returning the error.
/// - `read` GETs by ID; a 404 calls `set_id("")` and returns no error. It
///   must tolerate a handle containing only the ID (import path).
/// - `update` may send only changed fields or the full object; the engine
///   refreshes computed fields afterwards either way.
/// - `delete` treats 404 as already gone.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> &ResourceSchema;

    async fn create(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics;
    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics;
    async fn update(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics;
    async fn delete(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics;

    /// Optional plan-time validation requiring the API (e.g. monitor query
    /// validation). Runs after static validation.
    async fn validate_remote(&self, _data: &ResourceData, _meta: &ProviderMeta) -> Diagnostics {
        Diagnostics::new()
    }

    /// Split an import ID into seeded handles. Composite IDs override this;
    /// the default passes the ID through as a single instance.
    fn import(&self, id: &str) -> Result<Vec<ResourceData>, Diagnostics> {
        Ok(vec![ResourceData::for_import(id)])
    }
}

/// What the planner decided for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    Update,
    /// A force-new attribute changed: destroy then create.
    Replace,
    NoOp,
}

#[derive(Debug)]
pub struct ResourcePlan {
    pub action: PlannedAction,
    pub diff: Plan,
}

/// The only state persisted between runs: the instance ID and the
/// last-observed attribute tree.
#[derive(Debug, Clone)]
pub struct InstanceState {
    pub id: String,
    pub attributes: Value,
}

pub struct Engine {
    meta: ProviderMeta,
}

impl Engine {
    pub fn new(meta: ProviderMeta) -> Self {
        Engine { meta }
    }

    pub fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    /// Static validation of a configured tree: required fields, types,
    /// cardinality, validators, cross-field constraints. Runs on the raw
    /// configuration; defaults are schema-owned and validated by
    /// `check_consistency`, not here.
    pub fn validate(&self, adapter: &dyn ResourceAdapter, config: &Value) -> Diagnostics {
        validate_config(adapter.schema(), config)
    }

    /// Decide what apply would do for one instance.
    pub fn plan(
        &self,
        adapter: &dyn ResourceAdapter,
        prior: Option<&InstanceState>,
        config: &Value,
    ) -> ResourcePlan {
        let schema = adapter.schema();
        let config = apply_defaults(schema, config);
        let prior = match prior {
            Some(state) if !state.id.is_empty() => state,
            _ => {
                return ResourcePlan {
                    action: PlannedAction::Create,
                    diff: Plan::default(),
                }
            }
        };
        let diff = diff::plan(schema, &prior.attributes, &config);
        let action = if diff.is_empty() {
            PlannedAction::NoOp
        } else if diff.requires_replace() {
            PlannedAction::Replace
        } else {
            PlannedAction::Update
        };
        ResourcePlan { action, diff }
    }

    /// Create a new instance. On failure with an empty ID, no state is
    /// returned; a non-empty ID is persisted even when diagnostics carry
    /// errors (partial creation of a composite resource).
    pub async fn create(
        &self,
        adapter: &dyn ResourceAdapter,
        config: &Value,
    ) -> (Option<InstanceState>, Diagnostics) {
        let schema = adapter.schema();
        let mut diags = validate_config(schema, config);
        if diags.has_errors() {
            return (None, diags);
        }
        let config = apply_defaults(schema, config);

        let mut data = ResourceData::for_create(config);
        diags.extend(adapter.validate_remote(&data, &self.meta).await);
        if diags.has_errors() {
            return (None, diags);
        }
        diags.extend(
            self.run_op(
                adapter.type_name(),
                "create",
                schema.timeouts.create,
                adapter.create(&mut data, &self.meta),
            )
            .await,
        );
        if data.id().is_empty() {
            return (None, diags);
        }
        if diags.has_errors() {
            for attribute in data.partial_paths() {
                warn!(
                    resource = adapter.type_name(),
                    id = data.id(),
                    attribute,
                    "partially applied before the failure"
                );
            }
        }
        info!(resource = adapter.type_name(), id = data.id(), "created");

        // Read-after-write populates computed fields; runs even when create
        // half-failed so whatever exists remotely is captured.
        diags.extend(
            self.run_op(
                adapter.type_name(),
                "read",
                schema.timeouts.read,
                adapter.read(&mut data, &self.meta),
            )
            .await,
        );
        if data.id().is_empty() {
            return (None, diags);
        }
        (Some(self.persist(schema, &mut data)), diags)
    }

    /// Refresh one instance from the remote platform. `None` means the
    /// resource is gone remotely and must be re-created on the next apply;
    /// no further callback is invoked for it this run.
    pub async fn refresh(
        &self,
        adapter: &dyn ResourceAdapter,
        prior: &InstanceState,
        config: &Value,
    ) -> (Option<InstanceState>, Diagnostics) {
        let schema = adapter.schema();
        let config = apply_defaults(schema, config);
        let mut data =
            ResourceData::for_instance(prior.id.clone(), prior.attributes.clone(), config);
        let diags = self
            .run_op(
                adapter.type_name(),
                "read",
                schema.timeouts.read,
                adapter.read(&mut data, &self.meta),
            )
            .await;
        if diags.has_errors() {
            // Unknown state: preserve what we had.
            return (Some(prior.clone()), diags);
        }
        if data.id().is_empty() {
            debug!(resource = adapter.type_name(), id = %prior.id, "absent remotely");
            return (None, diags);
        }
        (Some(self.persist(schema, &mut data)), diags)
    }

    /// In-place update. The host only calls this when the plan reported
    /// non-force-new changes; adapters must not rely on being called when
    /// nothing changed.
    pub async fn update(
        &self,
        adapter: &dyn ResourceAdapter,
        prior: &InstanceState,
        config: &Value,
    ) -> (Option<InstanceState>, Diagnostics) {
        let schema = adapter.schema();
        let mut diags = validate_config(schema, config);
        if diags.has_errors() {
            return (Some(prior.clone()), diags);
        }
        let config = apply_defaults(schema, config);

        let mut data =
            ResourceData::for_instance(prior.id.clone(), prior.attributes.clone(), config);
        diags.extend(adapter.validate_remote(&data, &self.meta).await);
        if diags.has_errors() {
            return (Some(prior.clone()), diags);
        }
        diags.extend(
            self.run_op(
                adapter.type_name(),
                "update",
                schema.timeouts.update,
                adapter.update(&mut data, &self.meta),
            )
            .await,
        );
        if diags.has_errors() {
            return (Some(prior.clone()), diags);
        }
        diags.extend(
            self.run_op(
                adapter.type_name(),
                "read",
                schema.timeouts.read,
                adapter.read(&mut data, &self.meta),
            )
            .await,
        );
        if diags.has_errors() {
            // The write landed but the follow-up read failed; state is
            // unknown, keep prior.
            return (Some(prior.clone()), diags);
        }
        if data.id().is_empty() {
            return (None, diags);
        }
        (Some(self.persist(schema, &mut data)), diags)
    }

    /// Destroy one instance. An already-deleted remote object (404) is
    /// success; the host then drops the instance from state.
    pub async fn delete(
        &self,
        adapter: &dyn ResourceAdapter,
        prior: &InstanceState,
    ) -> Diagnostics {
        let schema = adapter.schema();
        let mut data =
            ResourceData::for_instance(prior.id.clone(), prior.attributes.clone(), Value::Null);
        let diags = self
            .run_op(
                adapter.type_name(),
                "delete",
                schema.timeouts.delete,
                adapter.delete(&mut data, &self.meta),
            )
            .await;
        if !diags.has_errors() {
            info!(resource = adapter.type_name(), id = %prior.id, "deleted");
        }
        diags
    }

    /// Import existing remote objects by ID. Each seeded handle goes
    /// through `read`; an ID that resolves to nothing is an error rather
    /// than silence.
    pub async fn import(
        &self,
        adapter: &dyn ResourceAdapter,
        id: &str,
    ) -> (Vec<InstanceState>, Diagnostics) {
        let schema = adapter.schema();
        let seeds = match adapter.import(id) {
            Ok(seeds) => seeds,
            Err(diags) => return (Vec::new(), diags),
        };

        let mut imported = Vec::new();
        let mut diags = Diagnostics::new();
        for mut data in seeds {
            diags.extend(
                self.run_op(
                    adapter.type_name(),
                    "read",
                    schema.timeouts.read,
                    adapter.read(&mut data, &self.meta),
                )
                .await,
            );
            if !data.id().is_empty() {
                imported.push(self.persist(schema, &mut data));
            }
        }
        if imported.is_empty() && !diags.has_errors() {
            diags.push(crate::diag::Diagnostic::error(format!(
                "cannot import {} '{id}': not found",
                adapter.type_name()
            )));
        }
        (imported, diags)
    }

    fn persist(&self, schema: &ResourceSchema, data: &mut ResourceData) -> InstanceState {
        InstanceState {
            id: data.id().to_string(),
            attributes: diff::normalize_state(schema, data.take_state()),
        }
    }

    /// Enforce the per-operation budget and the host's cancellation token.
    /// On either firing, the callback future is dropped mid-flight and the
    /// caller keeps prior state.
    async fn run_op(
        &self,
        resource: &str,
        op: &str,
        budget: Duration,
        fut: impl std::future::Future<Output = Diagnostics>,
    ) -> Diagnostics {
        if self.meta.cancel.is_cancelled() {
            return Diagnostics::from_error(format!(
                "{resource} {op} cancelled; prior state preserved"
            ));
        }
        tokio::select! {
            result = tokio::time::timeout(budget, fut) => match result {
                Ok(diags) => diags,
                Err(_) => Diagnostics::from_error(format!(
                    "{resource} {op} timed out after {}s; resource state is unknown, prior state preserved",
                    budget.as_secs()
                )),
            },
            _ = self.meta.cancel.cancelled() => Diagnostics::from_error(format!(
                "{resource} {op} cancelled; prior state preserved"
            )),
        }
    }
}
