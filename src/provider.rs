//! Provider registry: the table of resource and data-source types published
//! to the host runtime, plus the wiring that turns a resolved configuration
//! into a live engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, HttpTransport, ProviderConfig, Transport};
use crate::datasources::{user::UserDataSource, DataSourceAdapter};
use crate::diag::Diagnostics;
use crate::engine::{Engine, ProviderMeta, ResourceAdapter};
use crate::lock::LockRegistry;
use crate::resources::{
    dashboard_list::DashboardListResource, integration_aws::IntegrationAwsResource,
    logs_pipeline::LogsPipelineResource, monitor::MonitorResource,
};
use crate::schema::ResourceSchema;
use crate::value::Value;

pub use crate::api::config::provider_schema;

pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn ResourceAdapter>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSourceAdapter>>,
}

impl Provider {
    /// Build the registry. Every schema is consistency-checked here so a
    /// malformed resource description fails at startup, not mid-apply.
    pub fn new() -> Result<Self, String> {
        let resources: Vec<Arc<dyn ResourceAdapter>> = vec![
            Arc::new(MonitorResource::new()),
            Arc::new(LogsPipelineResource::new()),
            Arc::new(DashboardListResource::new()),
            Arc::new(IntegrationAwsResource::new()),
        ];
        let data_sources: Vec<Arc<dyn DataSourceAdapter>> = vec![Arc::new(UserDataSource::new())];

        let mut resource_map = BTreeMap::new();
        for adapter in resources {
            adapter
                .schema()
                .check_consistency()
                .map_err(|e| format!("{}: {e}", adapter.type_name()))?;
            resource_map.insert(adapter.type_name(), adapter);
        }
        let mut data_source_map = BTreeMap::new();
        for adapter in data_sources {
            adapter
                .schema()
                .check_consistency()
                .map_err(|e| format!("{}: {e}", adapter.type_name()))?;
            data_source_map.insert(adapter.type_name(), adapter);
        }
        Ok(Provider {
            resources: resource_map,
            data_sources: data_source_map,
        })
    }

    pub fn resource(&self, type_name: &str) -> Option<&Arc<dyn ResourceAdapter>> {
        self.resources.get(type_name)
    }

    pub fn data_source(&self, type_name: &str) -> Option<&Arc<dyn DataSourceAdapter>> {
        self.data_sources.get(type_name)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    pub fn schema(&self) -> ResourceSchema {
        provider_schema()
    }

    /// Resolve the provider block, optionally pre-flight the credentials,
    /// and hand back a ready engine.
    pub async fn connect(
        &self,
        options: &Value,
        cancel: CancellationToken,
    ) -> Result<Engine, Diagnostics> {
        let config = ProviderConfig::resolve(options)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config));
        self.connect_with_transport(config, transport, cancel).await
    }

    /// Same wiring with a caller-supplied transport; tests use this to run
    /// the full lifecycle against an in-memory fake.
    pub async fn connect_with_transport(
        &self,
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> Result<Engine, Diagnostics> {
        let client = Arc::new(ApiClient::new(transport, &config));
        let preflight = config.preflight(&client).await;
        if preflight.has_errors() {
            return Err(preflight);
        }
        Ok(Engine::new(ProviderMeta {
            api: client,
            locks: Arc::new(LockRegistry::new()),
            cancel,
        }))
    }
}
