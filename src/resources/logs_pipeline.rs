//! Custom log pipeline resource. Pipelines share account-wide ordering
//! server-side, so every write takes the logs-pipelines family lock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{check_unparsed, translate_api_error, ApiRequest};
use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::engine::{ProviderMeta, ResourceAdapter};
use crate::lock::FAMILY_LOGS_PIPELINES;
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::processors::{
    build_processors, flatten_processors, processors_attribute, FilterPayload, ProcessorPayload,
};

pub struct LogsPipelineResource {
    schema: ResourceSchema,
}

impl Default for LogsPipelineResource {
    fn default() -> Self {
        LogsPipelineResource::new()
    }
}

impl LogsPipelineResource {
    pub fn new() -> Self {
        LogsPipelineResource {
            schema: pipeline_schema(),
        }
    }
}

fn pipeline_schema() -> ResourceSchema {
    ResourceSchema::new([
        ("name", AttributeSchema::string().required()),
        ("is_enabled", AttributeSchema::bool()),
        (
            "filter",
            AttributeSchema::object([("query", AttributeSchema::string().required())]).required(),
        ),
        ("processor", processors_attribute(true)),
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelinePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_enabled: Option<bool>,
    filter: FilterPayload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    processors: Vec<ProcessorPayload>,
}

// Built from the configured tree only; removed processors must drop.
fn build_pipeline(data: &ResourceData) -> Result<PipelinePayload, Diagnostics> {
    let processors = build_processors(
        data.config(&AttrPath::attr("processor")).as_ref(),
        &AttrPath::attr("processor"),
    )?;
    Ok(PipelinePayload {
        id: None,
        name: data
            .config(&AttrPath::attr("name"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        is_enabled: data.config(&AttrPath::attr("is_enabled")).and_then(|v| v.as_bool()),
        filter: FilterPayload {
            query: data
                .config(&AttrPath::attr("filter").key("query"))
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        },
        processors,
    })
}

fn flatten_pipeline(data: &mut ResourceData, pipeline: &PipelinePayload) {
    data.set(&AttrPath::attr("name"), Value::string(pipeline.name.clone()));
    if let Some(enabled) = pipeline.is_enabled {
        data.set(&AttrPath::attr("is_enabled"), Value::Bool(enabled));
    }
    data.set(
        &AttrPath::attr("filter"),
        Value::object([("query", Value::string(pipeline.filter.query.clone()))]),
    );
    if !pipeline.processors.is_empty() {
        data.set(
            &AttrPath::attr("processor"),
            flatten_processors(&pipeline.processors),
        );
    }
}

#[async_trait]
impl ResourceAdapter for LogsPipelineResource {
    fn type_name(&self) -> &'static str {
        "datadog_logs_custom_pipeline"
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let payload = match build_pipeline(data) {
            Ok(payload) => payload,
            Err(diags) => return diags,
        };
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding pipeline: {e}")),
        };
        let _guard = meta.locks.acquire(FAMILY_LOGS_PIPELINES).await;
        let response = match meta
            .api
            .send(ApiRequest::post("/api/v1/logs/config/pipelines", body), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error creating logs pipeline").into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error creating logs pipeline")
                .into();
        }
        match response.body.get("id").and_then(|v| v.as_str()) {
            Some(id) => {
                data.set_id(id);
                Diagnostics::new()
            }
            None => Diagnostics::from_error("pipeline create response carried no id"),
        }
    }

    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = data.id().to_string();
        let response = match meta
            .api
            .send(
                ApiRequest::get(format!("/api/v1/logs/config/pipelines/{id}")),
                &meta.cancel,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting logs pipeline").into()
            }
        };
        // The pipelines API historically answers 400 for an ID it no longer
        // knows; both spellings mean the pipeline is gone.
        if response.status == 404 || response.status == 400 {
            data.set_id("");
            return Diagnostics::new();
        }
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error getting logs pipeline")
                .into();
        }

        let mut diags = Diagnostics::new();
        let pipeline: PipelinePayload = match serde_json::from_value(response.body.clone()) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                return Diagnostics::from_error(format!("error decoding pipeline response: {e}"))
            }
        };
        if let Some(warning) = check_unparsed(&response.body, &pipeline, "logs pipeline") {
            diags.push(warning);
        }
        flatten_pipeline(data, &pipeline);
        diags
    }

    async fn update(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let payload = match build_pipeline(data) {
            Ok(payload) => payload,
            Err(diags) => return diags,
        };
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding pipeline: {e}")),
        };
        let id = data.id().to_string();
        let _guard = meta.locks.acquire(FAMILY_LOGS_PIPELINES).await;
        match meta
            .api
            .send(
                ApiRequest::put(format!("/api/v1/logs/config/pipelines/{id}"), body),
                &meta.cancel,
            )
            .await
        {
            Ok(response) if response.ok() => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error updating logs pipeline").into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error updating logs pipeline").into()
            }
        }
    }

    async fn delete(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = data.id().to_string();
        let _guard = meta.locks.acquire(FAMILY_LOGS_PIPELINES).await;
        match meta
            .api
            .send(
                ApiRequest::delete(format!("/api/v1/logs/config/pipelines/{id}")),
                &meta.cancel,
            )
            .await
        {
            Ok(response)
                if response.ok() || response.status == 404 || response.status == 400 =>
            {
                Diagnostics::new()
            }
            Ok(response) => {
                translate_api_error(None, Some(&response), "error deleting logs pipeline").into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error deleting logs pipeline").into()
            }
        }
    }
}
