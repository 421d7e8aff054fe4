//! Dashboard list resource. The list shell lives on the v1 API; membership
//! is a v2 sub-resource edited by replacing the full item set. A membership
//! failure after the shell exists must still record the ID so the half-made
//! list is adopted rather than leaked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{translate_api_error, ApiRequest};
use crate::data::ResourceData;
use crate::diag::{Diagnostic, Diagnostics};
use crate::engine::{ProviderMeta, ResourceAdapter};
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::parse_int_id;

const DASHBOARD_TYPES: &[&str] = &[
    "custom_timeboard",
    "custom_screenboard",
    "integration_screenboard",
    "integration_timeboard",
    "host_timeboard",
];

pub struct DashboardListResource {
    schema: ResourceSchema,
}

impl Default for DashboardListResource {
    fn default() -> Self {
        DashboardListResource::new()
    }
}

impl DashboardListResource {
    pub fn new() -> Self {
        DashboardListResource {
            schema: dashboard_list_schema(),
        }
    }
}

fn dashboard_list_schema() -> ResourceSchema {
    ResourceSchema::new([
        ("name", AttributeSchema::string().required()),
        (
            "dash_item",
            AttributeSchema::set_of(AttributeSchema::object([
                (
                    "type",
                    AttributeSchema::string().required().validator(|value, path| {
                        match value.as_str() {
                            Some(s) if DASHBOARD_TYPES.contains(&s) => Diagnostics::new(),
                            Some(s) => {
                                Diagnostic::error(format!("invalid dashboard type '{s}'"))
                                    .at(path.clone())
                                    .into()
                            }
                            None => Diagnostics::new(),
                        }
                    }),
                ),
                ("dash_id", AttributeSchema::string().required()),
            ])),
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DashboardItem {
    id: String,
    #[serde(rename = "type")]
    dashboard_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MembershipBody {
    dashboards: Vec<DashboardItem>,
}

fn configured_items(data: &ResourceData) -> Vec<DashboardItem> {
    data.config(&AttrPath::attr("dash_item"))
        .as_ref()
        .and_then(Value::as_items)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get(&AttrPath::attr("dash_id"))?.as_str()?.to_string();
                    let dashboard_type = item.get(&AttrPath::attr("type"))?.as_str()?.to_string();
                    Some(DashboardItem { id, dashboard_type })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn membership_path(id: i64) -> String {
    format!("/api/v2/dashboard/lists/manual/{id}/dashboards")
}

impl DashboardListResource {
    /// Replace the list's membership with the configured items: read what is
    /// there, delete it, then insert the configured set.
    async fn sync_membership(
        &self,
        id: i64,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Diagnostics {
        let current = match meta
            .api
            .send(ApiRequest::get(membership_path(id)), &meta.cancel)
            .await
        {
            Ok(response) if response.ok() => parse_membership(&response.body),
            Ok(response) => {
                return translate_api_error(
                    None,
                    Some(&response),
                    "error getting dashboard list items",
                )
                .into()
            }
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting dashboard list items")
                    .into()
            }
        };

        if !current.is_empty() {
            let body = match serde_json::to_value(MembershipBody { dashboards: current }) {
                Ok(body) => body,
                Err(e) => {
                    return Diagnostics::from_error(format!("error encoding dashboard items: {e}"))
                }
            };
            match meta
                .api
                .send(ApiRequest::delete_with_body(membership_path(id), body), &meta.cancel)
                .await
            {
                Ok(response) if response.ok() => {}
                Ok(response) => {
                    return translate_api_error(
                        None,
                        Some(&response),
                        "error removing dashboard list items",
                    )
                    .into()
                }
                Err(err) => {
                    return translate_api_error(
                        Some(&err),
                        None,
                        "error removing dashboard list items",
                    )
                    .into()
                }
            }
        }

        let configured = configured_items(data);
        if configured.is_empty() {
            return Diagnostics::new();
        }
        let body = match serde_json::to_value(MembershipBody {
            dashboards: configured,
        }) {
            Ok(body) => body,
            Err(e) => {
                return Diagnostics::from_error(format!("error encoding dashboard items: {e}"))
            }
        };
        match meta
            .api
            .send(ApiRequest::post(membership_path(id), body), &meta.cancel)
            .await
        {
            Ok(response) if response.ok() => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error adding dashboard list items")
                    .into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error adding dashboard list items").into()
            }
        }
    }
}

fn parse_membership(body: &serde_json::Value) -> Vec<DashboardItem> {
    body.get("dashboards")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ResourceAdapter for DashboardListResource {
    fn type_name(&self) -> &'static str {
        "datadog_dashboard_list"
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let name = data
            .config(&AttrPath::attr("name"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let response = match meta
            .api
            .send(
                ApiRequest::post(
                    "/api/v1/dashboard/lists/manual",
                    serde_json::json!({ "name": name }),
                ),
                &meta.cancel,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error creating dashboard list")
                    .into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error creating dashboard list")
                .into();
        }
        let id = match response.body.get("id").and_then(|v| v.as_i64()) {
            Some(id) => id,
            None => return Diagnostics::from_error("dashboard list create response carried no id"),
        };
        // The shell exists from here on; whatever happens to membership, the
        // ID must end up in state.
        data.set_id(id.to_string());
        data.partial_mark(&AttrPath::attr("dash_item"));

        if configured_items(data).is_empty() {
            return Diagnostics::new();
        }
        self.sync_membership(id, data, meta).await
    }

    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "dashboard list") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let response = match meta
            .api
            .send(
                ApiRequest::get(format!("/api/v1/dashboard/lists/manual/{id}")),
                &meta.cancel,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting dashboard list")
                    .into()
            }
        };
        if response.status == 404 {
            data.set_id("");
            return Diagnostics::new();
        }
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error getting dashboard list")
                .into();
        }
        if let Some(name) = response.body.get("name").and_then(|v| v.as_str()) {
            data.set(&AttrPath::attr("name"), Value::string(name));
        }

        let items = match meta
            .api
            .send(ApiRequest::get(membership_path(id)), &meta.cancel)
            .await
        {
            Ok(response) if response.ok() => parse_membership(&response.body),
            Ok(response) => {
                return translate_api_error(
                    None,
                    Some(&response),
                    "error getting dashboard list items",
                )
                .into()
            }
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting dashboard list items")
                    .into()
            }
        };
        if !items.is_empty() {
            data.set(
                &AttrPath::attr("dash_item"),
                Value::Set(
                    items
                        .iter()
                        .map(|item| {
                            Value::object([
                                ("type", Value::string(item.dashboard_type.clone())),
                                ("dash_id", Value::string(item.id.clone())),
                            ])
                        })
                        .collect(),
                ),
            );
        }
        Diagnostics::new()
    }

    async fn update(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "dashboard list") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let name = data
            .config(&AttrPath::attr("name"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        match meta
            .api
            .send(
                ApiRequest::put(
                    format!("/api/v1/dashboard/lists/manual/{id}"),
                    serde_json::json!({ "name": name }),
                ),
                &meta.cancel,
            )
            .await
        {
            Ok(response) if response.ok() => {}
            Ok(response) => {
                return translate_api_error(None, Some(&response), "error updating dashboard list")
                    .into()
            }
            Err(err) => {
                return translate_api_error(Some(&err), None, "error updating dashboard list")
                    .into()
            }
        }
        self.sync_membership(id, data, meta).await
    }

    async fn delete(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "dashboard list") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        match meta
            .api
            .send(
                ApiRequest::delete(format!("/api/v1/dashboard/lists/manual/{id}")),
                &meta.cancel,
            )
            .await
        {
            Ok(response) if response.ok() || response.status == 404 => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error deleting dashboard list").into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error deleting dashboard list").into()
            }
        }
    }
}
