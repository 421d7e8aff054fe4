//! AWS integration resource. An account is addressed by the composite
//! `account_id:role_name` pair rather than a server-assigned ID, and the
//! integration API rejects concurrent writes for the same organization, so
//! every write takes the integration-aws family lock.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::{percent_encode, translate_api_error, ApiRequest};
use crate::data::ResourceData;
use crate::diag::{Diagnostic, Diagnostics};
use crate::diff::suppress;
use crate::engine::{ProviderMeta, ResourceAdapter};
use crate::lock::FAMILY_INTEGRATION_AWS;
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::string_items_sorted;

pub struct IntegrationAwsResource {
    schema: ResourceSchema,
}

impl Default for IntegrationAwsResource {
    fn default() -> Self {
        IntegrationAwsResource::new()
    }
}

impl IntegrationAwsResource {
    pub fn new() -> Self {
        IntegrationAwsResource {
            schema: integration_aws_schema(),
        }
    }
}

fn account_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

fn integration_aws_schema() -> ResourceSchema {
    ResourceSchema::new([
        (
            "account_id",
            AttributeSchema::string()
                .required()
                .force_new()
                .validator(|value, path| match value.as_str() {
                    Some(s) if account_id_pattern().is_match(s) => Diagnostics::new(),
                    Some(s) => {
                        Diagnostic::error(format!("invalid AWS account ID '{s}': must be numeric"))
                            .at(path.clone())
                            .into()
                    }
                    None => Diagnostics::new(),
                }),
        ),
        (
            "role_name",
            AttributeSchema::string()
                .force_new()
                .conflicts_with(&["access_key_id", "secret_access_key"]),
        ),
        (
            "access_key_id",
            AttributeSchema::string().conflicts_with(&["role_name"]),
        ),
        (
            "secret_access_key",
            // Write-only server-side; the configured value stays canonical.
            AttributeSchema::string()
                .sensitive()
                .conflicts_with(&["role_name"])
                .suppress(suppress::never_returned),
        ),
        ("filter_tags", AttributeSchema::list_of(AttributeSchema::string())),
        ("host_tags", AttributeSchema::list_of(AttributeSchema::string())),
        (
            "account_specific_namespace_rules",
            AttributeSchema::map_of(AttributeSchema::bool()),
        ),
        (
            "excluded_regions",
            AttributeSchema::set_of(AttributeSchema::string()),
        ),
        ("external_id", AttributeSchema::string().computed()),
    ])
}

/// Split a composite `account_id:role_name` handle. Rejects anything whose
/// account half is not numeric so a mistyped import fails loudly instead of
/// scanning for an account that can never match.
fn parse_composite_id(id: &str) -> Result<(String, String), Diagnostics> {
    let (account_id, role_name) = id.split_once(':').ok_or_else(|| {
        Diagnostics::from_error(format!(
            "invalid AWS integration id '{id}': expected '<account_id>:<role_name>'"
        ))
    })?;
    if !account_id_pattern().is_match(account_id) {
        return Err(Diagnostics::from_error(format!(
            "invalid AWS integration id '{id}': account half must be numeric"
        )));
    }
    Ok((account_id.to_string(), role_name.to_string()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AwsAccountPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    filter_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    host_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    account_specific_namespace_rules: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    excluded_regions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AwsAccountList {
    #[serde(default)]
    accounts: Vec<AwsAccountPayload>,
}

// Built from the configured tree only.
fn build_account(data: &ResourceData) -> AwsAccountPayload {
    let get_str = |name: &str| {
        data.config(&AttrPath::attr(name))
            .and_then(|v| v.as_str().map(str::to_string))
    };
    AwsAccountPayload {
        account_id: get_str("account_id"),
        role_name: get_str("role_name"),
        access_key_id: get_str("access_key_id"),
        secret_access_key: get_str("secret_access_key"),
        filter_tags: string_list(data, "filter_tags"),
        host_tags: string_list(data, "host_tags"),
        account_specific_namespace_rules: data
            .config(&AttrPath::attr("account_specific_namespace_rules"))
            .as_ref()
            .and_then(Value::as_entries)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default(),
        excluded_regions: string_items_sorted(data.config(&AttrPath::attr("excluded_regions"))),
        external_id: None,
    }
}

/// Ordered string list (filter/host tags are positional, unlike regions).
fn string_list(data: &ResourceData, name: &str) -> Vec<String> {
    data.config(&AttrPath::attr(name))
        .as_ref()
        .and_then(Value::as_items)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn flatten_account(data: &mut ResourceData, account: &AwsAccountPayload) {
    if let Some(account_id) = &account.account_id {
        data.set(&AttrPath::attr("account_id"), Value::string(account_id.clone()));
    }
    if let Some(role_name) = &account.role_name {
        data.set(&AttrPath::attr("role_name"), Value::string(role_name.clone()));
    }
    if let Some(access_key_id) = &account.access_key_id {
        data.set(&AttrPath::attr("access_key_id"), Value::string(access_key_id.clone()));
    }
    if !account.filter_tags.is_empty() {
        data.set(
            &AttrPath::attr("filter_tags"),
            Value::List(account.filter_tags.iter().map(Value::string).collect()),
        );
    }
    if !account.host_tags.is_empty() {
        data.set(
            &AttrPath::attr("host_tags"),
            Value::List(account.host_tags.iter().map(Value::string).collect()),
        );
    }
    if !account.account_specific_namespace_rules.is_empty() {
        data.set(
            &AttrPath::attr("account_specific_namespace_rules"),
            Value::Map(
                account
                    .account_specific_namespace_rules
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::Bool(*v)))
                    .collect(),
            ),
        );
    }
    if !account.excluded_regions.is_empty() {
        data.set(
            &AttrPath::attr("excluded_regions"),
            Value::Set(account.excluded_regions.iter().map(Value::string).collect()),
        );
    }
    if let Some(external_id) = &account.external_id {
        data.set(&AttrPath::attr("external_id"), Value::string(external_id.clone()));
    }
}

#[async_trait]
impl ResourceAdapter for IntegrationAwsResource {
    fn type_name(&self) -> &'static str {
        "datadog_integration_aws"
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn import(&self, id: &str) -> Result<Vec<ResourceData>, Diagnostics> {
        parse_composite_id(id)?;
        Ok(vec![ResourceData::for_import(id)])
    }

    async fn create(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let payload = build_account(data);
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding AWS account: {e}")),
        };
        let _guard = meta.locks.acquire(FAMILY_INTEGRATION_AWS).await;
        let response = match meta
            .api
            .send(ApiRequest::post("/api/v1/integration/aws", body), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error creating AWS integration")
                    .into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error creating AWS integration")
                .into();
        }
        if let Some(external_id) = response.body.get("external_id").and_then(|v| v.as_str()) {
            data.set(&AttrPath::attr("external_id"), Value::string(external_id));
        }
        data.set_id(format!(
            "{}:{}",
            payload.account_id.unwrap_or_default(),
            payload.role_name.unwrap_or_default()
        ));
        Diagnostics::new()
    }

    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let (account_id, role_name) = match parse_composite_id(data.id()) {
            Ok(parts) => parts,
            Err(diags) => return diags,
        };
        let response = match meta
            .api
            .send(ApiRequest::get("/api/v1/integration/aws"), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting AWS integration")
                    .into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error getting AWS integration")
                .into();
        }
        let list: AwsAccountList = match serde_json::from_value(response.body.clone()) {
            Ok(list) => list,
            Err(e) => {
                return Diagnostics::from_error(format!(
                    "error decoding AWS integration response: {e}"
                ))
            }
        };
        let account = list.accounts.into_iter().find(|account| {
            account.account_id.as_deref() == Some(account_id.as_str())
                && account.role_name.as_deref() == Some(role_name.as_str())
        });
        match account {
            Some(account) => {
                flatten_account(data, &account);
                Diagnostics::new()
            }
            None => {
                data.set_id("");
                Diagnostics::new()
            }
        }
    }

    async fn update(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let (account_id, role_name) = match parse_composite_id(data.id()) {
            Ok(parts) => parts,
            Err(diags) => return diags,
        };
        let mut payload = build_account(data);
        // Identity travels in the query string; repeating it in the body
        // would attempt a rename.
        payload.account_id = None;
        payload.role_name = None;
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding AWS account: {e}")),
        };
        // IAM role names may carry reserved characters (+ = , @).
        let path = format!(
            "/api/v1/integration/aws?account_id={}&role_name={}",
            percent_encode(&account_id),
            percent_encode(&role_name)
        );
        let _guard = meta.locks.acquire(FAMILY_INTEGRATION_AWS).await;
        match meta.api.send(ApiRequest::put(path, body), &meta.cancel).await {
            Ok(response) if response.ok() => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error updating AWS integration").into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error updating AWS integration").into()
            }
        }
    }

    async fn delete(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let (account_id, role_name) = match parse_composite_id(data.id()) {
            Ok(parts) => parts,
            Err(diags) => return diags,
        };
        let body = serde_json::json!({
            "account_id": account_id,
            "role_name": role_name,
        });
        let _guard = meta.locks.acquire(FAMILY_INTEGRATION_AWS).await;
        match meta
            .api
            .send(
                ApiRequest::delete_with_body("/api/v1/integration/aws", body),
                &meta.cancel,
            )
            .await
        {
            Ok(response) if response.ok() || response.status == 404 => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error deleting AWS integration").into()
            }
            Err(err) => {
                translate_api_error(Some(&err), None, "error deleting AWS integration").into()
            }
        }
    }
}
