//! User lookup by filter string.

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::{percent_encode, translate_api_error, ApiRequest};
use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::engine::ProviderMeta;
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::DataSourceAdapter;

pub struct UserDataSource {
    schema: ResourceSchema,
}

impl Default for UserDataSource {
    fn default() -> Self {
        UserDataSource::new()
    }
}

impl UserDataSource {
    pub fn new() -> Self {
        UserDataSource {
            schema: ResourceSchema::new([
                ("filter", AttributeSchema::string().required()),
                ("name", AttributeSchema::string().computed()),
                ("handle", AttributeSchema::string().computed()),
                ("email", AttributeSchema::string().computed()),
            ]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    data: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    attributes: UserAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct UserAttributes {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl DataSourceAdapter for UserDataSource {
    fn type_name(&self) -> &'static str {
        "datadog_user"
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let filter = match data
            .get_ok(&AttrPath::attr("filter"))
            .and_then(|v| v.as_str().map(str::to_string))
        {
            Some(filter) => filter,
            None => return Diagnostics::from_error("filter must be set"),
        };
        let response = match meta
            .api
            .send(
                ApiRequest::get(format!("/api/v2/users?filter={}", percent_encode(&filter))),
                &meta.cancel,
            )
            .await
        {
            Ok(response) => response,
            Err(err) => return translate_api_error(Some(&err), None, "error querying users").into(),
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error querying users").into();
        }
        let list: UserList = match serde_json::from_value(response.body.clone()) {
            Ok(list) => list,
            Err(e) => return Diagnostics::from_error(format!("error decoding users response: {e}")),
        };

        let user = match pick_user(list.data, &filter) {
            Ok(user) => user,
            Err(diags) => return diags,
        };
        data.set_id(user.id);
        if let Some(name) = user.attributes.name {
            data.set(&AttrPath::attr("name"), Value::String(name));
        }
        if let Some(handle) = user.attributes.handle {
            data.set(&AttrPath::attr("handle"), Value::String(handle));
        }
        if let Some(email) = user.attributes.email {
            data.set(&AttrPath::attr("email"), Value::String(email));
        }
        Diagnostics::new()
    }
}

/// Narrow a filter's match list to one user. A single hit wins outright;
/// with several, an exact handle or email match disambiguates.
fn pick_user(mut users: Vec<UserRecord>, filter: &str) -> Result<UserRecord, Diagnostics> {
    if users.is_empty() {
        return Err(Diagnostics::from_error(format!(
            "didn't find any user matching '{filter}'"
        )));
    }
    if users.len() == 1 {
        return Ok(users.swap_remove(0));
    }
    let count = users.len();
    users
        .into_iter()
        .find(|user| {
            user.attributes.handle.as_deref() == Some(filter)
                || user.attributes.email.as_deref() == Some(filter)
        })
        .ok_or_else(|| {
            Diagnostics::from_error(format!(
                "filter '{filter}' matched {count} users and none exactly; narrow the filter"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, handle: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            attributes: UserAttributes {
                name: None,
                handle: Some(handle.to_string()),
                email: None,
            },
        }
    }

    #[test]
    fn missing_user_error_names_the_filter() {
        let err = pick_user(Vec::new(), "ops@example.com").unwrap_err();
        let message = err.iter().next().unwrap().summary.clone();
        assert!(message.contains("ops@example.com"), "{message}");
    }

    #[test]
    fn exact_handle_wins_among_many() {
        let users = vec![user("1", "ops@example.com"), user("2", "ops2@example.com")];
        let picked = pick_user(users, "ops2@example.com").unwrap();
        assert_eq!(picked.id, "2");
    }

    #[test]
    fn ambiguous_match_is_an_error() {
        let users = vec![user("1", "a@example.com"), user("2", "b@example.com")];
        assert!(pick_user(users, "example.com").is_err());
    }
}
