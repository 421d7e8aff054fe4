//! The log-processor tree shared by the custom pipeline resource: fifteen
//! processor variants, one of which (`pipeline`) nests a further processor
//! list one level deep.
//!
//! On the configuration side a processor is an object with exactly one key
//! naming the variant; on the wire it is a tagged object whose `type` field
//! carries the hyphenated variant name. Order is user-intent and must
//! survive both directions untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diag::{Diagnostic, Diagnostics};
use crate::schema::AttributeSchema;
use crate::value::{AttrPath, Value};

/// Configuration key for each variant, paired with its wire `type` tag.
const VARIANTS: &[(&str, &str)] = &[
    ("arithmetic_processor", "arithmetic-processor"),
    ("attribute_remapper", "attribute-remapper"),
    ("category_processor", "category-processor"),
    ("date_remapper", "date-remapper"),
    ("geo_ip_parser", "geo-ip-parser"),
    ("grok_parser", "grok-parser"),
    ("lookup_processor", "lookup-processor"),
    ("message_remapper", "message-remapper"),
    ("pipeline", "pipeline"),
    ("service_remapper", "service-remapper"),
    ("status_remapper", "status-remapper"),
    ("string_builder_processor", "string-builder-processor"),
    ("trace_id_remapper", "trace-id-remapper"),
    ("url_parser", "url-parser"),
    ("user_agent_parser", "user-agent-parser"),
];

// ─── Wire payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct FilterPayload {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct CategoryPayload {
    pub filter: FilterPayload,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct GrokPayload {
    pub support_rules: String,
    pub match_rules: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub(crate) enum ProcessorPayload {
    #[serde(rename = "arithmetic-processor")]
    Arithmetic {
        expression: String,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_replace_missing: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "attribute-remapper")]
    AttributeRemapper {
        sources: Vec<String>,
        source_type: String,
        target: String,
        target_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        preserve_source: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        override_on_conflict: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "category-processor")]
    Category {
        target: String,
        categories: Vec<CategoryPayload>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "date-remapper")]
    DateRemapper {
        sources: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "geo-ip-parser")]
    GeoIpParser {
        sources: Vec<String>,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "grok-parser")]
    GrokParser {
        source: String,
        grok: GrokPayload,
        #[serde(skip_serializing_if = "Option::is_none")]
        samples: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "lookup-processor")]
    Lookup {
        source: String,
        target: String,
        lookup_table: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_lookup: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "message-remapper")]
    MessageRemapper {
        sources: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "pipeline")]
    Pipeline {
        filter: FilterPayload,
        #[serde(skip_serializing_if = "Option::is_none")]
        processors: Option<Vec<ProcessorPayload>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "service-remapper")]
    ServiceRemapper {
        sources: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "status-remapper")]
    StatusRemapper {
        sources: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "string-builder-processor")]
    StringBuilder {
        template: String,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_replace_missing: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "trace-id-remapper")]
    TraceIdRemapper {
        sources: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "url-parser")]
    UrlParser {
        sources: Vec<String>,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        normalize_ending_slashes: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename = "user-agent-parser")]
    UserAgentParser {
        sources: Vec<String>,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_encoded: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

// ─── Schema ─────────────────────────────────────────────────────────────────

fn common() -> [(&'static str, AttributeSchema); 2] {
    [
        ("name", AttributeSchema::string()),
        ("is_enabled", AttributeSchema::bool()),
    ]
}

fn sources() -> AttributeSchema {
    AttributeSchema::list_of(AttributeSchema::string())
        .required()
        .min_items(1)
}

fn filter_schema() -> AttributeSchema {
    AttributeSchema::object([("query", AttributeSchema::string().required())]).required()
}

fn remapper_schema() -> AttributeSchema {
    let mut shape: Vec<(&'static str, AttributeSchema)> = common().to_vec();
    shape.push(("sources", sources()));
    AttributeSchema::object(shape)
}

/// Schema of one processor element: an object with exactly one variant key
/// set. Nested pipelines repeat the same shape minus the `pipeline` key.
fn processor_element(allow_nested: bool) -> AttributeSchema {
    let mut shape: Vec<(&'static str, AttributeSchema)> = vec![
        (
            "arithmetic_processor",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("expression", AttributeSchema::string().required()),
                    ("target", AttributeSchema::string().required()),
                    ("is_replace_missing", AttributeSchema::bool()),
                ]),
            ),
        ),
        (
            "attribute_remapper",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("sources", sources()),
                    ("source_type", AttributeSchema::string().required()),
                    ("target", AttributeSchema::string().required()),
                    ("target_type", AttributeSchema::string().required()),
                    ("target_format", AttributeSchema::string()),
                    ("preserve_source", AttributeSchema::bool()),
                    ("override_on_conflict", AttributeSchema::bool()),
                ]),
            ),
        ),
        (
            "category_processor",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("target", AttributeSchema::string().required()),
                    (
                        "category",
                        AttributeSchema::list_of(AttributeSchema::object([
                            ("filter", filter_schema()),
                            ("name", AttributeSchema::string().required()),
                        ]))
                        .required()
                        .min_items(1),
                    ),
                ]),
            ),
        ),
        ("date_remapper", remapper_schema()),
        (
            "geo_ip_parser",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("sources", sources()),
                    ("target", AttributeSchema::string().required()),
                ]),
            ),
        ),
        (
            "grok_parser",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("source", AttributeSchema::string().required()),
                    ("samples", AttributeSchema::list_of(AttributeSchema::string())),
                    (
                        "grok",
                        AttributeSchema::object([
                            ("support_rules", AttributeSchema::string().required()),
                            ("match_rules", AttributeSchema::string().required()),
                        ])
                        .required(),
                    ),
                ]),
            ),
        ),
        (
            "lookup_processor",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("source", AttributeSchema::string().required()),
                    ("target", AttributeSchema::string().required()),
                    (
                        "lookup_table",
                        AttributeSchema::list_of(AttributeSchema::string())
                            .required()
                            .min_items(1),
                    ),
                    ("default_lookup", AttributeSchema::string()),
                ]),
            ),
        ),
        ("message_remapper", remapper_schema()),
        ("service_remapper", remapper_schema()),
        ("status_remapper", remapper_schema()),
        (
            "string_builder_processor",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("template", AttributeSchema::string().required()),
                    ("target", AttributeSchema::string().required()),
                    ("is_replace_missing", AttributeSchema::bool()),
                ]),
            ),
        ),
        ("trace_id_remapper", remapper_schema()),
        (
            "url_parser",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("sources", sources()),
                    ("target", AttributeSchema::string().required()),
                    ("normalize_ending_slashes", AttributeSchema::bool()),
                ]),
            ),
        ),
        (
            "user_agent_parser",
            AttributeSchema::object(
                common().into_iter().chain([
                    ("sources", sources()),
                    ("target", AttributeSchema::string().required()),
                    ("is_encoded", AttributeSchema::bool()),
                ]),
            ),
        ),
    ];
    if allow_nested {
        shape.push((
            "pipeline",
            AttributeSchema::object(
                [
                    ("name", AttributeSchema::string().required()),
                    ("is_enabled", AttributeSchema::bool()),
                    ("filter", filter_schema()),
                    ("processor", processors_attribute(false)),
                ],
            ),
        ));
    }
    AttributeSchema::object(shape).validator(|value, path| {
        let entries = match value.as_entries() {
            Some(entries) => entries,
            None => return Diagnostics::new(),
        };
        let set: Vec<&str> = entries
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.as_str())
            .collect();
        if set.len() == 1 {
            Diagnostics::new()
        } else {
            Diagnostic::error(format!(
                "a processor must set exactly one variant, found {}",
                set.len()
            ))
            .at(path.clone())
            .into()
        }
    })
}

/// The `processor` list attribute. `allow_nested` is false for the list
/// inside a nested pipeline; the platform supports one level only.
pub(crate) fn processors_attribute(allow_nested: bool) -> AttributeSchema {
    AttributeSchema::list_of(processor_element(allow_nested))
}

// ─── Build (value tree → payload) ───────────────────────────────────────────

struct Entry<'a> {
    map: &'a BTreeMap<String, Value>,
    path: AttrPath,
}

impl<'a> Entry<'a> {
    fn str(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    fn require_str(&self, key: &str, diags: &mut Diagnostics) -> String {
        match self.str(key) {
            Some(s) => s,
            None => {
                diags.push(
                    Diagnostic::error(format!("missing required field '{key}'"))
                        .at(self.path.clone()),
                );
                String::new()
            }
        }
    }

    fn bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).and_then(Value::as_bool)
    }

    fn strings(&self, key: &str) -> Option<Vec<String>> {
        self.map.get(key).and_then(Value::as_items).map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }

    fn require_strings(&self, key: &str, diags: &mut Diagnostics) -> Vec<String> {
        match self.strings(key) {
            Some(items) => items,
            None => {
                diags.push(
                    Diagnostic::error(format!("missing required field '{key}'"))
                        .at(self.path.clone()),
                );
                Vec::new()
            }
        }
    }
}

/// Convert a configured processor list into wire payloads, preserving order.
pub(crate) fn build_processors(
    value: Option<&Value>,
    path: &AttrPath,
) -> Result<Vec<ProcessorPayload>, Diagnostics> {
    let items = match value.and_then(Value::as_items) {
        Some(items) => items,
        None => return Ok(Vec::new()),
    };
    let mut payloads = Vec::with_capacity(items.len());
    let mut diags = Diagnostics::new();
    for (i, item) in items.iter().enumerate() {
        let entries = match item.as_entries() {
            Some(entries) => entries,
            None => {
                diags.push(
                    Diagnostic::error("processor must be an object").at(path.clone().index(i)),
                );
                continue;
            }
        };
        let variant = entries.iter().find(|(_, v)| !v.is_null());
        let (key, body) = match variant {
            Some((key, body)) => (key.as_str(), body),
            None => {
                diags.push(
                    Diagnostic::error("processor sets no variant").at(path.clone().index(i)),
                );
                continue;
            }
        };
        let entry_path = path.clone().index(i).key(key);
        match build_one(key, body, &entry_path, &mut diags) {
            Some(payload) => payloads.push(payload),
            None => {}
        }
    }
    if diags.has_errors() {
        Err(diags)
    } else {
        Ok(payloads)
    }
}

fn build_filter(body: &Value, path: &AttrPath, diags: &mut Diagnostics) -> FilterPayload {
    let query = body
        .get(&AttrPath::attr("filter").key("query"))
        .and_then(|v| v.as_str().map(str::to_string));
    match query {
        Some(query) => FilterPayload { query },
        None => {
            diags.push(Diagnostic::error("missing required field 'filter.query'").at(path.clone()));
            FilterPayload {
                query: String::new(),
            }
        }
    }
}

fn build_one(
    key: &str,
    body: &Value,
    path: &AttrPath,
    diags: &mut Diagnostics,
) -> Option<ProcessorPayload> {
    let map = body.as_entries()?;
    let e = Entry {
        map,
        path: path.clone(),
    };
    let payload = match key {
        "arithmetic_processor" => ProcessorPayload::Arithmetic {
            expression: e.require_str("expression", diags),
            target: e.require_str("target", diags),
            is_replace_missing: e.bool("is_replace_missing"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "attribute_remapper" => ProcessorPayload::AttributeRemapper {
            sources: e.require_strings("sources", diags),
            source_type: e.require_str("source_type", diags),
            target: e.require_str("target", diags),
            target_type: e.require_str("target_type", diags),
            target_format: e.str("target_format"),
            preserve_source: e.bool("preserve_source"),
            override_on_conflict: e.bool("override_on_conflict"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "category_processor" => {
            let categories = map
                .get("category")
                .and_then(Value::as_items)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let cat_path = path.clone().key("category").index(i);
                            CategoryPayload {
                                filter: build_filter(item, &cat_path, diags),
                                name: item
                                    .get(&AttrPath::attr("name"))
                                    .and_then(|v| v.as_str().map(str::to_string))
                                    .unwrap_or_else(|| {
                                        diags.push(
                                            Diagnostic::error("missing required field 'name'")
                                                .at(cat_path.clone()),
                                        );
                                        String::new()
                                    }),
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            ProcessorPayload::Category {
                target: e.require_str("target", diags),
                categories,
                is_enabled: e.bool("is_enabled"),
                name: e.str("name"),
            }
        }
        "date_remapper" => ProcessorPayload::DateRemapper {
            sources: e.require_strings("sources", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "geo_ip_parser" => ProcessorPayload::GeoIpParser {
            sources: e.require_strings("sources", diags),
            target: e.require_str("target", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "grok_parser" => ProcessorPayload::GrokParser {
            source: e.require_str("source", diags),
            grok: GrokPayload {
                support_rules: body
                    .get(&AttrPath::attr("grok").key("support_rules"))
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                match_rules: body
                    .get(&AttrPath::attr("grok").key("match_rules"))
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
            },
            samples: e.strings("samples"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "lookup_processor" => ProcessorPayload::Lookup {
            source: e.require_str("source", diags),
            target: e.require_str("target", diags),
            lookup_table: e.require_strings("lookup_table", diags),
            default_lookup: e.str("default_lookup"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "message_remapper" => ProcessorPayload::MessageRemapper {
            sources: e.require_strings("sources", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "pipeline" => {
            let nested = build_processors(
                map.get("processor"),
                &path.clone().key("processor"),
            )
            .unwrap_or_else(|nested_diags| {
                diags.extend(nested_diags);
                Vec::new()
            });
            ProcessorPayload::Pipeline {
                filter: build_filter(body, path, diags),
                processors: (!nested.is_empty()).then_some(nested),
                is_enabled: e.bool("is_enabled"),
                name: e.str("name"),
            }
        }
        "service_remapper" => ProcessorPayload::ServiceRemapper {
            sources: e.require_strings("sources", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "status_remapper" => ProcessorPayload::StatusRemapper {
            sources: e.require_strings("sources", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "string_builder_processor" => ProcessorPayload::StringBuilder {
            template: e.require_str("template", diags),
            target: e.require_str("target", diags),
            is_replace_missing: e.bool("is_replace_missing"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "trace_id_remapper" => ProcessorPayload::TraceIdRemapper {
            sources: e.require_strings("sources", diags),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "url_parser" => ProcessorPayload::UrlParser {
            sources: e.require_strings("sources", diags),
            target: e.require_str("target", diags),
            normalize_ending_slashes: e.bool("normalize_ending_slashes"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        "user_agent_parser" => ProcessorPayload::UserAgentParser {
            sources: e.require_strings("sources", diags),
            target: e.require_str("target", diags),
            is_encoded: e.bool("is_encoded"),
            is_enabled: e.bool("is_enabled"),
            name: e.str("name"),
        },
        other => {
            diags.push(
                Diagnostic::error(format!("unknown processor variant '{other}'"))
                    .at(path.clone()),
            );
            return None;
        }
    };
    Some(payload)
}

// ─── Flatten (payload → value tree) ─────────────────────────────────────────

fn obj(entries: Vec<(&'static str, Option<Value>)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect(),
    )
}

fn strings_value(items: &[String]) -> Value {
    Value::List(items.iter().map(Value::string).collect())
}

fn filter_value(filter: &FilterPayload) -> Value {
    Value::object([("query", Value::string(filter.query.clone()))])
}

/// Convert wire payloads back into the single-variant-key object form the
/// configuration uses. Order is preserved.
pub(crate) fn flatten_processors(processors: &[ProcessorPayload]) -> Value {
    Value::List(processors.iter().map(flatten_one).collect())
}

fn flatten_one(p: &ProcessorPayload) -> Value {
    let (key, body) = match p {
        ProcessorPayload::Arithmetic {
            expression,
            target,
            is_replace_missing,
            is_enabled,
            name,
        } => (
            "arithmetic_processor",
            obj(vec![
                ("expression", Some(Value::string(expression.clone()))),
                ("target", Some(Value::string(target.clone()))),
                ("is_replace_missing", is_replace_missing.map(Value::Bool)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::AttributeRemapper {
            sources,
            source_type,
            target,
            target_type,
            target_format,
            preserve_source,
            override_on_conflict,
            is_enabled,
            name,
        } => (
            "attribute_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("source_type", Some(Value::string(source_type.clone()))),
                ("target", Some(Value::string(target.clone()))),
                ("target_type", Some(Value::string(target_type.clone()))),
                ("target_format", target_format.clone().map(Value::String)),
                ("preserve_source", preserve_source.map(Value::Bool)),
                ("override_on_conflict", override_on_conflict.map(Value::Bool)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::Category {
            target,
            categories,
            is_enabled,
            name,
        } => (
            "category_processor",
            obj(vec![
                ("target", Some(Value::string(target.clone()))),
                (
                    "category",
                    Some(Value::List(
                        categories
                            .iter()
                            .map(|c| {
                                Value::object([
                                    ("filter", filter_value(&c.filter)),
                                    ("name", Value::string(c.name.clone())),
                                ])
                            })
                            .collect(),
                    )),
                ),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::DateRemapper {
            sources,
            is_enabled,
            name,
        } => (
            "date_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::GeoIpParser {
            sources,
            target,
            is_enabled,
            name,
        } => (
            "geo_ip_parser",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("target", Some(Value::string(target.clone()))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::GrokParser {
            source,
            grok,
            samples,
            is_enabled,
            name,
        } => (
            "grok_parser",
            obj(vec![
                ("source", Some(Value::string(source.clone()))),
                (
                    "grok",
                    Some(Value::object([
                        ("support_rules", Value::string(grok.support_rules.clone())),
                        ("match_rules", Value::string(grok.match_rules.clone())),
                    ])),
                ),
                ("samples", samples.as_deref().map(strings_value)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::Lookup {
            source,
            target,
            lookup_table,
            default_lookup,
            is_enabled,
            name,
        } => (
            "lookup_processor",
            obj(vec![
                ("source", Some(Value::string(source.clone()))),
                ("target", Some(Value::string(target.clone()))),
                ("lookup_table", Some(strings_value(lookup_table))),
                ("default_lookup", default_lookup.clone().map(Value::String)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::MessageRemapper {
            sources,
            is_enabled,
            name,
        } => (
            "message_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::Pipeline {
            filter,
            processors,
            is_enabled,
            name,
        } => (
            "pipeline",
            obj(vec![
                ("filter", Some(filter_value(filter))),
                (
                    "processor",
                    processors.as_deref().map(flatten_processors),
                ),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::ServiceRemapper {
            sources,
            is_enabled,
            name,
        } => (
            "service_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::StatusRemapper {
            sources,
            is_enabled,
            name,
        } => (
            "status_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::StringBuilder {
            template,
            target,
            is_replace_missing,
            is_enabled,
            name,
        } => (
            "string_builder_processor",
            obj(vec![
                ("template", Some(Value::string(template.clone()))),
                ("target", Some(Value::string(target.clone()))),
                ("is_replace_missing", is_replace_missing.map(Value::Bool)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::TraceIdRemapper {
            sources,
            is_enabled,
            name,
        } => (
            "trace_id_remapper",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::UrlParser {
            sources,
            target,
            normalize_ending_slashes,
            is_enabled,
            name,
        } => (
            "url_parser",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("target", Some(Value::string(target.clone()))),
                (
                    "normalize_ending_slashes",
                    normalize_ending_slashes.map(Value::Bool),
                ),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
        ProcessorPayload::UserAgentParser {
            sources,
            target,
            is_encoded,
            is_enabled,
            name,
        } => (
            "user_agent_parser",
            obj(vec![
                ("sources", Some(strings_value(sources))),
                ("target", Some(Value::string(target.clone()))),
                ("is_encoded", is_encoded.map(Value::Bool)),
                ("is_enabled", is_enabled.map(Value::Bool)),
                ("name", name.clone().map(Value::String)),
            ]),
        ),
    };
    let mut entry = BTreeMap::new();
    entry.insert(key.to_string(), body);
    Value::Object(entry)
}
