//! Input schema resolution.
//!
//! Turns an actor's (possibly absent) input schema into a fully populated
//! default input plus an ordered, renderable field list. When no schema can
//! be discovered the resolver falls back to a first-match-wins rule table
//! keyed on actor name and id hints — most actors on the platform expect
//! either a single URL field or a start-URL list, so the guess favors the
//! common single-URL shape.

use serde_json::{json, Map, Value};

use shared_types::{FieldCategory, FieldDescriptor, InputTemplate};

use crate::platform::ActorRecord;

/// Source file the platform packages an actor's schema under when the actor
/// record does not carry one directly.
const EMBEDDED_SCHEMA_FILE: &str = ".actor/input_schema.json";

const FALLBACK_LINK_SELECTOR: &str = "a[href]";
const FALLBACK_MAX_REQUESTS_PER_CRAWL: u32 = 100;

/// Page function handed to scraper-style actors when nothing better is known.
const FALLBACK_PAGE_FUNCTION: &str = "async function pageFunction(context) {
    return {
        url: context.request.url,
        title: await context.page.title(),
    };
}";

// ============================================================================
// Field specs
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldKind {
    #[default]
    String,
    Boolean,
    Number,
    Integer,
    Object,
    Array,
}

impl FieldKind {
    /// The `type` keyword is advisory; unknown or missing kinds degrade to
    /// `String`.
    fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("boolean") => Self::Boolean,
            Some("number") => Self::Number,
            Some("integer") => Self::Integer,
            Some("object") => Self::Object,
            Some("array") => Self::Array,
            _ => Self::String,
        }
    }
}

/// One property of an input schema, parsed leniently: malformed fragments
/// never fail resolution.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<String>>,
    pub example: Option<Value>,
}

impl FieldSpec {
    pub fn from_value(prop: &Value) -> Self {
        let kind = FieldKind::from_wire(prop.get("type").and_then(|v| v.as_str()));
        let enum_values = prop.get("enum").and_then(|v| v.as_array()).map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str())
                .map(ToString::to_string)
                .collect()
        });
        Self {
            kind,
            title: prop
                .get("title")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            description: prop
                .get("description")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            default: prop.get("default").cloned(),
            enum_values,
            example: prop.get("example").cloned(),
        }
    }

    /// Infer a spec from an already-built value, used to describe fields the
    /// fallback cascade synthesized without a schema.
    fn from_fallback_value(value: &Value) -> Self {
        let kind = match value {
            Value::Bool(_) => FieldKind::Boolean,
            Value::Number(_) => FieldKind::Number,
            Value::Array(_) => FieldKind::Array,
            Value::Object(_) => FieldKind::Object,
            _ => FieldKind::String,
        };
        Self {
            kind,
            ..Self::default()
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Classify a field for rendering. Pure function of `(name, spec)`:
/// exact-name URL matches win over everything; the enum marker beats the
/// kind-based classes, including the string-kind URL substring rule.
pub fn classify_field(name: &str, spec: &FieldSpec) -> FieldCategory {
    if name == "inputUrl"
        || name == "inputurl"
        || (spec.kind == FieldKind::String
            && spec.enum_values.is_none()
            && name.to_lowercase().contains("url"))
    {
        return FieldCategory::Url;
    }
    if name == "startUrls" || name == "urls" {
        return FieldCategory::UrlList;
    }
    if spec.enum_values.is_some() {
        return FieldCategory::Enumerated;
    }
    match spec.kind {
        FieldKind::Boolean => FieldCategory::Boolean,
        FieldKind::Number | FieldKind::Integer => FieldCategory::Numeric,
        _ => FieldCategory::FreeText,
    }
}

fn descriptor(name: &str, spec: &FieldSpec) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        category: classify_field(name, spec),
        title: spec.title.clone(),
        description: spec.description.clone(),
        enum_values: spec.enum_values.clone(),
        example: spec.example.clone(),
    }
}

// ============================================================================
// Default values
// ============================================================================

/// URL-list fields are unusable when empty; they default to one editable
/// placeholder row instead of an empty sequence.
fn is_url_list_name(name: &str) -> bool {
    name == "startUrls" || name.to_lowercase().contains("url")
}

fn default_value(name: &str, spec: &FieldSpec) -> Value {
    if let Some(default) = &spec.default {
        return default.clone();
    }
    match spec.kind {
        FieldKind::String => json!(""),
        FieldKind::Boolean => json!(false),
        FieldKind::Number | FieldKind::Integer => json!(0),
        FieldKind::Object => Value::Object(Map::new()),
        FieldKind::Array => {
            if is_url_list_name(name) {
                json!([{ "url": "" }])
            } else {
                json!([])
            }
        }
    }
}

// ============================================================================
// Fallback cascade
// ============================================================================

struct FallbackSignals {
    name_hint: String,
    actor_id: String,
}

/// One heuristic of the no-schema cascade. Rules are evaluated in table
/// order, first match wins; the final rule always applies.
struct FallbackRule {
    name: &'static str,
    applies: fn(&FallbackSignals) -> bool,
    build: fn() -> Map<String, Value>,
}

const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "single-url-hint",
        applies: |s| s.name_hint.contains("inputurl") || s.name_hint.contains("single"),
        build: single_url_input,
    },
    FallbackRule {
        name: "scraper-hint",
        applies: |s| s.name_hint.contains("web-scraper") || s.name_hint.contains("scraper"),
        build: scraper_input,
    },
    FallbackRule {
        name: "crawler-id",
        applies: |s| {
            s.actor_id.contains("web-scraper")
                || s.actor_id.contains("cheerio")
                || s.actor_id.contains("puppeteer")
        },
        build: crawler_input,
    },
    FallbackRule {
        name: "single-url-default",
        applies: |_| true,
        build: single_url_input,
    },
];

fn single_url_input() -> Map<String, Value> {
    let mut input = Map::new();
    input.insert("inputurl".to_string(), json!(""));
    input
}

fn scraper_input() -> Map<String, Value> {
    let mut input = Map::new();
    input.insert("startUrls".to_string(), json!([{ "url": "" }]));
    input.insert("linkSelector".to_string(), json!(FALLBACK_LINK_SELECTOR));
    input.insert("pageFunction".to_string(), json!(FALLBACK_PAGE_FUNCTION));
    input
}

fn crawler_input() -> Map<String, Value> {
    let mut input = Map::new();
    input.insert("startUrls".to_string(), json!([{ "url": "" }]));
    input.insert("linkSelector".to_string(), json!(FALLBACK_LINK_SELECTOR));
    input.insert(
        "maxRequestsPerCrawl".to_string(),
        json!(FALLBACK_MAX_REQUESTS_PER_CRAWL),
    );
    input
}

fn fallback_input(actor_id: &str, name_hint: Option<&str>) -> Map<String, Value> {
    let signals = FallbackSignals {
        name_hint: name_hint.unwrap_or_default().to_lowercase(),
        actor_id: actor_id.to_lowercase(),
    };
    // The terminal rule matches everything, so the search cannot come up empty.
    let rule = FALLBACK_RULES
        .iter()
        .find(|rule| (rule.applies)(&signals))
        .unwrap_or(&FALLBACK_RULES[FALLBACK_RULES.len() - 1]);
    tracing::debug!(actor_id, rule = rule.name, "input defaults from fallback heuristic");
    (rule.build)()
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve an actor's input template.
///
/// With a schema, every property resolves in schema key order: the field's
/// own `default` wins, else a kind-based zero value. Without one, the
/// fallback cascade guesses from the display-name hint and the actor id.
pub fn resolve(actor_id: &str, raw_schema: Option<&Value>, name_hint: Option<&str>) -> InputTemplate {
    if let Some(properties) = raw_schema
        .and_then(|schema| schema.get("properties"))
        .and_then(|props| props.as_object())
    {
        let mut input = Map::new();
        let mut fields = Vec::with_capacity(properties.len());
        for (name, prop) in properties {
            let spec = FieldSpec::from_value(prop);
            input.insert(name.clone(), default_value(name, &spec));
            fields.push(descriptor(name, &spec));
        }
        return InputTemplate { input, fields };
    }

    let input = fallback_input(actor_id, name_hint);
    let fields = input
        .iter()
        .map(|(name, value)| descriptor(name, &FieldSpec::from_fallback_value(value)))
        .collect();
    InputTemplate { input, fields }
}

// ============================================================================
// Discovery
// ============================================================================

/// Find an actor's input schema: the record's direct `inputSchema` property
/// wins, else the embedded schema file of the first listed version. A
/// malformed embedded file is absorbed and treated as no schema.
pub fn discover_input_schema(actor: &ActorRecord) -> Option<Value> {
    if let Some(schema) = &actor.input_schema {
        return Some(schema.clone());
    }
    let version = actor.versions.first()?;
    let file = version
        .source_files
        .iter()
        .find(|file| file.name == EMBEDDED_SCHEMA_FILE)?;
    let content = file.content.as_deref()?;
    match serde_json::from_str(content) {
        Ok(schema) => Some(schema),
        Err(e) => {
            tracing::warn!(
                actor_id = %actor.id,
                error = %e,
                "embedded input schema is not valid JSON; falling back to heuristics"
            );
            None
        }
    }
}
