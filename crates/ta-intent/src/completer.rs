//! Validation and completion of model-produced JSON.
//!
//! Small models routinely return partial objects: a bare `reply`, a missing
//! `shouldCreateTask`, keys with stray whitespace (`" reply"`), numbers as
//! strings. This stage turns whatever parsed into a fully populated
//! `IntentResult`, handing over to the rule-based resolver when the object
//! cannot be trusted.

use serde_json::{Map, Value};
use thiserror::Error;

use ta_protocol::{Intent, IntentResult, TaskParams};

use crate::fallback::{FallbackResolver, GENERIC_REPLY};

/// A model field had a type that cannot be interpreted.
#[derive(Debug, Error)]
#[error("model field `{field}` has unexpected type: {value}")]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

fn malformed(field: &'static str, value: &Value) -> MalformedField {
    MalformedField {
        field,
        value: value.to_string(),
    }
}

/// Model output with every top-level field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub intent: Option<Intent>,
    pub confidence: Option<f64>,
    pub params: Option<TaskParams>,
    pub reply: Option<String>,
    pub should_create_task: Option<bool>,
}

/// Re-key an object by trimmed key names. The first occurrence of a key wins;
/// `null` values count as absent.
fn normalize_keys(object: Map<String, Value>) -> Map<String, Value> {
    let mut normalized = Map::new();
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let key = key.trim().to_string();
        if !normalized.contains_key(&key) {
            normalized.insert(key, value);
        }
    }
    normalized
}

/// Numbers and numeric strings. `NaN` and infinities are rejected.
fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

/// Text fields accept strings and numbers; anything else is dropped.
fn text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn trip(value: &Value) -> Option<u32> {
    let meters = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(meters).ok().filter(|m| *m > 0)
}

/// Lenient per-field parse of a model `params` object. Unusable values are
/// left unset for later backfill.
fn parse_params(object: Map<String, Value>) -> TaskParams {
    let object = normalize_keys(object);
    let get = |key: &str| object.get(key);

    TaskParams {
        task_name: get("taskName").and_then(text),
        start_pos: get("startPos").and_then(text),
        task_trip: get("taskTrip").and_then(trip),
        executor: get("executor").and_then(text),
        remark: get("remark").and_then(text),
        task_type: get("taskType").and_then(text),
        confidence: get("confidence").and_then(number),
    }
}

impl ModelOutput {
    /// Read the recognised fields out of a parsed JSON object.
    pub fn from_object(object: Map<String, Value>) -> Result<Self, MalformedField> {
        let mut object = normalize_keys(object);
        let mut output = ModelOutput::default();

        if let Some(value) = object.remove("intent") {
            let Value::String(label) = &value else {
                return Err(malformed("intent", &value));
            };
            output.intent = Some(Intent::from_label(label));
        }

        if let Some(value) = object.remove("confidence") {
            output.confidence = Some(number(&value).ok_or_else(|| malformed("confidence", &value))?);
        }

        if let Some(value) = object.remove("params") {
            match value {
                Value::Object(map) => output.params = Some(parse_params(map)),
                other => return Err(malformed("params", &other)),
            }
        }

        if let Some(value) = object.remove("reply") {
            match &value {
                Value::String(s) if s.trim().is_empty() => {}
                Value::String(s) => output.reply = Some(s.clone()),
                Value::Number(n) => output.reply = Some(n.to_string()),
                other => return Err(malformed("reply", other)),
            }
        }

        if let Some(value) = object.remove("shouldCreateTask") {
            output.should_create_task = Some(match &value {
                Value::Bool(b) => *b,
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => true,
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => false,
                other => return Err(malformed("shouldCreateTask", other)),
            });
        }

        Ok(output)
    }

    /// All four decision fields are present.
    pub fn is_complete(&self) -> bool {
        self.intent.is_some()
            && self.confidence.is_some()
            && self.params.is_some()
            && self.should_create_task.is_some()
    }
}

/// Enforce the `IntentResult` invariants on an assembled result.
fn finalize(mut result: IntentResult) -> IntentResult {
    result.confidence = if result.confidence.is_finite() {
        result.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if result.intent != Intent::CreateTask {
        result.should_create_task = false;
        result.params = TaskParams::default();
    }
    if result.reply.trim().is_empty() {
        result.reply = GENERIC_REPLY.into();
    }
    result
}

/// Turn a (possibly absent, possibly partial) model object into a complete
/// `IntentResult`. Never fails: anything unusable is resolved by `fallback`
/// from the raw model text and the user's input.
pub fn complete(
    candidate: Option<Map<String, Value>>,
    raw: &str,
    user_input: &str,
    fallback: &FallbackResolver,
) -> IntentResult {
    let Some(object) = candidate else {
        tracing::warn!("no parseable JSON in model output, using fallback");
        return fallback.resolve(raw, user_input);
    };

    let output = match ModelOutput::from_object(object) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error = %e, "malformed model output, using fallback");
            return fallback.resolve(raw, user_input);
        }
    };

    if output.is_complete() {
        return finalize(IntentResult {
            intent: output.intent.unwrap_or_default(),
            confidence: output.confidence.unwrap_or_default(),
            params: output.params.unwrap_or_default(),
            reply: output.reply.unwrap_or_default(),
            should_create_task: output.should_create_task.unwrap_or_default(),
        });
    }

    tracing::debug!(?output, "model output incomplete, completing");

    if output.intent.is_none()
        && let Some(reply) = output.reply.clone()
    {
        if fallback.is_greeting_reply(&reply) {
            return finalize(IntentResult::greeting(reply));
        }
        tracing::debug!("bare non-greeting reply, using fallback");
        return fallback.resolve(raw, user_input);
    }

    finalize(IntentResult {
        intent: output.intent.unwrap_or(Intent::Unknown),
        confidence: output.confidence.unwrap_or(0.5),
        params: output.params.unwrap_or_default(),
        reply: output.reply.unwrap_or_else(|| GENERIC_REPLY.into()),
        should_create_task: output.should_create_task.unwrap_or(false),
    })
}
