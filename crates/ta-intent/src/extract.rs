//! Positional/regex parameter extraction.
//!
//! Each field has its own ordered list of patterns. Patterns are tried in
//! declared order and the first one whose capture group yields a usable value
//! sets the field. Fields never influence each other.

use regex::Regex;
use std::sync::LazyLock;

use ta_protocol::{ParamField, TaskParams};

// (field, pattern) in evaluation order. Group 1 is the extracted value.
const RULE_TABLE: &[(ParamField, &str)] = &[
    // ── Task name ───────────────────────────────────────────────
    (ParamField::TaskName, r"任务名称?[：:]\s*([^\s,，。]+)"),
    (ParamField::TaskName, r"创建[一个]?([^任务\s,，。]+)任务"),
    (ParamField::TaskName, r"新建[一个]?([^任务\s,，。]+)任务"),
    (ParamField::TaskName, r"([^任务\s,，。]+)巡检"),
    (ParamField::TaskName, r"([^任务\s,，。]+)检查"),
    (ParamField::TaskName, r"([^任务\s,，。]+)监控"),
    (ParamField::TaskName, r"隧道([^任务\s,，。]+)"),
    (ParamField::TaskName, r"地铁([^任务\s,，。]+)"),
    // ── Start position ──────────────────────────────────────────
    (ParamField::StartPos, r"起点[：:]\s*([^\s,，。]+)"),
    (ParamField::StartPos, r"起始[位置]?[：:]\s*([^\s,，。]+)"),
    (ParamField::StartPos, r"从([^\s,，。]+)开始"),
    (ParamField::StartPos, r"在([^\s,，。]+)进行"),
    (ParamField::StartPos, r"隧道([^任务\s,，。]+)"),
    (ParamField::StartPos, r"地铁([^任务\s,，。]+)"),
    (ParamField::StartPos, r"([^任务\s,，。]+)站"),
    (ParamField::StartPos, r"([^任务\s,，。]+)入口"),
    // ── Distance (meters) ───────────────────────────────────────
    (ParamField::TaskTrip, r"([0-9]+)\s*(?:米|m|M)"),
    (ParamField::TaskTrip, r"距离[：:]\s*([0-9]+)\s*(?:米|m|M)"),
    (ParamField::TaskTrip, r"行程[：:]\s*([0-9]+)\s*(?:米|m|M)"),
    (ParamField::TaskTrip, r"长度[：:]\s*([0-9]+)\s*(?:米|m|M)"),
    // Kilometre family: the number is kept as-is, not scaled to meters.
    (ParamField::TaskTrip, r"([0-9]+)\s*公里"),
    (ParamField::TaskTrip, r"([0-9]+)\s*km"),
    // ── Executor ────────────────────────────────────────────────
    (ParamField::Executor, r"执行人[：:]\s*([^\s,，。]+)"),
    (ParamField::Executor, r"由([^\s,，。]+)执行"),
    (ParamField::Executor, r"([^\s,，。]+)负责"),
    (ParamField::Executor, r"巡检([^\s,，。]+)"),
    (ParamField::Executor, r"(机器人)"),
    (ParamField::Executor, r"(AGV)"),
    // ── Remark ──────────────────────────────────────────────────
    (ParamField::Remark, r"备注[：:]\s*([^\s,，。]+)"),
    (ParamField::Remark, r"说明[：:]\s*([^\s,，。]+)"),
    (ParamField::Remark, r"描述[：:]\s*([^\s,，。]+)"),
    (ParamField::Remark, r"原因[：:]\s*([^\s,，。]+)"),
    (ParamField::Remark, r"目的[：:]\s*([^\s,，。]+)"),
];

/// One compiled extraction pattern for a single field.
#[derive(Debug)]
pub struct ExtractionRule {
    pub field: ParamField,
    pub pattern: Regex,
}

impl ExtractionRule {
    /// The value captured by this rule, if it matches and the value is usable
    /// for the field.
    fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(1)?.as_str();
        if value.is_empty() {
            return None;
        }
        if self.field == ParamField::TaskTrip && parse_trip(value).is_none() {
            return None;
        }
        Some(value.to_string())
    }
}

static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|(field, pattern)| ExtractionRule {
            field: *field,
            pattern: Regex::new(pattern).unwrap(),
        })
        .collect()
});

/// All extraction rules in evaluation order.
pub fn rules() -> &'static [ExtractionRule] {
    &RULES
}

/// Distance values must be positive integers that fit in `u32`.
fn parse_trip(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|trip| *trip > 0)
}

fn is_set(params: &TaskParams, field: ParamField) -> bool {
    match field {
        ParamField::TaskName => params.task_name.is_some(),
        ParamField::StartPos => params.start_pos.is_some(),
        ParamField::TaskTrip => params.task_trip.is_some(),
        ParamField::Executor => params.executor.is_some(),
        ParamField::Remark => params.remark.is_some(),
    }
}

fn assign(params: &mut TaskParams, field: ParamField, value: String) {
    match field {
        ParamField::TaskName => params.task_name = Some(value),
        ParamField::StartPos => params.start_pos = Some(value),
        ParamField::TaskTrip => params.task_trip = parse_trip(&value),
        ParamField::Executor => params.executor = Some(value),
        ParamField::Remark => params.remark = Some(value),
    }
}

/// Pull whatever task parameters the text states explicitly.
///
/// Fields with no matching rule stay `None`; template defaults fill them later.
pub fn extract_params(text: &str) -> TaskParams {
    let mut params = TaskParams::default();

    for rule in rules() {
        if is_set(&params, rule.field) {
            continue;
        }
        if let Some(value) = rule.apply(text) {
            assign(&mut params, rule.field, value);
        }
    }

    params
}
