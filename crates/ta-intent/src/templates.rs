//! Built-in task templates for subway tunnel inspection.
//!
//! The registry is static data: it is never mutated after startup and is
//! shared read-only by every resolution.

use ta_protocol::TaskParams;

/// Default parameters carried by a template. Every field is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDefaults {
    pub task_name: &'static str,
    pub start_pos: &'static str,
    pub task_trip: u32,
    pub executor: &'static str,
    pub remark: &'static str,
}

/// One business task category: default parameters plus trigger keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTemplate {
    pub id: &'static str,
    pub display_name: &'static str,
    pub defaults: TemplateDefaults,
    /// Matched as lower-cased substrings, in order.
    pub keywords: &'static [&'static str],
    pub description: &'static str,
}

impl TaskTemplate {
    /// The template defaults as owned task parameters, tagged with the template id.
    pub fn default_params(&self) -> TaskParams {
        TaskParams {
            task_name: Some(self.defaults.task_name.to_string()),
            start_pos: Some(self.defaults.start_pos.to_string()),
            task_trip: Some(self.defaults.task_trip),
            executor: Some(self.defaults.executor.to_string()),
            remark: Some(self.defaults.remark.to_string()),
            task_type: Some(self.id.to_string()),
            confidence: None,
        }
    }

    /// True if any keyword occurs in `lowered` (already lower-cased text).
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub const TUNNEL_INSPECTION: &str = "tunnel_inspection";
pub const EQUIPMENT_CHECK: &str = "equipment_check";
pub const SAFETY_MONITORING: &str = "safety_monitoring";

// Registry order is the classification tie-break.
static TEMPLATES: [TaskTemplate; 3] = [
    TaskTemplate {
        id: TUNNEL_INSPECTION,
        display_name: "隧道巡检任务",
        defaults: TemplateDefaults {
            task_name: "隧道巡检任务",
            start_pos: "隧道入口",
            task_trip: 1000,
            executor: "巡检机器人",
            remark: "地铁隧道安全巡检",
        },
        keywords: &[
            "巡检", "检查", "巡视", "巡查", "检测", "隧道", "地铁", "轨道", "线路",
        ],
        description: "地铁隧道安全巡检任务",
    },
    TaskTemplate {
        id: EQUIPMENT_CHECK,
        display_name: "设备检查任务",
        defaults: TemplateDefaults {
            task_name: "设备检查任务",
            start_pos: "设备区域",
            task_trip: 500,
            executor: "巡检机器人",
            remark: "设备状态检查",
        },
        keywords: &[
            "设备", "检查", "维护", "保养", "修理", "维修", "检修", "故障",
        ],
        description: "设备状态检查和维护任务",
    },
    TaskTemplate {
        id: SAFETY_MONITORING,
        display_name: "安全监控任务",
        defaults: TemplateDefaults {
            task_name: "安全监控任务",
            start_pos: "监控区域",
            task_trip: 800,
            executor: "巡检机器人",
            remark: "安全状态监控",
        },
        keywords: &[
            "监控", "监视", "观察", "跟踪", "监测", "安全", "防护", "预警",
        ],
        description: "安全状态监控任务",
    },
];

/// Process-wide, immutable template table.
#[derive(Debug)]
pub struct TemplateRegistry {
    templates: &'static [TaskTemplate],
    fallback: usize,
}

static BUILTIN: TemplateRegistry = TemplateRegistry {
    templates: &TEMPLATES,
    fallback: 0,
};

impl TemplateRegistry {
    /// The built-in registry.
    pub fn builtin() -> &'static TemplateRegistry {
        &BUILTIN
    }

    /// Templates in registry order.
    pub fn templates(&self) -> &'static [TaskTemplate] {
        self.templates
    }

    pub fn get(&self, id: &str) -> Option<&'static TaskTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Template used when no keyword matches.
    pub fn fallback(&self) -> &'static TaskTemplate {
        &self.templates[self.fallback]
    }
}
