//! Deterministic prompt synthesis for recommendation reasoning.
//!
//! Identical `(event, paths, telemetry)` inputs always yield byte-identical
//! prompt text: no timestamps, no randomness, telemetry serialized with
//! sorted object keys (serde_json's default map ordering). The model is
//! framed as a domain expert that reasons internally but emits only the
//! structured JSON shape documented in the task block.

use serde_json::Value;
use vesta_common::CausalPath;

/// System turn seeding every recommendation transcript.
pub const SYSTEM_PROMPT: &str = "你是严谨的航天能源运维专家。严格按JSON结构输出，不要解释文字。";

/// Marker emitted when traversal produced no candidate paths.
pub const NO_CANDIDATES: &str = "(无候选路径)";

/// Corrective user turn appended after an invalid model response.
pub const CORRECTION: &str = "解析失败，只返回 JSON，不要多余文字。";

/// Build the user prompt for one diagnosis request.
pub fn build(event: &str, paths: &[CausalPath], telemetry: Option<&Value>) -> String {
    let mut graph_block = String::new();
    for p in paths {
        graph_block.push_str(&format!("- {} → {} → {}\n", p.cause, p.sub_cause, p.repair));
    }
    let graph_block = if graph_block.is_empty() {
        NO_CANDIDATES.to_string()
    } else {
        graph_block.trim_end().to_string()
    };

    let telemetry_block = match telemetry {
        // to_string_pretty on a Value is stable: object keys are sorted.
        Some(t) => format!(
            "\n最新遥测概要:\n{}\n",
            serde_json::to_string_pretty(t).unwrap_or_else(|_| "{}".to_string())
        ),
        None => String::new(),
    };

    format!(
        "你是航天能源运维专家。基于“事件→原因→子原因→修复”的图谱候选，产出有约束、可执行的修复建议列表。\n\
事件: {event}\n\
\n\
图谱候选路径:\n\
{graph_block}\n\
{telemetry_block}\n\
要求：\n\
1) 根据候选路径与常识，给出排序后的修复建议清单（top 3 即可）。每条建议需包含：\n\
   - repair_action: 具体修复动作（严格对应上述候选或其等价工程表述）\n\
   - target_nodes: 涉及的原因/子因子（列表）\n\
   - preconditions: 执行该动作的前置条件或适用场景（列表）\n\
   - verification_metrics: 修复后需重点观测的验证指标（列表）\n\
   - confidence: [0,1] 信心度（考虑该路径与遥测是否吻合）\n\
   - score: [0,1] 综合评分（兼顾收益/风险/可实施性）\n\
   - brief_reason: 1-2 句简短理由（不要展开思维链细节）\n\
\n\
2) 全量返回 JSON，字段：\n\
{{\n\
  \"event\": \"...\",\n\
  \"recommendations\": [\n\
     {{\n\
       \"repair_action\": \"...\",\n\
       \"target_nodes\": [\"cause/sub-cause\", \"...\"],\n\
       \"preconditions\": [\"...\"],\n\
       \"verification_metrics\": [\"...\"],\n\
       \"confidence\": 0-1,\n\
       \"score\": 0-1,\n\
       \"brief_reason\": \"...\"\n\
     }}\n\
  ]\n\
}}\n\
\n\
只返回 JSON，不要多余文字。"
    )
}
