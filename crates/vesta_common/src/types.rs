//! Core data model: causal paths and repair recommendations.
//!
//! Node names in the knowledge graph are Chinese display strings and are
//! globally unique within their label. Absent graph hops are represented by
//! the two sentinel strings the graph itself uses, never by null once a row
//! has been normalized into a [`CausalPath`].

use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel name for a path with no subcause refinement.
pub const NO_SUBCAUSE: &str = "无子原因";

/// Sentinel name for a cause with no reachable repair. Rows carrying it are
/// filtered out before they ever leave the graph adapter.
pub const NO_REPAIR: &str = "无修复方案";

/// One raw row from graph traversal, before normalization. `sub_cause` and
/// `repair` may be null (the nested-shape query leaves them unbound) or may
/// carry a sentinel (the coalescing query substitutes it server-side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRow {
    pub event: String,
    pub cause: String,
    pub sub_cause: Option<String>,
    pub repair: Option<String>,
    pub validation: Option<String>,
}

/// One resolved event → cause → subcause? → repair chain.
///
/// `sub_cause` is always a real node name or [`NO_SUBCAUSE`]; a value equal
/// to [`NO_REPAIR`] never appears in `repair`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CausalPath {
    pub event: String,
    pub cause: String,
    pub sub_cause: String,
    pub repair: String,
    pub validation: Option<String>,
}

impl CausalPath {
    /// True if this path had no subcause refinement in the graph.
    pub fn is_direct(&self) -> bool {
        self.sub_cause == NO_SUBCAUSE
    }
}

/// One ranked repair recommendation emitted by the reasoning engine.
///
/// `confidence` and `score` are parsed leniently: a missing or mistyped
/// value becomes `0.0` instead of failing the whole set, matching how the
/// write-back path must treat untrusted model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub repair_action: String,
    #[serde(default)]
    pub target_nodes: Vec<String>,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub verification_metrics: Vec<String>,
    #[serde(default, deserialize_with = "lenient_unit_interval")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "lenient_unit_interval")]
    pub score: f64,
    #[serde(default)]
    pub brief_reason: String,
}

/// The full structured output of one diagnosis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub event: String,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationSet {
    /// The empty result for an event with no candidate paths.
    pub fn empty(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            recommendations: Vec::new(),
        }
    }
}

/// Mutable attributes of a `PROPOSED_REPAIR` edge. The update timestamp is
/// assigned server-side on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedRepair {
    pub score: f64,
    pub confidence: f64,
    pub brief_reason: String,
}

impl From<&Recommendation> for ProposedRepair {
    fn from(rec: &Recommendation) -> Self {
        Self {
            score: rec.score.clamp(0.0, 1.0),
            confidence: rec.confidence.clamp(0.0, 1.0),
            brief_reason: rec.brief_reason.clone(),
        }
    }
}

/// Accept a number in `[0,1]`; anything else (missing handled by `default`,
/// strings, nulls, objects) collapses to `0.0` and out-of-range numbers are
/// clamped. Model output is untrusted; scores must never abort persistence.
fn lenient_unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_set_round_trip() {
        let json = r#"{
            "event": "母线电压异常",
            "recommendations": [
                {
                    "repair_action": "重置并切换到冗余电源单元",
                    "target_nodes": ["母线电压调节失灵", "DC-DC模块漂移/失效"],
                    "preconditions": ["冗余电源单元自检通过"],
                    "verification_metrics": ["母线电压恢复并稳定在额定范围"],
                    "confidence": 0.85,
                    "score": 0.9,
                    "brief_reason": "遥测显示DC-DC输出漂移，与该路径吻合"
                }
            ]
        }"#;
        let set: RecommendationSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.event, "母线电压异常");
        assert_eq!(set.recommendations.len(), 1);
        assert_eq!(set.recommendations[0].confidence, 0.85);

        let back = serde_json::to_string(&set).unwrap();
        let again: RecommendationSet = serde_json::from_str(&back).unwrap();
        assert_eq!(again, set);
    }

    #[test]
    fn test_missing_scores_default_to_zero() {
        let json = r#"{"repair_action": "执行电池均衡/重校准程序"}"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.score, 0.0);
        assert!(rec.target_nodes.is_empty());
    }

    #[test]
    fn test_mistyped_scores_default_to_zero() {
        let json = r#"{"repair_action": "r", "confidence": "high", "score": null}"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn test_out_of_range_scores_clamped() {
        let json = r#"{"repair_action": "r", "confidence": 1.7, "score": -0.3}"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.confidence, 1.0);
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn test_proposed_repair_clamps() {
        let rec = Recommendation {
            repair_action: "r".into(),
            target_nodes: vec![],
            preconditions: vec![],
            verification_metrics: vec![],
            confidence: 2.0,
            score: 0.4,
            brief_reason: "why".into(),
        };
        let attrs = ProposedRepair::from(&rec);
        assert_eq!(attrs.confidence, 1.0);
        assert_eq!(attrs.score, 0.4);
        assert_eq!(attrs.brief_reason, "why");
    }

    #[test]
    fn test_direct_path_sentinel() {
        let path = CausalPath {
            event: "e".into(),
            cause: "c".into(),
            sub_cause: NO_SUBCAUSE.into(),
            repair: "r".into(),
            validation: None,
        };
        assert!(path.is_direct());
    }
}
