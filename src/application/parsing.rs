//! # Parsing Utils
//!
//! Turns the planning call's raw text into an `AgentPlan`. Extraction is permissive (fenced
//! block first, then the outermost braces); validation is strict.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::agent::AgentPlan;
use crate::domain::error::OrchestratorError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```").expect("fenced block pattern")
});

/// Pull the JSON candidate out of a model reply. Only fences whose body is an object count;
/// otherwise the outermost braces are used.
pub fn extract_plan_json(response: &str) -> Option<&str> {
    let fenced = FENCED_BLOCK
        .captures_iter(response)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .find(|body| body.starts_with('{'));
    if fenced.is_some() {
        return fenced;
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

pub fn parse_plan(response: &str) -> Result<AgentPlan, OrchestratorError> {
    let candidate = extract_plan_json(response)
        .ok_or_else(|| OrchestratorError::PlanParse("no JSON object in model reply".to_string()))?;

    let plan: AgentPlan = serde_json::from_str(candidate)
        .map_err(|e| OrchestratorError::PlanParse(e.to_string()))?;

    if let Some(position) = plan.actions.iter().position(|a| a.name.trim().is_empty()) {
        return Err(OrchestratorError::PlanParse(format!(
            "action #{} has no name",
            position + 1
        )));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{"intent":"bump","actions":[{"name":"update_order_priority","arguments":{"orderId":42,"priority":10}}]}"#;

    #[test]
    fn test_fenced_and_bare_extract_the_same_plan() {
        let fenced = format!("Here is the plan:\n```json\n{}\n```\nDone.", PLAN);
        let bare = format!("Sure! {} Let me know.", PLAN);
        let a = parse_plan(&fenced).unwrap();
        let b = parse_plan(&bare).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.actions[0].arguments["orderId"], 42);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let reply = format!("```\n{}\n```", PLAN);
        assert_eq!(extract_plan_json(&reply), Some(PLAN));
    }

    #[test]
    fn test_fence_tag_is_case_insensitive() {
        let reply = format!("```Json\n{}\n```", PLAN);
        assert_eq!(extract_plan_json(&reply), Some(PLAN));
        assert_eq!(parse_plan(&reply).unwrap().intent, "bump");
    }

    #[test]
    fn test_non_json_fences_are_skipped() {
        let reply = format!(
            "Current state:\n```text\nORD-42 priority 3\n```\nPlan:\n```json\n{}\n```",
            PLAN
        );
        assert_eq!(extract_plan_json(&reply), Some(PLAN));
        assert!(parse_plan(&reply).is_ok());
    }

    #[test]
    fn test_braces_used_when_no_fence_holds_an_object() {
        let reply = format!("```python\nprint('hi')\n```\nThen: {}", PLAN);
        assert_eq!(extract_plan_json(&reply), Some(PLAN));
    }

    #[test]
    fn test_empty_actions_is_valid() {
        let plan = parse_plan(r#"{"intent":"inform","actions":[]}"#).unwrap();
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn test_extra_argument_keys_are_kept_for_later_filtering() {
        let plan = parse_plan(
            r#"{"intent":"x","actions":[{"name":"list_orders","arguments":{"limit":3,"colour":"red"}}]}"#,
        )
        .unwrap();
        assert_eq!(plan.actions[0].arguments.len(), 2);
    }

    #[test]
    fn test_shape_violations_are_fatal() {
        for reply in [
            "I cannot help with that.",
            r#"{"intent":"x"}"#,
            r#"{"actions":[]}"#,
            r#"{"intent":"x","actions":[{"name":""}]}"#,
            r#"{"intent":"x","actions":[{"name":"a","arguments":"none"}]}"#,
            "} nothing {",
        ] {
            assert!(
                matches!(parse_plan(reply), Err(OrchestratorError::PlanParse(_))),
                "{reply}"
            );
        }
    }
}
