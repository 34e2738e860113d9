//! Text summary builder for CLI output.
//!
//! Renders the service's plan JSON into human-readable lines. The plan is an
//! opaque, deeply nested record owned by the service; access here is
//! defensive optional-field walking, never schema validation. When no
//! well-formed plan is present the summary is a single explicit "not found"
//! line rather than a partial guess.

use serde_json::Value;

/// Pre-formatted lines for text output.
pub struct PlanSummary {
    pub lines: Vec<String>,
}

fn field<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, key| v.get(key))
}

fn field_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    field(root, path).and_then(Value::as_str)
}

/// Build a text summary from a completed plan.
pub fn build_plan_summary(plan: &Value) -> PlanSummary {
    // The interesting payload sits a few levels down; older service versions
    // returned the inner object directly, so fall back to the root.
    let date = field(plan, &["complete_date_plan", "final_date_plan", "date"])
        .or_else(|| field(plan, &["final_date_plan", "date"]))
        .or_else(|| field(plan, &["date"]))
        .unwrap_or(plan);

    let activities = date
        .get("activities")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    if activities.is_empty() && date.get("theme").is_none() {
        return PlanSummary {
            lines: vec!["No date plan found in the service response.".into()],
        };
    }

    let mut lines = Vec::new();
    lines.push("Your date plan".into());
    if let Some(theme) = field_str(date, &["theme"]) {
        lines.push(format!("Theme: {theme}"));
    }

    for (idx, activity) in activities.iter().enumerate() {
        let name = field_str(activity, &["name"]).unwrap_or("(unnamed activity)");
        lines.push(format!("{}. {}", idx + 1, name));
        if let Some(location) = field_str(activity, &["location_name"]) {
            lines.push(format!("   at {location}"));
        }
        if let Some(slot) = field_str(activity, &["time_slot"]) {
            lines.push(format!("   {slot}"));
        }
        if let Some(why) = field_str(activity, &["reasoning"]) {
            lines.push(format!("   why: {why}"));
        }
    }

    if let Some(logistics) = field_str(date, &["logistics", "summary"]) {
        lines.push(format!("Logistics: {logistics}"));
    }
    if let Some(score) = field(date, &["compatibility_score"]).and_then(Value::as_f64) {
        lines.push(format!("Compatibility score: {score:.0}"));
    }

    PlanSummary { lines }
}
