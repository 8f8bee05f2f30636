use std::fmt::Write;

use risk_protocol::{IntakeField, RiskClass};
use serde::Serialize;
use serde_json::Number;

use crate::form::IntakeForm;
use crate::recommendations::HIGH_RISK_RECOMMENDATIONS;
use crate::session::IntakeSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskDetails {
    pub level: &'static str,
    pub color: &'static str,
    pub recommendations: Vec<String>,
}

fn risk_color(class: RiskClass) -> &'static str {
    match class {
        RiskClass::None => "blue",
        RiskClass::Mild => "green",
        RiskClass::Moderate => "yellow",
        RiskClass::Severe => "red",
    }
}

pub fn risk_details(class: RiskClass, recommendations: &[String]) -> RiskDetails {
    let recommendations = match class {
        RiskClass::Severe => HIGH_RISK_RECOMMENDATIONS
            .iter()
            .map(|message| message.to_string())
            .collect(),
        _ => recommendations.to_vec(),
    };
    RiskDetails {
        level: class.level(),
        color: risk_color(class),
        recommendations,
    }
}

/// Predictions outside 0..=3 render as the lowest class.
pub fn details_for_prediction(prediction: &Number, recommendations: &[String]) -> RiskDetails {
    let class = RiskClass::from_prediction(prediction).unwrap_or(RiskClass::None);
    risk_details(class, recommendations)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportJson {
    pub prediction: Option<Number>,
    pub level: Option<&'static str>,
    pub recommendations: Vec<String>,
}

impl ReportJson {
    pub fn from_session(session: &IntakeSession) -> Self {
        match session.details() {
            Some(details) => Self {
                prediction: session.result().cloned(),
                level: Some(details.level),
                recommendations: details.recommendations,
            },
            None => Self {
                prediction: None,
                level: None,
                recommendations: Vec::new(),
            },
        }
    }
}

/// One `label: value` line per field; categorical codes show their label.
pub fn render_intake(form: &IntakeForm) -> String {
    let mut out = String::new();
    for field in IntakeField::ALL {
        let value = form.record().get(field);
        let choice = field.choices().and_then(|choices| {
            if value == 0.0 {
                Some(choices[0])
            } else if value == 1.0 {
                Some(choices[1])
            } else {
                None
            }
        });
        match choice {
            Some(choice) => {
                let _ = writeln!(out, "{}: {}", field.label(), choice);
            }
            None => {
                let _ = writeln!(out, "{}: {}", field.label(), value);
            }
        }
    }
    out
}

pub fn render_text(session: &IntakeSession) -> String {
    let Some(details) = session.details() else {
        return "Complete all required fields to see your health risk assessment\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "{} Risk", details.level);
    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendations");
    if details.recommendations.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for recommendation in &details.recommendations {
        let _ = writeln!(out, "  - {recommendation}");
    }
    out
}
