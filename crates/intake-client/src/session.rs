use anyhow::Context;
use risk_protocol::IntakeRecord;
use serde_json::Number;

use crate::api::RiskApi;
use crate::form::IntakeForm;
use crate::recommendations::{build_prompt, parse_recommendations};
use crate::report::{details_for_prediction, RiskDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    /// A call failed; the error was logged and earlier results were kept.
    Failed,
    /// A submission was already running or the form was invalid.
    Refused,
}

/// One intake form plus the results of its last submission.
#[derive(Debug, Default)]
pub struct IntakeSession {
    form: IntakeForm,
    result: Option<Number>,
    recommendations: Vec<String>,
    analyzing: bool,
}

impl IntakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &IntakeForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut IntakeForm {
        &mut self.form
    }

    pub fn result(&self) -> Option<&Number> {
        self.result.as_ref()
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn can_submit(&self) -> bool {
        !self.is_analyzing() && self.form.is_valid()
    }

    pub fn details(&self) -> Option<RiskDetails> {
        self.result
            .as_ref()
            .map(|prediction| details_for_prediction(prediction, &self.recommendations))
    }

    /// Predicts, then asks for recommendations. The calls run strictly in
    /// that order and a failure in either is swallowed.
    pub async fn submit<A>(&mut self, api: &A) -> SubmitOutcome
    where
        A: RiskApi + ?Sized,
    {
        if !self.can_submit() {
            tracing::warn!(
                analyzing = self.analyzing,
                missing = ?self.form.missing_fields(),
                "submission refused"
            );
            return SubmitOutcome::Refused;
        }
        let record = *self.form.record();
        let _analyzing = AnalyzingGuard::set(&mut self.analyzing);
        let submission =
            run_submission(api, record, &mut self.result, &mut self.recommendations);
        match submission.await {
            Ok(()) => SubmitOutcome::Completed,
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::error!(error = %detail, "submission failed");
                SubmitOutcome::Failed
            }
        }
    }

    /// Clears the form and the stored class. Recommendations stay.
    pub fn reset(&mut self) {
        self.form.reset();
        self.result = None;
    }
}

/// Raises the analyzing flag and lowers it on drop, so a submission that is
/// cancelled mid-flight still frees the session.
struct AnalyzingGuard<'a>(&'a mut bool);

impl<'a> AnalyzingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

async fn run_submission<A>(
    api: &A,
    record: IntakeRecord,
    result: &mut Option<Number>,
    recommendations: &mut Vec<String>,
) -> anyhow::Result<()>
where
    A: RiskApi + ?Sized,
{
    let prediction = api
        .predict(&record)
        .await
        .context("prediction request failed")?;
    tracing::info!(prediction = %prediction, "prediction received");
    *result = Some(prediction);

    let prompt = build_prompt(&record)?;
    let text = api
        .recommend(&prompt)
        .await
        .context("recommendation request failed")?;
    *recommendations = parse_recommendations(&text);
    tracing::info!(count = recommendations.len(), "recommendations received");
    Ok(())
}
