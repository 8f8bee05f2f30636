pub mod api;
pub mod form;
pub mod recommendations;
pub mod report;
pub mod session;

pub use api::{HttpRiskApi, RiskApi};
pub use form::IntakeForm;
pub use report::{render_intake, render_text, risk_details, ReportJson, RiskDetails};
pub use session::{IntakeSession, SubmitOutcome};
