mod cli;
mod record_file;

use clap::Parser;
use cli::Args;
use intake_client::{
    render_intake, render_text, HttpRiskApi, IntakeSession, ReportJson, SubmitOutcome,
};
use record_file::load_record_inputs;
use std::io;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut session = IntakeSession::new();
    if let Some(path) = args.record.as_deref() {
        for (field, raw) in load_record_inputs(path)? {
            session.form_mut().set_input(field, &raw);
        }
    }
    for (field, raw) in args.field_inputs() {
        session.form_mut().set_input(field, raw);
    }

    let api = HttpRiskApi::new(args.server.as_str())?;
    let outcome = session.submit(&api).await;
    if outcome != SubmitOutcome::Completed {
        tracing::warn!(outcome = ?outcome, "submission did not complete");
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ReportJson::from_session(&session))?
        );
    } else {
        println!("{}", render_intake(session.form()));
        print!("{}", render_text(&session));
    }
    Ok(())
}

fn init_tracing() {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry().with(filter).with(layer).init();
}
