use clap::Parser;
use risk_protocol::IntakeField;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "risk-intake",
    version,
    about = "Submit a health risk intake to a risk-proxy"
)]
pub(crate) struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub(crate) server: String,
    /// TOML file with any of the intake fields; flags override it.
    #[arg(long)]
    pub(crate) record: Option<PathBuf>,
    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    pub(crate) json: bool,
    #[arg(long)]
    pub(crate) id: Option<String>,
    #[arg(long)]
    pub(crate) age: Option<String>,
    /// 0 = Female, 1 = Male
    #[arg(long)]
    pub(crate) gender: Option<String>,
    /// Cups per day
    #[arg(long)]
    pub(crate) coffee_intake: Option<String>,
    #[arg(long)]
    pub(crate) caffeine_mg: Option<String>,
    #[arg(long)]
    pub(crate) sleep_hours: Option<String>,
    /// 0 = Fair, 1 = Good
    #[arg(long)]
    pub(crate) sleep_quality: Option<String>,
    #[arg(long)]
    pub(crate) bmi: Option<String>,
    #[arg(long)]
    pub(crate) heart_rate: Option<String>,
    /// 0 = Low, 1 = High
    #[arg(long)]
    pub(crate) stress_level: Option<String>,
    /// Hours per day
    #[arg(long)]
    pub(crate) physical_activity_hours: Option<String>,
    /// 0 = Non-smoker, 1 = Smoker
    #[arg(long)]
    pub(crate) smoking: Option<String>,
    /// 0 = No, 1 = Yes
    #[arg(long)]
    pub(crate) alcohol_consumption: Option<String>,
}

impl Args {
    /// Raw text given on the command line, in form order.
    pub(crate) fn field_inputs(&self) -> Vec<(IntakeField, &str)> {
        let values = [
            &self.id,
            &self.age,
            &self.gender,
            &self.coffee_intake,
            &self.caffeine_mg,
            &self.sleep_hours,
            &self.sleep_quality,
            &self.bmi,
            &self.heart_rate,
            &self.stress_level,
            &self.physical_activity_hours,
            &self.smoking,
            &self.alcohol_consumption,
        ];
        IntakeField::ALL
            .into_iter()
            .zip(values)
            .filter_map(|(field, value)| value.as_deref().map(|raw| (field, raw)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_flags_map_to_fields() {
        let args = Args::parse_from([
            "risk-intake",
            "--age",
            "45",
            "--bmi",
            "24.5",
            "--alcohol-consumption",
            "1",
        ]);
        assert_eq!(
            args.field_inputs(),
            vec![
                (IntakeField::Age, "45"),
                (IntakeField::Bmi, "24.5"),
                (IntakeField::AlcoholConsumption, "1"),
            ]
        );
        assert_eq!(args.server, "http://127.0.0.1:3000");
        assert!(!args.json);
    }
}
