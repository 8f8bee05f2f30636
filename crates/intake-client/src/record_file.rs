use anyhow::Context;
use risk_protocol::IntakeField;
use std::path::Path;

/// Reads intake values from a TOML file such as:
///
/// ```toml
/// age = 45
/// bmi = 24.5
/// smoking = "1"
/// ```
pub(crate) fn load_record_inputs(path: &Path) -> anyhow::Result<Vec<(IntakeField, String)>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read record {}", path.display()))?;
    parse_record_inputs(&raw).with_context(|| format!("failed to parse record {}", path.display()))
}

fn parse_record_inputs(raw: &str) -> anyhow::Result<Vec<(IntakeField, String)>> {
    let table: toml::Table = toml::from_str(raw)?;
    let mut inputs = Vec::with_capacity(table.len());
    for (key, value) in table {
        let Some(field) = IntakeField::from_key(&key) else {
            anyhow::bail!("unknown intake field {}", key);
        };
        let text = match value {
            toml::Value::Integer(value) => value.to_string(),
            toml::Value::Float(value) => value.to_string(),
            toml::Value::String(value) => value,
            other => anyhow::bail!("{} must be a number, got {}", key, other.type_str()),
        };
        inputs.push((field, text));
    }
    Ok(inputs)
}
