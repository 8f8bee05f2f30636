use risk_protocol::{IntakeField, IntakeRecord};

/// Editable intake state. Every field starts at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeForm {
    record: IntakeRecord,
}

impl IntakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &IntakeRecord {
        &self.record
    }

    /// Stores raw user text. Anything that does not start with a number, or
    /// reads as zero, stores 0.
    pub fn set_input(&mut self, field: IntakeField, raw: &str) {
        self.record.set(field, parse_input(raw));
    }

    pub fn set_value(&mut self, field: IntakeField, value: f64) {
        self.record.set(field, value);
    }

    /// Fields holding the null sentinel (a non-finite value).
    pub fn missing_fields(&self) -> Vec<IntakeField> {
        IntakeField::ALL
            .into_iter()
            .filter(|field| !self.record.get(*field).is_finite())
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn reset(&mut self) {
        self.record = IntakeRecord::default();
    }
}

pub fn parse_input(raw: &str) -> f64 {
    match parse_float_prefix(raw) {
        Some(value) if value != 0.0 && !value.is_nan() => value,
        _ => 0.0,
    }
}

/// Parses the longest numeric prefix of `raw` after leading whitespace:
/// `"12abc"` is 12, `"3.5e1x"` is 35, `"e5"` has no value.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < len && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}
