use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;

pub const PREDICT_PATH: &str = "/api/predict";
pub const RECOMMEND_PATH: &str = "/api/recommend";

/// Patient metrics collected by the intake form.
///
/// Field order is the wire order; the recommendation prompt embeds this
/// serialization verbatim. Whole values are written without a fractional
/// part (`45`, not `45.0`); non-finite values are written as `null`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct IntakeRecord {
    #[serde(serialize_with = "whole_as_integer")]
    pub id: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub age: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub gender: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub coffee_intake: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub caffeine_mg: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub sleep_hours: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub sleep_quality: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub bmi: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub heart_rate: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub stress_level: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub physical_activity_hours: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub smoking: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub alcohol_consumption: f64,
}

// Integers stay exact in an f64 up to 2^53.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeField {
    Id,
    Age,
    Gender,
    CoffeeIntake,
    CaffeineMg,
    SleepHours,
    SleepQuality,
    Bmi,
    HeartRate,
    StressLevel,
    PhysicalActivityHours,
    Smoking,
    AlcoholConsumption,
}

impl IntakeField {
    pub const ALL: [IntakeField; 13] = [
        IntakeField::Id,
        IntakeField::Age,
        IntakeField::Gender,
        IntakeField::CoffeeIntake,
        IntakeField::CaffeineMg,
        IntakeField::SleepHours,
        IntakeField::SleepQuality,
        IntakeField::Bmi,
        IntakeField::HeartRate,
        IntakeField::StressLevel,
        IntakeField::PhysicalActivityHours,
        IntakeField::Smoking,
        IntakeField::AlcoholConsumption,
    ];

    /// JSON key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            IntakeField::Id => "id",
            IntakeField::Age => "age",
            IntakeField::Gender => "gender",
            IntakeField::CoffeeIntake => "coffee_intake",
            IntakeField::CaffeineMg => "caffeine_mg",
            IntakeField::SleepHours => "sleep_hours",
            IntakeField::SleepQuality => "sleep_quality",
            IntakeField::Bmi => "bmi",
            IntakeField::HeartRate => "heart_rate",
            IntakeField::StressLevel => "stress_level",
            IntakeField::PhysicalActivityHours => "physical_activity_hours",
            IntakeField::Smoking => "smoking",
            IntakeField::AlcoholConsumption => "alcohol_consumption",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IntakeField::Id => "Patient ID",
            IntakeField::Age => "Age",
            IntakeField::Gender => "Gender",
            IntakeField::CoffeeIntake => "Coffee Cups/Day",
            IntakeField::CaffeineMg => "Caffeine (mg/day)",
            IntakeField::SleepHours => "Sleep Hours",
            IntakeField::SleepQuality => "Sleep Quality",
            IntakeField::Bmi => "BMI",
            IntakeField::HeartRate => "Heart Rate (BPM)",
            IntakeField::StressLevel => "Stress Level",
            IntakeField::PhysicalActivityHours => "Physical Activity (hrs/day)",
            IntakeField::Smoking => "Smoking",
            IntakeField::AlcoholConsumption => "Alcohol Consumption",
        }
    }

    /// Labels for the 0 and 1 codes of categorical fields.
    pub fn choices(self) -> Option<[&'static str; 2]> {
        match self {
            IntakeField::Gender => Some(["Female", "Male"]),
            IntakeField::SleepQuality => Some(["Fair", "Good"]),
            IntakeField::StressLevel => Some(["Low", "High"]),
            IntakeField::Smoking => Some(["Non-smoker", "Smoker"]),
            IntakeField::AlcoholConsumption => Some(["No", "Yes"]),
            _ => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl IntakeRecord {
    pub fn get(&self, field: IntakeField) -> f64 {
        match field {
            IntakeField::Id => self.id,
            IntakeField::Age => self.age,
            IntakeField::Gender => self.gender,
            IntakeField::CoffeeIntake => self.coffee_intake,
            IntakeField::CaffeineMg => self.caffeine_mg,
            IntakeField::SleepHours => self.sleep_hours,
            IntakeField::SleepQuality => self.sleep_quality,
            IntakeField::Bmi => self.bmi,
            IntakeField::HeartRate => self.heart_rate,
            IntakeField::StressLevel => self.stress_level,
            IntakeField::PhysicalActivityHours => self.physical_activity_hours,
            IntakeField::Smoking => self.smoking,
            IntakeField::AlcoholConsumption => self.alcohol_consumption,
        }
    }

    pub fn set(&mut self, field: IntakeField, value: f64) {
        let slot = match field {
            IntakeField::Id => &mut self.id,
            IntakeField::Age => &mut self.age,
            IntakeField::Gender => &mut self.gender,
            IntakeField::CoffeeIntake => &mut self.coffee_intake,
            IntakeField::CaffeineMg => &mut self.caffeine_mg,
            IntakeField::SleepHours => &mut self.sleep_hours,
            IntakeField::SleepQuality => &mut self.sleep_quality,
            IntakeField::Bmi => &mut self.bmi,
            IntakeField::HeartRate => &mut self.heart_rate,
            IntakeField::StressLevel => &mut self.stress_level,
            IntakeField::PhysicalActivityHours => &mut self.physical_activity_hours,
            IntakeField::Smoking => &mut self.smoking,
            IntakeField::AlcoholConsumption => &mut self.alcohol_consumption,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictResponse {
    pub prediction: Number,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskClass {
    None,
    Mild,
    Moderate,
    Severe,
}

impl RiskClass {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RiskClass::None),
            1 => Some(RiskClass::Mild),
            2 => Some(RiskClass::Moderate),
            3 => Some(RiskClass::Severe),
            _ => None,
        }
    }

    /// Reads a scorer prediction. Fractional or out-of-range values have no
    /// class.
    pub fn from_prediction(prediction: &Number) -> Option<Self> {
        if let Some(code) = prediction.as_i64() {
            return Self::from_code(code);
        }
        let value = prediction.as_f64()?;
        if value.fract() != 0.0 {
            return None;
        }
        Self::from_code(value as i64)
    }

    pub fn level(self) -> &'static str {
        match self {
            RiskClass::None => "None",
            RiskClass::Mild => "Mild",
            RiskClass::Moderate => "Moderate",
            RiskClass::Severe => "Severe",
        }
    }
}
