use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` and missing strings both become `""`.
pub fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregates come back as numbers, numeric strings or `null` depending on
/// the SQL type the backend serialized.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value {
        Value::Null => None,
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|n| n.max(0.0).round() as u64)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .map(|n| n.max(0.0).round() as u64),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a number, got {other}"
            )))
        }
    };
    Ok(count)
}

pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
