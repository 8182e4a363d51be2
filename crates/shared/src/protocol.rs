use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Length, Sentiment, Tone};

pub const GENERATE_PATH: &str = "/api/generate";
pub const RECENT_PATH: &str = "/api/recent";

pub const MIN_VARIANTS: u8 = 1;
pub const MAX_VARIANTS: u8 = 5;

/// Parameters of one generation request. Built by the host from its form
/// state and handed to the request controller on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub tone: Tone,
    pub sentiment: Sentiment,
    pub length: Length,
    creativity: f64,
    variant_count: u8,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tone: Tone::default(),
            sentiment: Sentiment::default(),
            length: Length::default(),
            creativity: 0.35,
            variant_count: 2,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    /// Clamped to `[0.0, 1.0]`; NaN becomes `0.0`.
    pub fn with_creativity(mut self, creativity: f64) -> Self {
        self.creativity = if creativity.is_nan() {
            0.0
        } else {
            creativity.clamp(0.0, 1.0)
        };
        self
    }

    /// Clamped to `[MIN_VARIANTS, MAX_VARIANTS]`.
    pub fn with_variants(mut self, variant_count: u8) -> Self {
        self.variant_count = variant_count.clamp(MIN_VARIANTS, MAX_VARIANTS);
        self
    }

    pub fn creativity(&self) -> f64 {
        self.creativity
    }

    pub fn variant_count(&self) -> u8 {
        self.variant_count
    }

    /// Whether the prompt has any non-whitespace content.
    pub fn is_submittable(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    pub fn to_body(&self) -> GenerateRequestBody {
        GenerateRequestBody {
            prompt: self.prompt.clone(),
            tone: self.tone,
            sentiment: self.sentiment,
            length: self.length,
            creativity: self.creativity,
            variants: self.variant_count,
        }
    }
}

/// JSON body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequestBody {
    pub prompt: String,
    pub tone: Tone,
    pub sentiment: Sentiment,
    pub length: Length,
    pub creativity: f64,
    pub variants: u8,
}

/// Extracts `outputs` from a generation response. A missing or non-array
/// `outputs` yields an empty list; non-string entries are skipped.
pub fn generated_outputs(body: &Value) -> Vec<String> {
    body.get("outputs")
        .and_then(Value::as_array)
        .map(|outputs| {
            outputs
                .iter()
                .filter_map(|output| output.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// One previously generated item returned by `GET /api/recent`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LibraryItem {
    /// Lenient conversion from one element of the listing array. Fields of
    /// the wrong type are treated as absent.
    pub fn from_value(value: &Value) -> Self {
        let id = match value.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        let prompt = value
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let created_at = value
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        Self {
            id,
            prompt,
            created_at,
        }
    }

    /// Converts a listing response. Anything other than an array is an
    /// empty listing.
    pub fn list_from_value(body: &Value) -> Vec<Self> {
        body.as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Ordering timestamp in milliseconds; a missing timestamp counts as
    /// the epoch.
    pub fn sort_millis(&self) -> i64 {
        self.created_at
            .map(|created_at| created_at.timestamp_millis())
            .unwrap_or(0)
    }

    pub fn title(&self) -> &str {
        if self.prompt.is_empty() {
            "Untitled"
        } else {
            &self.prompt
        }
    }

    pub fn meta(&self) -> String {
        match self.created_at {
            Some(created_at) => created_at.format("%Y-%m-%d %H:%M").to_string(),
            None => "Recent".to_string(),
        }
    }

    /// Render identity: the server id when present, else prompt plus position.
    pub fn key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}{index}", self.prompt),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Minute precision with a numeric offset, e.g. 2024-03-01T12:30+02:00.
    if let Some(parsed) = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"]
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    // A trailing `Z` or no offset at all both mean UTC.
    let local = raw
        .strip_suffix('Z')
        .or_else(|| raw.strip_suffix('z'))
        .unwrap_or(raw);
    let naive = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(local, format).ok());
    if let Some(naive) = naive {
        return Some(naive.and_utc());
    }
    // Date-only values are midnight UTC.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
