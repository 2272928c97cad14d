//! Intent classification results
//!
//! The classifier's schema is advisory: unknown tags fall back to
//! [`IntentKind::Unclear`] and malformed fields are dropped, so parsing a
//! classifier reply never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use voyage_common::extract_json_object;

/// Purpose of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    NewTrip,
    ModifyTrip,
    AskQuestion,
    Confirm,
    Reject,
    Unclear,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::NewTrip,
        IntentKind::ModifyTrip,
        IntentKind::AskQuestion,
        IntentKind::Confirm,
        IntentKind::Reject,
        IntentKind::Unclear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::NewTrip => "new_trip",
            IntentKind::ModifyTrip => "modify_trip",
            IntentKind::AskQuestion => "ask_question",
            IntentKind::Confirm => "confirm",
            IntentKind::Reject => "reject",
            IntentKind::Unclear => "unclear",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = std::convert::Infallible;

    /// Never fails; unknown tags are `Unclear`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "new_trip" => IntentKind::NewTrip,
            // older classifier prompts emit provide_feedback for plan feedback
            "modify_trip" | "provide_feedback" => IntentKind::ModifyTrip,
            "ask_question" => IntentKind::AskQuestion,
            "confirm" => IntentKind::Confirm,
            "reject" => IntentKind::Reject,
            _ => IntentKind::Unclear,
        })
    }
}

/// Something a trip request still needs before planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Destination,
    TravelDates,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Destination => f.write_str("destination"),
            MissingField::TravelDates => f.write_str("travel dates"),
        }
    }
}

/// Classified intent plus whatever trip details the classifier extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub kind: IntentKind,
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub dates: Option<String>,
    pub budget: Option<String>,
    pub preferences: Vec<String>,
    pub questions: Vec<String>,
    pub feedback: Option<String>,
}

impl IntentResult {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            destination: None,
            origin: None,
            dates: None,
            budget: None,
            preferences: Vec::new(),
            questions: Vec::new(),
            feedback: None,
        }
    }

    pub fn unclear() -> Self {
        Self::new(IntentKind::Unclear)
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_dates(mut self, dates: impl Into<String>) -> Self {
        self.dates = Some(dates.into());
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Whether the message carried any detail a pending trip request can use
    pub fn provides_trip_details(&self) -> bool {
        self.destination.is_some() || self.dates.is_some() || self.origin.is_some() || self.budget.is_some()
    }

    /// Parse a classifier reply, degrading to `Unclear` on malformed output
    pub fn from_llm_reply(reply: &str) -> Self {
        let Some(json) = extract_json_object(reply) else {
            return Self::unclear();
        };
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(json) else {
            return Self::unclear();
        };

        let kind = map
            .get("intent")
            .and_then(Value::as_str)
            .map(|s| s.parse().unwrap_or(IntentKind::Unclear))
            .unwrap_or(IntentKind::Unclear);

        Self {
            kind,
            destination: text_field(map.get("destination")),
            origin: text_field(map.get("origin")),
            dates: text_field(map.get("dates")),
            budget: text_field(map.get("budget")),
            preferences: list_field(map.get("preferences")),
            questions: list_field(map.get("questions")),
            feedback: text_field(map.get("feedback")),
        }
    }
}

/// Strings pass through, numbers and objects are rendered, blanks are dropped
fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(_) => return None,
        other => other.to_string(),
    };
    let lowered = text.to_ascii_lowercase();
    if text.is_empty() || lowered == "null" || lowered == "none" || lowered == "n/a" {
        None
    } else {
        Some(text)
    }
}

fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| text_field(Some(v))).collect(),
        Some(other) => text_field(Some(other)).into_iter().collect(),
        None => Vec::new(),
    }
}
