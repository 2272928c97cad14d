//! Structured itineraries
//!
//! The planner asks the model for JSON in the shape of [`Itinerary`]. Models
//! are loose with numbers and dates, so amounts and calendar dates are
//! parsed leniently; anything unparseable becomes `None` rather than an
//! error.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use voyage_common::{Result, VoyageError, extract_json_object};

/// When the trip happens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelDates {
    #[serde(default, deserialize_with = "lenient_date")]
    pub start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end: Option<NaiveDate>,
    /// Human description, e.g. "5 days in April"
    #[serde(default)]
    pub description: String,
}

impl TravelDates {
    /// Best human-readable form
    pub fn describe(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => format!("{} to {}", start.format("%B %-d, %Y"), end.format("%B %-d, %Y")),
            (Some(start), None) => format!("from {}", start.format("%B %-d, %Y")),
            _ if !self.description.trim().is_empty() => self.description.trim().to_string(),
            _ => "dates to be decided".to_string(),
        }
    }

    /// Inclusive number of days when both ends are known
    pub fn num_days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end >= start => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

/// A single scheduled entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    pub description: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub estimated_cost: Option<f64>,
}

/// One day of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl DayPlan {
    pub fn estimated_cost(&self) -> f64 {
        self.activities.iter().filter_map(|a| a.estimated_cost).sum()
    }
}

/// One line of the budget breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

/// Overall budget estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEstimate {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub breakdown: Vec<BudgetLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for BudgetEstimate {
    fn default() -> Self {
        Self {
            total: None,
            currency: default_currency(),
            breakdown: Vec::new(),
            notes: None,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A day-by-day travel plan, replaced wholesale on every planning pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub dates: TravelDates,
    #[serde(default)]
    pub overview: Option<String>,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub budget: BudgetEstimate,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Itinerary {
    /// Parse a planner reply; fails when no usable itinerary is present
    pub fn from_llm_reply(reply: &str) -> Result<Self> {
        let json = extract_json_object(reply)
            .ok_or_else(|| VoyageError::upstream("planner", "reply did not contain an itinerary object"))?;
        let mut itinerary: Itinerary = serde_json::from_str(json)
            .map_err(|e| VoyageError::upstream("planner", format!("malformed itinerary: {}", e)))?;

        if itinerary.days.is_empty() {
            return Err(VoyageError::upstream("planner", "itinerary has no days"));
        }
        itinerary.days.sort_by_key(|d| d.day);
        Ok(itinerary)
    }

    /// Fill in a missing destination or dates from what the user asked for
    pub fn with_defaults(mut self, destination: Option<&str>, dates: Option<&str>) -> Self {
        if self.destination.trim().is_empty() {
            if let Some(destination) = destination {
                self.destination = destination.to_string();
            }
        }
        if self.dates.start.is_none() && self.dates.description.trim().is_empty() {
            if let Some(dates) = dates {
                self.dates.description = dates.to_string();
            }
        }
        self
    }

    pub fn num_days(&self) -> usize {
        self.days.len()
    }

    /// Stated total, or the sum of activity costs when the model gave none
    pub fn estimated_total(&self) -> Option<f64> {
        self.budget.total.or_else(|| {
            let sum: f64 = self.days.iter().map(DayPlan::estimated_cost).sum();
            (sum > 0.0).then_some(sum)
        })
    }

    /// Compact JSON for feeding back into prompts
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Markdown rendering with one section per day
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("## Your trip to {}\n\n", self.destination));
        out.push_str(&format!("**Dates:** {}", self.dates.describe()));
        out.push_str(&format!(" ({} days)\n\n", self.num_days()));

        if let Some(overview) = self.overview.as_deref().filter(|o| !o.trim().is_empty()) {
            out.push_str(overview.trim());
            out.push_str("\n\n");
        }

        for day in &self.days {
            match day.title.as_deref().filter(|t| !t.trim().is_empty()) {
                Some(title) => out.push_str(&format!("### Day {}: {}\n", day.day, title.trim())),
                None => out.push_str(&format!("### Day {}\n", day.day)),
            }
            for activity in &day.activities {
                let time = if activity.time.trim().is_empty() {
                    String::new()
                } else {
                    format!("**{}** ", activity.time.trim())
                };
                let cost = activity
                    .estimated_cost
                    .map(|c| format!(" (~{} {})", format_amount(c), self.budget.currency))
                    .unwrap_or_default();
                out.push_str(&format!("- {}{}{}\n", time, activity.description.trim(), cost));
            }
            out.push('\n');
        }

        out.push_str("### Budget estimate\n");
        match self.estimated_total() {
            Some(total) => out.push_str(&format!("**Total:** ~{} {}\n", format_amount(total), self.budget.currency)),
            None => out.push_str("**Total:** not estimated\n"),
        }
        for line in &self.budget.breakdown {
            let amount = line
                .amount
                .map(|a| format!("{} {}", format_amount(a), self.budget.currency))
                .unwrap_or_else(|| "n/a".to_string());
            out.push_str(&format!("- {}: {}\n", line.category, amount));
        }
        if let Some(notes) = self.budget.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            out.push_str(&format!("\n{}\n", notes.trim()));
        }

        if !self.tips.is_empty() {
            out.push_str("\n### Tips\n");
            for tip in &self.tips {
                out.push_str(&format!("- {}\n", tip.trim()));
            }
        }

        out.trim_end().to_string()
    }
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

/// Accepts numbers, numeric strings ("$1,200", "25 EUR") or null.
/// A range such as "$20-30" yields its lower bound.
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => first_amount(&s),
        _ => None,
    })
}

/// First number in `text`; commas inside it are thousands separators
fn first_amount(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse::<f64>().ok()
}

/// Accepts `YYYY-MM-DD` strings; anything else becomes `None`
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// An n-day itinerary for `destination` with two activities a day
    pub fn sample_itinerary(destination: &str, days: u32) -> Itinerary {
        Itinerary {
            destination: destination.to_string(),
            dates: TravelDates {
                start: None,
                end: None,
                description: "April".to_string(),
            },
            overview: Some(format!("{} days exploring {}.", days, destination)),
            days: (1..=days)
                .map(|day| DayPlan {
                    day,
                    title: Some(format!("Exploring {} day {}", destination, day)),
                    activities: vec![
                        Activity {
                            time: "09:00".to_string(),
                            description: "Museum visit".to_string(),
                            estimated_cost: Some(20.0),
                        },
                        Activity {
                            time: "19:00".to_string(),
                            description: "Dinner at a local bistro".to_string(),
                            estimated_cost: Some(45.5),
                        },
                    ],
                })
                .collect(),
            budget: BudgetEstimate {
                total: Some(1500.0),
                ..BudgetEstimate::default()
            },
            tips: vec!["Buy a metro pass".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_itinerary;
    use super::*;

    const REPLY: &str = r#"Here is your plan:
```json
{
  "destination": "Paris",
  "dates": {"start": "2027-04-10", "end": "2027-04-12", "description": "3 days in April"},
  "days": [
    {"day": 2, "activities": [{"time": "10:00", "description": "Louvre", "estimated_cost": "$22"}]},
    {"day": 1, "title": "Arrival", "activities": [{"time": "15:00", "description": "Check in", "estimated_cost": null}]},
    {"day": 3, "activities": []}
  ],
  "budget": {"total": 1200, "currency": "EUR", "breakdown": [{"category": "Hotel", "amount": "600"}]}
}
```"#;

    #[test]
    fn test_parse_fenced_reply() {
        let itinerary = Itinerary::from_llm_reply(REPLY).unwrap();
        assert_eq!(itinerary.destination, "Paris");
        assert_eq!(itinerary.num_days(), 3);
        assert_eq!(itinerary.days[0].day, 1);
        assert_eq!(itinerary.days[1].activities[0].estimated_cost, Some(22.0));
        assert_eq!(itinerary.budget.currency, "EUR");
        assert_eq!(itinerary.budget.breakdown[0].amount, Some(600.0));
        assert_eq!(itinerary.dates.num_days(), Some(3));
    }

    #[test]
    fn test_parse_rejects_missing_days() {
        let err = Itinerary::from_llm_reply(r#"{"destination": "Rome", "days": []}"#).unwrap_err();
        assert!(err.is_upstream());
        assert!(Itinerary::from_llm_reply("I could not plan that").unwrap_err().is_upstream());
    }

    #[test]
    fn test_lenient_dates() {
        let itinerary =
            Itinerary::from_llm_reply(r#"{"dates": {"start": "next spring", "description": "spring"}, "days": [{"day": 1}]}"#)
                .unwrap();
        assert_eq!(itinerary.dates.start, None);
        assert_eq!(itinerary.dates.describe(), "spring");
    }

    #[test]
    fn test_with_defaults_fills_gaps() {
        let itinerary = Itinerary::from_llm_reply(r#"{"days": [{"day": 1}]}"#)
            .unwrap()
            .with_defaults(Some("Lisbon"), Some("May 2027"));
        assert_eq!(itinerary.destination, "Lisbon");
        assert_eq!(itinerary.dates.describe(), "May 2027");
    }

    #[test]
    fn test_markdown_has_one_section_per_day() {
        let markdown = sample_itinerary("Paris", 5).to_markdown();
        for day in 1..=5 {
            assert!(markdown.contains(&format!("### Day {}:", day)));
        }
        assert!(markdown.contains("Paris"));
        assert!(markdown.contains("**09:00** Museum visit (~20 USD)"));
        assert!(markdown.contains("(~45.50 USD)"));
        assert!(markdown.contains("**Total:** ~1500 USD"));
    }

    #[test]
    fn test_estimated_total_falls_back_to_activity_sum() {
        let mut itinerary = sample_itinerary("Rome", 2);
        itinerary.budget.total = None;
        assert_eq!(itinerary.estimated_total(), Some(131.0));
    }

    #[test]
    fn test_cost_ranges_use_lower_bound() {
        let reply = r#"{"destination": "Rome", "days": [{"day": 1, "activities": [
            {"time": "10:00", "description": "Colosseum", "estimated_cost": "$20-30"},
            {"time": "13:00", "description": "Lunch", "estimated_cost": "25 - 30 EUR"}
        ]}], "budget": {"total": "$1,200.50 per person"}}"#;
        let itinerary = Itinerary::from_llm_reply(reply).unwrap();
        let costs: Vec<_> = itinerary.days[0].activities.iter().map(|a| a.estimated_cost).collect();
        assert_eq!(costs, vec![Some(20.0), Some(25.0)]);
        assert_eq!(itinerary.budget.total, Some(1200.5));

        let mut itinerary = itinerary;
        itinerary.budget.total = None;
        assert_eq!(itinerary.estimated_total(), Some(45.0));
        assert!(itinerary.to_markdown().contains("(~20 USD)"));
    }

    #[test]
    fn test_describe_full_range() {
        let dates = TravelDates {
            start: NaiveDate::from_ymd_opt(2027, 4, 10),
            end: NaiveDate::from_ymd_opt(2027, 4, 14),
            description: String::new(),
        };
        assert_eq!(dates.describe(), "April 10, 2027 to April 14, 2027");
        assert_eq!(dates.num_days(), Some(5));
    }
}
