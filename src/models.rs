use crate::catalog::{DEFAULT_GOAL_INDEX, DEFAULT_PVI, DEFAULT_TIER_INDEX, TIERS};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const GUEST_USER: &str = "local_guest";

/// A logged block of spins at one buy-in on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: String,
    pub date: String,
    #[serde(alias = "buyIn", deserialize_with = "lenient::buy_in")]
    pub buy_in: f64,
    #[serde(default, alias = "gamesCount", deserialize_with = "lenient::games")]
    pub games_count: u64,
    #[serde(default = "default_pvi", deserialize_with = "lenient::pvi")]
    pub pvi: f64,
    #[serde(default, alias = "leaderboardPrize", deserialize_with = "lenient::prize")]
    pub leaderboard_prize: f64,
    #[serde(default, alias = "miningPrize", deserialize_with = "lenient::prize")]
    pub mining_prize: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_rank", alias = "oceanRank")]
    pub ocean_rank: String,
    #[serde(default = "default_pvi", alias = "defaultPVI", deserialize_with = "lenient::pvi")]
    pub default_pvi: f64,
    #[serde(
        default = "default_goal_index",
        alias = "exchangeGoalIndex",
        deserialize_with = "lenient::goal_index"
    )]
    pub exchange_goal_index: i64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            ocean_rank: default_rank(),
            default_pvi: DEFAULT_PVI,
            exchange_goal_index: default_goal_index(),
        }
    }
}

fn default_rank() -> String {
    TIERS[DEFAULT_TIER_INDEX].id.to_string()
}

fn default_pvi() -> f64 {
    DEFAULT_PVI
}

fn default_goal_index() -> i64 {
    DEFAULT_GOAL_INDEX as i64
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserData {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub settings: UserSettings,
}

/// The persisted document: every user's data keyed by user id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<String, UserData>,
}

/// Body of session create and update requests. Numeric fields go through the
/// same lenient parsing as stored records, so form strings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInput {
    pub date: String,
    #[serde(alias = "buyIn", deserialize_with = "lenient::buy_in")]
    pub buy_in: f64,
    #[serde(default, alias = "gamesCount", deserialize_with = "lenient::games")]
    pub games_count: u64,
    #[serde(default = "default_pvi", deserialize_with = "lenient::pvi")]
    pub pvi: f64,
    #[serde(default, alias = "leaderboardPrize", deserialize_with = "lenient::prize")]
    pub leaderboard_prize: f64,
    #[serde(default, alias = "miningPrize", deserialize_with = "lenient::prize")]
    pub mining_prize: f64,
    #[serde(default)]
    pub notes: String,
}

impl SessionInput {
    pub fn into_session(self, id: String) -> Session {
        Session {
            id,
            date: self.date.trim().to_string(),
            buy_in: self.buy_in,
            games_count: self.games_count,
            pvi: self.pvi,
            leaderboard_prize: self.leaderboard_prize,
            mining_prize: self.mining_prize,
            notes: self.notes.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub settings: Option<UserSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: usize,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub month: Option<String>,
    pub view: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PviQuery {
    pub buy_in: f64,
    pub games: u64,
    pub tide_points: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PviResponse {
    pub pvi: Option<f64>,
    pub pvi_rounded: Option<f64>,
    pub theoretical_tp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthsResponse {
    pub months: Vec<String>,
}

/// Parsing for fields that may arrive as a number or as form text.
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn read<'de, D>(deserializer: D) -> Result<Option<NumberOrText>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<NumberOrText>::deserialize(deserializer)
    }

    fn number(raw: Option<NumberOrText>) -> Option<f64> {
        let value = match raw? {
            NumberOrText::Number(value) => value,
            NumberOrText::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        Some(value).filter(|value| value.is_finite())
    }

    fn parse<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(read(deserializer)?))
    }

    pub fn buy_in<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(parse(deserializer)?.unwrap_or(0.0))
    }

    pub fn games<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(parse(deserializer)?
            .filter(|value| *value >= 0.0)
            .map(|value| value.trunc() as u64)
            .unwrap_or(0))
    }

    /// A numeric zero counts as unset; text "0" is kept.
    pub fn pvi<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = read(deserializer)?;
        if matches!(raw, Some(NumberOrText::Number(value)) if value == 0.0) {
            return Ok(DEFAULT_PVI);
        }
        Ok(number(raw).unwrap_or(DEFAULT_PVI))
    }

    pub fn prize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(parse(deserializer)?.unwrap_or(0.0))
    }

    pub fn goal_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(parse(deserializer)?
            .filter(|value| value.fract() == 0.0)
            .map(|value| value as i64)
            .unwrap_or(DEFAULT_GOAL_INDEX as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_accepts_legacy_camel_case_strings() {
        let session: Session = serde_json::from_value(json!({
            "id": "1700000000000",
            "date": "2024-03-15",
            "buyIn": 5,
            "gamesCount": "120",
            "pvi": "0.75",
            "leaderboardPrize": "12.5",
            "miningPrize": 3,
            "notes": "good day"
        }))
        .unwrap();

        assert_eq!(session.buy_in, 5.0);
        assert_eq!(session.games_count, 120);
        assert_eq!(session.pvi, 0.75);
        assert_eq!(session.leaderboard_prize, 12.5);
        assert_eq!(session.mining_prize, 3.0);
    }

    #[test]
    fn session_falls_back_on_missing_and_garbage() {
        let session: Session = serde_json::from_value(json!({
            "date": "2024-03-15",
            "buy_in": 1,
            "games_count": "",
            "pvi": "abc",
            "mining_prize": null
        }))
        .unwrap();

        assert_eq!(session.id, "");
        assert_eq!(session.games_count, 0);
        assert_eq!(session.pvi, DEFAULT_PVI);
        assert_eq!(session.leaderboard_prize, 0.0);
        assert_eq!(session.mining_prize, 0.0);
    }

    #[test]
    fn games_truncate_and_reject_negative() {
        let session: Session = serde_json::from_value(json!({
            "date": "2024-03-15", "buy_in": 1, "games_count": "12.9"
        }))
        .unwrap();
        assert_eq!(session.games_count, 12);

        let session: Session = serde_json::from_value(json!({
            "date": "2024-03-15", "buy_in": 1, "games_count": -4
        }))
        .unwrap();
        assert_eq!(session.games_count, 0);
    }

    #[test]
    fn numeric_zero_pvi_means_unset() {
        let session: Session = serde_json::from_value(json!({
            "date": "2024-03-15", "buyIn": 5, "gamesCount": 100, "pvi": 0
        }))
        .unwrap();
        assert_eq!(session.pvi, DEFAULT_PVI);
        let metrics = crate::stats::session_metrics(&session, 3.0, 0.001);
        assert!((metrics.tide_points - 1750.0).abs() < 1e-9);

        let settings: UserSettings = serde_json::from_value(json!({ "defaultPVI": 0 })).unwrap();
        assert_eq!(settings.default_pvi, DEFAULT_PVI);

        let session: Session = serde_json::from_value(json!({
            "date": "2024-03-15", "buyIn": 5, "gamesCount": 100, "pvi": "0"
        }))
        .unwrap();
        assert_eq!(session.pvi, 0.0);
    }

    #[test]
    fn settings_default_when_fields_absent() {
        let settings: UserSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, UserSettings::default());
        assert_eq!(settings.ocean_rank, "turtle");
        assert_eq!(settings.exchange_goal_index, 4);
    }

    #[test]
    fn settings_accept_legacy_shape() {
        let settings: UserSettings = serde_json::from_value(json!({
            "oceanRank": "whale",
            "defaultPVI": "0.8",
            "exchangeGoalIndex": "seven"
        }))
        .unwrap();
        assert_eq!(settings.ocean_rank, "whale");
        assert_eq!(settings.default_pvi, 0.8);
        assert_eq!(settings.exchange_goal_index, 4);
    }
}
