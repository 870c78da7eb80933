use crate::catalog::{
    ExchangeTier, Tier, GEMS_BASE_PER_DOLLAR, SPIN_FEE_PERCENTAGE, TP_PER_DOLLAR_RAKE,
    resolve_goal, resolve_tier,
};
use crate::models::{Session, UserSettings};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// The slice of time a stats pass covers: one month, or the whole year that
/// month belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    month: String,
    year_view: bool,
}

impl Period {
    /// Accepts `YYYY-MM` for a real calendar month.
    pub fn parse(month: &str, year_view: bool) -> Option<Self> {
        let month = month.trim();
        if month.len() != 7 {
            return None;
        }
        NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()?;
        Some(Self {
            month: month.to_string(),
            year_view,
        })
    }

    pub fn current(year_view: bool) -> Self {
        Self::containing(Local::now().date_naive(), year_view)
    }

    pub fn containing(date: NaiveDate, year_view: bool) -> Self {
        Self {
            month: month_key(date),
            year_view,
        }
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn year(&self) -> &str {
        &self.month[..4]
    }

    pub fn is_year_view(&self) -> bool {
        self.year_view
    }

    fn prefix(&self) -> &str {
        if self.year_view { self.year() } else { self.month.as_str() }
    }

    pub fn contains(&self, session: &Session) -> bool {
        session.date.starts_with(self.prefix())
    }
}

/// Everything derived from a single session under the active tier and goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub gross_rake: f64,
    pub rake_at_skill: f64,
    pub tide_points: f64,
    pub gems: f64,
    pub gem_value: f64,
    pub total_rakeback: f64,
    pub ocean_rb_percent: f64,
    pub mining_rb_percent: f64,
    pub leaderboard_rb_percent: f64,
}

pub fn session_metrics(session: &Session, multiplier: f64, exchange_rate: f64) -> SessionMetrics {
    let gross_rake = gross_rake(session.buy_in, session.games_count);
    let rake_at_skill = gross_rake * session.pvi;
    let tide_points = rake_at_skill * TP_PER_DOLLAR_RAKE;
    let gems = rake_at_skill * GEMS_BASE_PER_DOLLAR * multiplier;
    let gem_value = gems * exchange_rate;

    SessionMetrics {
        gross_rake,
        rake_at_skill,
        tide_points,
        gems,
        gem_value,
        total_rakeback: gem_value + session.mining_prize + session.leaderboard_prize,
        ocean_rb_percent: percent_of(gem_value, gross_rake),
        mining_rb_percent: percent_of(session.mining_prize, gross_rake),
        leaderboard_rb_percent: percent_of(session.leaderboard_prize, gross_rake),
    }
}

pub fn gross_rake(buy_in: f64, games: u64) -> f64 {
    buy_in * games as f64 * SPIN_FEE_PERCENTAGE
}

/// Inverse of the tide-points formula: the PVI that would have produced
/// `observed_tp` points. `None` when the session has no theoretical rake.
pub fn solve_pvi(observed_tp: f64, buy_in: f64, games: u64) -> Option<f64> {
    let theoretical_tp = theoretical_tide_points(buy_in, games);
    if theoretical_tp > 0.0 && observed_tp.is_finite() {
        Some(observed_tp / theoretical_tp)
    } else {
        None
    }
}

pub fn theoretical_tide_points(buy_in: f64, games: u64) -> f64 {
    gross_rake(buy_in, games) * TP_PER_DOLLAR_RAKE
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRow {
    #[serde(flatten)]
    pub session: Session,
    pub metrics: SessionMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: String,
    pub games: u64,
    pub rake: f64,
    pub tide_points: f64,
    pub gem_value: f64,
    pub mining: f64,
    pub leaderboard: f64,
    pub total_rakeback: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StakeRow {
    pub stake: String,
    pub buy_in: f64,
    pub count: u64,
    pub rake: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub month: String,
    pub year: String,
    pub year_view: bool,
    pub sessions: Vec<SessionRow>,
    pub months_breakdown: Vec<MonthRow>,
    pub stakes_breakdown: Vec<StakeRow>,
    pub total_games: u64,
    pub total_rake_gross: f64,
    pub total_rake_pvi: f64,
    pub total_tide_points: f64,
    pub total_gems: f64,
    pub total_gem_value: f64,
    pub total_mining: f64,
    pub total_leaderboard: f64,
    pub total_rakeback: f64,
    pub effective_rb_percent: f64,
    pub ocean_rb_percent: f64,
    pub mining_rb_percent: f64,
    pub leaderboard_rb_percent: f64,
    pub avg_pvi: f64,
    pub current_tier: &'static Tier,
    pub exchange_goal: &'static ExchangeTier,
    pub gem_exchange_rate: f64,
}

pub fn build_stats(sessions: &[Session], settings: &UserSettings, period: &Period) -> StatsResponse {
    let current_tier = resolve_tier(&settings.ocean_rank);
    let exchange_goal = resolve_goal(settings.exchange_goal_index);
    let gem_exchange_rate = exchange_goal.rate();

    let mut rows = Vec::new();
    let mut stakes: BTreeMap<String, StakeRow> = BTreeMap::new();
    let mut months: BTreeMap<String, MonthRow> = BTreeMap::new();

    let mut total_games = 0u64;
    let mut total_rake_gross = 0.0;
    let mut total_rake_pvi = 0.0;
    let mut total_tide_points = 0.0;
    let mut total_gems = 0.0;
    let mut total_gem_value = 0.0;
    let mut total_mining = 0.0;
    let mut total_leaderboard = 0.0;
    let mut weighted_pvi_sum = 0.0;

    for session in sessions.iter().filter(|session| period.contains(session)) {
        let metrics = session_metrics(session, current_tier.multiplier, gem_exchange_rate);
        let games = session.games_count;

        total_games = total_games.saturating_add(games);
        total_rake_gross += metrics.gross_rake;
        total_rake_pvi += metrics.rake_at_skill;
        total_tide_points += metrics.tide_points;
        total_gems += metrics.gems;
        total_gem_value += metrics.gem_value;
        total_mining += session.mining_prize;
        total_leaderboard += session.leaderboard_prize;
        weighted_pvi_sum += session.pvi * games as f64;

        let stake_key = session.buy_in.to_string();
        let stake = stakes.entry(stake_key.clone()).or_insert_with(|| StakeRow {
            stake: stake_key,
            buy_in: session.buy_in,
            ..StakeRow::default()
        });
        stake.count = stake.count.saturating_add(games);
        stake.rake += metrics.gross_rake;

        if period.is_year_view() {
            let month_key = session.date.get(..7).unwrap_or(session.date.as_str()).to_string();
            let month = months.entry(month_key.clone()).or_insert_with(|| MonthRow {
                month: month_key,
                ..MonthRow::default()
            });
            month.games = month.games.saturating_add(games);
            month.rake += metrics.gross_rake;
            month.tide_points += metrics.tide_points;
            month.gem_value += metrics.gem_value;
            month.mining += session.mining_prize;
            month.leaderboard += session.leaderboard_prize;
            month.total_rakeback += metrics.total_rakeback;
        }

        rows.push(SessionRow {
            session: session.clone(),
            metrics,
        });
    }

    let total_rakeback = total_gem_value + total_leaderboard + total_mining;
    let avg_pvi = if total_games > 0 {
        weighted_pvi_sum / total_games as f64
    } else {
        settings.default_pvi
    };

    let mut stakes_breakdown: Vec<StakeRow> = stakes.into_values().collect();
    stakes_breakdown.sort_by(|a, b| a.buy_in.total_cmp(&b.buy_in));

    StatsResponse {
        month: period.month().to_string(),
        year: period.year().to_string(),
        year_view: period.is_year_view(),
        sessions: rows,
        months_breakdown: months.into_values().rev().collect(),
        stakes_breakdown,
        total_games,
        total_rake_gross,
        total_rake_pvi,
        total_tide_points,
        total_gems,
        total_gem_value,
        total_mining,
        total_leaderboard,
        total_rakeback,
        effective_rb_percent: percent_of(total_rakeback, total_rake_gross),
        ocean_rb_percent: percent_of(total_gem_value, total_rake_gross),
        mining_rb_percent: percent_of(total_mining, total_rake_gross),
        leaderboard_rb_percent: percent_of(total_leaderboard, total_rake_gross),
        avg_pvi,
        current_tier,
        exchange_goal,
        gem_exchange_rate,
    }
}

/// Months with at least one session plus the current month, newest first.
pub fn available_months(sessions: &[Session]) -> Vec<String> {
    available_months_at(Local::now().date_naive(), sessions)
}

pub fn available_months_at(today: NaiveDate, sessions: &[Session]) -> Vec<String> {
    let mut months: Vec<String> = sessions
        .iter()
        .filter_map(|session| session.date.get(..7))
        .map(str::to_string)
        .collect();
    months.push(month_key(today));
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    months
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
