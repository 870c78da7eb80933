use serde::Serialize;

pub const SPIN_FEE_PERCENTAGE: f64 = 0.07;
pub const TP_PER_DOLLAR_RAKE: f64 = 100.0;
pub const GEMS_BASE_PER_DOLLAR: f64 = 100.0;

pub const DEFAULT_TIER_INDEX: usize = 4;
pub const DEFAULT_GOAL_INDEX: usize = 4;
pub const DEFAULT_PVI: f64 = 0.5;

pub const MIN_PVI: f64 = 0.1;
pub const MAX_PVI: f64 = 2.0;

/// Buy-ins offered by the session form, ascending.
pub static STAKES: [f64; 9] = [0.25, 1.0, 3.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0];

/// Ocean rank. Higher ranks earn more gems per dollar of rake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tier {
    pub id: &'static str,
    pub name: &'static str,
    pub label_percent: &'static str,
    pub multiplier: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExchangeTier {
    pub cash: f64,
    pub gems: f64,
}

impl ExchangeTier {
    /// Cash value of a single gem at this redemption tier.
    pub fn rate(&self) -> f64 {
        self.cash / self.gems
    }
}

const fn tier(
    id: &'static str,
    name: &'static str,
    label_percent: &'static str,
    multiplier: f64,
    color: &'static str,
) -> Tier {
    Tier {
        id,
        name,
        label_percent,
        multiplier,
        color,
    }
}

pub static TIERS: [Tier; 8] = [
    tier("shark", "Shark", "80", 5.0, "#ef4444"),
    tier("whale", "Whale", "70", 4.5, "#a855f7"),
    tier("dolphin", "Dolphin", "60", 4.0, "#22d3ee"),
    tier("octopus", "Octopus", "50", 3.5, "#34d399"),
    tier("turtle", "Turtle", "40", 3.0, "#22c55e"),
    tier("crab", "Crab", "30", 2.5, "#fb923c"),
    tier("shrimp", "Shrimp", "25", 2.0, "#d97706"),
    tier("fish", "Fish", "16", 1.5, "#93c5fd"),
];

const fn exchange(cash: f64, gems: f64) -> ExchangeTier {
    ExchangeTier { cash, gems }
}

pub static EXCHANGE_TIERS: [ExchangeTier; 14] = [
    exchange(5.0, 5_000.0),
    exchange(10.0, 9_500.0),
    exchange(25.0, 23_000.0),
    exchange(50.0, 45_000.0),
    exchange(100.0, 90_000.0),
    exchange(250.0, 220_000.0),
    exchange(500.0, 420_000.0),
    exchange(1_000.0, 800_000.0),
    exchange(2_500.0, 2_000_000.0),
    exchange(5_000.0, 4_000_000.0),
    exchange(10_000.0, 7_500_000.0),
    exchange(25_000.0, 18_000_000.0),
    exchange(50_000.0, 33_000_000.0),
    exchange(100_000.0, 65_000_000.0),
];

pub fn find_tier(id: &str) -> Option<&'static Tier> {
    TIERS.iter().find(|tier| tier.id == id)
}

/// Falls back to turtle for unknown ids.
pub fn resolve_tier(id: &str) -> &'static Tier {
    find_tier(id).unwrap_or(&TIERS[DEFAULT_TIER_INDEX])
}

pub fn find_goal(index: i64) -> Option<&'static ExchangeTier> {
    usize::try_from(index)
        .ok()
        .and_then(|index| EXCHANGE_TIERS.get(index))
}

pub fn resolve_goal(index: i64) -> &'static ExchangeTier {
    find_goal(index).unwrap_or(&EXCHANGE_TIERS[DEFAULT_GOAL_INDEX])
}

pub fn is_stake(buy_in: f64) -> bool {
    STAKES.iter().any(|stake| *stake == buy_in)
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub tiers: &'static [Tier],
    pub exchange_tiers: &'static [ExchangeTier],
    pub stakes: &'static [f64],
    pub spin_fee_percentage: f64,
    pub tp_per_dollar_rake: f64,
    pub gems_base_per_dollar: f64,
}

pub fn catalog() -> CatalogResponse {
    CatalogResponse {
        tiers: &TIERS,
        exchange_tiers: &EXCHANGE_TIERS,
        stakes: &STAKES,
        spin_fee_percentage: SPIN_FEE_PERCENTAGE,
        tp_per_dollar_rake: TP_PER_DOLLAR_RAKE,
        gems_base_per_dollar: GEMS_BASE_PER_DOLLAR,
    }
}
