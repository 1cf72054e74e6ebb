use serde::Serialize;

/// Month at which the tariff shock fires (two years in).
pub const TARIFF_EVENT_MONTH: u32 = 24;
/// Month at which the extreme-event shock fires (three years in).
pub const EXTREME_EVENT_MONTH: u32 = 36;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn tariff_drop_percent(self) -> f64 {
        match self {
            Severity::Low => 5.0,
            Severity::Medium => 10.0,
            Severity::High => 15.0,
        }
    }

    pub fn extreme_drop_percent(self) -> f64 {
        match self {
            Severity::Low => 15.0,
            Severity::Medium => 25.0,
            Severity::High => 35.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShockKind {
    Tariff,
    Extreme,
    Custom(String),
}

impl ShockKind {
    pub fn label(&self) -> &str {
        match self {
            ShockKind::Tariff => "Tariff Event",
            ShockKind::Extreme => "Extreme Event",
            ShockKind::Custom(label) => label,
        }
    }
}

/// One-time percentage reduction of the fund value at a given month.
#[derive(Clone, Debug, PartialEq)]
pub struct ShockEvent {
    pub kind: ShockKind,
    pub enabled: bool,
    pub drop_percent: f64,
    pub at_month: u32,
}

impl ShockEvent {
    pub fn tariff(drop_percent: f64) -> Self {
        Self {
            kind: ShockKind::Tariff,
            enabled: true,
            drop_percent,
            at_month: TARIFF_EVENT_MONTH,
        }
    }

    pub fn extreme(drop_percent: f64) -> Self {
        Self {
            kind: ShockKind::Extreme,
            enabled: true,
            drop_percent,
            at_month: EXTREME_EVENT_MONTH,
        }
    }

    pub fn custom(label: impl Into<String>, at_month: u32, drop_percent: f64) -> Self {
        Self {
            kind: ShockKind::Custom(label.into()),
            enabled: true,
            drop_percent,
            at_month,
        }
    }

    pub(crate) fn retained_fraction(&self) -> f64 {
        1.0 - self.drop_percent / 100.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    pub horizon_months: u32,
    pub monthly_deposit: f64,
    pub annual_rate_percent: f64,
    pub shocks: Vec<ShockEvent>,
}

impl SimulationParameters {
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / 12.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month: u32,
    pub cumulative_deposits: f64,
    pub fund_value: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_deposits: f64,
    pub final_value: f64,
    pub total_growth: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShockOutcome {
    pub label: String,
    pub month: u32,
    pub drop_percent: f64,
    pub fired: bool,
}
