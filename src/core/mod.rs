mod engine;
mod types;

pub use engine::{shock_outcomes, simulate, summarize};
pub use types::{
    EXTREME_EVENT_MONTH, MonthlyRecord, ProjectionSummary, Severity, ShockEvent, ShockKind,
    ShockOutcome, SimulationParameters, TARIFF_EVENT_MONTH,
};
