use super::types::{MonthlyRecord, ProjectionSummary, ShockEvent, ShockOutcome, SimulationParameters};

pub fn simulate(params: &SimulationParameters) -> Vec<MonthlyRecord> {
    let monthly_rate = params.monthly_rate();
    let schedule = shock_schedule(&params.shocks);
    let mut pending = schedule.iter().peekable();

    let mut records = Vec::with_capacity(params.horizon_months as usize);
    let mut fund_value = 0.0_f64;
    let mut cumulative_deposits = 0.0_f64;

    for month in 1..=params.horizon_months {
        cumulative_deposits += params.monthly_deposit;
        fund_value = (fund_value + params.monthly_deposit) * (1.0 + monthly_rate);

        while let Some(shock) = pending.next_if(|shock| shock.at_month == month) {
            fund_value *= shock.retained_fraction();
        }

        if fund_value.is_nan() || fund_value <= 0.0 {
            fund_value = 0.0;
        }

        records.push(MonthlyRecord {
            month,
            cumulative_deposits,
            fund_value,
        });
    }

    records
}

pub fn summarize(records: &[MonthlyRecord]) -> Option<ProjectionSummary> {
    let last = records.last()?;
    Some(ProjectionSummary {
        total_deposits: last.cumulative_deposits,
        final_value: last.fund_value,
        total_growth: last.fund_value - last.cumulative_deposits,
    })
}

pub fn shock_outcomes(params: &SimulationParameters) -> Vec<ShockOutcome> {
    shock_schedule(&params.shocks)
        .into_iter()
        .map(|shock| ShockOutcome {
            label: shock.kind.label().to_string(),
            month: shock.at_month,
            drop_percent: shock.drop_percent,
            fired: shock.at_month <= params.horizon_months,
        })
        .collect()
}

/// Enabled shocks in application order: ascending month, configuration order on ties.
fn shock_schedule(shocks: &[ShockEvent]) -> Vec<&ShockEvent> {
    let mut schedule: Vec<&ShockEvent> = shocks
        .iter()
        .filter(|shock| shock.enabled && shock.at_month >= 1)
        .collect();
    schedule.sort_by_key(|shock| shock.at_month);
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EXTREME_EVENT_MONTH, TARIFF_EVENT_MONTH};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn sample_params() -> SimulationParameters {
        SimulationParameters {
            horizon_months: 240,
            monthly_deposit: 500.0,
            annual_rate_percent: 7.0,
            shocks: Vec::new(),
        }
    }

    #[test]
    fn two_month_oracle_matches_hand_computation() {
        let params = SimulationParameters {
            horizon_months: 2,
            monthly_deposit: 100.0,
            annual_rate_percent: 12.0,
            shocks: Vec::new(),
        };
        let records = simulate(&params);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, 1);
        assert_approx(records[0].cumulative_deposits, 100.0);
        assert_approx(records[0].fund_value, 101.0);
        assert_eq!(records[1].month, 2);
        assert_approx(records[1].cumulative_deposits, 200.0);
        assert_approx(records[1].fund_value, 203.01);
    }

    #[test]
    fn tariff_shock_scales_only_its_month() {
        let mut params = sample_params();
        params.horizon_months = 24;
        let baseline = simulate(&params);

        params.shocks.push(ShockEvent::tariff(10.0));
        let shocked = simulate(&params);

        assert_eq!(shocked.len(), 24);
        assert_eq!(shocked[22], baseline[22]);
        assert_approx(shocked[23].fund_value, baseline[23].fund_value * 0.90);
        assert_approx(shocked[23].cumulative_deposits, baseline[23].cumulative_deposits);
    }

    #[test]
    fn shock_beyond_horizon_never_fires() {
        let mut params = sample_params();
        params.horizon_months = 24;
        let baseline = simulate(&params);

        params.shocks.push(ShockEvent::extreme(25.0));
        let with_shock = simulate(&params);

        assert_eq!(with_shock, baseline);
        assert!(with_shock.iter().all(|r| r.month != EXTREME_EVENT_MONTH));
        let outcomes = shock_outcomes(&params);
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].fired);
    }

    #[test]
    fn disabled_shock_is_ignored() {
        let params = sample_params();
        let baseline = simulate(&params);

        let mut disabled = ShockEvent::tariff(50.0);
        disabled.enabled = false;
        let mut with_disabled = params.clone();
        with_disabled.shocks.push(disabled);

        assert_eq!(simulate(&with_disabled), baseline);
        assert!(shock_outcomes(&with_disabled).is_empty());
    }

    #[test]
    fn both_named_shocks_compound_over_later_months() {
        let mut params = sample_params();
        params.horizon_months = 48;
        let baseline = simulate(&params);

        params.shocks = vec![ShockEvent::tariff(10.0), ShockEvent::extreme(25.0)];
        let shocked = simulate(&params);

        let t = TARIFF_EVENT_MONTH as usize - 1;
        let e = EXTREME_EVENT_MONTH as usize - 1;
        assert_approx(shocked[t].fund_value, baseline[t].fund_value * 0.90);
        assert!(shocked[e].fund_value < baseline[e].fund_value * 0.75);
        assert!(shocked[47].fund_value < baseline[47].fund_value);
        assert_approx(shocked[47].cumulative_deposits, baseline[47].cumulative_deposits);
    }

    #[test]
    fn shocks_on_same_month_apply_in_configuration_order() {
        let mut params = sample_params();
        params.horizon_months = 12;
        let baseline = simulate(&params);

        let mut extreme = ShockEvent::extreme(20.0);
        extreme.at_month = 6;
        let mut tariff = ShockEvent::tariff(10.0);
        tariff.at_month = 6;
        params.shocks = vec![extreme, tariff];

        let shocked = simulate(&params);
        assert_approx(shocked[5].fund_value, baseline[5].fund_value * 0.80 * 0.90);

        let outcomes = shock_outcomes(&params);
        assert_eq!(outcomes[0].label, "Extreme Event");
        assert_eq!(outcomes[1].label, "Tariff Event");
    }

    #[test]
    fn shock_schedule_orders_by_month() {
        let mut params = sample_params();
        params.shocks = vec![
            ShockEvent::custom("late", 100, 5.0),
            ShockEvent::extreme(25.0),
            ShockEvent::tariff(10.0),
        ];
        let months: Vec<u32> = shock_outcomes(&params).iter().map(|o| o.month).collect();
        assert_eq!(months, vec![24, 36, 100]);
    }

    #[test]
    fn full_drop_wipes_fund_then_growth_resumes() {
        let mut params = sample_params();
        params.horizon_months = 30;
        params.shocks.push(ShockEvent::tariff(100.0));

        let records = simulate(&params);
        assert_eq!(records[23].fund_value, 0.0);
        assert!(records[24].fund_value > 0.0);
    }

    #[test]
    fn steep_negative_rate_floors_fund_at_zero() {
        let mut params = sample_params();
        params.horizon_months = 3;
        params.annual_rate_percent = -2400.0;

        let records = simulate(&params);
        assert!(records.iter().all(|r| r.fund_value == 0.0));
    }

    #[test]
    fn floored_fund_is_positive_zero() {
        let params = SimulationParameters {
            horizon_months: 2,
            monthly_deposit: 0.0,
            annual_rate_percent: -2400.0,
            shocks: Vec::new(),
        };

        let records = simulate(&params);
        assert!(records.iter().all(|r| r.fund_value == 0.0));
        assert!(records.iter().all(|r| r.fund_value.is_sign_positive()));
        let json = serde_json::to_string(&records[0]).expect("record should serialize");
        assert!(!json.contains("-0.0"), "unexpected negative zero in {json}");
    }

    #[test]
    fn summarize_uses_last_record() {
        let params = SimulationParameters {
            horizon_months: 2,
            monthly_deposit: 100.0,
            annual_rate_percent: 12.0,
            shocks: Vec::new(),
        };
        let summary = summarize(&simulate(&params)).expect("non-empty projection");
        assert_approx(summary.total_deposits, 200.0);
        assert_approx(summary.final_value, 203.01);
        assert_approx(summary.total_growth, 3.01);
    }

    #[test]
    fn summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_length_and_deposits_track_month_index(
            horizon in 1u32..600,
            deposit in 0u32..10_000,
            rate_bp in -2000i32..2000,
        ) {
            let params = SimulationParameters {
                horizon_months: horizon,
                monthly_deposit: deposit as f64,
                annual_rate_percent: rate_bp as f64 / 100.0,
                shocks: vec![ShockEvent::tariff(10.0), ShockEvent::extreme(25.0)],
            };
            let records = simulate(&params);

            prop_assert_eq!(records.len(), horizon as usize);
            let mut previous = 0.0;
            for (idx, record) in records.iter().enumerate() {
                prop_assert_eq!(record.month, idx as u32 + 1);
                prop_assert!(record.cumulative_deposits >= previous);
                let expected = deposit as f64 * record.month as f64;
                prop_assert!((record.cumulative_deposits - expected).abs() <= 1e-6);
                prop_assert!(record.fund_value.is_finite() && record.fund_value >= 0.0);
                previous = record.cumulative_deposits;
            }
        }

        #[test]
        fn prop_zero_deposit_keeps_fund_at_zero(
            horizon in 1u32..600,
            rate_bp in -2000i32..2000,
        ) {
            let params = SimulationParameters {
                horizon_months: horizon,
                monthly_deposit: 0.0,
                annual_rate_percent: rate_bp as f64 / 100.0,
                shocks: vec![ShockEvent::tariff(15.0)],
            };
            prop_assert!(simulate(&params).iter().all(|r| r.fund_value == 0.0));
        }

        #[test]
        fn prop_zero_rate_fund_equals_deposits(
            horizon in 1u32..600,
            deposit in 0u32..10_000,
        ) {
            let params = SimulationParameters {
                horizon_months: horizon,
                monthly_deposit: deposit as f64,
                annual_rate_percent: 0.0,
                shocks: Vec::new(),
            };
            for record in simulate(&params) {
                prop_assert_eq!(record.fund_value, record.cumulative_deposits);
            }
        }

        #[test]
        fn prop_simulate_is_idempotent(
            horizon in 1u32..600,
            deposit in 0u32..10_000,
            rate_bp in 0i32..2000,
            tariff_drop in 0u32..=100,
        ) {
            let params = SimulationParameters {
                horizon_months: horizon,
                monthly_deposit: deposit as f64,
                annual_rate_percent: rate_bp as f64 / 100.0,
                shocks: vec![ShockEvent::tariff(tariff_drop as f64)],
            };
            prop_assert_eq!(simulate(&params), simulate(&params));
        }
    }
}
