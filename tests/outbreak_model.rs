//! End-to-end checks of the daily recurrence through the public API.

use outbreak::prelude::*;

const BASELINE_POPULATION: f64 = 330e6;

fn baseline() -> ScenarioConfig {
    ScenarioConfig::default()
}

fn run(config: ScenarioConfig) -> SimulationState {
    let mut engine = EpidemicEngine::new(config).unwrap();
    engine.run().unwrap();
    engine.into_parts().1
}

#[test]
fn baseline_day_zero() {
    let engine = EpidemicEngine::new(baseline()).unwrap();
    let record = engine.state().history().record(0).unwrap();
    assert!((record.infectious - 1.0).abs() < f64::EPSILON);
    assert!((record.susceptible - 329_999_999.0).abs() < f64::EPSILON);
    assert!(record.immune.abs() < f64::EPSILON);
    assert!(record.dead.abs() < f64::EPSILON);
}

#[test]
fn baseline_burns_out_within_horizon() {
    let state = run(baseline());
    let gone = state.extinction_day().unwrap();
    assert!(gone < 1000);

    let dead = state.history().record(gone).unwrap().dead;
    assert!(dead > 0.0);
    assert!(dead < 0.01 * BASELINE_POPULATION);

    // Cohorts still inside their window settle within one period, then
    // the tail stays flat.
    let settled_day = (gone + baseline().infectious_period_days) as usize;
    let settled = state.history().dead()[settled_day];
    assert!(settled - dead < 1.0);
    assert!(state.history().dead()[settled_day..]
        .iter()
        .all(|d| (d - settled).abs() < f64::EPSILON));
    assert_eq!(state.history().len(), 1001);
}

#[test]
fn baseline_reaches_herd_immunity() {
    let state = run(baseline());
    let gone = state.extinction_day().unwrap();
    let percent = state.percent_immune_at(gone).unwrap();
    assert!(percent > 60.0, "percent immune {percent}");
    assert!(percent < 100.0);
}

#[test]
fn zero_seed_is_extinct_at_day_zero() {
    let state = run(ScenarioConfig {
        initial_infectious: 0.0,
        max_days: 30,
        ..baseline()
    });
    assert_eq!(state.extinction_day(), Some(0));
    assert!(state.history().dead().iter().all(|d| d.abs() < f64::EPSILON));
    assert!(state.history().infectious().iter().all(|i| i.abs() < f64::EPSILON));
}

#[test]
fn non_spreading_seed_dies_out_after_one_period() {
    let config = ScenarioConfig {
        initial_reproduction_number: 0.0,
        relaxed_reproduction_number: 0.0,
        initial_infectious: 1.0,
        max_days: 60,
        ..baseline()
    };
    let state = run(config.clone());

    assert_eq!(state.extinction_day(), Some(config.infectious_period_days));
    let dead = state.history().record(config.infectious_period_days).unwrap().dead;
    assert!((dead - config.death_rate).abs() < 1e-12);
}

#[test]
fn dissipating_day_is_first_crossing() {
    let state = run(baseline());
    let day = state.dissipating_day().unwrap();
    let susceptible = state.history().susceptible();
    let r0 = baseline().initial_reproduction_number;

    let rt = |d: u32| r0 * susceptible[(d - 1) as usize] / susceptible[0];
    assert!(rt(day) < 1.0);
    assert!((1..day).all(|d| rt(d) >= 1.0));
    assert!(day < state.extinction_day().unwrap());
}

#[test]
fn recoveries_trail_infections_by_one_period() {
    let config = ScenarioConfig {
        total_population: 100_000.0,
        initial_infectious: 10.0,
        max_days: 200,
        ..baseline()
    };
    let period = config.infectious_period_days as usize;
    let state = run(config.clone());
    let history = state.history();

    for day in 0..period {
        assert!(history.newly_recovered()[day].abs() < f64::EPSILON);
        assert!(history.newly_dead()[day].abs() < f64::EPSILON);
    }
    for day in period..history.len() {
        let cohort = history.newly_infected()[day - period];
        let expected = (1.0 - config.death_rate) * cohort;
        assert!((history.newly_recovered()[day] - expected).abs() < 1e-9);
        assert!((history.newly_dead()[day] - config.death_rate * cohort).abs() < 1e-9);
    }
}

#[test]
fn waning_immunity_returns_recovered_after_duration() {
    let config = ScenarioConfig {
        total_population: 100_000.0,
        initial_infectious: 10.0,
        immunity_duration_days: 90,
        immunity_loss_fraction: 0.3,
        max_days: 400,
        ..baseline()
    };
    let state = run(config.clone());
    let history = state.history();

    assert!(history.newly_lost_immunity()[..90].iter().all(|v| v.abs() < f64::EPSILON));
    for day in 90..history.len() {
        let expected = 0.3 * history.newly_recovered()[day - 90];
        assert!((history.newly_lost_immunity()[day] - expected).abs() < 1e-9);
    }
    assert!(history.newly_lost_immunity().iter().any(|v| *v > 0.0));
}

#[test]
fn cutoff_switches_reproduction_number_once() {
    let config = ScenarioConfig {
        initial_reproduction_number: 1.1,
        relaxed_reproduction_number: 2.5,
        social_distancing_cutoff_day: Some(50),
        relax_on_extinction: false,
        total_population: 100_000.0,
        initial_infectious: 10.0,
        max_days: 120,
        ..baseline()
    };
    let mut engine = EpidemicEngine::new(config).unwrap();
    let mut active = Vec::new();
    for _ in 0..120 {
        active.push(engine.step().unwrap().active_reproduction);
    }

    // active[i] belongs to day i + 1; day 50 is the last distanced day.
    assert!(active[..50].iter().all(|r| (r - 1.1).abs() < f64::EPSILON));
    assert!(active[50..].iter().all(|r| (r - 2.5).abs() < f64::EPSILON));
    assert_eq!(engine.state().relaxed_day(), Some(51));
}

#[test]
fn cutoff_counts_distanced_days() {
    let first_day_infections = |cutoff: u32| {
        let mut engine = EpidemicEngine::new(ScenarioConfig {
            initial_reproduction_number: 1.25,
            relaxed_reproduction_number: 2.5,
            social_distancing_cutoff_day: Some(cutoff),
            total_population: 1000.0,
            initial_infectious: 10.0,
            max_days: 5,
            ..baseline()
        })
        .unwrap();
        engine.step().unwrap().newly_infected
    };

    assert!((first_day_infections(1) - 10.0 * 1.25 / 14.0).abs() < 1e-12);
    assert!((first_day_infections(0) - 10.0 * 2.5 / 14.0).abs() < 1e-12);
}

#[test]
fn conservation_holds_every_day() {
    let state = run(ScenarioConfig {
        immunity_duration_days: 60,
        immunity_loss_fraction: 0.5,
        ..baseline()
    });
    for record in state.history().records() {
        let total = record.susceptible + record.infectious + record.immune + record.dead;
        assert!(
            (total - BASELINE_POPULATION).abs() <= 1.0,
            "day {} drift {}",
            record.day,
            total - BASELINE_POPULATION
        );
    }
}

#[test]
fn identical_inputs_give_identical_histories() {
    let a = run(baseline());
    let b = run(baseline());
    assert_eq!(a.history(), b.history());
}

#[test]
fn invalid_configuration_rejected_before_day_one() {
    let err = EpidemicEngine::new(ScenarioConfig {
        infectious_period_days: 0,
        ..baseline()
    })
    .unwrap_err();
    assert!(err.is_invalid_configuration());
}
