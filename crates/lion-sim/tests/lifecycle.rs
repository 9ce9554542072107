//! Lifecycle and bookkeeping of a single simulation.

use lion_cell::CellParams;
use lion_core::celsius_to_kelvin;
use lion_sim::{
    JacobianMethod, Recorder, SimConfig, SimError, SimHooks, SimResult, SimState, Simulation,
};
use lion_solver::StepperKind;

fn config(time_seconds: f64) -> SimConfig {
    SimConfig {
        name: "lifecycle".to_string(),
        time_seconds,
        step_seconds: 1.0,
        ..SimConfig::default()
    }
}

#[test]
fn hundred_second_constant_power_example() {
    let params = CellParams::generic();
    let mut sim = Simulation::with_hooks(config(100.0), &params, Recorder::default()).unwrap();
    sim.init().unwrap();
    assert_eq!(sim.max_iters(), 100);

    let ambient = celsius_to_kelvin(25.0);
    let summary = sim.run(&[1.0; 100], &[ambient; 100]).unwrap();
    assert_eq!(summary.steps, 100);
    assert!(summary.closed);
    assert_eq!(sim.state().step, 100);
    assert_eq!(sim.state().time, 100.0);

    let states = sim.hooks().states();
    assert_eq!(states.len(), 100);
    let mut prev = params.init.soc;
    for s in states {
        assert!(s.integrated.soc_nominal < prev, "step {}", s.step);
        assert!(s.derived.current > 0.0);
        assert!((s.derived.voltage * s.derived.current - 1.0).abs() < 1e-6);
        prev = s.integrated.soc_nominal;
    }
    assert_eq!(sim.hooks().finished().map(|s| s.step), Some(100));
}

#[test]
fn step_and_time_bookkeeping() {
    let params = CellParams::generic();
    let config = SimConfig {
        time_seconds: 3.0,
        step_seconds: 0.25,
        ..config(0.0)
    };
    let mut sim = Simulation::with_hooks(config, &params, Recorder::default()).unwrap();
    sim.init().unwrap();
    assert_eq!(sim.max_iters(), 12);

    let summary = sim.run(&[3.0; 20], &[300.0; 20]).unwrap();
    assert_eq!(summary.steps, 12);
    for (i, s) in sim.hooks().states().iter().enumerate() {
        assert_eq!(s.step, i as u64 + 1);
        assert_eq!(s.time, s.step as f64 * 0.25);
        assert_eq!(s.degradation.cycle_step, s.step);
    }
}

#[test]
fn no_load_at_ambient_is_steady() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(50.0), &params).unwrap();
    sim.init().unwrap();
    let start = *sim.state();

    sim.run(&[0.0; 50], &[params.init.internal_temperature; 50])
        .unwrap();
    let end = sim.state();
    assert!((end.integrated.soc_nominal - start.integrated.soc_nominal).abs() < 1e-9);
    assert!(
        (end.integrated.internal_temperature - start.integrated.internal_temperature).abs() < 1e-6
    );
    assert!(end.derived.current.abs() < 1e-9);
}

#[test]
fn reset_reproduces_trajectory_bit_for_bit() {
    let params = CellParams::generic();
    let power: Vec<f64> = (0..60).map(|i| 4.0 * ((i as f64) * 0.2).sin()).collect();
    let ambient = vec![293.15; 60];

    for stepper in [StepperKind::Rkf45, StepperKind::MsAdams, StepperKind::MsBdf] {
        let config = SimConfig {
            stepper,
            ..config(60.0)
        };
        let mut sim = Simulation::with_hooks(config, &params, Recorder::default()).unwrap();
        sim.init().unwrap();
        sim.run(&power, &ambient).unwrap();
        let first = sim.hooks().states().to_vec();

        sim.reset().unwrap();
        sim.run(&power, &ambient).unwrap();
        assert_eq!(first, sim.hooks().states(), "{stepper:?}");
    }
}

#[test]
fn failed_step_leaves_state_untouched() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(10.0), &params).unwrap();
    sim.init().unwrap();
    sim.step(2.0, 298.15).unwrap();
    let before = *sim.state();

    // Far above the deliverable power of the cell.
    let err = sim.step(1e5, 298.15).unwrap_err();
    assert!(matches!(err, SimError::ConvergenceFailed { .. }), "{err}");
    assert!(err.is_recoverable());
    assert_eq!(*sim.state(), before);

    sim.step(2.0, 298.15).unwrap();
    assert_eq!(sim.state().step, 2);
}

#[test]
fn invalid_inputs_are_rejected_before_stepping() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(10.0), &params).unwrap();
    sim.init().unwrap();
    assert!(matches!(
        sim.step(f64::NAN, 298.15),
        Err(SimError::InvalidInput { .. })
    ));
    assert!(matches!(
        sim.step(1.0, -5.0),
        Err(SimError::InvalidInput { .. })
    ));
    assert_eq!(sim.state().step, 0);
}

#[test]
fn run_length_mismatch_is_a_config_error() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(10.0), &params).unwrap();
    sim.init().unwrap();
    let err = sim.run(&[1.0; 5], &[298.15; 4]).unwrap_err();
    assert!(matches!(err, SimError::Config { .. }));
    assert!(!err.is_recoverable());
    assert_eq!(sim.state().step, 0);
}

#[test]
fn invalid_setup_fails_at_creation() {
    let params = CellParams::generic();
    assert!(matches!(
        Simulation::new(config(10.5), &params),
        Err(SimError::Config { .. })
    ));

    let mut bad = CellParams::generic();
    bad.thermal.cp = -1.0;
    assert!(matches!(
        Simulation::new(config(10.0), &bad),
        Err(SimError::Cell(_))
    ));
}

#[test]
fn step_before_init_is_rejected() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(10.0), &params).unwrap();
    assert!(matches!(sim.step(1.0, 298.15), Err(SimError::Config { .. })));
}

#[test]
fn cleanup_is_idempotent_and_final() {
    let params = CellParams::generic();
    let mut sim = Simulation::new(config(10.0), &params).unwrap();
    sim.init().unwrap();
    sim.step(1.0, 298.15).unwrap();
    assert!(sim.driver_stats().is_some());

    sim.cleanup().unwrap();
    sim.cleanup().unwrap();
    assert!(sim.driver_stats().is_none());
    assert!(matches!(sim.init(), Err(SimError::Resource { .. })));
    assert!(matches!(sim.reset(), Err(SimError::Resource { .. })));
    assert!(sim.step(1.0, 298.15).is_err());
    assert_eq!(sim.state().step, 1);
}

#[test]
fn both_jacobian_strategies_track_each_other() {
    let params = CellParams::generic();
    let mut finals = Vec::new();
    for jacobian in [JacobianMethod::Analytical, JacobianMethod::CentralDifference] {
        let config = SimConfig {
            stepper: StepperKind::Rk2Imp,
            jacobian,
            ..config(30.0)
        };
        let mut sim = Simulation::new(config, &params).unwrap();
        sim.init().unwrap();
        sim.run(&[6.0; 30], &[290.0; 30]).unwrap();
        finals.push(sim.state().integrated);
    }
    assert!((finals[0].soc_nominal - finals[1].soc_nominal).abs() < 1e-6);
    assert!((finals[0].internal_temperature - finals[1].internal_temperature).abs() < 1e-3);
}

#[derive(Default)]
struct Counting {
    init: usize,
    update: usize,
    finished: usize,
    fail_at: Option<u64>,
}

impl SimHooks for Counting {
    fn on_init(&mut self, _state: &SimState) -> SimResult<()> {
        self.init += 1;
        Ok(())
    }

    fn on_update(&mut self, state: &SimState) -> SimResult<()> {
        self.update += 1;
        if self.fail_at == Some(state.step) {
            return Err(SimError::Hook {
                what: format!("rejected step {}", state.step),
            });
        }
        Ok(())
    }

    fn on_finished(&mut self, _state: &SimState) -> SimResult<()> {
        self.finished += 1;
        Ok(())
    }
}

#[test]
fn hooks_fire_at_lifecycle_points() {
    let params = CellParams::generic();
    let mut sim = Simulation::with_hooks(config(5.0), &params, Counting::default()).unwrap();
    sim.init().unwrap();
    sim.run(&[1.0; 5], &[298.15; 5]).unwrap();
    // Past the end: steps still commit but the finished hook stays quiet.
    sim.step(1.0, 298.15).unwrap();

    let hooks = sim.into_hooks();
    assert_eq!(hooks.init, 1);
    assert_eq!(hooks.update, 6);
    assert_eq!(hooks.finished, 1);
}

#[test]
fn hook_error_stops_run() {
    let params = CellParams::generic();
    let hooks = Counting {
        fail_at: Some(3),
        ..Counting::default()
    };
    let mut sim = Simulation::with_hooks(config(10.0), &params, hooks).unwrap();
    sim.init().unwrap();
    let err = sim.run(&[1.0; 10], &[298.15; 10]).unwrap_err();
    assert!(matches!(err, SimError::Hook { .. }));
    assert_eq!(sim.state().step, 3);
    assert_eq!(sim.hooks().update, 3);
}
