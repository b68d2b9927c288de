mod common;

use common::{ProbePlan, ProbeUnit, SimBuilder};
use protosim_core::config::SimConfig;
use protosim_core::device::Device;
use protosim_core::engine::{StopCondition, StopReason};
use protosim_core::hooks::EngineHooks;
use protosim_core::program::Program;
use protosim_data::DeviceId;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl EngineHooks<ProbeUnit> for EventLog {
    fn pre_init(&mut self, config: &SimConfig) {
        self.0
            .borrow_mut()
            .push(format!("pre_init {}", config.population.size));
    }

    fn device_init(&mut self, device: &Device<ProbeUnit>) {
        self.0.borrow_mut().push(format!("init {}", device.id().0));
    }

    fn pre_update(&mut self, time: f64) {
        self.0.borrow_mut().push(format!("update {time}"));
    }

    fn device_executed(&mut self, device: &Device<ProbeUnit>) {
        self.0.borrow_mut().push(format!(
            "executed {} at {:?}",
            device.id().0,
            device.last_compute_time()
        ));
    }
}

#[test]
fn test_hook_order() {
    let log = EventLog::default();
    let plan = ProbePlan {
        clones: vec![(DeviceId(1), 0.0)],
        ..Default::default()
    };
    let mut engine = SimBuilder::new()
        .with_device(0.0, 0.0, 0.0)
        .with_device(1.0, 0.0, 0.0)
        .probe(plan)
        .hooks(log.clone())
        .build()
        .unwrap();
    engine.tick();

    assert_eq!(
        log.events(),
        vec![
            "pre_init 2",
            "init 1",
            "init 2",
            "update 0",
            "executed 1 at Some(0.0)",
            "executed 2 at Some(0.0)",
            "init 3",
        ]
    );
}

#[test]
fn test_parallel_compute_keeps_hook_order() {
    let log = EventLog::default();
    let mut engine = SimBuilder::new()
        .with_config(|c| {
            c.engine.parallel_compute = true;
            c.population.size = 16;
        })
        .probe(ProbePlan::default())
        .hooks(log.clone())
        .build()
        .unwrap();
    engine.tick();
    let executed: Vec<String> = log
        .events()
        .into_iter()
        .filter(|e| e.starts_with("executed"))
        .collect();
    let expected: Vec<String> = (1..=16).map(|i| format!("executed {i} at Some(0.0)")).collect();
    assert_eq!(executed, expected);
}

#[test]
fn test_run_stops_at_custom_condition() {
    let mut engine = SimBuilder::new()
        .with_device(0.0, 0.0, 0.0)
        .probe(ProbePlan::default())
        .stop_when(StopCondition::custom(|t| t >= 2.5))
        .build()
        .unwrap();
    let summary = engine.run(100);
    assert_eq!(summary.reason, StopReason::Condition);
    assert_eq!(summary.ticks, 3);
    assert_eq!(engine.time(), 3.0);
    assert!(engine.advance().is_none());
}

#[test]
fn test_builder_stop_overrides_config() {
    let mut engine = SimBuilder::new()
        .with_config(|c| c.engine.stop_at = Some(1.0))
        .with_device(0.0, 0.0, 0.0)
        .probe(ProbePlan::default())
        .stop_when(StopCondition::Never)
        .build()
        .unwrap();
    let summary = engine.run(5);
    assert_eq!(summary.reason, StopReason::TickLimit);
    assert_eq!(summary.ticks, 5);
}

#[test]
fn test_pause_and_resume() {
    let mut engine = SimBuilder::new()
        .with_config(|c| c.engine.start_paused = true)
        .with_device(0.0, 0.0, 0.0)
        .build_scripted(Program::Idle);

    let summary = engine.run(10);
    assert_eq!(summary.reason, StopReason::Paused);
    assert_eq!(summary.ticks, 0);
    assert_eq!(engine.time(), 0.0);

    engine.resume();
    assert!(engine.advance().is_some());
    engine.pause();
    assert!(engine.advance().is_none());
    assert_eq!(engine.tick_count(), 1);
}

#[test]
fn test_start_time_offsets_clock() {
    let mut engine = SimBuilder::new()
        .with_config(|c| {
            c.engine.start_time = 10.0;
            c.engine.step_size = 2.0;
        })
        .with_device(0.0, 0.0, 0.0)
        .build_probe(ProbePlan::default());
    engine.tick();
    engine.tick();
    assert_eq!(engine.time(), 14.0);
    assert_eq!(
        engine.device(DeviceId(1)).unwrap().unit().rounds,
        vec![10.0, 12.0]
    );
}

#[test]
fn test_snapshot_reflects_state() {
    let mut engine = SimBuilder::new()
        .with_device(0.0, 0.0, 0.0)
        .with_device(2.0, 0.0, 0.0)
        .build_scripted(Program::Blink { period: 1.0 });
    engine.set_sensor(DeviceId(2), 1, true).unwrap();
    engine.tick();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.time, 1.0);
    assert_eq!(snapshot.fingerprint, engine.config().fingerprint());
    assert_eq!(snapshot.devices.len(), 2);
    let second = &snapshot.devices[1];
    assert_eq!(second.id, DeviceId(2));
    assert_eq!(second.sensors, vec![false, true, false, false]);
    assert_eq!(second.color.green, 1.0);
    assert_eq!(second.last_compute_time, Some(0.0));
    assert_eq!(second.next_compute_time, 1.0);
}
