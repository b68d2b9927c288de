mod common;

use common::SimBuilder;
use protosim_core::program::Program;
use protosim_data::DeviceId;

#[test]
fn test_hop_gradient_settles_along_a_line() {
    let mut builder = SimBuilder::new().with_radius(6.0);
    for i in 0..6 {
        builder = builder.with_device(i as f64 * 5.0, 0.0, 0.0);
    }
    let mut engine = builder.build_scripted(Program::HopGradient { source_sensor: 0 });
    engine.set_sensor(DeviceId(1), 0, true).unwrap();

    for _ in 0..12 {
        engine.tick();
    }
    let hops: Vec<Option<u32>> = engine.devices().iter().map(|d| d.unit().hops()).collect();
    assert_eq!(hops, vec![Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]);

    let source = engine.color(DeviceId(1)).unwrap();
    assert_eq!(source.red, 1.0);
    let far = engine.color(DeviceId(6)).unwrap();
    assert!((far.blue - 0.2).abs() < 1e-12);
}

#[test]
fn test_gradient_without_source_stays_unset() {
    let mut engine = SimBuilder::new()
        .with_device(0.0, 0.0, 0.0)
        .with_device(3.0, 0.0, 0.0)
        .build_scripted(Program::HopGradient { source_sensor: 0 });
    for _ in 0..5 {
        engine.tick();
    }
    assert!(engine.devices().iter().all(|d| d.unit().hops().is_none()));
}
