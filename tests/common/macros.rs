/// Asserts the engine holds exactly `$count` devices.
#[macro_export]
macro_rules! assert_population {
    ($engine:expr, $count:expr) => {
        assert_eq!($engine.len(), $count, "Population count mismatch");
    };
}

/// Asserts the neighbors of device `$id` are exactly the listed ids.
#[macro_export]
macro_rules! assert_neighbors {
    ($engine:expr, $id:expr, [$($n:expr),* $(,)?]) => {
        let expected: Vec<protosim_data::DeviceId> =
            vec![$(protosim_data::DeviceId($n)),*];
        let actual = $engine
            .neighbors_of(protosim_data::DeviceId($id))
            .expect("Device not found in engine");
        assert_eq!(actual, expected, "Neighbors of device {} mismatch", $id);
    };
}

/// Asserts device `$id` sits at `($x, $y, $z)`.
#[macro_export]
macro_rules! assert_position {
    ($engine:expr, $id:expr, ($x:expr, $y:expr, $z:expr)) => {
        let position = $engine
            .position(protosim_data::DeviceId($id))
            .expect("Device not found in engine");
        assert_eq!(
            position,
            protosim_data::Vec3::new($x, $y, $z),
            "Device {} position mismatch",
            $id
        );
    };
}
