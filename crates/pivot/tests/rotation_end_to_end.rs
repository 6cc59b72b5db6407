//! Arbitrated rotation flowing from module requests into outbound movement
//! messages.

use std::sync::Arc;

use parking_lot::Mutex;

use pivot::{ClientContext, ClientDriver, MockHost, MockMessage, PivotConfig, TickPath};
use pivot_network::{MovementMessage, PacketSendPre};
use pivot_rotation::{RequestStatus, RotationMode, RotationRequest, TurnSpeed};
use pivot_shared::{Rotation, Vec3};

fn driver_with(config: PivotConfig) -> ClientDriver<MockHost> {
    let context = ClientContext::new(config).unwrap();
    let mut driver = ClientDriver::new(context, MockHost::new());
    driver.connect();
    driver
}

fn driver() -> ClientDriver<MockHost> {
    driver_with(PivotConfig::default())
}

fn sent_rotation(message: &MovementMessage) -> Option<Rotation> {
    match message {
        MovementMessage::Full { rotation, .. } | MovementMessage::Look { rotation, .. } => Some(*rotation),
        _ => None,
    }
}

#[test]
fn send_subscribers_observe_the_winning_rotation() {
    let mut driver = driver();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let o = Arc::clone(&observed);
    driver
        .context()
        .bus()
        .subscribe_system::<PacketSendPre<MockMessage>, _>("observer", move |e| {
            if let MockMessage::Movement(movement) = e.message() {
                o.lock().extend(sent_rotation(movement));
            }
        });

    let modules = driver.context().modules();
    let low = modules.register("Low").unwrap();
    let high = modules.register("High").unwrap();
    low.enable();
    high.enable();
    let rotation = driver.context().rotation();
    let low_id = rotation.request(&low, RotationRequest::look(45.0, 0.0, 5)).unwrap();
    let high_id = rotation.request(&high, RotationRequest::look(-120.0, 20.0, 10)).unwrap();

    driver.tick(TickPath::InputFirst);

    assert_eq!(*observed.lock(), vec![Rotation::new(-120.0, 20.0)]);
    assert_eq!(driver.host().sent_movement().len(), 1);
    let rotation = driver.context().rotation();
    assert_eq!(rotation.status(high_id), Some(RequestStatus::Active));
    assert_eq!(rotation.status(low_id), Some(RequestStatus::Pending));
    assert_eq!(rotation.head_yaw(), Some(-120.0));
    // The host's own camera is untouched in Sync mode.
    assert_eq!(driver.host().rotation, Rotation::ZERO);
}

#[test]
fn fixed_turn_speed_converges_over_ticks() {
    let mut config = PivotConfig::default();
    config.rotation.turn_speed = TurnSpeed::Fixed(30.0);
    let mut driver = driver_with(config);

    let aim = driver.context().modules().register("Aim").unwrap();
    aim.enable();
    driver
        .context()
        .rotation()
        .request(&aim, RotationRequest::look(90.0, 0.0, 1))
        .unwrap();

    for _ in 0..4 {
        driver.tick(TickPath::InputFirst);
    }

    let yaws: Vec<f64> = driver
        .host()
        .sent_movement()
        .iter()
        .filter_map(sent_rotation)
        .map(|r| r.yaw)
        .collect();
    assert_eq!(yaws.len(), 3);
    for (yaw, expected) in yaws.iter().zip([30.0, 60.0, 90.0]) {
        assert!((yaw - expected).abs() < 1e-9, "{yaw} != {expected}");
    }
    assert!(driver.context().rotation().target_reached());
}

#[test]
fn disabling_the_owner_returns_control_to_the_host() {
    let mut driver = driver();
    driver.host_mut().look(10.0, 0.0);
    let aim = driver.context().modules().register("Aim").unwrap();
    aim.enable();
    let id = driver
        .context()
        .rotation()
        .request(&aim, RotationRequest::look(100.0, 0.0, 1))
        .unwrap();

    driver.tick(TickPath::InputFirst);
    aim.disable();
    driver.tick(TickPath::InputFirst);

    let rotation = driver.context().rotation();
    assert_eq!(rotation.status(id), Some(RequestStatus::Expired));
    assert_eq!(rotation.movement_yaw(), None);

    let rotations: Vec<Rotation> = driver
        .host()
        .sent_movement()
        .iter()
        .filter_map(sent_rotation)
        .collect();
    assert_eq!(rotations, vec![Rotation::new(100.0, 0.0), Rotation::new(10.0, 0.0)]);
}

#[test]
fn silent_mode_only_changes_what_is_sent() {
    let mut driver = driver();
    let aim = driver.context().modules().register("Silent").unwrap();
    aim.enable();
    driver
        .context()
        .rotation()
        .request(
            &aim,
            RotationRequest::look(70.0, -10.0, 1).mode(RotationMode::Silent),
        )
        .unwrap();

    driver.tick(TickPath::InputFirst);

    let rotation = driver.context().rotation();
    assert_eq!(rotation.movement_rotation(), None);
    assert_eq!(rotation.network_rotation(), Some(Rotation::new(70.0, -10.0)));
    assert_eq!(
        driver.host().sent_movement().iter().find_map(sent_rotation),
        Some(Rotation::new(70.0, -10.0))
    );
}

#[test]
fn lock_mode_writes_the_rotation_back_into_the_host() {
    let mut driver = driver();
    let aim = driver.context().modules().register("Lock").unwrap();
    aim.enable();
    driver
        .context()
        .rotation()
        .request(&aim, RotationRequest::look(33.0, 12.0, 1).mode(RotationMode::Lock))
        .unwrap();

    let report = driver.tick(TickPath::InputFirst);

    assert_eq!(report.lock_rotation, Some(Rotation::new(33.0, 12.0)));
    assert_eq!(driver.host().rotation, Rotation::new(33.0, 12.0));
}

#[test]
fn correction_from_the_peer_expires_requests() {
    let mut driver = driver();
    let aim = driver.context().modules().register("Aim").unwrap();
    aim.enable();
    let id = driver
        .context()
        .rotation()
        .request(&aim, RotationRequest::look(150.0, 0.0, 1))
        .unwrap();
    driver.tick(TickPath::InputFirst);

    driver.receive(MockMessage::Correction(Rotation::new(-45.0, 5.0)));

    let rotation = driver.context().rotation();
    assert_eq!(rotation.status(id), Some(RequestStatus::Expired));
    assert_eq!(rotation.state().server, Rotation::new(-45.0, 5.0));
    assert_eq!(driver.host().rotation, Rotation::new(-45.0, 5.0));
}

#[test]
fn movement_is_reported_from_host_state() {
    let mut driver = driver();
    driver.host_mut().move_to(Vec3::new(1.0, 64.0, -3.0));
    driver.host_mut().state.on_ground = true;

    driver.tick(TickPath::InputFirst);
    driver.tick(TickPath::InputFirst);

    assert_eq!(
        driver.host().sent_movement(),
        vec![MovementMessage::Position {
            position: Vec3::new(1.0, 64.0, -3.0),
            on_ground: true,
            horizontal_collision: false,
        }]
    );
}

#[test]
fn half_turn_target_is_reported_as_requested() {
    let mut driver = driver();
    let aim = driver.context().modules().register("Behind").unwrap();
    aim.enable();
    driver
        .context()
        .rotation()
        .request(&aim, RotationRequest::look(180.0, 0.0, 1))
        .unwrap();

    driver.tick(TickPath::InputFirst);

    assert_eq!(
        driver.host().sent_movement().iter().find_map(sent_rotation),
        Some(Rotation::new(180.0, 0.0))
    );
    assert_eq!(driver.context().rotation().movement_yaw(), Some(180.0));
}
