use kebalance::persistence::PersistenceManager;
use kebalance::{ChargerId, Config, CoordinatorConfig, Strategy};

#[test]
fn state_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut config = CoordinatorConfig {
        total_budget_a: 25,
        strategy: Strategy::Priority,
        ..Default::default()
    };
    config.priorities.insert(ChargerId::new("garage"), 1);

    let mut manager = PersistenceManager::new(&path);
    manager.set_coordinator_config(config.clone());
    manager.save().unwrap();

    let mut restored = PersistenceManager::new(&path);
    restored.load().unwrap();
    assert_eq!(restored.coordinator_config(), &config);
}

#[test]
fn missing_state_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does_not_exist.json");

    let mut manager = PersistenceManager::new(&path);
    manager.load().unwrap();
    assert_eq!(manager.coordinator_config(), &CoordinatorConfig::default());
}

#[test]
fn corrupt_state_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    let mut manager = PersistenceManager::new(&path);
    assert!(manager.load().is_err());
}

#[test]
fn config_yaml_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let mut config = Config::default();
    config.coordinator.total_budget_a = 40;
    config.coordinator.strategy = Strategy::Equal;
    config.save_to_file(&path).unwrap();

    let restored = Config::from_file(&path).unwrap();
    assert_eq!(restored.coordinator, config.coordinator);
    assert!(restored.validate().is_ok());
}
