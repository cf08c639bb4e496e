//! # Integration Tests
//!
//! End-to-end tests for the signal controller, run entirely against mock
//! capabilities:
//! - full mock intersection (feeds -> shared state -> scheduler -> board)
//! - emergency preemption through the whole stack
//! - concurrency safety of the shared observation store

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_blueprint_loads_from_toml() {
        let content = r#"
[intersection]
name = "it-junction"

[timing]
min_green_secs = 5
max_green_secs = 30
vehicle_weights = { car = 1.0, bus = 2.5 }

[[approaches]]
direction = "north"
camera_source = "cam0"
[approaches.channels]
red = 17
yellow = 27
green = 22

[[approaches]]
direction = "east"
camera_source = "cam1"
[approaches.channels]
red = 5
yellow = 6
green = 13
"#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(content, config_loader::ConfigFormat::Toml)
                .expect("valid config");
        assert_eq!(
            blueprint.cycle_order(),
            vec![contracts::Direction::North, contracts::Direction::East]
        );
        assert_eq!(blueprint.timing.weight("bus"), 2.5);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use actuation::{LightEvent, MockLightBoard};
    use contracts::{
        Direction, EmergencyNotifier, LightColor, SharedTrafficState, TimingConfig,
        VehicleObservation,
    };
    use control::{emergency_channel, PhaseScheduler, SchedulerConfig};
    use detection::{
        DetectionFeed, FeedConfig, FeedStats, MockDetectorConfig, MockFrameSource,
        MockFrameSourceConfig, MockVehicleDetector,
    };
    use tokio::sync::watch;
    use tokio::time::sleep;

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            min_green_secs: 1,
            max_green_secs: 1,
            yellow_secs: 1,
            all_red_secs: 1,
            emergency_blink_secs: 2,
            vehicle_weights: HashMap::new(),
            capacity_normalizer: 50.0,
        }
    }

    struct MockIntersection {
        board: Arc<MockLightBoard>,
        state: Arc<SharedTrafficState>,
        shutdown_tx: watch::Sender<bool>,
        feeds: Vec<tokio::task::JoinHandle<FeedStats>>,
    }

    /// Wire the full mock system: four feeds, shared state, board, scheduler.
    fn build(
        timing: TimingConfig,
        max_phases: Option<u64>,
        emergency_on_north: bool,
    ) -> (MockIntersection, PhaseScheduler<MockLightBoard>) {
        let state = Arc::new(SharedTrafficState::new());
        let board = Arc::new(MockLightBoard::with_default_channels());
        let (handle, coordinator) = emergency_channel(Arc::clone(&state), timing.emergency_blink());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let notifier: Arc<dyn EmergencyNotifier> = Arc::new(handle);

        let mut feeds = Vec::new();
        for (index, direction) in Direction::CYCLE.iter().enumerate() {
            let detector = if emergency_on_north && *direction == Direction::North {
                MockVehicleDetector::new(MockDetectorConfig {
                    base_counts: HashMap::from([("car".to_string(), 4)]),
                    ripple: 0,
                    emergency_from_frame: Some(2),
                    fail_every: None,
                    latency: Duration::ZERO,
                })
            } else {
                MockVehicleDetector::new(MockDetectorConfig {
                    base_counts: HashMap::from([("car".to_string(), 2 + index as u32)]),
                    ripple: 3,
                    emergency_from_frame: None,
                    fail_every: None,
                    latency: Duration::from_millis(5),
                })
            };
            let source = MockFrameSource::new(MockFrameSourceConfig {
                source_id: format!("cam_{direction}"),
                fps: 50.0,
                fail_every: None,
                frame_bytes: 64,
            });
            let feed = DetectionFeed::new(
                *direction,
                source,
                Arc::new(detector),
                Arc::clone(&state),
                Arc::clone(&notifier),
                FeedConfig {
                    frame_skip: 2,
                    failure_backoff: Duration::from_millis(10),
                },
                shutdown_rx.clone(),
            );
            feeds.push(feed.spawn());
        }

        let scheduler = PhaseScheduler::new(
            Arc::clone(&board),
            Arc::clone(&state),
            SchedulerConfig {
                timing,
                cycle: Direction::CYCLE.to_vec(),
                max_phases,
            },
            coordinator,
            shutdown_rx,
        );

        (
            MockIntersection {
                board,
                state,
                shutdown_tx,
                feeds,
            },
            scheduler,
        )
    }

    async fn stop_feeds(intersection: &mut MockIntersection) -> FeedStats {
        let _ = intersection.shutdown_tx.send(true);
        let mut totals = FeedStats::default();
        for handle in intersection.feeds.drain(..) {
            let stats = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("feed shutdown timed out")
                .expect("feed task panicked");
            totals.frames_seen += stats.frames_seen;
            totals.detections += stats.detections;
            totals.frame_failures += stats.frame_failures;
            totals.detector_failures += stats.detector_failures;
            totals.emergencies += stats.emergencies;
        }
        totals
    }

    fn greens_in_order(history: &[LightEvent]) -> Vec<Direction> {
        history
            .iter()
            .filter_map(|event| match event {
                LightEvent::Set {
                    direction,
                    color: LightColor::Green,
                    on: true,
                } => Some(*direction),
                _ => None,
            })
            .collect()
    }

    /// Full mock run: phases progress in clockwise order, observations land,
    /// never two greens, safe state at the end.
    #[tokio::test(start_paused = true)]
    async fn test_e2e_mock_intersection() {
        let (mut intersection, scheduler) = build(fast_timing(), Some(8), false);

        let stats = scheduler.run().await;
        let feed_totals = stop_feeds(&mut intersection).await;

        assert_eq!(stats.phases_completed, 8);
        assert_eq!(
            greens_in_order(&intersection.board.history()),
            vec![
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
            ]
        );
        assert_eq!(intersection.board.max_simultaneous(LightColor::Green), 1);

        // Feeds were writing the whole time, every direction has a
        // consistent observation
        assert!(feed_totals.detections > 0);
        for direction in Direction::CYCLE {
            let obs = intersection
                .state
                .observation(direction)
                .expect("observation for every approach");
            assert!(obs.is_consistent());
        }

        // Safe state: steady all-red on the way out
        assert_eq!(intersection.board.lit_count(LightColor::Red), 4);
        assert_eq!(intersection.board.lit_count(LightColor::Green), 0);
        assert_eq!(intersection.board.lit_count(LightColor::Yellow), 0);
    }

    /// An emergency seen by a feed preempts the cycle with the blink
    /// pattern, then the scheduler carries on.
    #[tokio::test(start_paused = true)]
    async fn test_e2e_emergency_preemption() {
        let (mut intersection, scheduler) = build(fast_timing(), Some(6), true);

        let stats = scheduler.run().await;
        let feed_totals = stop_feeds(&mut intersection).await;

        assert!(stats.preemptions >= 1, "emergency must preempt the cycle");
        assert!(feed_totals.emergencies >= 1);

        // The blink pattern reached the board
        let blink_toggles = intersection
            .board
            .history()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    LightEvent::SetAll {
                        color: LightColor::Red,
                        ..
                    }
                )
            })
            .count();
        // 2 s blink at 0.5 s period: at least 4 toggles plus restores
        assert!(blink_toggles >= 5, "got {blink_toggles} all-red toggles");

        // The cycle still completed its phases afterwards
        assert_eq!(stats.phases_completed, 6);
        let greens = greens_in_order(&intersection.board.history());
        assert_eq!(greens[0], Direction::North);
        assert_eq!(greens[1], Direction::East);
    }

    /// Shutdown mid-run forces the safe state.
    #[tokio::test(start_paused = true)]
    async fn test_e2e_shutdown_forces_safe_state() {
        let (mut intersection, scheduler) = build(fast_timing(), None, false);
        let shutdown_tx = intersection.shutdown_tx.clone();

        let run = tokio::spawn(scheduler.run());
        sleep(Duration::from_secs(7)).await;
        let _ = shutdown_tx.send(true);
        run.await.expect("scheduler task");
        stop_feeds(&mut intersection).await;

        let history = intersection.board.history();
        assert_eq!(history[history.len() - 2], LightEvent::ResetAll);
        assert_eq!(
            history[history.len() - 1],
            LightEvent::SetAll {
                color: LightColor::Red,
                on: true
            }
        );
    }

    /// Four high-frequency writers and a continuous reader: no torn
    /// observations, no deadlock, bounded completion.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_observation_writes_never_tear() {
        let state = Arc::new(SharedTrafficState::new());
        let mut tasks = Vec::new();

        for direction in Direction::CYCLE {
            let state = Arc::clone(&state);
            tasks.push(tokio::spawn(async move {
                for n in 0..2000u32 {
                    let obs = VehicleObservation::from_type_counts(HashMap::from([
                        ("car".to_string(), n),
                        ("bus".to_string(), n / 7),
                        ("truck".to_string(), n / 13),
                    ]));
                    state.record_observation(direction, obs);
                    if n.is_multiple_of(256) {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let reader = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                for round in 0..4000u32 {
                    for direction in Direction::CYCLE {
                        if let Some(obs) = state.observation(direction) {
                            assert!(obs.is_consistent(), "torn observation read");
                        }
                    }
                    if round.is_multiple_of(256) {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };
        tasks.push(reader);

        let all = async {
            for task in tasks {
                task.await.expect("task panicked");
            }
        };
        tokio::time::timeout(Duration::from_secs(30), all)
            .await
            .expect("writers/reader deadlocked");
    }
}
