//! End-to-end pipeline tests: mock sensor → analysis → simulated link.
//!
//! All tests run on tokio's paused clock, so retry delays, capture pauses
//! and publish-gate intervals elapse deterministically without real sleeps.

use std::time::Duration;

use vibenode::acquisition::AcquisitionScheduler;
use vibenode::config::NodeConfig;
use vibenode::dsp::{RmsMode, SignalProcessor};
use vibenode::hardware::mock::{AxisSignal, MockAccelerometer};
use vibenode::net::{ConnectionState, ConnectivityManager, SimulatedLink};
use vibenode::orchestrator::{CycleOutcome, Orchestrator};
use vibenode::publish::TelemetryPublisher;
use vibenode::source::{ScalarSource, VibrationSource};
use vibenode::NodeError;

const N: usize = 128;
const RATE: f64 = 1000.0;

fn test_config() -> NodeConfig {
    let config = NodeConfig::from_toml(
        r#"
        [node]
        device_id = "vib-node-01"

        [network]
        ssid = "lab"
        password = "hunter2"

        [broker]
        host = "broker.local"

        [publish]
        min_interval = "5s"
    "#,
    )
    .unwrap();
    config.validate().unwrap();
    config
}

fn vibration_source(tone_hz: f64) -> VibrationSource<MockAccelerometer> {
    let sensor = MockAccelerometer::with_signals(
        RATE,
        [AxisSignal {
            frequency_hz: tone_hz,
            amplitude: 1.0,
            offset: 0.0,
        }; 3],
    );
    let scheduler = AcquisitionScheduler::new(sensor, N, Duration::from_millis(1));
    VibrationSource::new(scheduler, SignalProcessor::new(N, RmsMode::Raw))
}

fn orchestrator(
    link: SimulatedLink,
    source: VibrationSource<MockAccelerometer>,
) -> Orchestrator<SimulatedLink, VibrationSource<MockAccelerometer>> {
    let config = test_config();
    let connectivity = ConnectivityManager::new(link, &config);
    let publisher = TelemetryPublisher::new("vib-node-01", config.publish.min_interval);
    Orchestrator::new(connectivity, source, publisher, config.node.cycle_pause)
}

#[tokio::test(start_paused = true)]
async fn one_cycle_publishes_six_metrics() {
    let mut orchestrator = orchestrator(SimulatedLink::new(), vibration_source(100.0));
    orchestrator.init().await.unwrap();

    let outcome = orchestrator.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Published(6));

    let link = orchestrator.connectivity().link();
    let published = link.published();
    assert_eq!(published.len(), 6);

    let topics: Vec<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "vib-node-01/freq_x",
            "vib-node-01/freq_y",
            "vib-node-01/freq_z",
            "vib-node-01/rms_x",
            "vib-node-01/rms_y",
            "vib-node-01/rms_z",
        ]
    );

    // Dominant frequency within one bin of the 100 Hz tone
    let freq: f64 = published[0].1.parse().unwrap();
    assert!((freq - 100.0).abs() <= RATE / N as f64, "freq {}", freq);

    // Amplitude-1 sinusoid: RMS ~ 0.7071, four fractional digits
    let rms: f64 = published[3].1.parse().unwrap();
    assert!((rms - 0.7071).abs() < 0.02, "rms {}", rms);
}

#[tokio::test(start_paused = true)]
async fn publish_is_never_reached_before_broker_connected() {
    // Several association and broker failures before success
    let link = SimulatedLink::new().with_flaky_startup(3, 2);
    let mut orchestrator = orchestrator(link, vibration_source(100.0));
    orchestrator.init().await.unwrap();

    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Published(6));
    assert_eq!(
        orchestrator.connectivity().state(),
        ConnectionState::BrokerConnected
    );
    assert!(!orchestrator
        .connectivity()
        .link()
        .published_while_disconnected());
}

#[tokio::test(start_paused = true)]
async fn gate_drops_back_to_back_cycles() {
    let mut orchestrator = orchestrator(SimulatedLink::new(), vibration_source(100.0));
    orchestrator.init().await.unwrap();

    // First cycle publishes; the second begins ~128 ms later, well inside
    // the 5 s minimum interval
    assert_eq!(
        orchestrator.run_cycle().await.unwrap(),
        CycleOutcome::Published(6)
    );
    assert_eq!(
        orchestrator.run_cycle().await.unwrap(),
        CycleOutcome::RateLimited
    );

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(
        orchestrator.run_cycle().await.unwrap(),
        CycleOutcome::Published(6)
    );

    assert_eq!(orchestrator.connectivity().link().published().len(), 12);
}

#[tokio::test(start_paused = true)]
async fn session_drop_mid_run_reconnects_and_resubscribes() {
    let mut orchestrator = orchestrator(SimulatedLink::new(), vibration_source(100.0));
    orchestrator.init().await.unwrap();
    orchestrator.run_cycle().await.unwrap();

    orchestrator.connectivity_mut().link_mut().drop_session();
    tokio::time::advance(Duration::from_secs(5)).await;
    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Published(6));
    assert_eq!(
        orchestrator.connectivity().link().subscriptions().len(),
        2,
        "control topic must be re-subscribed after a reconnect"
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_reading_skips_the_publish() {
    use anyhow::Result;
    use async_trait::async_trait;
    use vibenode::hardware::ScalarProbe;

    struct NanProbe;

    #[async_trait]
    impl ScalarProbe for NanProbe {
        async fn read(&mut self) -> Result<f64> {
            Ok(f64::NAN)
        }
    }

    let config = test_config();
    let connectivity = ConnectivityManager::new(SimulatedLink::new(), &config);
    let publisher = TelemetryPublisher::new("vib-node-01", config.publish.min_interval);
    let source = ScalarSource::new("weight", 2, Box::new(NanProbe));
    let mut orchestrator =
        Orchestrator::new(connectivity, source, publisher, config.node.cycle_pause);
    orchestrator.init().await.unwrap();

    let outcome = orchestrator.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Skipped);
    assert!(orchestrator.connectivity().link().published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sensor_init_failure_is_fatal() {
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use vibenode::hardware::Accelerometer;

    struct DeadSensor;

    #[async_trait]
    impl Accelerometer for DeadSensor {
        async fn init(&mut self) -> Result<()> {
            bail!("no response on the sensor bus")
        }

        async fn read_triple(&mut self) -> Result<[f64; 3]> {
            bail!("unreachable")
        }
    }

    let config = test_config();
    let scheduler = AcquisitionScheduler::new(DeadSensor, N, Duration::from_millis(1));
    let source = VibrationSource::new(scheduler, SignalProcessor::new(N, RmsMode::Raw));
    let connectivity = ConnectivityManager::new(SimulatedLink::new(), &config);
    let publisher = TelemetryPublisher::new("vib-node-01", config.publish.min_interval);
    let mut orchestrator =
        Orchestrator::new(connectivity, source, publisher, config.node.cycle_pause);

    let err = orchestrator.init().await.unwrap_err();
    assert!(matches!(err, NodeError::SensorInit(_)));
}
