//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Wire layout constants shared by every crate
//! - Driver e2e over the scripted mock transport (no headset required)
//! - Sequence resolution over the simulated headset stream

#[cfg(test)]
mod contract_tests {
    use contracts::{IMU_REPORT_ID, IMU_REPORT_LEN, IMU_SAMPLE_LEN, IMU_SLOTS};

    #[test]
    fn test_report_layout() {
        assert_eq!(IMU_REPORT_ID, 0x20);
        assert_eq!(IMU_REPORT_LEN, 1 + IMU_SLOTS * IMU_SAMPLE_LEN);
    }
}

#[cfg(test)]
mod sequence_tests {
    use ingestion::{parse_report, SimulatedHeadset};
    use sync_engine::{SequenceCursor, SequenceTracker};

    /// SimulatedHeadset -> parse_report -> SequenceTracker, across the 255 -> 0 wrap
    #[test]
    fn test_simulated_stream_resolves_in_order() {
        for per_report in 1..=3u8 {
            let headset = SimulatedHeadset::new(250).samples_per_report(per_report);
            let mut tracker = SequenceTracker::new();
            let mut accepted = Vec::new();

            for report in headset.take(10) {
                let samples = parse_report(&report).unwrap();
                let resolution = tracker.push(&samples);
                accepted.extend(resolution.samples().iter().map(|s| s.seq));
            }

            let expected: Vec<u8> = (0..accepted.len() as u8)
                .map(|i| 250u8.wrapping_add(i))
                .collect();
            assert_eq!(accepted, expected, "samples per report {per_report}");
            assert_eq!(accepted.len(), 3 + 9 * per_report as usize);

            let stats = tracker.stats();
            assert_eq!(stats.lost, 0);
            assert_eq!(stats.accepted as usize + stats.stale as usize, 30);
            assert_eq!(
                tracker.cursor(),
                SequenceCursor::new(*accepted.last().unwrap())
            );
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use async_channel::Receiver;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AcquisitionConfig, CalibratedSample, ConfigError, Device, DeviceState, DriverConfig,
        DriverError, DropPolicy, RawSample,
    };
    use device::{simulated_transport, HeadsetImu, SIMULATED_CALIBRATION};
    use ingestion::{encode_report, Exhausted, LoopExit, MockEvent, MockTransport, SimulatedHeadset};
    use observability::AcquisitionStatsAggregator;

    fn sample(seq: u8) -> RawSample {
        RawSample {
            accel: [0, 0, 4096],
            gyro: [0, 0, 0],
            time: u32::from(seq) * 1000,
            seq,
        }
    }

    /// Report snapshot after the device wrote sample `newest`
    fn report(newest: u8) -> MockEvent {
        let mut samples = [RawSample::default(); 3];
        for back in 0..3u8 {
            let seq = newest.wrapping_sub(back);
            samples[usize::from(seq) % 3] = sample(seq);
        }
        MockEvent::Report(encode_report(&samples).to_vec())
    }

    fn config(poll_timeout_ms: u64) -> DriverConfig {
        DriverConfig {
            name: "e2e".to_string(),
            acquisition: AcquisitionConfig {
                poll_timeout_ms,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn headset(events: impl IntoIterator<Item = MockEvent>) -> MockTransport {
        simulated_transport(SIMULATED_CALIBRATION.as_bytes())
            .unwrap()
            .with_events(events)
    }

    /// Block until the worker closes the channel
    fn drain(samples: &Receiver<CalibratedSample>) -> Vec<CalibratedSample> {
        let mut out = Vec::new();
        while let Ok(sample) = samples.recv_blocking() {
            out.push(sample);
        }
        out
    }

    /// Wait for the worker to exit on its own
    fn wait_finished<T: contracts::Transport + 'static>(driver: &HeadsetImu<T>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while driver.is_running() {
            assert!(Instant::now() < deadline, "worker did not exit");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn seqs(samples: &[CalibratedSample]) -> Vec<u8> {
        samples.iter().map(|s| s.seq).collect()
    }

    /// Overlapping reports deliver each sample exactly once, in order
    #[test]
    fn test_overlapping_reports_deliver_once() {
        let events = (2..=20u8).map(report).chain([MockEvent::HangUp]);
        let mut driver = HeadsetImu::new(config(100), headset(events));
        let samples = driver.take_receiver().unwrap();

        driver.start().unwrap();
        driver.run().unwrap();
        let delivered = drain(&samples);
        driver.stop().unwrap();

        assert_eq!(seqs(&delivered), (0..=20u8).collect::<Vec<_>>());

        let metrics = driver.metrics().snapshot();
        assert_eq!(metrics.reports_received, 19);
        assert_eq!(metrics.samples_accepted, 21);
        assert_eq!(metrics.samples_stale, 19 * 3 - 21);
        assert_eq!(metrics.samples_lost, 0);
    }

    /// A 40-byte report is discarded and acquisition continues
    #[test]
    fn test_short_report_discarded() {
        let events = [
            report(2),
            MockEvent::Report(vec![0x20; 40]),
            report(3),
            MockEvent::HangUp,
        ];
        let mut driver = HeadsetImu::new(config(100), headset(events));
        let samples = driver.take_receiver().unwrap();

        driver.start().unwrap();
        driver.run().unwrap();
        let delivered = drain(&samples);
        driver.stop().unwrap();

        assert_eq!(seqs(&delivered), vec![0, 1, 2, 3]);
        assert_eq!(driver.metrics().snapshot().malformed_reports, 1);
    }

    /// Hang-up ends the loop without a stop request
    #[test]
    fn test_hangup_stops_loop() {
        let mut driver = HeadsetImu::new(config(100), headset([report(2), MockEvent::HangUp]));
        let samples = driver.take_receiver().unwrap();

        driver.start().unwrap();
        driver.run().unwrap();
        assert_eq!(drain(&samples).len(), 3);

        driver.stop().unwrap();
        assert_eq!(driver.exit_reason(), Some(LoopExit::HangUp));
        assert_eq!(driver.state(), DeviceState::Stopped);
    }

    /// Stop returns within about one poll interval
    #[test]
    fn test_stop_latency_bounded_by_poll_timeout() {
        let transport = headset(Vec::new()).when_exhausted(Exhausted::Timeout);
        let mut driver = HeadsetImu::new(config(50), transport);

        driver.start().unwrap();
        driver.run().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(driver.is_running());

        let begin = Instant::now();
        driver.stop().unwrap();
        let elapsed = begin.elapsed();

        assert!(elapsed < Duration::from_millis(300), "stop took {elapsed:?}");
        assert_eq!(driver.exit_reason(), Some(LoopExit::Stopped));
        assert!(driver.metrics().snapshot().poll_timeouts >= 1);
    }

    /// A calibration blob without gyro_scale aborts startup before the loop exists
    #[test]
    fn test_missing_gyro_scale_aborts_startup() {
        let calibration = br#"{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0]}"#;
        let transport = simulated_transport(calibration)
            .unwrap()
            .with_events([report(2)]);
        let handle = transport.handle();
        let mut driver = HeadsetImu::new(config(100), transport);

        let err = driver.start().unwrap_err();
        assert!(
            matches!(err, DriverError::Config(ConfigError::MissingField { ref field }) if field == "gyro_scale"),
            "unexpected error: {err}"
        );

        assert_eq!(driver.state(), DeviceState::Idle);
        assert!(handle.sent_features().is_empty(), "lighthouse must stay disabled");
        assert!(driver.run().is_err());
        assert_eq!(handle.pending_events(), 1);
    }

    /// A calibration override replaces the device's blob
    #[test]
    fn test_calibration_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0],"gyro_scale":[2,2,2]}"#,
        )
        .unwrap();

        // the device's own blob is unusable
        let broken = simulated_transport(b"{}").unwrap().with_events([MockEvent::HangUp]);
        let config = DriverConfig {
            calibration_override: Some(file.path().to_path_buf()),
            ..config(100)
        };
        let mut driver = HeadsetImu::new(config, broken);

        driver.start().unwrap();
        assert_eq!(driver.calibration().unwrap().gyro_scale().x, 2.0);
        driver.stop().unwrap();
    }

    /// Full queue with drop_oldest keeps the newest samples
    #[test]
    fn test_drop_oldest_from_toml_config() {
        let toml = r#"
name = "drop-oldest"

[acquisition]
poll_timeout_ms = 100
channel_capacity = 4
drop_policy = "drop_oldest"
"#;
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.acquisition.drop_policy, DropPolicy::DropOldest);

        let events = (2..=10u8).map(report).chain([MockEvent::HangUp]);
        let mut driver = HeadsetImu::new(config, headset(events));
        let samples = driver.take_receiver().unwrap();

        driver.start().unwrap();
        driver.run().unwrap();
        wait_finished(&driver);
        driver.stop().unwrap();
        assert_eq!(driver.exit_reason(), Some(LoopExit::HangUp));

        assert_eq!(seqs(&drain(&samples)), vec![7, 8, 9, 10]);
        assert_eq!(driver.metrics().snapshot().samples_dropped, 7);
    }

    /// Skipped reports show up as sequence gaps on both sides of the channel
    #[test]
    fn test_gap_detection() {
        let events = [report(2), report(10), MockEvent::HangUp];
        let mut driver = HeadsetImu::new(config(100), headset(events));
        let samples = driver.take_receiver().unwrap();

        driver.start().unwrap();
        driver.run().unwrap();
        let delivered = drain(&samples);
        driver.stop().unwrap();

        assert_eq!(seqs(&delivered), vec![0, 1, 2, 8, 9, 10]);
        assert_eq!(driver.metrics().snapshot().samples_lost, 5);

        let mut aggregator = AcquisitionStatsAggregator::new();
        delivered.iter().for_each(|s| aggregator.update(s));
        assert_eq!(aggregator.sequence_gaps, 5);
        assert_eq!(aggregator.summary().total_samples, 6);
    }

    /// Simulated headset stream consumed from async code
    #[tokio::test]
    async fn test_simulated_headset_async_consumer() {
        let transport = simulated_transport(SIMULATED_CALIBRATION.as_bytes())
            .unwrap()
            .with_generator(SimulatedHeadset::new(100), Duration::from_millis(1));
        let mut driver = HeadsetImu::new(config(100), transport);
        let samples = driver.take_receiver().unwrap();

        let mut driver = tokio::task::spawn_blocking(move || {
            driver.start().unwrap();
            driver.run().unwrap();
            driver
        })
        .await
        .unwrap();

        let mut received = Vec::new();
        let collect = async {
            while received.len() < 30 {
                match samples.recv().await {
                    Ok(sample) => received.push(sample.seq),
                    Err(_) => break,
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), collect)
            .await
            .expect("samples within timeout");

        tokio::task::spawn_blocking(move || driver.stop())
            .await
            .unwrap()
            .unwrap();

        let expected: Vec<u8> = (100..130).collect();
        assert_eq!(received, expected);
    }
}
