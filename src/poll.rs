use std::{error::Error, time::Duration};

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::istatrol::{DecodedSample, DeviceError, SampleSource, decode};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);

const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause after each reported sample.
    pub interval: Duration,

    /// Pause before reopening the device after a failure.
    pub backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollState {
    pub sample_count: u64,

    pub last_reading: Option<u16>,
}

#[derive(Debug)]
pub enum Step {
    Reported(DecodedSample),
    Recovered(DeviceError),
}

pub struct PollLoop<S> {
    source: S,
    config: PollConfig,
    state: PollState,
}

impl<S: SampleSource> PollLoop<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source,
            config,
            state: PollState::default(),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Initial open. A failure is only logged; the first read fails
    /// and drives the recovery path.
    pub async fn connect(&mut self) {
        match self.source.open().await {
            Ok(()) => info!("device opened"),
            Err(err) => error!("{}", error_chain(&err)),
        }
    }

    /// Polls forever.
    pub async fn run(&mut self) {
        self.connect().await;

        loop {
            self.step().await;
        }
    }

    pub async fn step(&mut self) -> Step {
        match self.sample().await {
            Ok(sample) => {
                println!("{}", format_report(self.state.sample_count, &sample));
                debug!(counter = sample.counter, "valve counter");

                self.state.sample_count += 1;
                self.state.last_reading = Some(sample.reading_raw);

                sleep(self.config.interval).await;
                Step::Reported(sample)
            }
            Err(err) => {
                self.recover(&err).await;
                Step::Recovered(err)
            }
        }
    }

    async fn sample(&mut self) -> Result<DecodedSample, DeviceError> {
        let raw = self.source.read_raw().await?;
        decode(&raw, self.state.last_reading)
    }

    async fn recover(&mut self, err: &DeviceError) {
        error!("{}", error_chain(err));

        let backoff = self.backoff_for(err);
        warn!("... trying again in {}s ...", backoff.as_secs());
        sleep(backoff).await;

        match self.source.open().await {
            Ok(()) => info!("device reopened"),
            Err(err) => warn!("{}", error_chain(&err)),
        }
    }

    fn backoff_for(&self, err: &DeviceError) -> Duration {
        match err {
            DeviceError::DeviceNotFound(_) => self.config.backoff,
            DeviceError::OpenFailed { .. } => self.config.backoff,
            DeviceError::NoDeviceOpen => self.config.backoff,
            DeviceError::TransferFailed(_) => self.config.backoff,
            DeviceError::MalformedResponse { .. } => self.config.backoff,
        }
    }
}

pub fn format_report(index: u64, sample: &DecodedSample) -> String {
    format!(
        "{index:5}\t{:5}\t{:.1}°C\t{}{}",
        sample.reading_raw,
        sample.temperature_celsius,
        sample.measured_at.format(REPORT_TIME_FORMAT),
        sample.valve_edge.as_str(),
    )
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source())
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
