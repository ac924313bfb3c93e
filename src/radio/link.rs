use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::Result;
use super::init::InitStage;
use super::transport::Transport;

/// Bytes of already-seen data retained for the validator in streaming mode,
/// so a completion marker split across two polls is still recognized
const STREAM_TAIL_BYTES: usize = 64;

/// Result of a command exchange
///
/// A timeout resolves with the partial reply instead of failing: the
/// companion module occasionally misses a beat, and the next scheduling
/// round is expected to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The validator recognized a complete reply
    Completed(Vec<u8>),
    /// The wait expired; carries whatever arrived before the deadline
    TimedOut(Vec<u8>),
}

impl ExchangeOutcome {
    /// Received bytes regardless of how the exchange settled
    pub fn data(&self) -> &[u8] {
        match self {
            ExchangeOutcome::Completed(data) => data,
            ExchangeOutcome::TimedOut(data) => data,
        }
    }

    /// Whether the validator accepted the reply before the deadline
    pub fn is_completed(&self) -> bool {
        matches!(self, ExchangeOutcome::Completed(_))
    }

    /// Consumes the outcome, yielding the received bytes
    pub fn into_data(self) -> Vec<u8> {
        match self {
            ExchangeOutcome::Completed(data) => data,
            ExchangeOutcome::TimedOut(data) => data,
        }
    }
}

/// Command engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Interval between transport polls during an exchange
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub poll_interval: Duration,
    /// Idle time after which module power is dropped
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub idle_power_off: Duration,
    /// Settle delay between power-off and power-on during a power cycle
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub settle_delay: Duration,
    /// Reply deadline for advertisement data exchanges
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub response_timeout: Duration,
    /// Reply deadline for each initialization step
    #[serde(serialize_with = "crate::core::serde::serialize_duration")]
    #[serde(deserialize_with = "crate::core::serde::deserialize_duration")]
    pub init_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            poll_interval: Duration::from_millis(25),
            idle_power_off: Duration::from_secs(10),
            settle_delay: Duration::from_millis(100),
            response_timeout: Duration::from_secs(1),
            init_timeout: Duration::from_secs(10),
        }
    }
}

/// Drives the companion radio's half-duplex command protocol
///
/// The link owns the transport and hands a shared reference only to its own
/// idle power-off task. All exchanges borrow the link mutably, so a second
/// outstanding exchange is unrepresentable.
pub struct RadioLink<T: Transport> {
    transport: Arc<Mutex<T>>,
    config: LinkConfig,
    initialized: bool,
    stage: InitStage,
    idle_task: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> RadioLink<T> {
    /// Creates a link over `transport`; the module stays powered off until
    /// the first exchange or initialization
    pub fn new(transport: T, config: LinkConfig) -> Self {
        RadioLink {
            transport: Arc::new(Mutex::new(transport)),
            config,
            initialized: false,
            stage: InitStage::PoweredOff,
            idle_task: None,
        }
    }

    /// Shared handle to the underlying transport
    pub fn transport(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.transport)
    }

    /// Command engine configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Whether the bring-up sequence has completed on this link
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bring-up stage the link last reached
    pub fn init_stage(&self) -> InitStage {
        self.stage
    }

    /// Whether the module is currently powered
    pub async fn is_powered(&self) -> bool {
        self.transport.lock().await.is_powered()
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub(crate) fn set_stage(&mut self, stage: InitStage) {
        self.stage = stage;
    }

    /// Sends `command` (or just listens when `None`) until `validator`
    /// accepts the accumulated reply or `timeout` expires
    ///
    /// The validator is called after every poll with the bytes received so
    /// far and the elapsed seconds. A timeout is not an error: it resolves
    /// with [`ExchangeOutcome::TimedOut`] carrying the partial reply.
    pub async fn exchange<V>(
        &mut self,
        command: Option<&str>,
        validator: V,
        timeout: Duration,
    ) -> Result<ExchangeOutcome>
    where
        V: FnMut(&[u8], f64) -> bool,
    {
        self.run_exchange(command, validator, timeout, None).await
    }

    /// Like [`RadioLink::exchange`], but hands each newly received chunk to
    /// `sink` and retains only a short tail for the validator
    pub async fn exchange_streaming<V, S>(
        &mut self,
        command: Option<&str>,
        mut sink: S,
        validator: V,
        timeout: Duration,
    ) -> Result<ExchangeOutcome>
    where
        V: FnMut(&[u8], f64) -> bool,
        S: FnMut(&[u8]),
    {
        self.run_exchange(command, validator, timeout, Some(&mut sink))
            .await
    }

    async fn run_exchange<V>(
        &mut self,
        command: Option<&str>,
        mut validator: V,
        timeout: Duration,
        mut sink: Option<&mut dyn FnMut(&[u8])>,
    ) -> Result<ExchangeOutcome>
    where
        V: FnMut(&[u8], f64) -> bool,
    {
        self.cancel_idle_timer();
        self.ensure_powered().await?;

        if let Some(command) = command {
            debug!("sending command: {}", command);
            let mut framed = BytesMut::with_capacity(command.len() + 2);
            framed.extend_from_slice(command.as_bytes());
            framed.extend_from_slice(b"\r\n");
            self.transport.lock().await.write(&framed)?;
        }

        let start = Instant::now();
        let mut buffer = BytesMut::new();
        let mut chunk = [0u8; 256];
        let outcome = loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let count = self.transport.lock().await.read_available(&mut chunk)?;
            if count > 0 {
                if let Some(sink) = sink.as_mut() {
                    sink(&chunk[..count]);
                }
                buffer.extend_from_slice(&chunk[..count]);
                if sink.is_some() && buffer.len() > STREAM_TAIL_BYTES {
                    let excess = buffer.len() - STREAM_TAIL_BYTES;
                    buffer.advance(excess);
                }
            }

            let elapsed = start.elapsed();
            if validator(&buffer, elapsed.as_secs_f64()) {
                break ExchangeOutcome::Completed(buffer.to_vec());
            }
            if elapsed >= timeout {
                warn!(
                    "exchange timed out after {:?} with {} bytes received",
                    timeout,
                    buffer.len()
                );
                break ExchangeOutcome::TimedOut(buffer.to_vec());
            }
        };

        self.arm_idle_timer();
        Ok(outcome)
    }

    /// Powers the module off (when on), waits for the settle delay, and
    /// powers it back on with a freshly configured UART
    pub(crate) async fn power_cycle(&mut self) -> Result<()> {
        let was_powered = {
            let mut transport = self.transport.lock().await;
            let was_powered = transport.is_powered();
            if was_powered {
                transport.power_off()?;
            }
            was_powered
        };
        if was_powered {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        self.transport.lock().await.power_on()
    }

    async fn ensure_powered(&mut self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        if !transport.is_powered() {
            transport.power_on()?;
        }
        Ok(())
    }

    fn cancel_idle_timer(&mut self) {
        if let Some(task) = self.idle_task.take() {
            task.abort();
        }
    }

    fn arm_idle_timer(&mut self) {
        self.cancel_idle_timer();
        let transport = Arc::clone(&self.transport);
        let delay = self.config.idle_power_off;
        self.idle_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut transport = transport.lock().await;
            if transport.is_powered() {
                debug!("idle timeout, dropping module power");
                if let Err(e) = transport.power_off() {
                    warn!("failed to power off idle module: {}", e);
                }
            }
        }));
    }
}

impl<T: Transport> Drop for RadioLink<T> {
    fn drop(&mut self) {
        if let Some(task) = self.idle_task.take() {
            task.abort();
        }
    }
}
