//! Radio module bring-up
//!
//! An ordered sequence of command exchanges that power-cycles the companion
//! module and brings it into BLE-advertiser mode. Each step starts only once
//! the previous one has settled, and unlike data exchanges a step that times
//! out or answers with an error fails the whole sequence.

use tracing::{info, warn};

use crate::core::{Error, Result};
use super::link::{ExchangeOutcome, RadioLink};
use super::transport::Transport;
use super::{
    banner_seen, reply_complete, reply_failed, CMD_ADV_PARAMS, CMD_ADV_START,
    CMD_BLE_SERVER_ROLE, CMD_DISABLE_NETWORKING, CMD_RESTORE,
};

/// Stages of the bring-up sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// Module power has been cycled or first applied
    PoweredOff,
    /// Waiting for the boot banner
    AwaitBanner,
    /// Factory restore acknowledged; the module is rebooting
    Restored,
    /// Waiting for the banner after the restore reboot
    AwaitBannerAgain,
    /// Station/AP networking disabled
    ModeSet,
    /// BLE peripheral role selected
    BleRoleSet,
    /// Advertisement parameters configured
    AdvParamsSet,
    /// Advertising; the sequence succeeded
    Advertising,
    /// A step failed; the link must not be used for advertising
    Failed,
}

impl InitStage {
    /// Stage name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            InitStage::PoweredOff => "PoweredOff",
            InitStage::AwaitBanner => "AwaitBanner",
            InitStage::Restored => "Restored",
            InitStage::AwaitBannerAgain => "AwaitBannerAgain",
            InitStage::ModeSet => "ModeSet",
            InitStage::BleRoleSet => "BleRoleSet",
            InitStage::AdvParamsSet => "AdvParamsSet",
            InitStage::Advertising => "Advertising",
            InitStage::Failed => "Failed",
        }
    }
}

/// One step of the bring-up sequence
struct InitStep {
    /// Stage reached when the step settles successfully
    stage: InitStage,
    /// Command to send; `None` listens for an unsolicited banner
    command: Option<&'static str>,
}

const INIT_STEPS: &[InitStep] = &[
    InitStep {
        stage: InitStage::AwaitBanner,
        command: None,
    },
    InitStep {
        stage: InitStage::Restored,
        command: Some(CMD_RESTORE),
    },
    InitStep {
        stage: InitStage::AwaitBannerAgain,
        command: None,
    },
    InitStep {
        stage: InitStage::ModeSet,
        command: Some(CMD_DISABLE_NETWORKING),
    },
    InitStep {
        stage: InitStage::BleRoleSet,
        command: Some(CMD_BLE_SERVER_ROLE),
    },
    InitStep {
        stage: InitStage::AdvParamsSet,
        command: Some(CMD_ADV_PARAMS),
    },
    InitStep {
        stage: InitStage::Advertising,
        command: Some(CMD_ADV_START),
    },
];

impl<T: Transport + 'static> RadioLink<T> {
    /// Brings the module into advertiser mode
    ///
    /// A no-op when the link is already initialized. Any step failing marks
    /// the link [`InitStage::Failed`] and propagates [`Error::Init`]; the
    /// caller must not start advertising in that case.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.run_init_sequence().await
    }

    /// Forces a fresh bring-up, power-cycling a previously running module
    pub async fn reinitialize(&mut self) -> Result<()> {
        self.set_initialized(false);
        self.run_init_sequence().await
    }

    async fn run_init_sequence(&mut self) -> Result<()> {
        info!("starting radio module bring-up");
        let timeout = self.config().init_timeout;

        if let Err(e) = self.power_cycle().await {
            self.set_stage(InitStage::Failed);
            return Err(e);
        }
        self.set_stage(InitStage::PoweredOff);

        for step in INIT_STEPS {
            let outcome = if step.command.is_some() {
                self.exchange(step.command, reply_complete, timeout).await
            } else {
                self.exchange(None, banner_seen, timeout).await
            };

            match outcome {
                Err(e) => {
                    self.set_stage(InitStage::Failed);
                    return Err(e);
                }
                Ok(ExchangeOutcome::TimedOut(_)) => {
                    warn!("bring-up stalled before {}", step.stage.name());
                    self.set_stage(InitStage::Failed);
                    return Err(Error::init(step.stage.name(), "no reply before timeout"));
                }
                Ok(ExchangeOutcome::Completed(data)) => {
                    if reply_failed(&data) {
                        self.set_stage(InitStage::Failed);
                        return Err(Error::init(
                            step.stage.name(),
                            String::from_utf8_lossy(&data).trim().to_string(),
                        ));
                    }
                    info!("bring-up reached {}", step.stage.name());
                    self.set_stage(step.stage);
                }
            }
        }

        self.set_initialized(true);
        info!("radio module advertising");
        Ok(())
    }
}
