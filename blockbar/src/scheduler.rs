//! Block scheduler
//!
//! Runs every block on one global tick and turns the results into snapshots.
//! A tick where any block fails produces no snapshot at all.

use crate::config::Config;
use crate::error::Result;
use crate::format::FormatEngine;
use crate::protocol::{ProtocolWriter, Snapshot};
use crate::runner;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Scheduler timing
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the global tick
    pub tick: Duration,
    /// Deadline for each block program
    pub block_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            block_timeout: runner::DEFAULT_DEADLINE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

pub struct Scheduler {
    config: Arc<Config>,
    settings: SchedulerConfig,
    engine: FormatEngine,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(config: Arc<Config>, settings: SchedulerConfig) -> Self {
        for block in &config.blocks {
            if block.interval != 0 && Duration::from_secs(block.interval) != settings.tick {
                log::warn!(
                    "Block '{}' asks for a {}s interval; all blocks run every {:?}",
                    block.name,
                    block.interval,
                    settings.tick
                );
            }
        }

        let engine = FormatEngine::new(config.clone());
        Self {
            config,
            settings,
            engine,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run and render every block in declaration order
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let mut items = Vec::with_capacity(self.config.blocks.len());

        for block in &self.config.blocks {
            log::debug!("Executing block: {}", block.name);
            let text = runner::run(self.settings.block_timeout, block.invocation(), &[]).await?;
            items.push(self.engine.render(block, &text)?);
        }

        Ok(items)
    }

    /// One tick: emit a snapshot, or log why this tick is skipped.
    ///
    /// Returns whether a snapshot was written. Only write errors are returned.
    pub async fn cycle<W: Write>(&mut self, out: &mut ProtocolWriter<W>) -> io::Result<bool> {
        self.state = SchedulerState::Running;
        match self.snapshot().await {
            Ok(snapshot) => {
                if let Err(e) = out.write_snapshot(&snapshot) {
                    self.state = SchedulerState::Stopped;
                    return Err(e);
                }
                Ok(true)
            }
            Err(e) => {
                log::error!("Skipping update: {}", e);
                Ok(false)
            }
        }
    }

    /// Tick until writing to the host fails
    pub async fn run<W: Write>(mut self, mut out: ProtocolWriter<W>) -> io::Result<()> {
        log::info!(
            "Scheduler started ({} blocks, tick {:?})",
            self.config.blocks.len(),
            self.settings.tick
        );

        let mut ticker = tokio::time::interval(self.settings.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.cycle(&mut out).await {
                log::error!("Failed to write to the bar: {}", e);
                return Err(e);
            }
        }
    }
}
