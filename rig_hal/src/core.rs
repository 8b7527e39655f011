//! Rig core struct and frame loop management.
//!
//! The `RigCore` struct is the main entry point for rig operations.
//! It creates and starts components, ticks them once per frame and runs the
//! shutdown sequence exactly once.

use rig_common::rig::component::{Component, RigError};
use rig_common::rig::config::RigConfig;
use rig_common::rig::types::{ComponentStatus, FrameInput};
use rig_common::serial::LinkOpener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::component_registry::ComponentRegistry;
use crate::input::PointerSource;

/// Frames between debug summaries.
const SUMMARY_INTERVAL: u64 = 600;

/// Rig core manages components and the frame loop.
pub struct RigCore {
    /// Rig configuration
    config: RigConfig,
    /// Started components, in tick order
    components: Vec<Box<dyn Component>>,
    /// Latest status per component (same order as `components`)
    statuses: Vec<Option<ComponentStatus>>,
    /// Cleared to request a stop; set from construction so a request made
    /// before `run` is honoured
    running: Arc<AtomicBool>,
    /// Frame period from config
    cycle_time: Duration,
    /// Timing statistics
    stats: TimingStats,
    /// Shutdown sequence already ran
    shut_down: bool,
}

/// Timing statistics for frame loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of frames executed
    pub cycle_count: u64,
    /// Number of frames whose work exceeded the frame period
    pub timing_violations: u64,
    /// Maximum observed frame work time
    pub max_cycle_time_us: u64,
    /// Sum of frame work times for average calculation
    pub total_cycle_time_us: u64,
}

impl TimingStats {
    /// Average frame work time in microseconds.
    pub fn avg_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }

    fn record(&mut self, cycle_time_us: u64, budget_us: u64) -> bool {
        self.cycle_count += 1;
        self.total_cycle_time_us += cycle_time_us;
        self.max_cycle_time_us = self.max_cycle_time_us.max(cycle_time_us);
        let violated = cycle_time_us > budget_us;
        if violated {
            self.timing_violations += 1;
        }
        violated
    }
}

impl RigCore {
    /// Create a new RigCore with the given configuration.
    ///
    /// # Errors
    /// Returns `RigError::ConfigError` if validation fails.
    pub fn new(config: RigConfig) -> Result<Self, RigError> {
        config.validate()?;

        let cycle_time = config.cycle_time();
        info!(
            "RigCore created for '{}' with components {:?}, cycle_time={}us",
            config.shared.service_name,
            config.enabled_components(),
            config.host.cycle_time_us
        );

        Ok(Self {
            config,
            components: Vec::new(),
            statuses: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            cycle_time,
            stats: TimingStats::default(),
            shut_down: false,
        })
    }

    /// Create and start the named components.
    ///
    /// Components are started in the order given. If any of them fails to
    /// be created or started, every component created so far (including the
    /// failing one) is shut down before the error is returned.
    ///
    /// # Errors
    /// Returns the first creation or start error.
    pub fn init(
        &mut self,
        registry: &ComponentRegistry,
        names: &[&str],
        opener: &dyn LinkOpener,
    ) -> Result<(), RigError> {
        if names.is_empty() {
            return Err(RigError::InitFailed(
                "no components selected (add a [servo] or [distance] section)".to_string(),
            ));
        }

        info!("Initializing RigCore with components {:?}...", names);

        for name in names {
            let mut component = match registry.create(name, &self.config) {
                Ok(component) => component,
                Err(e) => {
                    error!("Cannot create component '{}': {}", name, e);
                    self.shutdown_quietly();
                    return Err(e);
                }
            };

            // Kept even when start fails so shutdown still reaches it.
            let started = component.start(opener);
            self.components.push(component);
            self.statuses.push(None);

            if let Err(e) = started {
                error!("Component '{}' failed to start: {}", name, e);
                self.shutdown_quietly();
                return Err(e);
            }
        }

        info!("RigCore initialized with {} components", self.components.len());
        Ok(())
    }

    /// Execute one frame: tick every component in order.
    ///
    /// # Errors
    /// Returns the first fatal component error; later components are not
    /// ticked in that frame.
    pub fn tick(&mut self, frame: &FrameInput, dt: Duration) -> Result<(), RigError> {
        for (component, status) in self.components.iter_mut().zip(self.statuses.iter_mut()) {
            match component.tick(frame, dt) {
                Ok(s) => *status = Some(s),
                Err(e) => {
                    error!("Component '{}' failed: {}", component.name(), e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Run the frame loop.
    ///
    /// Blocks until shutdown is requested via the running flag, `max_frames`
    /// frames have run, or a component fails fatally. Returns without running
    /// a frame if a stop was requested before the call.
    ///
    /// # Errors
    /// Returns the fatal component error that stopped the loop.
    pub fn run(
        &mut self,
        pointer: &mut dyn PointerSource,
        max_frames: Option<u64>,
    ) -> Result<(), RigError> {
        if self.components.is_empty() {
            return Err(RigError::InitFailed("RigCore not initialized".to_string()));
        }

        if !self.running.load(Ordering::SeqCst) {
            info!("Stop requested before the frame loop started");
            return Ok(());
        }

        info!(
            "Starting frame loop (cycle_time={}us)...",
            self.cycle_time.as_micros()
        );

        let budget_us = self.config.host.cycle_time_us as u64;
        let loop_start = Instant::now();
        let mut last_cycle = loop_start;
        let mut result = Ok(());

        while self.running.load(Ordering::SeqCst) {
            if max_frames.is_some_and(|max| self.stats.cycle_count >= max) {
                info!("Reached frame limit ({} frames)", self.stats.cycle_count);
                break;
            }

            let cycle_start = Instant::now();
            let dt = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            let frame = FrameInput::with_pointer(pointer.sample(cycle_start - loop_start));
            if let Err(e) = self.tick(&frame, dt) {
                result = Err(e);
                break;
            }

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            if self.stats.record(cycle_time_us, budget_us)
                && (self.stats.timing_violations <= 10
                    || self.stats.timing_violations % 1000 == 0)
            {
                warn!(
                    "Timing violation #{}: frame took {}us (target {}us)",
                    self.stats.timing_violations, cycle_time_us, budget_us
                );
            }

            if self.stats.cycle_count % SUMMARY_INTERVAL == 0 {
                self.log_summary();
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Frame loop stopped after {} frames (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
        result
    }

    /// Run every component's shutdown sequence.
    ///
    /// Idempotent: the sequence runs once, later calls return `Ok`. All
    /// components are shut down even if one of them fails; the first failure
    /// is returned.
    pub fn shutdown(&mut self) -> Result<(), RigError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.running.store(false, Ordering::SeqCst);
        info!("Shutdown requested");

        let mut first_error = None;
        for component in self.components.iter_mut().rev() {
            let diag = component.diagnostics();
            info!(
                "Component '{}': {} ticks, {} lines written, {} read, {} timeouts, {} malformed",
                component.name(),
                diag.ticks,
                diag.lines_written,
                diag.lines_read,
                diag.timeouts,
                diag.parse_errors
            );
            if let Err(e) = component.shutdown() {
                warn!("Component '{}' shutdown failed: {}", component.name(), e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn shutdown_quietly(&mut self) {
        if let Err(e) = self.shutdown() {
            debug!("Shutdown after failed init reported: {}", e);
        }
    }

    fn log_summary(&self) {
        debug!(
            "Frame loop: {} frames, avg={}us, max={}us, violations={}",
            self.stats.cycle_count,
            self.stats.avg_cycle_time_us(),
            self.stats.max_cycle_time_us,
            self.stats.timing_violations
        );
        for status in self.statuses.iter().flatten() {
            debug!("  {:?}", status);
        }
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Names of the started components, in tick order.
    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Latest status of each component, in tick order.
    pub fn statuses(&self) -> &[Option<ComponentStatus>] {
        &self.statuses
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        self.stats
    }

    /// Whether the shutdown sequence has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for RigCore {
    fn drop(&mut self) {
        if !self.shut_down {
            self.shutdown_quietly();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_stats_average_and_violations() {
        let mut stats = TimingStats::default();
        assert_eq!(stats.avg_cycle_time_us(), 0);
        assert!(!stats.record(100, 1000));
        assert!(stats.record(3000, 1000));
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.timing_violations, 1);
        assert_eq!(stats.max_cycle_time_us, 3000);
        assert_eq!(stats.avg_cycle_time_us(), 1550);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = RigConfig::default();
        config.host.cycle_time_us = 0;
        assert!(matches!(RigCore::new(config), Err(RigError::ConfigError(_))));
    }

    #[test]
    fn init_without_components_fails() {
        let mut core = RigCore::new(RigConfig::default()).unwrap();
        let opener = crate::transport::LoopbackOpener::new();
        let result = core.init(&ComponentRegistry::with_builtin(), &[], &opener);
        assert!(matches!(result, Err(RigError::InitFailed(_))));
    }
}
