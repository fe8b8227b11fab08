//! Headless demo application driving a try-on session with synthetic input.

use crate::{
    config::Config,
    constants::DEFAULT_FPS,
    error::Result,
    scene::{HeadlessNode, HeadlessOccluder, SceneHandles},
    session::{CycleOutcome, HideReason, Progress, SessionStats, TryOnSession},
    synthetic::{DetectorStats, SyntheticDetector, SyntheticLoader},
    transform::RigidTransform,
    video::{StaticVideo, VideoSource},
};
use log::{debug, info};
use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Result of a demo run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub session: SessionStats,
    pub detector: DetectorStats,
    /// Last transform applied to the overlay
    pub last_transform: Option<RigidTransform>,
    /// Occluder vertex buffer uploads
    pub occluder_uploads: u64,
    /// Cycles per second of wall-clock time
    pub fps: f64,
}

/// Main application struct
pub struct TryOnApp {
    config: Config,
    session: TryOnSession,
    video: StaticVideo,
    loader: SyntheticLoader,
    detector_stats: Rc<RefCell<DetectorStats>>,
    overlay: HeadlessNode,
    occluder: HeadlessOccluder,
}

impl TryOnApp {
    /// Create the demo application
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing eyewear try-on demo");

        let demo = &config.demo;
        let video = StaticVideo::new(demo.width, demo.height);
        let detector = SyntheticDetector::new(demo.seed)
            .with_noise(demo.noise)
            .with_dropout_every(demo.dropout_every)
            .with_failure_every(demo.failure_every);
        let detector = if config.placement.orientation_source == crate::config::OrientationSource::DetectorMatrix {
            detector.with_matrix()
        } else {
            detector
        };
        let detector_stats = detector.stats();

        let overlay = HeadlessNode::new();
        let occluder = HeadlessOccluder::new();
        let scene = SceneHandles::new(Box::new(overlay.clone()), Box::new(occluder.clone()));
        let session = TryOnSession::new(config.clone(), scene)?;

        info!(
            "Synthetic {}x{} video, noise {:.2}px, seed {}",
            demo.width, demo.height, demo.noise, demo.seed
        );

        Ok(Self {
            config,
            session,
            video,
            loader: SyntheticLoader::new(detector),
            detector_stats,
            overlay,
            occluder,
        })
    }

    /// Run the configured number of cycles
    ///
    /// # Errors
    ///
    /// Returns an error if the detector fails to load
    pub fn run(&mut self) -> Result<RunSummary> {
        self.session
            .start(&mut self.loader, &self.video, |progress| match progress {
                Progress::Failed(reason) => log::error!("Initialization failed: {reason}"),
                other => info!("{other:?}"),
            })?;

        let frames = self.config.demo.frames;
        info!("Starting main loop for {frames} frames");

        let start_time = Instant::now();
        let mut last_report = Instant::now();
        let mut frame_count: u32 = 0;

        for index in 0..frames {
            self.video.advance();
            let timestamp_ms = f64::from(index) * 1000.0 / DEFAULT_FPS;

            match self.session.run_cycle(&self.video, timestamp_ms) {
                CycleOutcome::Tracked(step) if step.snapped => {
                    debug!("Frame {index}: tracking (re)acquired");
                }
                CycleOutcome::Tracked(_) => {}
                CycleOutcome::Hidden(HideReason::NoFace) => debug!("Frame {index}: no face"),
                CycleOutcome::Hidden(reason) => debug!("Frame {index}: overlay hidden ({reason:?})"),
                CycleOutcome::Skipped | CycleOutcome::NotDue => {}
                CycleOutcome::Cancelled => {
                    info!("Session cancelled at frame {index}");
                    break;
                }
            }
            frame_count += 1;

            if last_report.elapsed() >= Duration::from_secs(1) {
                info!("{:?}", self.session.stats());
                last_report = Instant::now();
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        let fps = if elapsed > 0.0 {
            f64::from(frame_count) / elapsed
        } else {
            0.0
        };

        let summary = RunSummary {
            session: self.session.stats(),
            detector: self.detector_stats.borrow().clone(),
            last_transform: self.overlay.state().transform,
            occluder_uploads: self.occluder.buffers().uploads,
            fps,
        };

        if let Some(transform) = &summary.last_transform {
            let euler = transform.euler_degrees();
            info!(
                "Final overlay: position ({:.1}, {:.1}, {:.1}) pitch {:.1}° yaw {:.1}° roll {:.1}° scale {:.3}",
                transform.position.x,
                transform.position.y,
                transform.position.z,
                euler.x,
                euler.y,
                euler.z,
                transform.scale.x
            );
        }
        info!(
            "Processed {} frames at {:.0} FPS: {} tracked, {} hidden, {} detection errors",
            frame_count, fps, summary.session.tracked, summary.session.hidden, summary.session.detection_errors
        );

        Ok(summary)
    }

    /// Stop the session and release the detector
    pub fn shutdown(&mut self) {
        info!("Application shutting down");
        self.session.stop();
    }

    #[must_use]
    pub fn frame_size(&self) -> (u32, u32) {
        self.video.dimensions()
    }
}
