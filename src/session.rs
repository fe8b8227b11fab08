//! Frame driver: detector lifecycle and the per-frame tracking cycle.
//!
//! A `TryOnSession` owns everything the cycle touches: the loaded detector,
//! the pose estimator, the smoothing filter, the occluder mesh, the scene
//! handles and the scheduler. States run
//! `Idle → AwaitingDetector → Tracking → Stopped`; `Stopped` is terminal.
//!
//! Each cycle reads the current video frame, runs detection, and either
//! places the overlay and occluder or hides both. Losing the face or a
//! failed detection also resets the smoother; a degenerate frame does not.
//! At most one detection is outstanding at a time; a cycle that finds one
//! in flight is skipped, not queued.

use crate::{
    config::Config,
    constants::{OCCLUDER_RENDER_ORDER, OVERLAY_RENDER_ORDER},
    detector::{Detection, DetectorLoader, FaceObservation, LandmarkDetector},
    filters::{SmoothingStep, TransformFilter},
    landmarks::FaceLandmarks,
    occlusion::OcclusionMesh,
    pose_estimation::PoseEstimator,
    scene::SceneHandles,
    scheduler::{CancelHandle, CycleScheduler},
    video::{VideoFrame, VideoSource},
    Error, Result,
};
use log::{debug, info, trace, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingDetector,
    Tracking,
    Stopped,
}

/// Initialization progress reported to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    LoadingDetector,
    DetectorReady,
    Tracking,
    Failed(String),
}

/// Why the overlay was hidden this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    NoFace,
    DetectionFailed,
    Degenerate,
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Overlay and occluder were placed
    Tracked(SmoothingStep),
    /// Overlay and occluder were hidden; smoothing is reset unless the
    /// frame was merely degenerate
    Hidden(HideReason),
    /// A detection was already outstanding
    Skipped,
    /// No cycle was requested
    NotDue,
    /// The session is stopped or its scheduler cancelled
    Cancelled,
}

/// Running counters for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub cycles: u64,
    pub tracked: u64,
    pub hidden: u64,
    pub skipped: u64,
    pub detection_errors: u64,
}

/// Tracking session driving one overlay and one occluder
pub struct TryOnSession {
    config: Config,
    state: SessionState,
    scene: SceneHandles,
    estimator: PoseEstimator,
    filter: Box<dyn TransformFilter>,
    occluder: Option<OcclusionMesh>,
    detector: Option<Box<dyn LandmarkDetector>>,
    scheduler: Option<CycleScheduler>,
    in_flight: bool,
    stats: SessionStats,
}

impl TryOnSession {
    /// Create an idle session and prepare the scene nodes
    ///
    /// Sets render orders so the occluder fills depth before the overlay
    /// draws, uploads the occluder's index buffer and hides both nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: Config, mut scene: SceneHandles) -> Result<Self> {
        config.validate()?;

        let filter = config.create_filter()?;
        let estimator = PoseEstimator::new(config.placement.clone());
        let occluder = if config.occluder.enabled {
            Some(OcclusionMesh::face_oval(&config.occluder)?)
        } else {
            None
        };

        scene.occluder.set_render_order(OCCLUDER_RENDER_ORDER);
        scene.overlay.set_render_order(OVERLAY_RENDER_ORDER);
        if let Some(mesh) = &occluder {
            scene.occluder.set_indices(mesh.indices());
        }
        scene.set_visible(false);

        info!("Created try-on session with {} filter", filter.name());

        Ok(Self {
            config,
            state: SessionState::Idle,
            scene,
            estimator,
            filter,
            occluder,
            detector: None,
            scheduler: None,
            in_flight: false,
            stats: SessionStats::default(),
        })
    }

    /// Load the detector and schedule the first cycle
    ///
    /// Initialization is attempted once; a failed session stays stopped.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionState` unless the session is idle, and
    /// `Error::DetectorInit` if the detector cannot be loaded
    pub fn start<L, P>(&mut self, loader: &mut L, video: &dyn VideoSource, mut progress: P) -> Result<()>
    where
        L: DetectorLoader + ?Sized,
        P: FnMut(Progress),
    {
        if self.state != SessionState::Idle {
            return Err(Error::SessionState(format!("cannot start a session in state {:?}", self.state)));
        }

        self.state = SessionState::AwaitingDetector;
        progress(Progress::LoadingDetector);
        info!("Loading landmark detector");

        let detector = match loader.load() {
            Ok(detector) => detector,
            Err(e) => {
                self.state = SessionState::Stopped;
                let e = if matches!(e, Error::DetectorInit(_)) {
                    e
                } else {
                    Error::DetectorInit(e.to_string())
                };
                warn!("{e}");
                progress(Progress::Failed(e.to_string()));
                return Err(e);
            }
        };
        info!("Detector {} ready", detector.name());
        progress(Progress::DetectorReady);

        let mut scheduler = CycleScheduler::for_source(video, self.config.tracking.prefer_video_frame_callback);
        scheduler.request_next();

        self.detector = Some(detector);
        self.scheduler = Some(scheduler);
        self.state = SessionState::Tracking;
        progress(Progress::Tracking);

        Ok(())
    }

    /// Run one tracking cycle if one is due
    pub fn run_cycle(&mut self, video: &dyn VideoSource, timestamp_ms: f64) -> CycleOutcome {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return CycleOutcome::Cancelled;
        };
        if !scheduler.is_alive() || self.state != SessionState::Tracking {
            return CycleOutcome::Cancelled;
        }
        if !scheduler.take_due() {
            return CycleOutcome::NotDue;
        }

        let Some(frame) = self.begin_detection(video) else {
            return CycleOutcome::Skipped;
        };

        let result = match self.detector.as_mut() {
            Some(detector) => detector.detect(&frame, timestamp_ms),
            None => Err(Error::SessionState("no detector loaded".to_string())),
        };

        self.finish_detection(&frame, result)
    }

    /// Mark a detection as outstanding and return the frame to run it on
    ///
    /// Returns `None` and requests the next cycle when a detection is
    /// already outstanding, or `None` alone when the session is not tracking.
    pub fn begin_detection(&mut self, video: &dyn VideoSource) -> Option<VideoFrame> {
        if self.state != SessionState::Tracking {
            return None;
        }
        if self.in_flight {
            trace!("Detection in flight, skipping cycle");
            self.stats.skipped += 1;
            self.request_next();
            return None;
        }

        self.in_flight = true;
        Some(video.current_frame())
    }

    /// Apply a detection result to the scene and request the next cycle
    ///
    /// Results arriving after the session stopped are discarded.
    pub fn finish_detection(&mut self, frame: &VideoFrame, result: Result<Detection>) -> CycleOutcome {
        self.in_flight = false;
        if self.state != SessionState::Tracking || !self.scheduler.as_ref().is_some_and(CycleScheduler::is_alive) {
            return CycleOutcome::Cancelled;
        }
        self.stats.cycles += 1;

        let outcome = match result {
            Ok(detection) => match detection.primary() {
                Some(face) => match self.track(face, frame) {
                    Ok(step) => CycleOutcome::Tracked(step),
                    Err(e) => {
                        debug!("Skipping frame {}: {e}", frame.sequence);
                        self.hide(HideReason::Degenerate)
                    }
                },
                None => self.hide(HideReason::NoFace),
            },
            Err(e) => {
                warn!("Detection failed on frame {}: {e}", frame.sequence);
                self.stats.detection_errors += 1;
                self.hide(HideReason::DetectionFailed)
            }
        };

        self.request_next();
        outcome
    }

    fn track(&mut self, face: &FaceObservation, frame: &VideoFrame) -> Result<SmoothingStep> {
        let landmarks = FaceLandmarks::new(&face.landmarks, frame.width, frame.height)?;
        let pose = self.estimator.estimate(&landmarks, face.transformation.as_ref())?;

        // Occluder first so a failure leaves the smoother untouched
        if let Some(mesh) = self.occluder.as_mut() {
            mesh.update(&landmarks, &pose.basis, pose.measurements.face_width())?;
        }

        let step = self.filter.apply(&pose.transform);
        self.scene.overlay.set_transform(&step.transform);
        if let Some(mesh) = self.occluder.as_mut() {
            if mesh.take_dirty() {
                self.scene.occluder.write_vertices(mesh.vertices());
            }
        }

        self.scene.overlay.set_visible(true);
        self.scene.occluder.set_visible(self.occluder.is_some());
        self.stats.tracked += 1;

        if log::log_enabled!(log::Level::Trace) {
            let euler = step.transform.euler_degrees();
            trace!(
                "Frame {}: pitch {:.1}° yaw {:.1}° roll {:.1}° scale {:.3} (blend pos {:.2} rot {:.2})",
                frame.sequence,
                euler.x,
                euler.y,
                euler.z,
                step.transform.scale.x,
                step.position_blend,
                step.rotation_blend
            );
        }

        Ok(step)
    }

    fn hide(&mut self, reason: HideReason) -> CycleOutcome {
        self.scene.set_visible(false);
        // Degenerate frames keep the filtered transform
        if reason != HideReason::Degenerate {
            self.filter.reset();
        }
        self.stats.hidden += 1;
        CycleOutcome::Hidden(reason)
    }

    fn request_next(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.request_next();
        }
    }

    /// Stop tracking and release the detector
    ///
    /// Safe to call repeatedly. Close errors are logged, never returned.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.cancel();
        }
        if let Some(mut detector) = self.detector.take() {
            if let Err(e) = detector.close() {
                warn!("Failed to close detector {}: {e}", detector.name());
            }
        }
        self.filter.reset();
        self.scene.set_visible(false);
        self.in_flight = false;
        self.state = SessionState::Stopped;

        info!(
            "Session stopped after {} cycles ({} tracked, {} hidden, {} skipped)",
            self.stats.cycles, self.stats.tracked, self.stats.hidden, self.stats.skipped
        );
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the smoother holds state from an earlier frame
    #[must_use]
    pub fn is_smoothing(&self) -> bool {
        self.filter.is_ready()
    }

    #[must_use]
    pub fn scheduler(&self) -> Option<&CycleScheduler> {
        self.scheduler.as_ref()
    }

    /// Handle that cancels the cycle from outside the session
    #[must_use]
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.scheduler.as_ref().map(CycleScheduler::cancel_handle)
    }

    #[must_use]
    pub fn occluder(&self) -> Option<&OcclusionMesh> {
        self.occluder.as_ref()
    }
}

impl Drop for TryOnSession {
    fn drop(&mut self) {
        self.stop();
    }
}
