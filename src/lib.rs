//! Face tracking core for real-time virtual eyewear try-on.
//!
//! Given per-frame face landmarks from an external detector, this library
//! computes where a pair of glasses should sit on the face, smooths that
//! placement over time, and keeps a depth-only occluder mesh aligned with
//! the face so temple arms disappear behind the head.
//!
//! The per-frame pipeline consists of:
//! 1. Landmark conversion from normalized detector space into scene space
//! 2. Pose estimation: orthonormal face basis, anchor position and scale
//! 3. Movement-adaptive temporal smoothing of the overlay transform
//! 4. Occluder update from the face oval
//!
//! The renderer, the video source and the detector are external; they are
//! reached through the traits in [`scene`], [`video`] and [`detector`].
//!
//! # Examples
//!
//! ## Estimating a pose
//!
//! ```no_run
//! use eyewear_tryon::{
//!     config::PlacementConfig,
//!     landmarks::FaceLandmarks,
//!     pose_estimation::PoseEstimator,
//!     synthetic::SyntheticFace,
//! };
//!
//! # fn main() -> eyewear_tryon::Result<()> {
//! let landmarks = SyntheticFace::frontal(640, 480).with_yaw(15.0).landmarks();
//! let face = FaceLandmarks::new(&landmarks, 640, 480)?;
//!
//! let estimator = PoseEstimator::new(PlacementConfig::default());
//! let pose = estimator.estimate(&face, None)?;
//! let euler = pose.transform.euler_degrees();
//! println!("Yaw: {:.1}°, scale {:.2}", euler.y, pose.transform.scale.x);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a session
//!
//! ```no_run
//! use eyewear_tryon::{
//!     config::Config,
//!     scene::{HeadlessNode, HeadlessOccluder, SceneHandles},
//!     session::TryOnSession,
//!     synthetic::{SyntheticDetector, SyntheticLoader},
//!     video::StaticVideo,
//! };
//!
//! # fn main() -> eyewear_tryon::Result<()> {
//! let overlay = HeadlessNode::new();
//! let scene = SceneHandles::new(Box::new(overlay.clone()), Box::new(HeadlessOccluder::new()));
//! let mut session = TryOnSession::new(Config::default(), scene)?;
//!
//! let mut video = StaticVideo::new(640, 480);
//! let mut loader = SyntheticLoader::new(SyntheticDetector::new(7));
//! session.start(&mut loader, &video, |progress| println!("{progress:?}"))?;
//!
//! for frame in 0..90 {
//!     video.advance();
//!     session.run_cycle(&video, f64::from(frame) * 33.3);
//! }
//! println!("Overlay visible: {}", overlay.state().visible);
//!
//! session.stop();
//! # Ok(())
//! # }
//! ```

/// Landmark storage and scene-space conversion
pub mod landmarks;

/// Position, orientation and scale of scene nodes
pub mod transform;

/// Face basis, anchor position and scale from landmarks
pub mod pose_estimation;

/// Temporal smoothing of the overlay transform
pub mod filters;

/// Depth-only occluder mesh following the face oval
pub mod occlusion;

/// Landmark detector seam
pub mod detector;

/// Renderer scene-graph seam
pub mod scene;

/// Video source seam
pub mod video;

/// Cancellable cycle scheduling
pub mod scheduler;

/// Frame driver state machine
pub mod session;

/// Synthetic faces and detector for demos and tests
pub mod synthetic;

/// Error types and result handling
pub mod error;

/// Headless demo application
pub mod app;

/// Constants used throughout the pipeline
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
