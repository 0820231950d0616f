//! Frame acquisition and the capture loop.
//!
//! The loop is deliberately sequential: grab a frame, look for a QR code,
//! reconcile it, sleep. The sleep is added after the work, so the period
//! drifts by however long the network calls took.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use image::GrayImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use qrattend_core::checkin::{reconcile, CheckInError, CheckInOutcome};
use qrattend_core::qr;
use qrattend_core::{Directory, DirectoryCache};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[cfg(feature = "camera")]
    #[error("camera error: {0}")]
    Camera(#[from] nokhwa::NokhwaError),

    #[error("camera returned a malformed frame")]
    MalformedFrame,
}

/// Something that produces grayscale frames on demand.
pub trait FrameSource {
    /// Name used in log output.
    fn name(&self) -> &'static str;

    /// Acquire one frame. Blocks until the device answers.
    fn read_frame(&mut self) -> Result<GrayImage, CaptureError>;
}

/// A local video device, opened once and released on drop.
#[cfg(feature = "camera")]
pub struct CameraSource {
    camera: nokhwa::Camera,
}

#[cfg(feature = "camera")]
impl CameraSource {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)?;
        camera.open_stream()?;
        info!(index, "Camera opened");
        Ok(Self { camera })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for CameraSource {
    fn name(&self) -> &'static str {
        "camera"
    }

    fn read_frame(&mut self) -> Result<GrayImage, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;

        let frame = self.camera.frame()?;
        let decoded = frame.decode_image::<RgbFormat>()?;
        let (width, height) = (decoded.width(), decoded.height());
        let rgb = image::RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or(CaptureError::MalformedFrame)?;
        Ok(image::DynamicImage::ImageRgb8(rgb).to_luma8())
    }
}

#[cfg(feature = "camera")]
impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!(error = %e, "Failed to release camera");
        } else {
            info!("Camera released");
        }
    }
}

/// Where the loop is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingFrame,
    Reconciling,
}

/// Result of one tick, mostly for logging and tests.
#[derive(Debug)]
pub enum TickOutcome {
    FrameUnavailable,
    NoCode,
    Undecodable,
    Reconciled(CheckInOutcome),
    Aborted(CheckInError),
}

pub struct CaptureLoop<D> {
    source: Box<dyn FrameSource>,
    directory: D,
    cache: DirectoryCache,
    interval: Duration,
    preview_path: Option<PathBuf>,
    state: LoopState,
}

impl<D: Directory> CaptureLoop<D> {
    pub fn new(
        source: Box<dyn FrameSource>,
        directory: D,
        cache: DirectoryCache,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            directory,
            cache,
            interval,
            preview_path: None,
            state: LoopState::AwaitingFrame,
        }
    }

    /// Write every grayscale frame to `path` for debugging the camera view.
    pub fn with_preview(mut self, path: PathBuf) -> Self {
        self.preview_path = Some(path);
        self
    }

    /// One pass: frame, decode, reconcile. Never fails; problems are logged
    /// and the next tick starts from scratch.
    pub async fn tick(&mut self, today: NaiveDate) -> TickOutcome {
        self.state = LoopState::AwaitingFrame;

        let frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Error reading frame");
                return TickOutcome::FrameUnavailable;
            }
        };

        if let Some(ref path) = self.preview_path {
            write_preview(path, &frame);
        }

        let code = match qr::decode_frame(&frame) {
            Ok(Some(code)) => code,
            Ok(None) => return TickOutcome::NoCode,
            Err(e) => {
                warn!(error = %e, "Error getting QR code");
                return TickOutcome::Undecodable;
            }
        };
        debug!(code = %code, "Found QR code");

        self.state = LoopState::Reconciling;
        let result = reconcile(&self.directory, &mut self.cache, &code, today).await;
        self.state = LoopState::AwaitingFrame;

        match result {
            Ok(outcome) => TickOutcome::Reconciled(outcome),
            Err(e) => TickOutcome::Aborted(e),
        }
    }

    /// Tick, sleep, repeat until interrupted. Dropping `self` afterwards
    /// releases the frame source.
    pub async fn run(mut self) -> Result<()> {
        info!(
            source = self.source.name(),
            interval = ?self.interval,
            cache = self.cache.is_enabled(),
            "Capture loop started"
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                signal = &mut shutdown => {
                    signal.context("Failed to listen for interrupt signal")?;
                    break;
                }
                _ = self.cycle() => {}
            }
        }

        if self.state == LoopState::Reconciling {
            warn!("Interrupted while a check-in was in flight, it may not have been recorded");
        }
        info!("Capture loop stopped");
        Ok(())
    }

    async fn cycle(&mut self) {
        let today = Local::now().date_naive();
        let outcome = self.tick(today).await;
        log_outcome(&outcome);
        tokio::time::sleep(self.interval).await;
    }
}

fn log_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Reconciled(CheckInOutcome::CheckedIn { user_id, title, .. }) => {
            info!(user = %user_id, title = %title, "Checked in");
        }
        TickOutcome::Reconciled(CheckInOutcome::AlreadyCheckedIn {
            user_id,
            attendance_id,
            ..
        }) => {
            debug!(user = %user_id, attendance = %attendance_id, "Already checked in");
        }
        TickOutcome::Aborted(e) => warn!(error = %e, "Check-in abandoned this cycle"),
        _ => {}
    }
}

fn write_preview(path: &Path, frame: &GrayImage) {
    if let Err(e) = frame.save(path) {
        debug!(path = %path.display(), error = %e, "Failed to write preview frame");
    }
}
