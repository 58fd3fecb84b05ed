use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

use super::camera::{Camera, CameraError};
use super::decoder::decode;
use super::record::{ScanCandidate, ScanRecord};
use super::store::ScanStore;
use super::StoreError;

/// How long an error banner stays visible.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("camera failure: {0}")]
    Camera(#[from] CameraError),
}

/// Transient error message.
#[derive(Debug, Clone)]
pub struct Banner {
    message: String,
    raised_at: Instant,
}

impl Banner {
    pub fn new(message: impl Into<String>) -> Banner {
        Banner {
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < BANNER_TIMEOUT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Confirming {
        pending: ScanCandidate,
        camera_active: bool,
    },
}

/// State of the scan/entry flow. Idle -> Scanning -> Confirming -> Idle, with
/// manual entry going from Idle straight to Confirming.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    banner: Option<Banner>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            state: SessionState::Idle,
            banner: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pending(&self) -> Option<&ScanCandidate> {
        match &self.state {
            SessionState::Confirming { pending, .. } => Some(pending),
            _ => None,
        }
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.visible_banner(Instant::now())
    }

    pub fn visible_banner(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|banner| banner.is_visible_at(now))
    }

    /// Replaces any current banner.
    pub fn notify(&mut self, message: impl Into<String>) {
        let banner = Banner::new(message);
        warn!("{}", banner.message());
        self.banner = Some(banner);
    }

    /// Returns whether scanning started. Starting while scanning or confirming
    /// does nothing.
    pub fn start_scan(&mut self, camera: &mut dyn Camera) -> bool {
        if self.state != SessionState::Idle {
            debug!("scan already in progress, state={:?}", self.state);
            return false;
        }

        match camera.start() {
            Ok(()) => {
                self.state = SessionState::Scanning;
                true
            },
            Err(err) => {
                self.notify(format!("Camera access failed: {}", err));
                self.state = SessionState::Idle;
                false
            },
        }
    }

    /// Feeds one payload read while scanning. A malformed payload raises a
    /// banner and keeps the camera running.
    pub fn on_payload(&mut self, payload: &str) -> bool {
        if self.state != SessionState::Scanning {
            debug!("ignoring payload outside of a scan, state={:?}", self.state);
            return false;
        }

        match decode(payload) {
            Ok(candidate) => {
                self.state = SessionState::Confirming {
                    pending: candidate,
                    camera_active: true,
                };
                true
            },
            Err(err) => {
                self.notify(err.to_string());
                false
            },
        }
    }

    /// Ends a scan that produced nothing to confirm.
    pub fn stop_scan(&mut self, camera: &mut dyn Camera) -> Result<(), SessionError> {
        if self.state != SessionState::Scanning {
            return Ok(());
        }

        self.release_camera(camera, true)?;
        self.state = SessionState::Idle;

        Ok(())
    }

    /// Both fields are trimmed and must be non-empty. Entering manually while
    /// the camera runs keeps it running until the entry is accepted or rejected.
    pub fn manual_entry(&mut self, part_no: &str, mrp: &str) -> bool {
        let camera_active = match self.state {
            SessionState::Idle => false,
            SessionState::Scanning => true,
            SessionState::Confirming { .. } => {
                debug!("manual entry ignored while confirming");
                return false;
            },
        };

        let (part_no, mrp) = (part_no.trim(), mrp.trim());
        if part_no.is_empty() || mrp.is_empty() {
            self.notify("Please enter both Part No and MRP.");
            return false;
        }

        self.state = SessionState::Confirming {
            pending: ScanCandidate::new(part_no, mrp),
            camera_active,
        };

        true
    }

    /// Persists the pending record and returns to Idle. `Ok(None)` when there
    /// was nothing to confirm. If the camera fails to stop, nothing is saved and
    /// the record stays pending.
    pub fn accept(&mut self, store: &mut ScanStore, camera: &mut dyn Camera) -> Result<Option<ScanRecord>, SessionError> {
        let Some(pending) = self.finish_confirming(camera)? else {
            return Ok(None);
        };

        match store.save(&pending) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                self.notify(format!("Failed to save scan: {}", err));
                Err(err.into())
            },
        }
    }

    /// Discards the pending record and returns to Idle.
    pub fn reject(&mut self, camera: &mut dyn Camera) -> Result<Option<ScanCandidate>, SessionError> {
        let Some(pending) = self.finish_confirming(camera)? else {
            return Ok(None);
        };

        debug!("discarded scan, part_no={}, mrp={}", pending.part_no, pending.mrp);

        Ok(Some(pending))
    }

    /// Stops the camera first and leaves Confirming only once it has stopped.
    fn finish_confirming(&mut self, camera: &mut dyn Camera) -> Result<Option<ScanCandidate>, SessionError> {
        let camera_active = match &self.state {
            SessionState::Confirming { camera_active, .. } => *camera_active,
            _ => return Ok(None),
        };

        self.release_camera(camera, camera_active)?;

        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Confirming { pending, .. } => Ok(Some(pending)),
            _ => Ok(None),
        }
    }

    fn release_camera(&mut self, camera: &mut dyn Camera, camera_active: bool) -> Result<(), SessionError> {
        if camera_active {
            if let Err(err) = camera.stop() {
                self.notify(format!("Failed to stop camera: {}", err));
                return Err(err.into());
            }
        }

        Ok(())
    }
}
