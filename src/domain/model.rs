use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Encoded raster image as received from the chat. Cheap to clone, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBytes(Arc<[u8]>);

impl PhotoBytes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for PhotoBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl Deref for PhotoBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for PhotoBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Axis-aligned slot rectangle in template pixels, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl SlotBox {
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn overlaps(&self, other: &SlotBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 <= width && self.y1 <= height
    }
}

/// Soft drop-shadow drawn for each slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    pub alpha: u8,
    pub blur_sigma: f32,
    pub offset_y: u32,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            alpha: 40,
            blur_sigma: 3.0,
            offset_y: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// Opaque reference to the status message of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Per-request state, owned by the task that runs the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: u64,
    pub photo: PhotoBytes,
    pub status: StatusHandle,
    pub state: RequestState,
}

impl RequestContext {
    pub fn new(request_id: u64, photo: PhotoBytes, status: StatusHandle) -> Self {
        Self {
            request_id,
            photo,
            status,
            state: RequestState::Pending,
        }
    }

    /// Moves a pending request to a terminal state; terminal states are final.
    pub fn finish(&mut self, state: RequestState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = state;
        true
    }

    pub fn outcome(&self, error: Option<String>) -> RequestOutcome {
        RequestOutcome {
            request_id: self.request_id,
            state: self.state,
            error,
        }
    }
}

/// Terminal record of one spawned request.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request_id: u64,
    pub state: RequestState,
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RequestState::Succeeded
    }
}
