//! Group a sorted manifest into sender and receiver blocks.
//!
//! # Architecture
//!
//! ```text
//! Sorted manifest                 Grouped
//! ┌──────────────────────┐       ┌──────────────────────────┐
//! │ AL → BR  NIKE  AB1   │       │ AL                       │
//! │ AL → BR  PUMA  P1    │  →    │   → BR: [AB1, P1]        │
//! │ AL → CW  NIKE  AB2   │       │   → CW: [AB2]            │
//! │ BR → AL  NIKE  AB3   │       │ BR                       │
//! └──────────────────────┘       │   → AL: [AB3]            │
//!                                └──────────────────────────┘
//! ```
//!
//! Groups are contiguous runs, so the input must already be in manifest
//! order for each sender to appear once.

use serde::Serialize;

use crate::models::ProcessedRequest;

/// Requests from one sender to one receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverGroup {
    pub receiver: String,
    pub requests: Vec<ProcessedRequest>,
}

/// All requests leaving one sender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderGroup {
    pub sender: String,
    pub receivers: Vec<ReceiverGroup>,
}

impl SenderGroup {
    pub fn request_count(&self) -> usize {
        self.receivers.iter().map(|r| r.requests.len()).sum()
    }
}

/// Where a request sits relative to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// First request of the manifest
    Start,
    /// Sender differs from the previous request
    NewSender,
    /// Same sender, receiver differs
    NewReceiver,
    /// Same sender and receiver
    Continue,
}

impl Boundary {
    /// Whether a spacer belongs before this request.
    pub fn needs_spacer(self) -> bool {
        matches!(self, Boundary::NewSender | Boundary::NewReceiver)
    }
}

/// Boundary classification for each request, in order.
pub fn boundaries(requests: &[ProcessedRequest]) -> Vec<Boundary> {
    let mut previous: Option<&ProcessedRequest> = None;

    requests
        .iter()
        .map(|request| {
            let boundary = match previous {
                None => Boundary::Start,
                Some(prev) if prev.sender != request.sender => Boundary::NewSender,
                Some(prev) if prev.receiver != request.receiver => Boundary::NewReceiver,
                Some(_) => Boundary::Continue,
            };
            previous = Some(request);
            boundary
        })
        .collect()
}

/// Group contiguous runs of a manifest by sender, then receiver.
pub fn group_manifest(requests: &[ProcessedRequest]) -> Vec<SenderGroup> {
    let mut groups: Vec<SenderGroup> = Vec::new();

    for (request, boundary) in requests.iter().zip(boundaries(requests)) {
        match boundary {
            Boundary::Start | Boundary::NewSender => groups.push(SenderGroup {
                sender: request.sender.clone(),
                receivers: vec![ReceiverGroup::starting_with(request)],
            }),
            Boundary::NewReceiver => {
                if let Some(group) = groups.last_mut() {
                    group.receivers.push(ReceiverGroup::starting_with(request));
                }
            }
            Boundary::Continue => {
                if let Some(receiver) = groups.last_mut().and_then(|g| g.receivers.last_mut()) {
                    receiver.requests.push(request.clone());
                }
            }
        }
    }

    groups
}

impl ReceiverGroup {
    fn starting_with(request: &ProcessedRequest) -> Self {
        Self {
            receiver: request.receiver.clone(),
            requests: vec![request.clone()],
        }
    }
}
