//! Focus controller - camera moves with cancellable arrival signals.
//!
//! Every request gets a ticket. The move (and, for command glyphs, the
//! impact shake) runs in a spawned timer task that reports back through a
//! channel. A new request aborts the previous task and invalidates its
//! ticket, so at most one arrival is ever accepted per request and a
//! superseded request never arrives.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::TimingConfig;
use crate::layout::{CameraPose, FocusTarget, Layout};

/// Identifies one focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FocusTicket(u64);

impl FocusTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// The camera has reached a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub ticket: FocusTicket,
    pub target: FocusTarget,
}

/// Messages produced by focus timer tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum FocusSignal {
    /// The move finished on a command glyph; shake the scene.
    ImpactShake {
        ticket: FocusTicket,
        duration: Duration,
        intensity: f32,
    },
    Arrived(Arrival),
}

/// Result of a focus request.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusRequest {
    pub ticket: FocusTicket,
    pub target: FocusTarget,
    /// `None` when the target has no position; arrival is already queued.
    pub pose: Option<CameraPose>,
    pub duration: Duration,
}

/// Drives the virtual camera, one request at a time.
pub struct FocusController {
    catalog: Arc<Catalog>,
    layout: Layout,
    move_duration: Duration,
    shake_duration: Duration,
    shake_intensity: f32,
    next_ticket: u64,
    current: Option<FocusTicket>,
    pending: Option<AbortHandle>,
    signals: mpsc::UnboundedSender<FocusSignal>,
}

impl FocusController {
    /// Create a controller and the receiver its signals arrive on.
    pub fn new(
        catalog: Arc<Catalog>,
        layout: Layout,
        timing: &TimingConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FocusSignal>) {
        let (signals, rx) = mpsc::unbounded_channel();
        let controller = Self {
            catalog,
            layout,
            move_duration: timing.focus_move(),
            shake_duration: timing.impact_shake(),
            shake_intensity: timing.impact_shake_intensity,
            next_ticket: 0,
            current: None,
            pending: None,
            signals,
        };
        (controller, rx)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Move the camera to `target`, superseding any request in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_focus(&mut self, target: FocusTarget) -> FocusRequest {
        self.cancel();

        self.next_ticket += 1;
        let ticket = FocusTicket(self.next_ticket);
        self.current = Some(ticket);

        let Some(pose) = self.layout.resolve(&target, &self.catalog) else {
            debug!(target = %target, ticket = ticket.0, "Focus target has no position, arriving immediately");
            // The receiver lives as long as the owner; a closed channel only
            // happens during shutdown.
            let _ = self.signals.send(FocusSignal::Arrived(Arrival {
                ticket,
                target: target.clone(),
            }));
            return FocusRequest {
                ticket,
                target,
                pose: None,
                duration: Duration::ZERO,
            };
        };

        debug!(target = %target, ticket = ticket.0, "Focus requested");

        let signals = self.signals.clone();
        let move_duration = self.move_duration;
        let shake = target
            .is_command()
            .then_some((self.shake_duration, self.shake_intensity));
        let arrival = Arrival {
            ticket,
            target: target.clone(),
        };

        let handle = tokio::spawn(async move {
            tokio::time::sleep(move_duration).await;

            if let Some((duration, intensity)) = shake {
                let _ = signals.send(FocusSignal::ImpactShake {
                    ticket,
                    duration,
                    intensity,
                });
                tokio::time::sleep(duration).await;
            }

            let _ = signals.send(FocusSignal::Arrived(arrival));
        });
        self.pending = Some(handle.abort_handle());

        FocusRequest {
            ticket,
            target,
            pose: Some(pose),
            duration: move_duration,
        }
    }

    /// Whether `ticket` belongs to the request in flight.
    pub fn is_current(&self, ticket: FocusTicket) -> bool {
        self.current == Some(ticket)
    }

    /// Consume an arrival. Returns `false` for stale arrivals, which must be
    /// ignored by the caller.
    pub fn accept(&mut self, arrival: &Arrival) -> bool {
        if !self.is_current(arrival.ticket) {
            debug!(
                target = %arrival.target,
                ticket = arrival.ticket.0,
                "Dropping stale focus arrival"
            );
            return false;
        }
        self.current = None;
        self.pending = None;
        true
    }

    /// Abort the request in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.current = None;
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for FocusController {
    fn drop(&mut self) {
        self.cancel();
    }
}
