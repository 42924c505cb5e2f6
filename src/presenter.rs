//! Tooltip visibility, content and position state machine.
//!
//! The presenter owns no DOM. It drives a [`TooltipSurface`] supplied by the
//! host and keeps the bookkeeping needed to throttle repositioning and to
//! discard hydration results that arrive after the user moved on.

use crate::config::Config;
use crate::format::TooltipContent;
use crate::geometry::{Point, Rect, Size, Viewport, place_panel};
use crate::types::{DocRecord, SymbolKey};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The host's floating panel, highlight box and lock indicator.
pub trait TooltipSurface {
    fn viewport(&self) -> Viewport;
    /// Size of the panel with its current content.
    fn panel_size(&self) -> Size;
    fn render(&mut self, content: &TooltipContent);
    /// Shows the panel with its top-left corner at `position` (page coordinates).
    fn show_at(&mut self, position: Point);
    fn hide(&mut self);
    /// Outlines the hovered token (page coordinates).
    fn highlight(&mut self, rect: Rect);
    fn clear_highlight(&mut self);
    fn set_lock_indicator(&mut self, locked: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TooltipState {
    Hidden,
    Shown(SymbolKey),
    Locked(SymbolKey),
}

impl TooltipState {
    pub const fn symbol(&self) -> Option<&SymbolKey> {
        match self {
            Self::Hidden => None,
            Self::Shown(key) | Self::Locked(key) => Some(key),
        }
    }
}

/// Identifies one lookup request. Only the latest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// What a hover resolved to.
#[derive(Debug, Clone)]
pub enum HoverOutcome {
    /// A token with a known record.
    Found {
        key: SymbolKey,
        record: Arc<DocRecord>,
        anchor: Rect,
    },
    /// A token whose record may appear once the cold tier is hydrated.
    Pending { key: SymbolKey, anchor: Rect },
    /// No token, or a token without documentation.
    Missing,
}

#[derive(Debug, Clone)]
struct PendingRequest {
    ticket: Ticket,
    key: SymbolKey,
    anchor: Rect,
}

pub struct Presenter<T> {
    surface: T,
    state: TooltipState,
    offset: f64,
    move_threshold: f64,
    reposition_interval: Duration,
    pointer: Point,
    /// Pointer position the panel was last placed for.
    placed_for: Option<Point>,
    placed_at: Option<Instant>,
    generation: u64,
    pending: Option<PendingRequest>,
}

impl<T> std::fmt::Debug for Presenter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("state", &self.state)
            .field("pointer", &self.pointer)
            .field("generation", &self.generation)
            .field("pending", &self.pending.as_ref().map(|p| &p.key))
            .finish_non_exhaustive()
    }
}

impl<T: TooltipSurface> Presenter<T> {
    pub fn new(surface: T, config: &Config) -> Self {
        Self {
            surface,
            state: TooltipState::Hidden,
            offset: config.tooltip_offset,
            move_threshold: config.move_threshold,
            reposition_interval: config.reposition_interval(),
            pointer: Point::default(),
            placed_for: None,
            placed_at: None,
            generation: 0,
            pending: None,
        }
    }

    pub const fn state(&self) -> &TooltipState {
        &self.state
    }

    pub const fn surface(&self) -> &T {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut T {
        &mut self.surface
    }

    pub const fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn pending_symbol(&self) -> Option<&SymbolKey> {
        self.pending.as_ref().map(|p| &p.key)
    }

    /// Applies a hover at client position `pointer`.
    ///
    /// Returns a ticket when the outcome is pending; the caller hands it back
    /// to [`Presenter::complete`] once the lookup settles. A locked panel is
    /// left untouched, but a pending lookup is still tracked so releasing the
    /// lock can keep the panel up for it.
    pub fn hover(&mut self, pointer: Point, outcome: HoverOutcome, now: Instant) -> Option<Ticket> {
        self.pointer = pointer;
        if matches!(self.state, TooltipState::Locked(_)) {
            return match outcome {
                HoverOutcome::Pending { key, anchor } => self.request(key, anchor),
                HoverOutcome::Found { .. } | HoverOutcome::Missing => {
                    self.next_generation();
                    None
                }
            };
        }

        match outcome {
            HoverOutcome::Found {
                key,
                record,
                anchor,
            } => {
                if self.state == TooltipState::Shown(key.clone()) {
                    self.maybe_reposition(now);
                } else {
                    self.next_generation();
                    self.show(key, &record, anchor, now);
                }
                None
            }
            HoverOutcome::Pending { key, anchor } => {
                if self.pending_symbol() == Some(&key) {
                    return None;
                }
                self.hide_panel();
                self.request(key, anchor)
            }
            HoverOutcome::Missing => {
                self.next_generation();
                if self.state != TooltipState::Hidden {
                    self.hide_panel();
                }
                None
            }
        }
    }

    /// Applies a settled lookup. Returns whether it was still current.
    pub fn complete(&mut self, ticket: Ticket, record: Option<Arc<DocRecord>>, now: Instant) -> bool {
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            tracing::debug!(ticket = ticket.0, "Discarding stale lookup result");
            return false;
        };

        match record {
            Some(_) if matches!(self.state, TooltipState::Locked(_)) => {
                tracing::debug!(symbol = %pending.key, "Panel locked, dropping late record");
            }
            Some(record) => self.show(pending.key, &record, pending.anchor, now),
            None => tracing::debug!(symbol = %pending.key, "No documentation after hydration"),
        }
        true
    }

    /// Lock key pressed: a shown panel stops following hover changes.
    pub fn lock(&mut self) {
        if let TooltipState::Shown(key) = &self.state {
            self.state = TooltipState::Locked(key.clone());
            self.surface.set_lock_indicator(true);
        }
    }

    /// Lock key released: the panel stays when the pointer is over it or a
    /// lookup is still pending, and hides otherwise.
    pub fn unlock(&mut self, pointer_over_panel: bool) {
        let TooltipState::Locked(key) = &self.state else {
            return;
        };
        self.surface.set_lock_indicator(false);
        if pointer_over_panel || self.pending.is_some() {
            self.state = TooltipState::Shown(key.clone());
        } else {
            self.hide_panel();
        }
    }

    /// Starts tracking a lookup for `key` unless it is already pending.
    fn request(&mut self, key: SymbolKey, anchor: Rect) -> Option<Ticket> {
        if self.pending_symbol() == Some(&key) {
            return None;
        }
        let ticket = self.next_generation();
        tracing::debug!(symbol = %key, ticket = ticket.0, "Waiting for cold tier");
        self.pending = Some(PendingRequest {
            ticket,
            key,
            anchor,
        });
        Some(ticket)
    }

    fn next_generation(&mut self) -> Ticket {
        self.generation += 1;
        self.pending = None;
        Ticket(self.generation)
    }

    fn show(&mut self, key: SymbolKey, record: &DocRecord, anchor: Rect, now: Instant) {
        let content = TooltipContent::from_record(&key, record);
        self.surface.render(&content);
        self.place(now);

        let viewport = self.surface.viewport();
        self.surface
            .highlight(anchor.translate(viewport.scroll_x, viewport.scroll_y));
        self.state = TooltipState::Shown(key);
    }

    fn place(&mut self, now: Instant) {
        let viewport = self.surface.viewport();
        let position = place_panel(
            self.pointer,
            self.surface.panel_size(),
            viewport,
            self.offset,
        );
        self.surface
            .show_at(position.offset(viewport.scroll_x, viewport.scroll_y));
        self.placed_for = Some(self.pointer);
        self.placed_at = Some(now);
    }

    fn maybe_reposition(&mut self, now: Instant) {
        let moved = self.placed_for.is_none_or(|last| {
            (self.pointer.x - last.x).abs() > self.move_threshold
                || (self.pointer.y - last.y).abs() > self.move_threshold
        });
        let due = self
            .placed_at
            .is_none_or(|last| now.saturating_duration_since(last) >= self.reposition_interval);
        if moved && due {
            self.place(now);
        }
    }

    fn hide_panel(&mut self) {
        self.surface.hide();
        self.surface.clear_highlight();
        self.state = TooltipState::Hidden;
        self.placed_for = None;
        self.placed_at = None;
    }
}
