//! Editor session: the browser-free orchestrator.
//!
//! `MapEditor` owns the stand registry, the map surface, and the interaction
//! state machine, and applies host props (`hallMap`, `stands`,
//! `exhibitionId`). Pointer and keyboard input come in through
//! `handle_input`; everything the host should react to comes out as
//! `EditorEvent`s.
//!
//! Every collaborator action is split into a `begin_*` / `finish_*` pair so
//! the async gateway never holds a borrow across an await. Tickets carry the
//! session epoch; finishing a ticket from before the last `teardown` yields
//! `GatewayError::Detached` and touches nothing.

use crate::error::{ApiError, GatewayError};
use crate::gateway::resolve_booking;
use crate::input::{Button, InputEvent};
use crate::interaction::{Interaction, Mode, StandForm, Transition};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use fp_core::config::EditorConfig;
use fp_core::id::{BookingId, ExhibitionId, HallMapId, StandId};
use fp_core::model::{
    Booking, CreateStandRequest, HallMap, PendingPlacement, Stand, StandStatus, UploadedImage,
};
use fp_core::registry::StandRegistry;
use fp_core::surface::{LoadError, LoadTicket, MapSurface};
use fp_render::hit::hit_test;
use fp_render::markers::{Marker, MarkerFocus, build_markers};
use kurbo::{Point, Vec2};
use serde::Serialize;
use std::collections::HashSet;

/// Zoom step for keyboard and toolbar zoom, in zoom levels.
const STEP_ZOOM: f64 = 1.0;

// ─── Events ──────────────────────────────────────────────────────────────

/// Notifications for the host, drained with [`MapEditor::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorEvent {
    /// Markers or viewport changed; repaint.
    RenderNeeded,
    /// Owner clicked the map while drawing: show the stand form.
    PlacementFormOpened { placement: PendingPlacement },
    PlacementDiscarded,
    /// The backend created a stand. Carries the server's copy.
    StandCreated { stand: Stand },
    /// `onStandSelect` for the host.
    StandSelected { stand: Stand },
    BookingPromptOpened { stand: Stand },
    StandDetailOpened { stand: Stand },
    SelectionCleared,
    BookingRequested { stand_id: StandId },
    BookingReviewed {
        stand_id: StandId,
        booking_id: BookingId,
        approved: bool,
    },
    StandStatusChanged { stand_id: StandId, status: StandStatus },
    StandDeleted { stand_id: StandId },
    ImageLoaded { width: f64, height: f64 },
    /// The image failed; the placeholder space is shown instead.
    ImageFailed { url: String, reason: String },
    HallMapImageUploaded { url: String },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<&'static str>,
    },
}

// ─── Tickets ─────────────────────────────────────────────────────────────

/// Proof that a `begin_*` call succeeded, redeemed by the matching `finish_*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket<T> {
    epoch: u64,
    payload: T,
}

impl<T> Ticket<T> {
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    pub placement: PendingPlacement,
    pub request: CreateStandRequest,
}

/// Owner decision on a stand's pending booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    Approve,
    Reject { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingReview {
    pub stand: StandId,
    pub review: Review,
    /// Filled in once the pending-bookings lookup matched.
    pub booking: Option<BookingId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingStatusChange {
    pub stand: StandId,
    pub status: StandStatus,
}

/// An image the host must fetch and decode, then report back through
/// [`MapEditor::finish_image_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub ticket: LoadTicket,
    pub url: String,
}

// ─── Editor ──────────────────────────────────────────────────────────────

/// An in-progress press on the map.
#[derive(Debug, Clone, Copy)]
struct Gesture {
    start: Point,
    last: Point,
    button: Button,
    dragging: bool,
}

pub struct MapEditor {
    config: EditorConfig,
    interaction: Interaction,
    surface: MapSurface,
    registry: StandRegistry,
    hall_map: Option<HallMap>,
    exhibition: Option<ExhibitionId>,
    hovered: Option<StandId>,
    gesture: Option<Gesture>,
    /// Bumped on teardown; tickets from older epochs are dead.
    epoch: u64,
    /// Stands with a booking/review/status/delete call in flight.
    in_flight: HashSet<StandId>,
    events: Vec<EditorEvent>,
    render_pending: bool,
}

impl MapEditor {
    pub fn new(mode: Mode, config: EditorConfig) -> Self {
        let config = config.sanitized();
        Self {
            surface: MapSurface::new(&config),
            config,
            interaction: Interaction::new(mode),
            registry: StandRegistry::new(),
            hall_map: None,
            exhibition: None,
            hovered: None,
            gesture: None,
            epoch: 0,
            in_flight: HashSet::new(),
            events: Vec::new(),
            render_pending: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.interaction.mode()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    pub fn registry(&self) -> &StandRegistry {
        &self.registry
    }

    pub fn hall_map(&self) -> Option<&HallMap> {
        self.hall_map.as_ref()
    }

    pub fn exhibition(&self) -> Option<ExhibitionId> {
        self.exhibition
    }

    pub fn hovered(&self) -> Option<StandId> {
        self.hovered
    }

    /// Whether a booking/review/status/delete call is running for `id`.
    pub fn is_busy(&self, id: StandId) -> bool {
        self.in_flight.contains(&id)
    }

    /// Current markers in render order.
    pub fn markers(&self) -> Vec<Marker> {
        build_markers(
            self.registry.all(),
            self.interaction.pending_placement(),
            MarkerFocus {
                hovered: self.hovered,
                selected: self.interaction.selected(),
            },
        )
    }

    /// Drain pending notifications. A single `RenderNeeded` closes the batch
    /// if anything visible changed.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        let mut events = std::mem::take(&mut self.events);
        if std::mem::take(&mut self.render_pending) {
            events.push(EditorEvent::RenderNeeded);
        }
        events
    }

    fn push(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    fn request_render(&mut self) {
        self.render_pending = true;
    }

    /// Surface a failed action to the user. Late responses after teardown
    /// are dropped silently.
    pub fn report(&mut self, err: &GatewayError) {
        if matches!(err, GatewayError::Detached) {
            log::debug!("dropping late response: {err}");
            return;
        }
        log::warn!("editor action failed: {err}");
        self.push(EditorEvent::Error {
            message: err.user_message(),
            field: err.field(),
        });
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Bind to a viewport of the given CSS pixel size. Idempotent for the
    /// same size.
    pub fn attach(&mut self, width: f64, height: f64) {
        if self.surface.initialize(width, height) {
            log::debug!("editor attached at {width}×{height}");
            self.request_render();
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface.resize(width, height);
        self.request_render();
    }

    /// Release the surface and invalidate every outstanding ticket. Host
    /// props are dropped too; a remount supplies them again. Safe to call
    /// repeatedly.
    pub fn teardown(&mut self) {
        self.epoch += 1;
        self.surface.teardown();
        self.hall_map = None;
        self.registry.replace_from_host(Vec::new());
        self.interaction.reset();
        self.in_flight.clear();
        self.gesture = None;
        self.hovered = None;
        self.events.clear();
        self.render_pending = false;
    }

    fn check_epoch<T>(&self, ticket: &Ticket<T>) -> Result<(), GatewayError> {
        if ticket.epoch == self.epoch {
            Ok(())
        } else {
            Err(GatewayError::Detached)
        }
    }

    fn ticket<T>(&self, payload: T) -> Ticket<T> {
        Ticket {
            epoch: self.epoch,
            payload,
        }
    }

    // ─── Host props ──────────────────────────────────────────────────────

    /// Switch to a hall map (or none). Returns the image the host must load.
    /// Embedded stands, even an empty list, replace the registry. A different
    /// map without embedded stands starts with none until `set_stands`.
    /// Re-supplying the same map with the same image loads nothing.
    pub fn set_hall_map(&mut self, hall_map: Option<HallMap>) -> Option<ImageRequest> {
        let Some(mut hall_map) = hall_map else {
            if self.hall_map.take().is_some() {
                self.interaction.reset();
                self.surface.clear_image();
                self.registry.replace_from_host(Vec::new());
                self.request_render();
            }
            return None;
        };

        let same_map = self.hall_map.as_ref().map(|h| h.id) == Some(hall_map.id);
        match hall_map.stands.take() {
            Some(embedded) => self.set_stands(embedded),
            // Stands of the previous map never carry over.
            None if !same_map => self.set_stands(Vec::new()),
            None => {}
        }

        let same_image = same_map
            && self.hall_map.as_ref().map(|h| &h.map_image_url) == Some(&hall_map.map_image_url);
        if !same_map {
            self.interaction.reset();
        }
        let url = hall_map.map_image_url.clone().filter(|u| !u.trim().is_empty());
        self.hall_map = Some(hall_map);
        if same_image {
            return None;
        }

        self.request_render();
        match url {
            Some(url) => Some(ImageRequest {
                ticket: self.surface.begin_load(&url),
                url,
            }),
            None => {
                self.surface.clear_image();
                None
            }
        }
    }

    /// Report the outcome of an [`ImageRequest`]. `Ok` carries the decoded
    /// natural `(width, height)`.
    pub fn finish_image_load(&mut self, ticket: LoadTicket, result: Result<(f64, f64), LoadError>) {
        match self.surface.finish_load(ticket, result) {
            None => {}
            Some(Ok(bounds)) => {
                self.push(EditorEvent::ImageLoaded {
                    width: bounds.width,
                    height: bounds.height,
                });
                self.request_render();
            }
            Some(Err(err)) => {
                self.push(EditorEvent::ImageFailed {
                    url: err.url,
                    reason: err.reason,
                });
                self.request_render();
            }
        }
    }

    /// Adopt a fresh host stand list, dropping every local entry.
    pub fn set_stands(&mut self, stands: Vec<Stand>) {
        self.registry.replace_from_host(stands);
        if let Some(id) = self.hovered {
            if self.registry.get(id).is_none() {
                self.hovered = None;
            }
        }
        if let Some(id) = self.interaction.selected() {
            if self.registry.get(id).is_none() {
                self.interaction.forget(id);
            }
        }
        self.request_render();
    }

    pub fn set_exhibition(&mut self, exhibition: Option<ExhibitionId>) {
        self.exhibition = exhibition;
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event and return the resulting notifications.
    pub fn handle_input(&mut self, event: InputEvent) -> Vec<EditorEvent> {
        match event {
            InputEvent::PointerDown { x, y, button, .. } => {
                let at = Point::new(x, y);
                if button != Button::Secondary {
                    self.gesture = Some(Gesture {
                        start: at,
                        last: at,
                        button,
                        dragging: false,
                    });
                }
            }
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y)),
            InputEvent::PointerUp { x, y, time_ms } => {
                if let Some(gesture) = self.gesture.take() {
                    if !gesture.dragging && gesture.button == Button::Primary {
                        self.click(Point::new(x, y), time_ms);
                    }
                }
            }
            InputEvent::PointerLeave => {
                self.gesture = None;
                if self.hovered.take().is_some() {
                    self.request_render();
                }
            }
            InputEvent::Wheel { x, y, delta_y } => {
                if delta_y.is_finite() && delta_y != 0.0 {
                    let delta = -delta_y.signum() * self.config.wheel_zoom_step;
                    self.surface.zoom_around(delta, Point::new(x, y));
                    self.request_render();
                }
            }
            InputEvent::Key { key, modifiers } => {
                if let Some(action) = ShortcutMap::resolve(&key, modifiers) {
                    self.shortcut(action);
                }
            }
        }
        self.take_events()
    }

    fn pointer_move(&mut self, at: Point) {
        let slop = self.config.click_slop_px;
        if let Some(gesture) = &mut self.gesture {
            if !gesture.dragging && gesture.start.distance(at) > slop {
                gesture.dragging = true;
            }
            if gesture.dragging {
                let delta: Vec2 = at - gesture.last;
                gesture.last = at;
                self.surface.pan_by(delta);
                self.request_render();
            }
            return;
        }

        let hovered = self.hit(at);
        if hovered != self.hovered {
            self.hovered = hovered;
            self.request_render();
        }
    }

    fn hit(&self, screen: Point) -> Option<StandId> {
        if !self.surface.is_initialized() {
            return None;
        }
        hit_test(&self.markers(), &self.surface, screen, self.config.marker_radius_px)
    }

    /// A press and release within the click slop. Markers take precedence
    /// over the map background.
    fn click(&mut self, screen: Point, now_ms: f64) {
        if !self.surface.is_initialized() {
            return;
        }
        let transitions = match self.hit(screen).and_then(|id| self.registry.get(id).cloned()) {
            Some(stand) => self.interaction.click_stand(&stand),
            None => {
                let image = self.surface.screen_to_image(screen);
                let inside = self.surface.is_within_bounds(image);
                self.interaction.click_background(image, inside, now_ms)
            }
        };
        self.apply(transitions);
    }

    fn shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::ToggleAddStand => {
                let on = !self.interaction.is_drawing();
                self.toggle_add_stand(on);
            }
            ShortcutAction::Cancel => self.cancel_form(),
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ZoomToFit => self.fit(),
        }
    }

    fn apply(&mut self, transitions: Vec<Transition>) {
        for transition in transitions {
            self.request_render();
            match transition {
                Transition::PlacementStarted(placement) => {
                    log::debug!("placement at ({}, {})", placement.lng, placement.lat);
                    self.push(EditorEvent::PlacementFormOpened { placement });
                }
                Transition::PlacementDiscarded => self.push(EditorEvent::PlacementDiscarded),
                Transition::Inspect(id) => {
                    self.select(id);
                }
                Transition::BookingPrompt(id) => {
                    if let Some(stand) = self.select(id) {
                        self.push(EditorEvent::BookingPromptOpened { stand });
                    }
                }
                Transition::Detail(id) => {
                    if let Some(stand) = self.select(id) {
                        self.push(EditorEvent::StandDetailOpened { stand });
                    }
                }
                Transition::SelectionCleared => self.push(EditorEvent::SelectionCleared),
            }
        }
    }

    /// Announce a selection to the host.
    fn select(&mut self, id: StandId) -> Option<Stand> {
        let stand = self.registry.get(id).cloned()?;
        self.push(EditorEvent::StandSelected {
            stand: stand.clone(),
        });
        Some(stand)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn toggle_add_stand(&mut self, on: bool) {
        let transitions = self.interaction.toggle_add_stand(on);
        self.apply(transitions);
        self.request_render();
    }

    /// Close the placement form, or clear the selection.
    pub fn cancel_form(&mut self) {
        let transitions = self.interaction.cancel();
        self.apply(transitions);
    }

    /// Discard a placement left open longer than the abandon timeout.
    pub fn expire_abandoned_placement(&mut self, now_ms: f64) {
        let transitions = self
            .interaction
            .expire_placement(now_ms, self.config.abandon_placement_ms);
        self.apply(transitions);
    }

    pub fn zoom_in(&mut self) {
        self.surface.zoom_by(STEP_ZOOM);
        self.request_render();
    }

    pub fn zoom_out(&mut self) {
        self.surface.zoom_by(-STEP_ZOOM);
        self.request_render();
    }

    pub fn fit(&mut self) {
        self.surface.fit_bounds();
        self.request_render();
    }

    // ─── Gateway steps: create ───────────────────────────────────────────

    /// Validate the form and lock the open placement for submission.
    ///
    /// # Errors
    /// Validation failures (blank or duplicate stand number), `WrongMode`,
    /// `NoHallMap`, `NoPlacement`, or `SubmitInFlight`. Nothing is sent.
    pub fn begin_create_stand(
        &mut self,
        form: &StandForm,
    ) -> Result<Ticket<PendingCreate>, GatewayError> {
        if self.mode() != Mode::Owner {
            return Err(GatewayError::WrongMode(self.mode()));
        }
        let hall_map = self.hall_map.as_ref().map(|h| h.id).ok_or(GatewayError::NoHallMap)?;
        form.validate()?;
        if self.registry.has_stand_number(&form.stand_number) {
            return Err(GatewayError::Validation {
                field: "standNumber",
                message: format!(
                    "Stand number {} already exists on this map",
                    form.stand_number.trim()
                ),
            });
        }
        let placement = self.interaction.begin_submit()?;
        let request = CreateStandRequest::new(
            hall_map,
            &placement,
            &form.stand_number,
            form.width(),
            form.height(),
            form.stand_type.clone(),
        );
        log::debug!(
            "creating stand {} at ({}, {})",
            request.stand_number,
            request.position_x,
            request.position_y
        );
        Ok(self.ticket(PendingCreate { placement, request }))
    }

    /// Settle a create call. On success the stand is registered locally
    /// under a placeholder id until the host refreshes; on failure the form
    /// stays open for a retry.
    ///
    /// # Errors
    /// `Detached` for a ticket from before teardown, `Api` on failure.
    pub fn finish_create_stand(
        &mut self,
        ticket: Ticket<PendingCreate>,
        result: Result<Stand, ApiError>,
    ) -> Result<Stand, GatewayError> {
        self.check_epoch(&ticket)?;
        let PendingCreate { placement, request } = ticket.payload;
        match result {
            Ok(created) => {
                self.interaction.finish_submit(&placement, true);
                let local = Stand {
                    id: StandId::placeholder(),
                    hall_map_id: created.hall_map_id.or(Some(request.hall_map_id)),
                    ..created.clone()
                };
                self.registry.add_local(local.clone());
                self.push(EditorEvent::StandCreated { stand: created });
                self.request_render();
                Ok(local)
            }
            Err(err) => {
                self.interaction.finish_submit(&placement, false);
                self.request_render();
                Err(err.into())
            }
        }
    }

    // ─── Gateway steps: stand actions ────────────────────────────────────

    /// Common gate for actions on one existing, server-confirmed stand.
    fn claim_stand(&self, id: StandId, mode: Mode) -> Result<&Stand, GatewayError> {
        if self.mode() != mode {
            return Err(GatewayError::WrongMode(self.mode()));
        }
        if id.is_placeholder() {
            return Err(GatewayError::NotReady(id));
        }
        if self.in_flight.contains(&id) {
            return Err(GatewayError::AlreadyRequested(id));
        }
        self.registry.get(id).ok_or(GatewayError::UnknownStand(id))
    }

    /// # Errors
    /// `NotReady` for placeholder ids, `AlreadyRequested` while a call for
    /// the stand is running, `NotBookable` unless the stand is available.
    pub fn begin_book_stand(&mut self, id: StandId) -> Result<Ticket<StandId>, GatewayError> {
        if !self.claim_stand(id, Mode::Artist)?.status.is_bookable() {
            return Err(GatewayError::NotBookable(id));
        }
        self.interaction.begin_booking(id)?;
        self.in_flight.insert(id);
        self.request_render();
        Ok(self.ticket(id))
    }

    /// Settle a booking request. Success marks the stand `PENDING`.
    ///
    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_book_stand(
        &mut self,
        ticket: Ticket<StandId>,
        result: Result<(), ApiError>,
    ) -> Result<(), GatewayError> {
        self.check_epoch(&ticket)?;
        let id = ticket.payload;
        self.in_flight.remove(&id);
        self.interaction.finish_booking();
        self.request_render();
        result?;
        self.registry.apply_status_change(id, StandStatus::Pending);
        self.push(EditorEvent::BookingRequested { stand_id: id });
        Ok(())
    }

    /// Start approving or rejecting the pending booking on a stand.
    ///
    /// # Errors
    /// `WrongMode`, `NotReady`, `AlreadyRequested`, or `UnknownStand`.
    pub fn begin_review(
        &mut self,
        id: StandId,
        review: Review,
    ) -> Result<Ticket<PendingReview>, GatewayError> {
        self.claim_stand(id, Mode::Owner)?;
        self.in_flight.insert(id);
        Ok(self.ticket(PendingReview {
            stand: id,
            review,
            booking: None,
        }))
    }

    /// Match the stand to its booking in the pending-bookings list.
    ///
    /// # Errors
    /// `NoBookingForStand` when nothing matches, `Api` if the list could not
    /// be fetched. Either way the review ends here.
    pub fn resolve_review(
        &mut self,
        mut ticket: Ticket<PendingReview>,
        bookings: Result<Vec<Booking>, ApiError>,
    ) -> Result<Ticket<PendingReview>, GatewayError> {
        self.check_epoch(&ticket)?;
        let stand = ticket.payload.stand;
        let resolved = bookings
            .map_err(GatewayError::from)
            .and_then(|bookings| resolve_booking(stand, &bookings));
        match resolved {
            Ok(booking) => {
                ticket.payload.booking = Some(booking);
                Ok(ticket)
            }
            Err(err) => {
                self.in_flight.remove(&stand);
                Err(err)
            }
        }
    }

    /// Settle an approve/reject call. Approval marks the stand `BOOKED`,
    /// rejection puts it back to `AVAILABLE`.
    ///
    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_review(
        &mut self,
        ticket: Ticket<PendingReview>,
        result: Result<(), ApiError>,
    ) -> Result<(), GatewayError> {
        self.check_epoch(&ticket)?;
        let PendingReview {
            stand,
            review,
            booking,
        } = ticket.payload;
        self.in_flight.remove(&stand);
        result?;
        let Some(booking) = booking else {
            return Err(GatewayError::NoBookingForStand(stand));
        };
        let approved = review == Review::Approve;
        let status = if approved {
            StandStatus::Booked
        } else {
            StandStatus::Available
        };
        self.registry.apply_status_change(stand, status);
        self.push(EditorEvent::BookingReviewed {
            stand_id: stand,
            booking_id: booking,
            approved,
        });
        self.request_render();
        Ok(())
    }

    /// # Errors
    /// `WrongMode`, `NotReady`, `AlreadyRequested`, or `UnknownStand`.
    pub fn begin_status_change(
        &mut self,
        id: StandId,
        status: StandStatus,
    ) -> Result<Ticket<PendingStatusChange>, GatewayError> {
        self.claim_stand(id, Mode::Owner)?;
        self.in_flight.insert(id);
        Ok(self.ticket(PendingStatusChange { stand: id, status }))
    }

    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_status_change(
        &mut self,
        ticket: Ticket<PendingStatusChange>,
        result: Result<(), ApiError>,
    ) -> Result<(), GatewayError> {
        self.check_epoch(&ticket)?;
        let PendingStatusChange { stand, status } = ticket.payload;
        self.in_flight.remove(&stand);
        result?;
        if self.registry.apply_status_change(stand, status.clone()) {
            self.request_render();
        }
        self.push(EditorEvent::StandStatusChanged {
            stand_id: stand,
            status,
        });
        Ok(())
    }

    /// # Errors
    /// `WrongMode`, `NotReady`, `AlreadyRequested`, or `UnknownStand`.
    pub fn begin_delete_stand(&mut self, id: StandId) -> Result<Ticket<StandId>, GatewayError> {
        self.claim_stand(id, Mode::Owner)?;
        self.in_flight.insert(id);
        Ok(self.ticket(id))
    }

    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_delete_stand(
        &mut self,
        ticket: Ticket<StandId>,
        result: Result<(), ApiError>,
    ) -> Result<(), GatewayError> {
        self.check_epoch(&ticket)?;
        let id = ticket.payload;
        self.in_flight.remove(&id);
        result?;
        self.registry.remove(id);
        self.interaction.forget(id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.push(EditorEvent::StandDeleted { stand_id: id });
        self.request_render();
        Ok(())
    }

    // ─── Gateway steps: hall maps ────────────────────────────────────────

    /// # Errors
    /// `NoHallMap` when no hall map is set.
    pub fn begin_refresh_stands(&self) -> Result<Ticket<HallMapId>, GatewayError> {
        let id = self.hall_map.as_ref().map(|h| h.id).ok_or(GatewayError::NoHallMap)?;
        Ok(self.ticket(id))
    }

    /// Adopt the fetched stand list, unless the hall map changed meanwhile.
    ///
    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_refresh_stands(
        &mut self,
        ticket: Ticket<HallMapId>,
        result: Result<Vec<Stand>, ApiError>,
    ) -> Result<(), GatewayError> {
        self.check_epoch(&ticket)?;
        let stands = result?;
        if self.hall_map.as_ref().map(|h| h.id) != Some(ticket.payload) {
            log::debug!("discarding stands for hall map {} (no longer shown)", ticket.payload);
            return Ok(());
        }
        self.set_stands(stands);
        Ok(())
    }

    /// # Errors
    /// `NoExhibition` when no exhibition is set.
    pub fn begin_exhibition_call(&self) -> Result<Ticket<ExhibitionId>, GatewayError> {
        let id = self.exhibition.ok_or(GatewayError::NoExhibition)?;
        Ok(self.ticket(id))
    }

    /// Upload checks: owner only, exhibition set.
    ///
    /// # Errors
    /// `WrongMode` or `NoExhibition`.
    pub fn begin_upload(&self) -> Result<Ticket<ExhibitionId>, GatewayError> {
        if self.mode() != Mode::Owner {
            return Err(GatewayError::WrongMode(self.mode()));
        }
        self.begin_exhibition_call()
    }

    /// Check that a fetched hall-map list still belongs to this session.
    ///
    /// # Errors
    /// `Detached` or `Api`.
    pub fn finish_exhibition_call<T>(
        &self,
        ticket: &Ticket<ExhibitionId>,
        result: Result<T, ApiError>,
    ) -> Result<T, GatewayError> {
        self.check_epoch(ticket)?;
        Ok(result?)
    }

    /// Point the current hall map at a freshly uploaded image and start
    /// loading it.
    ///
    /// # Errors
    /// `Detached`, `Api`, or `Api` with a descriptive message when the
    /// upload answered without a usable URL.
    pub fn finish_upload(
        &mut self,
        ticket: Ticket<ExhibitionId>,
        result: Result<UploadedImage, ApiError>,
    ) -> Result<ImageRequest, GatewayError> {
        let uploaded = self.finish_exhibition_call(&ticket, result)?;
        let url = uploaded
            .url()
            .map(str::to_string)
            .ok_or_else(|| ApiError::new("The upload did not return an image URL"))?;
        if let Some(hall_map) = &mut self.hall_map {
            hall_map.map_image_url = Some(url.clone());
        }
        self.push(EditorEvent::HallMapImageUploaded { url: url.clone() });
        self.request_render();
        Ok(ImageRequest {
            ticket: self.surface.begin_load(&url),
            url,
        })
    }
}
