//! Interaction state machine.
//!
//! The mode is fixed per session. Owners drive the placement track
//! (`Idle → Drawing → AwaitingPlacementForm → Idle`); artists drive the
//! booking track (`Idle → StandSelected → Booking → Idle`).
//!
//! | Owner state | Event | Next |
//! |-------------|-------|------|
//! | Idle | toggle add-stand on | Drawing |
//! | Drawing | click inside image | AwaitingPlacementForm |
//! | AwaitingPlacementForm | submit (valid) | same, `submitting` until the create call resolves |
//! | AwaitingPlacementForm | create succeeded | Idle |
//! | AwaitingPlacementForm | create failed | same, editable again |
//! | AwaitingPlacementForm | cancel / abandon timeout | Idle |
//! | any | toggle add-stand off | Idle |

use crate::error::GatewayError;
use fp_core::id::StandId;
use fp_core::model::{PendingPlacement, Stand, StandDimension, StandType};
use kurbo::Point;
use std::fmt;

/// Who is using the editor. Set once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Owner,
    Artist,
}

impl Mode {
    /// Parse the host's `'owner' | 'artist'` prop.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "artist" => Some(Self::Artist),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Artist => "artist",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OwnerState {
    Idle,
    Drawing,
    AwaitingPlacementForm {
        placement: PendingPlacement,
        /// A create call for this placement is in flight.
        submitting: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistState {
    Idle,
    StandSelected(StandId),
    /// Booking call in flight for this stand.
    Booking(StandId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Owner(OwnerState),
    Artist(ArtistState),
}

/// What a transition asks the editor to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    PlacementStarted(PendingPlacement),
    PlacementDiscarded,
    /// Owner picked a stand for inspection; no status side effect.
    Inspect(StandId),
    /// Artist picked an available stand.
    BookingPrompt(StandId),
    /// Artist picked a stand that can't be booked.
    Detail(StandId),
    SelectionCleared,
}

// ─── Form ────────────────────────────────────────────────────────────────

/// Fields of the stand placement form.
///
/// Width and height are clamped by their setters the way the form inputs
/// constrain them; only the stand number can be invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct StandForm {
    pub stand_number: String,
    pub stand_type: StandType,
    width: StandDimension,
    height: StandDimension,
}

impl Default for StandForm {
    fn default() -> Self {
        Self {
            stand_number: String::new(),
            stand_type: StandType::Painting,
            width: StandDimension::default(),
            height: StandDimension::default(),
        }
    }
}

impl StandForm {
    pub fn new(stand_number: impl Into<String>, stand_type: StandType) -> Self {
        Self {
            stand_number: stand_number.into(),
            stand_type,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width_cm: f64, height_cm: f64) -> Self {
        self.set_width(width_cm);
        self.set_height(height_cm);
        self
    }

    pub fn set_width(&mut self, cm: f64) {
        self.width = StandDimension::from_f64(cm);
    }

    pub fn set_height(&mut self, cm: f64) {
        self.height = StandDimension::from_f64(cm);
    }

    pub fn width(&self) -> StandDimension {
        self.width
    }

    pub fn height(&self) -> StandDimension {
        self.height
    }

    /// # Errors
    /// `Validation` on the `standNumber` field when it is blank.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.stand_number.trim().is_empty() {
            return Err(GatewayError::Validation {
                field: "standNumber",
                message: "Stand number is required".to_string(),
            });
        }
        Ok(())
    }
}

// ─── State machine ───────────────────────────────────────────────────────

pub struct Interaction {
    mode: Mode,
    state: InteractionState,
    /// Owner-side inspection selection (does not change the state track).
    inspected: Option<StandId>,
}

impl Interaction {
    pub fn new(mode: Mode) -> Self {
        let state = match mode {
            Mode::Owner => InteractionState::Owner(OwnerState::Idle),
            Mode::Artist => InteractionState::Artist(ArtistState::Idle),
        };
        Self {
            mode,
            state,
            inspected: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Back to the initial state, dropping any placement or selection.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn is_drawing(&self) -> bool {
        matches!(
            self.state,
            InteractionState::Owner(OwnerState::Drawing | OwnerState::AwaitingPlacementForm { .. })
        )
    }

    pub fn pending_placement(&self) -> Option<&PendingPlacement> {
        match &self.state {
            InteractionState::Owner(OwnerState::AwaitingPlacementForm { placement, .. }) => {
                Some(placement)
            }
            _ => None,
        }
    }

    /// The stand currently selected in either track.
    pub fn selected(&self) -> Option<StandId> {
        match self.state {
            InteractionState::Owner(_) => self.inspected,
            InteractionState::Artist(ArtistState::StandSelected(id) | ArtistState::Booking(id)) => {
                Some(id)
            }
            InteractionState::Artist(ArtistState::Idle) => None,
        }
    }

    fn owner_state(&mut self) -> Option<&mut OwnerState> {
        match &mut self.state {
            InteractionState::Owner(state) => Some(state),
            InteractionState::Artist(_) => None,
        }
    }

    /// Turn the owner's add-stand mode on or off. Turning it off discards
    /// any placement without cancelling a create call already in flight.
    pub fn toggle_add_stand(&mut self, on: bool) -> Vec<Transition> {
        let Some(state) = self.owner_state() else {
            return vec![];
        };
        match (*state, on) {
            (OwnerState::Idle, true) => {
                *state = OwnerState::Drawing;
                log::debug!("interaction: drawing on");
                vec![]
            }
            (OwnerState::AwaitingPlacementForm { .. }, false) => {
                *state = OwnerState::Idle;
                log::debug!("interaction: drawing off, placement discarded");
                vec![Transition::PlacementDiscarded]
            }
            (OwnerState::Drawing, false) => {
                *state = OwnerState::Idle;
                log::debug!("interaction: drawing off");
                vec![]
            }
            _ => vec![],
        }
    }

    /// Click on the map background (no marker hit). `image` is already in
    /// image space; `inside` tells whether it falls within the image bounds.
    pub fn click_background(&mut self, image: Point, inside: bool, now_ms: f64) -> Vec<Transition> {
        match &mut self.state {
            InteractionState::Owner(state @ OwnerState::Drawing) => {
                if !inside {
                    log::debug!("interaction: click outside the map ignored");
                    return vec![];
                }
                let placement = PendingPlacement::from_image_point(image, now_ms);
                *state = OwnerState::AwaitingPlacementForm {
                    placement,
                    submitting: false,
                };
                vec![Transition::PlacementStarted(placement)]
            }
            InteractionState::Owner(_) => {
                if self.inspected.take().is_some() {
                    vec![Transition::SelectionCleared]
                } else {
                    vec![]
                }
            }
            InteractionState::Artist(state @ ArtistState::StandSelected(_)) => {
                *state = ArtistState::Idle;
                vec![Transition::SelectionCleared]
            }
            InteractionState::Artist(_) => vec![],
        }
    }

    /// Click on a stand marker.
    pub fn click_stand(&mut self, stand: &Stand) -> Vec<Transition> {
        match &mut self.state {
            InteractionState::Owner(_) => {
                self.inspected = Some(stand.id);
                vec![Transition::Inspect(stand.id)]
            }
            // A booking in flight keeps the track busy until it resolves.
            InteractionState::Artist(ArtistState::Booking(_)) => vec![],
            InteractionState::Artist(state) => {
                if stand.status.is_bookable() {
                    *state = ArtistState::StandSelected(stand.id);
                    vec![Transition::BookingPrompt(stand.id)]
                } else {
                    *state = ArtistState::Idle;
                    vec![Transition::Detail(stand.id)]
                }
            }
        }
    }

    /// Close the placement form without creating a stand.
    pub fn cancel(&mut self) -> Vec<Transition> {
        match &mut self.state {
            InteractionState::Owner(state @ OwnerState::AwaitingPlacementForm { .. }) => {
                *state = OwnerState::Idle;
                vec![Transition::PlacementDiscarded]
            }
            InteractionState::Owner(_) => {
                if self.inspected.take().is_some() {
                    vec![Transition::SelectionCleared]
                } else {
                    vec![]
                }
            }
            InteractionState::Artist(state @ ArtistState::StandSelected(_)) => {
                *state = ArtistState::Idle;
                vec![Transition::SelectionCleared]
            }
            InteractionState::Artist(_) => vec![],
        }
    }

    /// Mark the open placement as submitting and hand it out. Repeated
    /// submits while the call is in flight are refused.
    ///
    /// # Errors
    /// `WrongMode`, `NoPlacement`, or `SubmitInFlight`.
    pub fn begin_submit(&mut self) -> Result<PendingPlacement, GatewayError> {
        let mode = self.mode;
        let Some(state) = self.owner_state() else {
            return Err(GatewayError::WrongMode(mode));
        };
        match state {
            OwnerState::AwaitingPlacementForm {
                submitting: true, ..
            } => Err(GatewayError::SubmitInFlight),
            OwnerState::AwaitingPlacementForm {
                placement,
                submitting,
            } => {
                *submitting = true;
                Ok(*placement)
            }
            _ => Err(GatewayError::NoPlacement),
        }
    }

    /// Settle a submit. Success returns to Idle; failure keeps the form open
    /// for a retry. No-op if the placement was cancelled meanwhile.
    pub fn finish_submit(&mut self, placement: &PendingPlacement, succeeded: bool) {
        let Some(state) = self.owner_state() else {
            return;
        };
        if let OwnerState::AwaitingPlacementForm {
            placement: current,
            submitting,
        } = state
        {
            if current != placement {
                return;
            }
            if succeeded {
                *state = OwnerState::Idle;
            } else {
                *submitting = false;
            }
        }
    }

    /// Discard a placement left open longer than `timeout_ms`.
    pub fn expire_placement(&mut self, now_ms: f64, timeout_ms: f64) -> Vec<Transition> {
        let Some(state) = self.owner_state() else {
            return vec![];
        };
        match *state {
            OwnerState::AwaitingPlacementForm {
                placement,
                submitting: false,
            } if now_ms - placement.placed_at_ms >= timeout_ms => {
                log::debug!("interaction: placement abandoned after {timeout_ms} ms");
                *state = OwnerState::Idle;
                vec![Transition::PlacementDiscarded]
            }
            _ => vec![],
        }
    }

    /// Enter the booking-in-flight state for `id`.
    ///
    /// # Errors
    /// `WrongMode` outside artist mode, `AlreadyRequested` if a booking is
    /// already in flight.
    pub fn begin_booking(&mut self, id: StandId) -> Result<(), GatewayError> {
        match &mut self.state {
            InteractionState::Owner(_) => Err(GatewayError::WrongMode(self.mode)),
            InteractionState::Artist(ArtistState::Booking(current)) => {
                Err(GatewayError::AlreadyRequested(*current))
            }
            InteractionState::Artist(state) => {
                *state = ArtistState::Booking(id);
                Ok(())
            }
        }
    }

    /// Booking resolved (either way): back to Idle.
    pub fn finish_booking(&mut self) {
        if let InteractionState::Artist(state @ ArtistState::Booking(_)) = &mut self.state {
            *state = ArtistState::Idle;
        }
    }

    /// Forget an inspected/selected stand that no longer exists.
    pub fn forget(&mut self, id: StandId) {
        if self.inspected == Some(id) {
            self.inspected = None;
        }
        if let InteractionState::Artist(state @ ArtistState::StandSelected(_)) = &mut self.state {
            if *state == ArtistState::StandSelected(id) {
                *state = ArtistState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::model::StandStatus;
    use pretty_assertions::assert_eq;

    fn stand(id: &str, status: StandStatus) -> Stand {
        Stand {
            id: StandId::intern(id),
            stand_number: id.to_string(),
            position_x: 0.0,
            position_y: 0.0,
            width: StandDimension::default(),
            height: StandDimension::default(),
            stand_type: StandType::Painting,
            status,
            hall_map_id: None,
        }
    }

    fn awaiting() -> Interaction {
        let mut it = Interaction::new(Mode::Owner);
        it.toggle_add_stand(true);
        it.click_background(Point::new(120.0, 80.0), true, 1_000.0);
        it
    }

    #[test]
    fn drawing_click_captures_placement() {
        let it = awaiting();
        let placement = it.pending_placement().unwrap();
        assert_eq!((placement.lng, placement.lat), (120.0, 80.0));
        assert!(it.is_drawing());
    }

    #[test]
    fn click_outside_bounds_stays_drawing() {
        let mut it = Interaction::new(Mode::Owner);
        it.toggle_add_stand(true);
        let t = it.click_background(Point::new(-5.0, 10.0), false, 0.0);
        assert!(t.is_empty());
        assert_eq!(it.state(), InteractionState::Owner(OwnerState::Drawing));
    }

    #[test]
    fn idle_click_does_not_place() {
        let mut it = Interaction::new(Mode::Owner);
        it.click_background(Point::new(1.0, 1.0), true, 0.0);
        assert!(it.pending_placement().is_none());
    }

    #[test]
    fn cancel_discards_placement() {
        let mut it = awaiting();
        assert_eq!(it.cancel(), vec![Transition::PlacementDiscarded]);
        assert_eq!(it.state(), InteractionState::Owner(OwnerState::Idle));
    }

    #[test]
    fn toggle_off_discards_placement() {
        let mut it = awaiting();
        assert_eq!(it.toggle_add_stand(false), vec![Transition::PlacementDiscarded]);
        assert!(!it.is_drawing());
    }

    #[test]
    fn double_submit_is_refused() {
        let mut it = awaiting();
        assert!(it.begin_submit().is_ok());
        assert_eq!(it.begin_submit(), Err(GatewayError::SubmitInFlight));
    }

    #[test]
    fn failed_submit_keeps_form_open() {
        let mut it = awaiting();
        let placement = it.begin_submit().unwrap();
        it.finish_submit(&placement, false);
        assert_eq!(it.pending_placement(), Some(&placement));
        assert!(it.begin_submit().is_ok());
        it.finish_submit(&placement, true);
        assert_eq!(it.state(), InteractionState::Owner(OwnerState::Idle));
    }

    #[test]
    fn abandoned_placement_expires() {
        let mut it = awaiting();
        assert!(it.expire_placement(20_000.0, 30_000.0).is_empty());
        assert_eq!(
            it.expire_placement(31_000.0, 30_000.0),
            vec![Transition::PlacementDiscarded]
        );
        assert!(it.pending_placement().is_none());
    }

    #[test]
    fn submitting_placement_never_expires() {
        let mut it = awaiting();
        it.begin_submit().unwrap();
        assert!(it.expire_placement(1.0e9, 30_000.0).is_empty());
    }

    #[test]
    fn artist_can_only_select_available_stands() {
        let mut it = Interaction::new(Mode::Artist);
        let booked = stand("1", StandStatus::Booked);
        assert_eq!(it.click_stand(&booked), vec![Transition::Detail(booked.id)]);
        assert_eq!(it.selected(), None);

        let free = stand("2", StandStatus::Available);
        assert_eq!(it.click_stand(&free), vec![Transition::BookingPrompt(free.id)]);
        assert_eq!(it.state(), InteractionState::Artist(ArtistState::StandSelected(free.id)));
    }

    #[test]
    fn booking_returns_to_idle() {
        let mut it = Interaction::new(Mode::Artist);
        let free = stand("3", StandStatus::Available);
        it.click_stand(&free);
        it.begin_booking(free.id).unwrap();
        assert_eq!(it.begin_booking(free.id), Err(GatewayError::AlreadyRequested(free.id)));
        it.finish_booking();
        assert_eq!(it.state(), InteractionState::Artist(ArtistState::Idle));
    }

    #[test]
    fn owner_click_inspects_without_leaving_track() {
        let mut it = Interaction::new(Mode::Owner);
        it.toggle_add_stand(true);
        let s = stand("4", StandStatus::Booked);
        assert_eq!(it.click_stand(&s), vec![Transition::Inspect(s.id)]);
        assert_eq!(it.selected(), Some(s.id));
        assert_eq!(it.state(), InteractionState::Owner(OwnerState::Drawing));
    }

    #[test]
    fn artist_mode_ignores_drawing_toggle() {
        let mut it = Interaction::new(Mode::Artist);
        assert!(it.toggle_add_stand(true).is_empty());
        assert!(!it.is_drawing());
        assert_eq!(it.begin_submit(), Err(GatewayError::WrongMode(Mode::Artist)));
    }

    #[test]
    fn blank_stand_number_fails_validation() {
        let form = StandForm::new("   ", StandType::Painting);
        assert_eq!(form.validate().unwrap_err().field(), Some("standNumber"));
        let form = StandForm::new("A1", StandType::Painting).with_size(20.0, 9000.0);
        assert!(form.validate().is_ok());
        assert_eq!((form.width().get(), form.height().get()), (50, 500));
    }
}
