//! Shared fixtures: a recording `BookingApi` double and a ready editor.

#![allow(dead_code)]

use fp_core::config::EditorConfig;
use fp_core::id::{BookingId, ExhibitionId, HallMapId, StandId};
use fp_core::model::{
    Booking, CreateStandRequest, HallMap, Stand, StandDimension, StandStatus, StandType,
    UploadedImage,
};
use fp_editor::input::InputEvent;
use fp_editor::{ApiError, BookingApi, EditorEvent, MapEditor, Mode};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const HALL_URL: &str = "https://cdn.example/hall-a.png";

/// One collaborator invocation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    HallMaps(ExhibitionId),
    Stands(HallMapId),
    Upload(ExhibitionId, String),
    CreateStand(CreateStandRequest),
    ChangeStatus(StandId, StandStatus),
    DeleteStand(StandId),
    CreateBooking(StandId),
    PendingBookings,
    Approve(BookingId),
    Reject(BookingId, String),
}

/// In-memory backend that records every call.
pub struct RecordingApi {
    pub calls: RefCell<Vec<Call>>,
    pub hall_maps: RefCell<Vec<HallMap>>,
    pub stands: RefCell<Vec<Stand>>,
    pub bookings: RefCell<Vec<Booking>>,
    pub upload: RefCell<UploadedImage>,
    /// Makes the next call fail.
    pub failure: RefCell<Option<ApiError>>,
    /// Runs while the next call is "on the wire".
    pub during_call: RefCell<Option<Box<dyn FnOnce()>>>,
    next_id: Cell<i64>,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self {
            calls: RefCell::default(),
            hall_maps: RefCell::default(),
            stands: RefCell::default(),
            bookings: RefCell::default(),
            upload: RefCell::default(),
            failure: RefCell::default(),
            during_call: RefCell::default(),
            next_id: Cell::new(100),
        }
    }
}

impl RecordingApi {
    pub fn fail_next(&self, err: ApiError) {
        *self.failure.borrow_mut() = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call);
        let hook = self.during_call.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
        match self.failure.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl BookingApi for RecordingApi {
    type File = String;

    async fn hall_maps_by_event(&self, exhibition: ExhibitionId) -> Result<Vec<HallMap>, ApiError> {
        self.record(Call::HallMaps(exhibition))?;
        Ok(self.hall_maps.borrow().clone())
    }

    async fn stands_by_hall_map(&self, hall_map: HallMapId) -> Result<Vec<Stand>, ApiError> {
        self.record(Call::Stands(hall_map))?;
        Ok(self.stands.borrow().clone())
    }

    async fn upload_hall_map_image(
        &self,
        exhibition: ExhibitionId,
        file: String,
    ) -> Result<UploadedImage, ApiError> {
        self.record(Call::Upload(exhibition, file))?;
        Ok(self.upload.borrow().clone())
    }

    async fn create_stand(&self, request: &CreateStandRequest) -> Result<Stand, ApiError> {
        self.record(Call::CreateStand(request.clone()))?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(request.clone().into_stand(StandId::from_number(id)))
    }

    async fn change_stand_status(&self, stand: StandId, status: &StandStatus) -> Result<(), ApiError> {
        self.record(Call::ChangeStatus(stand, status.clone()))
    }

    async fn delete_stand(&self, stand: StandId) -> Result<(), ApiError> {
        self.record(Call::DeleteStand(stand))
    }

    async fn create_booking(&self, stand: StandId) -> Result<(), ApiError> {
        self.record(Call::CreateBooking(stand))
    }

    async fn pending_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.record(Call::PendingBookings)?;
        Ok(self.bookings.borrow().clone())
    }

    async fn approve_booking(&self, booking: BookingId) -> Result<(), ApiError> {
        self.record(Call::Approve(booking))
    }

    async fn reject_booking(&self, booking: BookingId, reason: &str) -> Result<(), ApiError> {
        self.record(Call::Reject(booking, reason.to_string()))
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn hall_map() -> HallMap {
    HallMap {
        id: HallMapId::from_number(3),
        exhibition_event_id: Some(ExhibitionId::from_number(9)),
        map_image_url: Some(HALL_URL.to_string()),
        name: "Hall A".to_string(),
        stands: None,
    }
}

pub fn stand(id: i64, number: &str, x: f64, y: f64, status: StandStatus) -> Stand {
    Stand {
        id: StandId::from_number(id),
        stand_number: number.to_string(),
        position_x: x,
        position_y: y,
        width: StandDimension::default(),
        height: StandDimension::default(),
        stand_type: StandType::Painting,
        status,
        hall_map_id: Some(HallMapId::from_number(3)),
    }
}

/// An attached 800×600 editor showing an 800×600 hall image at zoom 0,
/// so screen and image pixels coincide.
pub fn editor(mode: Mode) -> Rc<RefCell<MapEditor>> {
    init_logging();
    let mut editor = MapEditor::new(mode, EditorConfig::default());
    editor.attach(800.0, 600.0);
    editor.set_exhibition(Some(ExhibitionId::from_number(9)));
    if let Some(request) = editor.set_hall_map(Some(hall_map())) {
        editor.finish_image_load(request.ticket, Ok((800.0, 600.0)));
    }
    editor.take_events();
    Rc::new(RefCell::new(editor))
}

pub fn click(editor: &RefCell<MapEditor>, x: f64, y: f64, time_ms: f64) -> Vec<EditorEvent> {
    let mut editor = editor.borrow_mut();
    editor.handle_input(InputEvent::pointer_down(x, y, time_ms));
    editor.handle_input(InputEvent::pointer_up(x, y, time_ms))
}

/// Error messages among the pending events.
pub fn error_messages(editor: &RefCell<MapEditor>) -> Vec<String> {
    editor
        .borrow_mut()
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Error { message, .. } => Some(message),
            _ => None,
        })
        .collect()
}
