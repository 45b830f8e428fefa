//! Booking action gateway.
//!
//! The seam between the editor and the host's backend callbacks. Each action
//! runs `begin_*` on the editor, awaits the collaborator with no borrow held,
//! then settles with `finish_*`. Failures are reported to the editor as user
//! messages and returned to the caller; a failed call never mutates the
//! registry.

use crate::editor::{ImageRequest, MapEditor, Review};
use crate::error::{ApiError, GatewayError};
use crate::interaction::StandForm;
use fp_core::id::{BookingId, ExhibitionId, HallMapId, StandId};
use fp_core::model::{Booking, CreateStandRequest, HallMap, Stand, StandStatus, UploadedImage};
use std::cell::RefCell;

/// Backend collaborator: one method per host callback.
///
/// Everything runs on the UI thread, so futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait BookingApi {
    /// Whatever the host hands over as an image upload (a DOM `File`, bytes).
    type File;

    async fn hall_maps_by_event(&self, exhibition: ExhibitionId) -> Result<Vec<HallMap>, ApiError>;

    async fn stands_by_hall_map(&self, hall_map: HallMapId) -> Result<Vec<Stand>, ApiError>;

    async fn upload_hall_map_image(
        &self,
        exhibition: ExhibitionId,
        file: Self::File,
    ) -> Result<UploadedImage, ApiError>;

    /// Returns the created stand with its server-assigned id.
    async fn create_stand(&self, request: &CreateStandRequest) -> Result<Stand, ApiError>;

    async fn change_stand_status(&self, stand: StandId, status: &StandStatus) -> Result<(), ApiError>;

    async fn delete_stand(&self, stand: StandId) -> Result<(), ApiError>;

    async fn create_booking(&self, stand: StandId) -> Result<(), ApiError>;

    async fn pending_bookings(&self) -> Result<Vec<Booking>, ApiError>;

    async fn approve_booking(&self, booking: BookingId) -> Result<(), ApiError>;

    async fn reject_booking(&self, booking: BookingId, reason: &str) -> Result<(), ApiError>;
}

/// Find the booking that references `stand`.
///
/// Ids are canonicalized on ingestion, so `7` and `"7"` already compare
/// equal here.
///
/// # Errors
/// `NoBookingForStand` when no booking references the stand.
pub fn resolve_booking(stand: StandId, bookings: &[Booking]) -> Result<BookingId, GatewayError> {
    bookings
        .iter()
        .find(|b| b.exhibition_stand_id == stand)
        .map(|b| b.id)
        .ok_or_else(|| {
            log::warn!(
                "no pending booking for stand {stand} among {} booking(s)",
                bookings.len()
            );
            GatewayError::NoBookingForStand(stand)
        })
}

/// Pass a result through, reporting a failure to the editor first.
fn reported<T>(editor: &RefCell<MapEditor>, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
    if let Err(err) = &result {
        editor.borrow_mut().report(err);
    }
    result
}

pub struct BookingGateway<A> {
    api: A,
}

impl<A: BookingApi> BookingGateway<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit the placement form. Returns the locally registered stand.
    ///
    /// # Errors
    /// Validation errors before any call; `Api` if the backend refused.
    pub async fn create_stand(
        &self,
        editor: &RefCell<MapEditor>,
        form: &StandForm,
    ) -> Result<Stand, GatewayError> {
        let begun = editor.borrow_mut().begin_create_stand(form);
        let ticket = reported(editor, begun)?;
        let result = self.api.create_stand(&ticket.payload().request).await;
        let done = editor.borrow_mut().finish_create_stand(ticket, result);
        reported(editor, done)
    }

    /// Artist books an available stand; marks it `PENDING` on success.
    ///
    /// # Errors
    /// `NotReady`, `NotBookable`, `AlreadyRequested`, or `Api`.
    pub async fn book_stand(&self, editor: &RefCell<MapEditor>, stand: StandId) -> Result<(), GatewayError> {
        let begun = editor.borrow_mut().begin_book_stand(stand);
        let ticket = reported(editor, begun)?;
        let result = self.api.create_booking(stand).await;
        let done = editor.borrow_mut().finish_book_stand(ticket, result);
        reported(editor, done)
    }

    /// Owner approves the pending booking on a stand.
    ///
    /// # Errors
    /// `NoBookingForStand` if no pending booking references the stand.
    pub async fn approve_booking(
        &self,
        editor: &RefCell<MapEditor>,
        stand: StandId,
    ) -> Result<(), GatewayError> {
        self.review(editor, stand, Review::Approve).await
    }

    /// Owner rejects the pending booking on a stand.
    ///
    /// # Errors
    /// `NoBookingForStand` if no pending booking references the stand.
    pub async fn reject_booking(
        &self,
        editor: &RefCell<MapEditor>,
        stand: StandId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let review = Review::Reject {
            reason: reason.to_string(),
        };
        self.review(editor, stand, review).await
    }

    async fn review(
        &self,
        editor: &RefCell<MapEditor>,
        stand: StandId,
        review: Review,
    ) -> Result<(), GatewayError> {
        let begun = editor.borrow_mut().begin_review(stand, review);
        let ticket = reported(editor, begun)?;
        let bookings = self.api.pending_bookings().await;
        let resolved = editor.borrow_mut().resolve_review(ticket, bookings);
        let ticket = reported(editor, resolved)?;

        let pending = ticket.payload();
        let result = match (pending.booking, &pending.review) {
            (Some(booking), Review::Approve) => self.api.approve_booking(booking).await,
            (Some(booking), Review::Reject { reason }) => self.api.reject_booking(booking, reason).await,
            // finish_review reports the missing booking.
            (None, _) => Ok(()),
        };
        let done = editor.borrow_mut().finish_review(ticket, result);
        reported(editor, done)
    }

    /// Owner changes a stand's status (e.g. to `MAINTENANCE`).
    ///
    /// # Errors
    /// `NotReady`, `AlreadyRequested`, `UnknownStand`, or `Api`.
    pub async fn change_stand_status(
        &self,
        editor: &RefCell<MapEditor>,
        stand: StandId,
        status: StandStatus,
    ) -> Result<(), GatewayError> {
        let begun = editor.borrow_mut().begin_status_change(stand, status);
        let ticket = reported(editor, begun)?;
        let result = self
            .api
            .change_stand_status(stand, &ticket.payload().status)
            .await;
        let done = editor.borrow_mut().finish_status_change(ticket, result);
        reported(editor, done)
    }

    /// Owner deletes a stand; it leaves the registry once the backend agrees.
    ///
    /// # Errors
    /// `NotReady`, `AlreadyRequested`, `UnknownStand`, or `Api`.
    pub async fn delete_stand(&self, editor: &RefCell<MapEditor>, stand: StandId) -> Result<(), GatewayError> {
        let begun = editor.borrow_mut().begin_delete_stand(stand);
        let ticket = reported(editor, begun)?;
        let result = self.api.delete_stand(stand).await;
        let done = editor.borrow_mut().finish_delete_stand(ticket, result);
        reported(editor, done)
    }

    /// Pull the current hall map's stands and reconcile.
    ///
    /// # Errors
    /// `NoHallMap` or `Api`.
    pub async fn refresh_stands(&self, editor: &RefCell<MapEditor>) -> Result<(), GatewayError> {
        let begun = editor.borrow().begin_refresh_stands();
        let ticket = reported(editor, begun)?;
        let result = self.api.stands_by_hall_map(*ticket.payload()).await;
        let done = editor.borrow_mut().finish_refresh_stands(ticket, result);
        reported(editor, done)
    }

    /// Hall maps of the current exhibition. Choosing one is up to the host.
    ///
    /// # Errors
    /// `NoExhibition` or `Api`.
    pub async fn load_hall_maps(&self, editor: &RefCell<MapEditor>) -> Result<Vec<HallMap>, GatewayError> {
        let begun = editor.borrow().begin_exhibition_call();
        let ticket = reported(editor, begun)?;
        let result = self.api.hall_maps_by_event(*ticket.payload()).await;
        let done = editor.borrow().finish_exhibition_call(&ticket, result);
        reported(editor, done)
    }

    /// Upload a new floor-plan image and start loading it.
    ///
    /// # Errors
    /// `WrongMode`, `NoExhibition`, or `Api`.
    pub async fn upload_hall_map(
        &self,
        editor: &RefCell<MapEditor>,
        file: A::File,
    ) -> Result<ImageRequest, GatewayError> {
        let begun = editor.borrow().begin_upload();
        let ticket = reported(editor, begun)?;
        let result = self.api.upload_hall_map_image(*ticket.payload(), file).await;
        let done = editor.borrow_mut().finish_upload(ticket, result);
        reported(editor, done)
    }
}
