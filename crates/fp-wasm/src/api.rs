//! `BookingApi` backed by host JavaScript callbacks.
//!
//! The host passes one object whose properties are the callbacks
//! (`getHallMapsByEvent`, `createStand`, `approveBooking`, ...). Each may
//! return a value or a Promise. Payloads cross the boundary as JSON.

use fp_core::id::{BookingId, ExhibitionId, HallMapId, StandId, numeric_id};
use fp_core::model::{
    Booking, CreateStandRequest, HallMap, PendingBookings, Stand, StandStatus, UploadedImage,
};
use fp_editor::{ApiError, BookingApi};
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub struct JsBookingApi {
    callbacks: JsValue,
}

impl JsBookingApi {
    pub fn new(callbacks: JsValue) -> Self {
        Self { callbacks }
    }

    fn callback(&self, name: &str) -> Result<js_sys::Function, ApiError> {
        js_sys::Reflect::get(&self.callbacks, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| ApiError::new(format!("{name} is not available")))
    }

    /// Call a host callback and await its (possibly promised) result.
    async fn invoke(&self, name: &str, args: &[JsValue]) -> Result<JsValue, ApiError> {
        let f = self.callback(name)?;
        let args: js_sys::Array = args.iter().collect();
        let returned = f.apply(&JsValue::NULL, &args).map_err(api_error)?;
        JsFuture::from(js_sys::Promise::resolve(&returned))
            .await
            .map_err(api_error)
    }
}

/// Server ids go out as numbers only when the number is exact in JS.
fn id_value(id: &str) -> JsValue {
    match numeric_id(id) {
        Some(n) => JsValue::from_f64(n as f64),
        None => JsValue::from_str(id),
    }
}

fn to_json(value: &JsValue) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    js_sys::JSON::stringify(value)
        .ok()?
        .as_string()
        .and_then(|s| serde_json::from_str(&s).ok())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, ApiError> {
    let text = serde_json::to_string(value).map_err(|e| ApiError::new(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(api_error)
}

/// Decode a response, unwrapping a `{ data: ... }` envelope if present.
fn decode<T: DeserializeOwned>(what: &str, value: &JsValue) -> Result<T, ApiError> {
    let json = to_json(value).ok_or_else(|| ApiError::new(format!("empty {what} response")))?;
    match serde_json::from_value::<T>(json.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(err) => json
            .get("data")
            .and_then(|data| serde_json::from_value::<T>(data.clone()).ok())
            .ok_or_else(|| ApiError::new(format!("unexpected {what} response: {err}"))),
    }
}

/// Turn a rejected promise / thrown value into an `ApiError`, keeping the
/// serializable parts (e.g. an HTTP client's `response.data`) as payload.
fn api_error(err: JsValue) -> ApiError {
    let message = err
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| "Request failed".to_string());
    let mut api = ApiError::new(message);

    let response = js_sys::Reflect::get(&err, &JsValue::from_str("response")).ok();
    if let Some(status) = response
        .as_ref()
        .and_then(|r| js_sys::Reflect::get(r, &JsValue::from_str("status")).ok())
        .and_then(|s| s.as_f64())
    {
        api = api.with_status(status as u16);
    }
    let payload = response
        .as_ref()
        .and_then(to_json)
        .map(|response| serde_json::json!({ "response": response }))
        .or_else(|| to_json(&err));
    if let Some(payload) = payload {
        api = api.with_payload(payload);
    }
    api
}

impl BookingApi for JsBookingApi {
    type File = web_sys::File;

    async fn hall_maps_by_event(&self, exhibition: ExhibitionId) -> Result<Vec<HallMap>, ApiError> {
        let v = self
            .invoke("getHallMapsByEvent", &[id_value(exhibition.as_str())])
            .await?;
        decode("hall map", &v)
    }

    async fn stands_by_hall_map(&self, hall_map: HallMapId) -> Result<Vec<Stand>, ApiError> {
        let v = self
            .invoke("getStandsByHallMap", &[id_value(hall_map.as_str())])
            .await?;
        decode("stand list", &v)
    }

    async fn upload_hall_map_image(
        &self,
        exhibition: ExhibitionId,
        file: web_sys::File,
    ) -> Result<UploadedImage, ApiError> {
        let v = self
            .invoke(
                "uploadHallMapImage",
                &[id_value(exhibition.as_str()), file.into()],
            )
            .await?;
        decode("upload", &v)
    }

    async fn create_stand(&self, request: &CreateStandRequest) -> Result<Stand, ApiError> {
        let v = self.invoke("createStand", &[to_js(request)?]).await?;
        decode::<Stand>("stand", &v).or_else(|err| {
            // Some backends only acknowledge; the host refresh brings the id.
            log::warn!("createStand answered without a stand ({err}), using the request");
            Ok(request.clone().into_stand(StandId::placeholder()))
        })
    }

    async fn change_stand_status(&self, stand: StandId, status: &StandStatus) -> Result<(), ApiError> {
        self.invoke(
            "changeStandStatus",
            &[id_value(stand.as_str()), JsValue::from_str(status.as_str())],
        )
        .await
        .map(drop)
    }

    async fn delete_stand(&self, stand: StandId) -> Result<(), ApiError> {
        self.invoke("deleteStand", &[id_value(stand.as_str())])
            .await
            .map(drop)
    }

    async fn create_booking(&self, stand: StandId) -> Result<(), ApiError> {
        self.invoke("createBooking", &[id_value(stand.as_str())])
            .await
            .map(drop)
    }

    async fn pending_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let v = self.invoke("getPendingBookings", &[]).await?;
        decode::<PendingBookings>("pending bookings", &v).map(PendingBookings::into_vec)
    }

    async fn approve_booking(&self, booking: BookingId) -> Result<(), ApiError> {
        self.invoke("approveBooking", &[id_value(booking.as_str())])
            .await
            .map(drop)
    }

    async fn reject_booking(&self, booking: BookingId, reason: &str) -> Result<(), ApiError> {
        self.invoke(
            "rejectBooking",
            &[id_value(booking.as_str()), JsValue::from_str(reason)],
        )
        .await
        .map(drop)
    }
}
