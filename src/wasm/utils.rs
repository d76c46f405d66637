//! Conversions at the JS boundary

use crate::clock::Timestamp;
use crate::error::OrderingError;
use crate::item::ItemId;
use wasm_bindgen::prelude::*;

/// Route Rust panics to `console.error`
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Item ids arrive as JS numbers or strings
pub(crate) fn item_id_from_js(value: &JsValue) -> Result<ItemId, JsValue> {
    if let Some(number) = value.as_f64() {
        return ItemId::try_from(number).map_err(to_js_error);
    }
    value
        .as_string()
        .map(ItemId::Str)
        .ok_or_else(|| JsValue::from_str("Item id must be a number or a string"))
}

/// `Date.now()` style milliseconds; negative values clamp to the epoch
pub(crate) fn timestamp(now_ms: f64) -> Timestamp {
    Timestamp::from_millis(now_ms.max(0.0) as u64)
}

pub(crate) fn to_js_error(error: OrderingError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}
