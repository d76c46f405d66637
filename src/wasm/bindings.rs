//! JavaScript bindings for the reorder controller
//!
//! Data crosses the boundary as JSON strings. Item ids may be passed as
//! JS numbers or strings.

use super::utils::{item_id_from_js, timestamp, to_js_error, to_json};
use crate::config::OrderingConfig;
use crate::controller::{DropTarget, ReorderController};
use crate::error::{OrderingError, Result};
use crate::item::{PositionedItem, ScopeId, ScopeKind};
use crate::store::{PositionUpdate, ResourceStore};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

/// Resource store backed by three JS callbacks
///
/// - `fetchList(scopeJson) -> itemsJson`
/// - `updatePosition(updateJson)`; throwing means the write was not issued
/// - `invalidate(scopeJson)`
struct JsStore {
    fetch_list: js_sys::Function,
    update_position: js_sys::Function,
    invalidate: js_sys::Function,
}

fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

impl ResourceStore for JsStore {
    fn fetch_list(&mut self, scope: &ScopeId) -> Result<Vec<PositionedItem>> {
        let scope_json = serde_json::to_string(scope)?;
        let result = self
            .fetch_list
            .call1(&JsValue::NULL, &JsValue::from_str(&scope_json))
            .map_err(|e| OrderingError::Store(js_error_message(&e)))?;
        let items_json = result
            .as_string()
            .ok_or_else(|| OrderingError::Store("fetchList must return a JSON string".to_string()))?;
        Ok(serde_json::from_str(&items_json)?)
    }

    fn update_position(&mut self, update: &PositionUpdate) -> Result<()> {
        let update_json = serde_json::to_string(update)?;
        self.update_position
            .call1(&JsValue::NULL, &JsValue::from_str(&update_json))
            .map(|_| ())
            .map_err(|e| OrderingError::Persistence {
                id: update.id.clone(),
                reason: js_error_message(&e),
            })
    }

    fn invalidate(&mut self, scope: &ScopeId) {
        let Ok(scope_json) = serde_json::to_string(scope) else {
            return;
        };
        if let Err(e) = self
            .invalidate
            .call1(&JsValue::NULL, &JsValue::from_str(&scope_json))
        {
            tracing::warn!(scope = %scope, error = %js_error_message(&e), "invalidate callback failed");
        }
    }
}

/// JavaScript-friendly wrapper for one reorderable list
#[wasm_bindgen]
pub struct WasmReorderList {
    inner: ReorderController,
    store: JsStore,
}

#[wasm_bindgen]
impl WasmReorderList {
    /// Load a scope (`kind` is `"course"` or `"topic"`)
    #[wasm_bindgen(constructor)]
    pub fn new(
        kind: String,
        scope_id: String,
        fetch_list: js_sys::Function,
        update_position: js_sys::Function,
        invalidate: js_sys::Function,
        config_json: Option<String>,
        now_ms: f64,
    ) -> std::result::Result<WasmReorderList, JsValue> {
        let kind = match kind.as_str() {
            "course" => ScopeKind::Course,
            "topic" => ScopeKind::Topic,
            other => return Err(JsValue::from_str(&format!("Unknown scope kind: {}", other))),
        };
        let config = match config_json {
            Some(json) => OrderingConfig::from_json(&json).map_err(to_js_error)?,
            None => OrderingConfig::default(),
        };
        let mut store = JsStore {
            fetch_list,
            update_position,
            invalidate,
        };
        let scope = ScopeId { kind, id: scope_id };
        let inner = ReorderController::open(&mut store, scope, config, timestamp(now_ms))
            .map_err(to_js_error)?;

        Ok(Self { inner, store })
    }

    /// Items in render order as a JSON array
    #[wasm_bindgen(js_name = sortedView)]
    pub fn sorted_view(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.inner.sorted_view())
    }

    /// `[{id, draggable}]` for every item, in render order
    #[wasm_bindgen(js_name = dragHandles)]
    pub fn drag_handles(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.inner.drag_handles())
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self, id: JsValue) -> std::result::Result<bool, JsValue> {
        Ok(self.inner.is_locked(&item_id_from_js(&id)?))
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, id: JsValue) -> std::result::Result<(), JsValue> {
        let id = item_id_from_js(&id)?;
        self.inner.drag_start(&id).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = dragCancel)]
    pub fn drag_cancel(&mut self) {
        self.inner.drag_cancel();
    }

    /// Drop over `overId` (null for no target); returns the outcome as JSON
    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self, over_id: JsValue, now_ms: f64) -> std::result::Result<String, JsValue> {
        let target = if over_id.is_null() || over_id.is_undefined() {
            None
        } else {
            Some(DropTarget::Item(item_id_from_js(&over_id)?))
        };
        let outcome = self
            .inner
            .drag_end(&mut self.store, target, timestamp(now_ms))
            .map_err(to_js_error)?;
        to_json(&outcome)
    }

    #[wasm_bindgen(js_name = onReorder)]
    pub fn on_reorder(
        &mut self,
        id: JsValue,
        new_index: usize,
        now_ms: f64,
    ) -> std::result::Result<String, JsValue> {
        let id = item_id_from_js(&id)?;
        let outcome = self
            .inner
            .on_reorder(&mut self.store, &id, new_index, timestamp(now_ms))
            .map_err(to_js_error)?;
        to_json(&outcome)
    }

    /// Report a write completion; pass an error message on failure
    #[wasm_bindgen(js_name = onUpdateSettled)]
    pub fn on_update_settled(
        &mut self,
        request_id: String,
        error: Option<String>,
        now_ms: f64,
    ) -> std::result::Result<(), JsValue> {
        let request_id = Uuid::parse_str(&request_id)
            .map_err(|e| JsValue::from_str(&format!("Invalid request id: {}", e)))?;
        let outcome = match error {
            Some(reason) => Err(reason),
            None => Ok(()),
        };
        self.inner
            .on_update_settled(&mut self.store, request_id, outcome, timestamp(now_ms));
        Ok(())
    }

    /// Advance timers; returns true if the list was refreshed
    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.inner.tick(&mut self.store, timestamp(now_ms))
    }

    #[wasm_bindgen(js_name = reconcile)]
    pub fn reconcile(&mut self, now_ms: f64) -> bool {
        self.inner.reconcile(&mut self.store, timestamp(now_ms))
    }

    /// Drain pending notifications as a JSON array
    #[wasm_bindgen(js_name = takeNotifications)]
    pub fn take_notifications(&mut self) -> std::result::Result<String, JsValue> {
        to_json(&self.inner.take_notifications())
    }

    /// Current drag session as JSON
    #[wasm_bindgen(js_name = session)]
    pub fn session(&self) -> std::result::Result<String, JsValue> {
        to_json(self.inner.session())
    }

    /// Key for a new item appended at the end
    #[wasm_bindgen(js_name = appendPosition)]
    pub fn append_position(&self) -> f64 {
        self.inner.append_position()
    }
}
