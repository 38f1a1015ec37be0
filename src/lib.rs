pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod optimistic;
pub mod rules;
pub mod vendor;

#[cfg(test)]
pub(crate) mod fixtures;

use wasm_bindgen::prelude::*;

pub use command::{Command, MutationRequest};
pub use config::EngineConfig;
pub use error::{ErdError, ErrorClass, ErrorPayload};
pub use handler::Engine;
pub use model::Database;
pub use vendor::Vendor;

/// Decode a `MutationRequest`, apply it, and encode the resulting snapshot.
pub fn apply_json(engine: &Engine, request: &str) -> Result<String, ErrorPayload> {
    let request: MutationRequest =
        serde_json::from_str(request).map_err(|e| ErdError::parse_invalid(e).payload())?;
    let next = engine.apply(&request.database, &request.command)?;
    serde_json::to_string(&next).map_err(|e| ErdError::parse_invalid(e).payload())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Apply a JSON `MutationRequest` with the built-in rules.
///
/// Throws a JS `Error` whose message is the error payload JSON.
#[wasm_bindgen(js_name = "applyCommand")]
pub fn apply_command(request: &str) -> Result<String, JsValue> {
    apply_json(&Engine::default(), request)
        .map_err(|payload| js_sys::Error::new(&payload.to_json()).into())
}
