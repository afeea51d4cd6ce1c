//! Moving values across the sandbox boundary.
//!
//! Values leave the sandbox as deep copies (via the engine's own `JSON.stringify`), since any
//! handle into the sandbox dies with its execution context.

use rquickjs::{CatchResultExt, Ctx, Object, Value};

use crate::input::InputSnapshot;

#[derive(thiserror::Error, Debug)]
pub enum MarshalError {
    #[error("{0}")]
    Script(String),

    #[error("Malformed value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deep-copies a sandbox value into host data. `undefined` and functions become `null`.
pub fn copy_out<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<serde_json::Value, MarshalError> {
    let json = ctx
        .json_stringify(value)
        .catch(ctx)
        .map_err(|e| MarshalError::Script(e.to_string()))?;

    match json {
        None => Ok(serde_json::Value::Null),
        Some(json) => {
            let json = json.to_string().map_err(|e| MarshalError::Script(e.to_string()))?;
            Ok(serde_json::from_str(&json)?)
        }
    }
}

/// Builds the guest's `input` argument: a flat object of button names to 0/1.
pub fn input_object<'js>(ctx: &Ctx<'js>, input: &InputSnapshot, include_system: bool) -> rquickjs::Result<Object<'js>> {
    let object = Object::new(ctx.clone())?;
    for (name, value) in input.fields(include_system) {
        object.set(name, i32::from(value))?;
    }
    Ok(object)
}
