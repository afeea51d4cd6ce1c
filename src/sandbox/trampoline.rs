//! The guest-side wrapper around `update`.
//!
//! Errors thrown inside the sandbox can't always be inspected reliably once they cross into
//! the host, so `update` is wrapped in a function evaluated inside the sandbox that catches
//! anything thrown and returns `{ error: { message, stack, name } }` instead. The runtime then
//! treats that sentinel exactly like a thrown error.

use rquickjs::{Ctx, Function, Result};

/// Evaluates to a factory taking the real `update` and returning the wrapped one.
const TRAMPOLINE_SOURCE: &str = r#"
(function (update) {
  "use strict";
  return function (deltaTime, input) {
    try {
      return update(deltaTime, input);
    } catch (e) {
      var isObject = e !== null && (typeof e === "object" || typeof e === "function");
      return {
        error: {
          message: String(isObject && "message" in e ? e.message : e),
          stack: String(isObject && e.stack ? e.stack : ""),
          name: String(isObject && e.name ? e.name : "Error")
        }
      };
    }
  };
})
"#;

/// Wraps a guest `update` function.
pub fn wrap_update<'js>(ctx: &Ctx<'js>, update: Function<'js>) -> Result<Function<'js>> {
    let factory: Function<'js> = ctx.eval(TRAMPOLINE_SOURCE)?;
    factory.call((update,))
}
