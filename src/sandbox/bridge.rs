//! The host capability surface visible to guest code.
//!
//! Guests receive everything they need as `update` arguments and report back by returning
//! data, so the only host functions installed are a `console` whose output is routed into
//! the host log.

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Result};
use tracing::{debug, error, info, warn};

use crate::formatter::GUEST_TARGET;

fn join(args: Rest<Coerced<String>>) -> String {
    args.0.into_iter().map(|arg| arg.0).collect::<Vec<_>>().join(" ")
}

/// Installs `console.log`, `console.info`, `console.warn`, `console.error` and `console.debug`.
pub fn install_console(ctx: &Ctx<'_>) -> Result<()> {
    let console = Object::new(ctx.clone())?;

    console.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            info!(target: GUEST_TARGET, "{}", join(args));
        })?,
    )?;
    console.set(
        "info",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            info!(target: GUEST_TARGET, "{}", join(args));
        })?,
    )?;
    console.set(
        "debug",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            debug!(target: GUEST_TARGET, "{}", join(args));
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            warn!(target: GUEST_TARGET, "{}", join(args));
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            error!(target: GUEST_TARGET, "{}", join(args));
        })?,
    )?;

    ctx.globals().set("console", console)
}
