//! Module resolution stub.
//!
//! Guest code is evaluated as a plain script, so there is nothing to import. The engine still
//! expects a loader; this one resolves every specifier to itself and hands back an empty
//! module.

use rquickjs::loader::{Loader, Resolver};
use rquickjs::module::Declared;
use rquickjs::{Ctx, Module, Result};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyModuleResolver;

impl Resolver for EmptyModuleResolver {
    fn resolve<'js>(&mut self, _ctx: &Ctx<'js>, base: &str, name: &str) -> Result<String> {
        debug!(base, module = name, "Resolving guest module import");
        Ok(name.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyModuleLoader;

impl Loader for EmptyModuleLoader {
    fn load<'js>(&mut self, ctx: &Ctx<'js>, name: &str) -> Result<Module<'js, Declared>> {
        debug!(module = name, "Guest requested a module, returning empty source");
        Module::declare(ctx.clone(), name, "")
    }
}
