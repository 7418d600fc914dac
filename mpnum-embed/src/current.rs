// mpnum-embed - Thread-local current context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The current context of each thread.
//!
//! Host code that does not want to thread a `&mut Context` through every
//! call uses the per-thread current context instead. It starts out as
//! [`Context::new`]. [`local_context`] applies an override until the
//! returned guard is dropped.
//!
//! We use `thread_local!` with a `RefCell`. Borrows never outlive a single
//! function in this module. A closure passed to [`with_context`] works on a
//! copy, and changes it makes through this module are overwritten when it
//! returns.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use mpnum_core::{Context, ContextOverride, Flags, Result};
use tracing::debug;

thread_local! {
    static CURRENT: RefCell<Context> = RefCell::new(Context::new());
}

/// Copy of this thread's current context.
#[must_use]
pub fn get_context() -> Context {
    CURRENT.with(|cell| *cell.borrow())
}

/// Replace this thread's current context.
pub fn set_context(ctx: Context) {
    CURRENT.with(|cell| *cell.borrow_mut() = ctx);
}

/// Run `f` with the current context.
///
/// `f` works on a copy that is written back when it returns, so flags it
/// raises become sticky on the current context.
pub fn with_context<R>(f: impl FnOnce(&mut Context) -> R) -> R {
    let mut ctx = get_context();
    let result = f(&mut ctx);
    set_context(ctx);
    result
}

/// Sticky flags of the current context.
#[must_use]
pub fn flags() -> Flags {
    get_context().flags()
}

/// Clear the current context's sticky flags.
pub fn clear_flags() {
    CURRENT.with(|cell| cell.borrow_mut().clear_flags());
}

/// Apply `overrides` to the current context until the guard is dropped.
///
/// The configuration in force before the call is restored on drop; flags
/// raised in the meantime stay raised. Guards nest and must be dropped in
/// reverse order, which scoping gives for free.
///
/// ```
/// use mpnum_embed::{ContextOverride, get_context, local_context};
///
/// {
///     let _guard = local_context(&ContextOverride::new().precision(200)).unwrap();
///     assert_eq!(get_context().precision(), 200);
/// }
/// assert_eq!(get_context().precision(), 53);
/// ```
pub fn local_context(overrides: &ContextOverride) -> Result<LocalContext> {
    let saved = get_context();
    let mut next = saved;
    overrides.apply_to(&mut next)?;
    set_context(next);
    debug!(overrides = ?overrides, "local context entered");
    Ok(LocalContext {
        saved,
        _not_send: PhantomData,
    })
}

/// RAII guard returned by [`local_context`].
#[must_use = "the override ends when the guard is dropped"]
pub struct LocalContext {
    saved: Context,
    // The guard restores this thread's context, so it must stay on it
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for LocalContext {
    fn drop(&mut self) {
        CURRENT.with(|cell| {
            let mut ctx = cell.borrow_mut();
            let flags = ctx.flags();
            *ctx = self.saved;
            ctx.set_flags(flags);
        });
        debug!(precision = self.saved.precision(), "local context restored");
    }
}
