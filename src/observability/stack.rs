//! Backtraces taken at the panic site.
//!
//! By the time `catch_unwind` returns the panicking frames are gone, so a
//! process-wide panic hook captures the stack first. It only does so on a
//! thread that is currently running a logged request, and leaves the result
//! in a thread-local for the request logger to take.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the capturing hook in front of whatever hook is already set.
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if DEPTH.try_with(Cell::get).unwrap_or(0) > 0 {
                let stack = Backtrace::force_capture();
                let _ = CAPTURED.try_with(|slot| *slot.borrow_mut() = Some(stack));
            }
            previous(info);
        }));
    });
}

/// The stack of the last panic raised under [`capturing`] or [`CaptureStack`]
/// on this thread.
pub(crate) fn take() -> Option<Backtrace> {
    CAPTURED.with(|slot| slot.borrow_mut().take())
}

fn discard() {
    CAPTURED.with(|slot| slot.borrow_mut().take());
}

struct Capturing;

impl Capturing {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        Capturing
    }
}

impl Drop for Capturing {
    fn drop(&mut self) {
        let _ = DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f` with panic-site capture enabled.
pub(crate) fn capturing<R>(f: impl FnOnce() -> R) -> R {
    let _guard = Capturing::enter();
    f()
}

/// Future adapter that enables panic-site capture while `inner` is polled.
pub(crate) struct CaptureStack<F> {
    inner: Pin<Box<F>>,
}

impl<F: Future> CaptureStack<F> {
    pub(crate) fn new(inner: F) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl<F: Future> Future for CaptureStack<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _guard = Capturing::enter();
        let polled = self.get_mut().inner.as_mut().poll(cx);
        // Reaching here means nothing unwound past us; panics the handler
        // caught itself must not be reported later.
        discard();
        polled
    }
}
