//! Non-fatal diagnostics

/// Report `cond` the first time it holds at this call site
///
/// Linux equivalent: `WARN_ON_ONCE(cond)`. Evaluates to `cond` so it can
/// guard an early return.
macro_rules! warn_on_once {
    ($cond:expr, $($arg:tt)+) => {{
        static WARNED: ::core::sync::atomic::AtomicBool =
            ::core::sync::atomic::AtomicBool::new(false);
        let cond: bool = $cond;
        if cond && !WARNED.swap(true, ::core::sync::atomic::Ordering::Relaxed) {
            ::tracing::warn!($($arg)+);
        }
        cond
    }};
}

pub(crate) use warn_on_once;
