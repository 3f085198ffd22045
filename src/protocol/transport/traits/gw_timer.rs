//! Asynchronous timer abstraction providing the timing primitives required
//! by deadline and reconciliation logic.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait GwTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;

    /// Monotonic milliseconds since an arbitrary origin, used for aggregate
    /// deadlines spanning many awaited steps.
    fn now_ms(&self) -> u64;
}
