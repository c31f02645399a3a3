#[doc(hidden)]
#[macro_export]
macro_rules! time {
    ($what:expr, $($token:tt)*) => ({
        let start = std::time::Instant::now();
        let value = { $($token)* };
        $crate::tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "{} finished", $what);
        value
    });
}

pub use time;
