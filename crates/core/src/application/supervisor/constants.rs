// Supervisor constants (No magic values)
use std::time::Duration;

/// Delay between liveness polls (1s)
/// Bounded, not exact: trades CPU usage against exit-detection latency
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest accepted poll interval; tokio intervals reject a zero period
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Delay between supervised launches so each service can bind its port (2s)
pub const DEFAULT_SUPERVISED_STAGGER: Duration = Duration::from_secs(2);

/// Delay between detached session requests so windows open in order (1s)
pub const DEFAULT_DETACHED_STAGGER: Duration = Duration::from_secs(1);
