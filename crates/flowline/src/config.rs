//! Tunables the wire spec leaves to the implementer.
//!
//! Mirrors the constants-plus-builder split `hdds::config` uses for its
//! RTPS ports: cheap `const` defaults for the common case, a small builder
//! for callers that need to override one or two values.

use std::time::Duration;

/// Default 256-bit MAC key (four 64-bit words), matching the "convenience
/// random default key" `lasr::mac_codec::default_key` provides.
pub const DEFAULT_MAC_KEY: [u64; 4] = [
    0xb6b9_bb54_4bfd_7e87,
    0xd5c3_f7cc_c7c7_dfd4,
    0x807d_bb00_23c7_c781,
    0x1347_3d62_0bd5_426c,
];

/// Unbounded serial-line packet size (the default when no limit is set).
pub const UNLIMITED_PACKET_SIZE: usize = usize::MAX;

/// Default bounded-queue capacity when a caller passes `-1` ("use the
/// default").
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default `poll(2)` wait granularity used while waiting on a `Flag` or a
/// `Queue` with no caller-supplied deadline, purely to bound how long a
/// cancellation check is delayed.
pub const DEFAULT_POLL_GRANULARITY: Duration = Duration::from_millis(250);

/// Runtime-tunable knobs for a [`crate::transport::Connection`] or
/// [`crate::sync::ThreadPool`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    mac_key: [u64; 4],
    max_packet_size: usize,
    queue_capacity: usize,
    worker_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            mac_key: DEFAULT_MAC_KEY,
            max_packet_size: UNLIMITED_PACKET_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mac_key(mut self, key: [u64; 4]) -> Self {
        self.mac_key = key;
        self
    }

    pub fn mac_key(&self) -> [u64; 4] {
        self.mac_key
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count.max(1);
        self
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Resolves the "-1 means default" convention `spec.md` §4.5 uses for
    /// queue capacities and pool sizes.
    pub fn resolve_capacity(&self, requested: isize) -> usize {
        if requested < 0 {
            self.queue_capacity
        } else {
            (requested as usize).max(1)
        }
    }
}
