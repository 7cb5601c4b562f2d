use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::guid::Guid;

/// Default block size for outgoing data phases.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Configuration for PTP/IP connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfig {
    /// Connect, read and write timeout on both sockets. Default: 2.5 s.
    pub io_timeout: Duration,
    /// Readiness wait of a fast event check. Default: 1 µs.
    pub fast_event_timeout: Duration,
    /// Readiness wait of a waiting event check. Default: 1 ms.
    pub wait_event_timeout: Duration,
    /// Bytes pulled from the data source per outgoing block. Default: 64 KiB.
    pub block_size: usize,
    /// Extra event-socket connect attempts after "connection refused". Default: 2.
    pub event_connect_retries: u32,
    /// Pause between event-socket connect attempts. Default: 100 ms.
    pub event_retry_delay: Duration,
    /// Initiator GUID. A random one is generated per connection when unset.
    pub guid: Option<Guid>,
    /// Initiator name sent in the init request. The system host name when unset.
    pub host_name: Option<String>,
    /// Leave the event socket unconnected until
    /// [`PtpIpTransport::connect_event_channel`](crate::PtpIpTransport::connect_event_channel).
    pub defer_event_channel: bool,
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_millis(2500),
            fast_event_timeout: Duration::from_micros(1),
            wait_event_timeout: Duration::from_millis(1),
            block_size: DEFAULT_BLOCK_SIZE,
            event_connect_retries: 2,
            event_retry_delay: Duration::from_millis(100),
            guid: None,
            host_name: None,
            defer_event_channel: false,
        }
    }
}

impl IpConfig {
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_event_timeouts(mut self, fast: Duration, wait: Duration) -> Self {
        self.fast_event_timeout = fast;
        self.wait_event_timeout = wait;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn with_event_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.event_connect_retries = retries;
        self.event_retry_delay = delay;
        self
    }

    pub fn with_guid(mut self, guid: Guid) -> Self {
        self.guid = Some(guid);
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn with_deferred_event_channel(mut self, defer: bool) -> Self {
        self.defer_event_channel = defer;
        self
    }
}
