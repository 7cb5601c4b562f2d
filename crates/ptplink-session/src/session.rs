use std::time::{Duration, Instant};

use bytes::Bytes;
use ptplink_frame::codes::op;
use ptplink_frame::{Container, DeviceInfo, Event};
use ptplink_transport::{
    BufferSink, DataPhase, DataSink, DataSource, EventQueue, MemorySource, Transport,
};
use tracing::{debug, info, trace};

use crate::error::{Result, SessionError};

/// Data phase of one transaction, with the handler that serves it.
pub enum Payload<'a> {
    /// Request and response only.
    None,
    /// The host sends `size` bytes pulled from `source`.
    Send {
        size: u64,
        source: &'a mut dyn DataSource,
    },
    /// The device sends data, pushed into the sink.
    Receive(&'a mut dyn DataSink),
}

impl Payload<'_> {
    pub fn phase(&self) -> DataPhase {
        match self {
            Self::None => DataPhase::None,
            Self::Send { .. } => DataPhase::Send,
            Self::Receive(_) => DataPhase::Receive,
        }
    }
}

impl std::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Send { size, .. } => f.debug_struct("Send").field("size", size).finish(),
            Self::Receive(_) => f.write_str("Receive"),
        }
    }
}

/// One logical connection to a device.
///
/// Every operation takes `&mut self`, so two transactions never overlap on
/// the same session. Hosts sharing a session across threads wrap it in a
/// `Mutex`.
pub struct Session<T: Transport> {
    transport: T,
    session_id: u32,
    next_transaction_id: u32,
    last_transaction_id: Option<u32>,
    events: EventQueue,
    device_info: Option<DeviceInfo>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session_id: 0,
            next_transaction_id: 0,
            last_transaction_id: None,
            events: EventQueue::new(),
            device_info: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Current session id, 0 when no session is open.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Transaction id the most recent transaction was stamped with.
    pub fn last_transaction_id(&self) -> Option<u32> {
        self.last_transaction_id
    }

    fn advance_transaction_id(&mut self) -> u32 {
        let id = self.next_transaction_id;
        self.next_transaction_id = match id {
            u32::MAX => 1,
            n => n + 1,
        };
        self.last_transaction_id = Some(id);
        id
    }

    /// Run one request, optional data phase and response cycle.
    ///
    /// Non-OK responses are returned as values. Transport failures abort the
    /// transaction and are never retried here.
    pub fn transaction(&mut self, request: &Container, payload: Payload<'_>) -> Result<Container> {
        let mut request = request.clone();
        request.transaction_id = self.advance_transaction_id();
        request.session_id = self.session_id;
        debug!(
            transport = self.transport.name(),
            code = request.code,
            tid = request.transaction_id,
            phase = ?payload.phase(),
            "transaction"
        );

        self.transport
            .send_request(&request, payload.phase(), &mut self.events)?;
        match payload {
            Payload::None => {}
            Payload::Send { size, source } => {
                self.transport
                    .send_data(&request, size, source, &mut self.events)?;
            }
            Payload::Receive(sink) => {
                self.transport.get_data(&request, sink, &mut self.events)?;
            }
        }

        let mut response = self.transport.get_response(&request, &mut self.events)?;
        if response.transaction_id != request.transaction_id {
            return Err(SessionError::TransactionMismatch {
                expected: request.transaction_id,
                actual: response.transaction_id,
            });
        }
        response.session_id = self.session_id;
        trace!(
            code = response.code,
            params = ?response.params,
            "response"
        );
        Ok(response)
    }

    /// Transaction that sends `data` as its data phase.
    pub fn transaction_send(&mut self, request: &Container, data: &[u8]) -> Result<Container> {
        let mut source = MemorySource::new(data);
        self.transaction(
            request,
            Payload::Send {
                size: data.len() as u64,
                source: &mut source,
            },
        )
    }

    /// Transaction that collects the device's data phase in memory.
    pub fn transaction_receive(&mut self, request: &Container) -> Result<(Container, Bytes)> {
        let mut sink = BufferSink::new();
        let response = self.transaction(request, Payload::Receive(&mut sink))?;
        Ok((response, sink.into_bytes()))
    }

    /// Open session `id`. The next transaction after this one uses id 1.
    pub fn open_session(&mut self, id: u32) -> Result<()> {
        self.session_id = 0;
        self.next_transaction_id = 0;
        let request = Container {
            code: op::OPEN_SESSION,
            params: vec![id],
            ..Container::default()
        };
        let response = self.transaction(&request, Payload::None)?;
        ok_or_response(&response)?;
        self.session_id = id;
        info!(session = id, "session opened");
        Ok(())
    }

    pub fn close_session(&mut self) -> Result<()> {
        let response = self.transaction(&Container::new(op::CLOSE_SESSION), Payload::None)?;
        ok_or_response(&response)?;
        debug!(session = self.session_id, "session closed");
        self.session_id = 0;
        Ok(())
    }

    /// Fetch, decode and cache the device descriptor.
    pub fn get_device_info(&mut self) -> Result<&DeviceInfo> {
        let (response, data) = self.transaction_receive(&Container::new(op::GET_DEVICE_INFO))?;
        ok_or_response(&response)?;
        let info = DeviceInfo::decode(&data).map_err(SessionError::DeviceInfo)?;
        debug!(
            manufacturer = %info.manufacturer,
            model = %info.model,
            operations = info.operations_supported.len(),
            "device info"
        );
        Ok(self.device_info.insert(info))
    }

    /// Cached descriptor from the last [`get_device_info`](Self::get_device_info).
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    pub fn operation_supported(&self, code: u16) -> bool {
        self.device_info
            .as_ref()
            .is_some_and(|info| info.supports_operation(code))
    }

    pub fn event_supported(&self, code: u16) -> bool {
        self.device_info
            .as_ref()
            .is_some_and(|info| info.supports_event(code))
    }

    pub fn property_supported(&self, code: u16) -> bool {
        self.device_info
            .as_ref()
            .is_some_and(|info| info.supports_property(code))
    }

    /// Next event, without blocking.
    ///
    /// Events queued on the command path come first. `Ok(None)` means
    /// nothing is pending.
    pub fn check_event(&mut self) -> Result<Option<Event>> {
        if let Some(event) = self.events.pop() {
            return Ok(Some(event));
        }
        match self.transport.check_event_fast() {
            Ok(event) => Ok(Some(event)),
            Err(err) if err.is_timeout() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Wait up to `timeout` for an event.
    pub fn wait_event(&mut self, timeout: Duration) -> Result<Event> {
        if let Some(event) = self.events.pop() {
            return Ok(event);
        }
        let deadline = Instant::now() + timeout;
        loop {
            match self.transport.check_event_wait() {
                Ok(event) => return Ok(event),
                Err(err) if err.is_timeout() => {
                    if Instant::now() >= deadline {
                        return Err(SessionError::Timeout(timeout));
                    }
                    std::thread::yield_now();
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Events noticed on the command path and not yet handed out.
    pub fn pending_events(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Ask the device to abandon the most recent transaction.
    pub fn cancel(&mut self) -> Result<()> {
        let Some(id) = self.last_transaction_id else {
            return Ok(());
        };
        debug!(tid = id, "cancel");
        self.transport.cancel(id)?;
        Ok(())
    }

    /// Close the transport and drop the session.
    pub fn close(mut self) -> Result<()> {
        self.transport.close()?;
        Ok(())
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("session_id", &self.session_id)
            .field("next_transaction_id", &self.next_transaction_id)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

fn ok_or_response(response: &Container) -> Result<()> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(SessionError::Response {
            code: response.code,
        })
    }
}
