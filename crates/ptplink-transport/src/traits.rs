use ptplink_frame::{Container, Event};
use tracing::{trace, warn};

use crate::error::Result;
use crate::event::EventQueue;
use crate::handler::{DataSink, DataSource};

/// Direction of a transaction's data phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPhase {
    /// No data phase.
    None,
    /// The host sends data to the device.
    Send,
    /// The device sends data to the host.
    Receive,
}

/// What the transaction engine needs from a physical medium.
///
/// Implementations queue any event they notice on the command path into the
/// `events` queue passed to the transfer methods. Event checks report "nothing
/// pending" as [`TransportError::Timeout`](crate::TransportError::Timeout).
pub trait Transport {
    /// Send a request container.
    ///
    /// Implementations perform one fast event check before sending.
    fn send_request(
        &mut self,
        request: &Container,
        phase: DataPhase,
        events: &mut EventQueue,
    ) -> Result<()>;

    /// Send `size` bytes pulled from `source` as the request's data phase.
    ///
    /// Implementations pull in bounded blocks and perform one fast event
    /// check per block.
    fn send_data(
        &mut self,
        request: &Container,
        size: u64,
        source: &mut dyn DataSource,
        events: &mut EventQueue,
    ) -> Result<()>;

    /// Receive the request's data phase into `sink`.
    fn get_data(
        &mut self,
        request: &Container,
        sink: &mut dyn DataSink,
        events: &mut EventQueue,
    ) -> Result<()>;

    /// Receive the response to `request`.
    fn get_response(&mut self, request: &Container, events: &mut EventQueue) -> Result<Container>;

    /// Return an event if one is already waiting, without blocking.
    fn check_event_fast(&mut self) -> Result<Event>;

    /// Wait a short, transport-defined time for an event.
    fn check_event_wait(&mut self) -> Result<Event>;

    /// Ask the device to abandon `transaction_id`. Best effort.
    fn cancel(&mut self, transaction_id: u32) -> Result<()>;

    /// Release the underlying medium.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Short transport name for logs.
    fn name(&self) -> &'static str;

    /// Opportunistic event check used on the command path.
    ///
    /// Queues whatever a fast check returns. Failures are logged and never
    /// fail the command that triggered the check.
    fn drain_event(&mut self, events: &mut EventQueue) {
        match self.check_event_fast() {
            Ok(event) => {
                trace!(code = event.code, "queued event");
                events.push(event);
            }
            Err(err) if err.is_timeout() => {}
            Err(err) => warn!(transport = self.name(), %err, "event check failed"),
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_request(
        &mut self,
        request: &Container,
        phase: DataPhase,
        events: &mut EventQueue,
    ) -> Result<()> {
        (**self).send_request(request, phase, events)
    }

    fn send_data(
        &mut self,
        request: &Container,
        size: u64,
        source: &mut dyn DataSource,
        events: &mut EventQueue,
    ) -> Result<()> {
        (**self).send_data(request, size, source, events)
    }

    fn get_data(
        &mut self,
        request: &Container,
        sink: &mut dyn DataSink,
        events: &mut EventQueue,
    ) -> Result<()> {
        (**self).get_data(request, sink, events)
    }

    fn get_response(&mut self, request: &Container, events: &mut EventQueue) -> Result<Container> {
        (**self).get_response(request, events)
    }

    fn check_event_fast(&mut self) -> Result<Event> {
        (**self).check_event_fast()
    }

    fn check_event_wait(&mut self) -> Result<Event> {
        (**self).check_event_wait()
    }

    fn cancel(&mut self, transaction_id: u32) -> Result<()> {
        (**self).cancel(transaction_id)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn drain_event(&mut self, events: &mut EventQueue) {
        (**self).drain_event(events)
    }
}
