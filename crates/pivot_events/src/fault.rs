//! # Fault Sink
//!
//! Out-of-band diagnostics for subscribers that panic mid-dispatch.
//!
//! Every fault is logged through `tracing` AND queued on a bounded channel so
//! an overlay or a test can inspect it later. The queue never blocks the
//! dispatching thread: when it is full the report is dropped (and that drop is
//! itself logged).

use std::any::Any;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::bus::SubscriptionId;

/// Default number of undrained fault reports kept.
pub const DEFAULT_FAULT_CAPACITY: usize = 256;

/// One contained subscriber failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultReport {
    /// Name of the event being dispatched.
    pub event: &'static str,
    /// The subscription that failed.
    pub subscription: SubscriptionId,
    /// Owner name (module name, or the system label).
    pub owner: String,
    /// Panic message, if it was a string.
    pub message: String,
}

/// Bounded fault queue.
#[derive(Clone)]
pub struct FaultSink {
    sender: Sender<FaultReport>,
    receiver: Receiver<FaultReport>,
}

impl FaultSink {
    /// Creates a sink holding at most `capacity` undrained reports.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Logs and queues a report.
    pub fn report(&self, report: FaultReport) {
        tracing::error!(
            event = report.event,
            subscription = %report.subscription,
            owner = %report.owner,
            message = %report.message,
            "subscriber panicked, dispatch continues"
        );

        match self.sender.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(event = dropped.event, "fault sink full, report dropped");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Receiver for draining reports.
    #[must_use]
    pub fn receiver(&self) -> Receiver<FaultReport> {
        self.receiver.clone()
    }

    /// Removes and returns every queued report.
    #[must_use]
    pub fn drain(&self) -> Vec<FaultReport> {
        self.receiver.try_iter().collect()
    }
}

impl Default for FaultSink {
    fn default() -> Self {
        Self::new(DEFAULT_FAULT_CAPACITY)
    }
}

/// Extracts a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(n: u64) -> FaultReport {
        FaultReport {
            event: "Tick.Pre",
            subscription: SubscriptionId(n),
            owner: "Test".into(),
            message: "boom".into(),
        }
    }

    #[test]
    fn full_sink_drops_instead_of_blocking() {
        let sink = FaultSink::new(2);
        sink.report(report(1));
        sink.report(report(2));
        sink.report(report(3));

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].subscription, SubscriptionId(1));
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn receiver_observes_reports_from_another_thread() {
        let sink = FaultSink::new(4);
        let receiver = sink.receiver();

        let reporter = sink.clone();
        std::thread::spawn(move || reporter.report(report(9)))
            .join()
            .unwrap();

        assert_eq!(receiver.try_recv().unwrap().subscription, SubscriptionId(9));
        assert!(sink.drain().is_empty());
    }
}
