//! The emulated card as driven by the host.
//!
//! The host platform owns the actual service: it is started, registered for an AID and kept in the
//! foreground outside of this crate. It forwards every command it receives to
//! [`HostCardService::process_command_apdu`], and reports the end of the link through
//! [`HostCardService::on_deactivated`].

use std::fmt::{Display, Formatter};

use crate::nfc::{Applet, Extras};
use crate::trace::{debug, info};

/// Why the host stopped routing commands to the service.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeactivationReason {
    /// The NFC link with the reader was lost.
    LinkLoss,

    /// The reader selected another AID.
    Deselected,

    /// A reason unknown to this crate.
    Other(i32),
}

impl From<i32> for DeactivationReason {
    fn from(reason: i32) -> Self {
        use DeactivationReason::*;

        match reason {
            0 => LinkLoss,
            1 => Deselected,
            _ => Other(reason),
        }
    }
}

impl From<DeactivationReason> for i32 {
    fn from(reason: DeactivationReason) -> Self {
        use DeactivationReason::*;

        match reason {
            LinkLoss => 0,
            Deselected => 1,
            Other(reason) => reason,
        }
    }
}

impl Display for DeactivationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinkLoss => write!(f, "link loss"),
            Self::Deselected => write!(f, "deselected"),
            Self::Other(reason) => write!(f, "unknown ({})", reason),
        }
    }
}

/// Hooks into the host around a session with a reader.
/// Both do nothing by default.
pub trait Lifecycle {
    fn on_session_start(&self) {}

    fn on_session_end(&self, _reason: DeactivationReason) {}
}

impl Lifecycle for () {}

/// An applet wired to the host's lifecycle hooks.
pub struct HostCardService<A, L = ()>
where
    A: Applet,
    L: Lifecycle,
{
    applet: A,
    lifecycle: L,
}

impl<A> HostCardService<A>
where
    A: Applet,
{
    /// Initiates a service without lifecycle hooks.
    pub fn new(applet: A) -> Self {
        Self::with_lifecycle(applet, ())
    }
}

impl<A, L> HostCardService<A, L>
where
    A: Applet,
    L: Lifecycle,
{
    pub fn with_lifecycle(applet: A, lifecycle: L) -> Self {
        Self { applet, lifecycle }
    }

    pub fn applet(&self) -> &A {
        &self.applet
    }

    /// Called once the host has brought the service up.
    pub fn start(&self) {
        info!("Service started");

        self.lifecycle.on_session_start();
    }

    /// Processes a command APDU received from the reader, then returns the response APDU.
    pub fn process_command_apdu(&self, command: Option<&[u8]>, extras: Option<&Extras>) -> Vec<u8> {
        debug!(
            "RX: {}",
            command.map(crate::codec::bytes_to_hex).unwrap_or_default()
        );

        let response = self.applet.process_command_apdu(command, extras);

        debug!("TX: {}", crate::codec::bytes_to_hex(&response));

        response
    }

    /// Called by the host when the reader is gone.
    pub fn on_deactivated(&self, reason: i32) {
        let reason = DeactivationReason::from(reason);

        info!("Deactivated: {}", reason);

        self.lifecycle.on_session_end(reason);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{Dispatcher, Echo};

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl Lifecycle for &Recorder {
        fn on_session_start(&self) {
            self.events.borrow_mut().push("start".to_owned());
        }

        fn on_session_end(&self, reason: DeactivationReason) {
            self.events.borrow_mut().push(format!("end: {}", reason));
        }
    }

    #[test]
    fn test_reason() {
        assert_eq!(DeactivationReason::LinkLoss, DeactivationReason::from(0));
        assert_eq!(DeactivationReason::Deselected, DeactivationReason::from(1));
        assert_eq!(DeactivationReason::Other(42), DeactivationReason::from(42));
        assert_eq!(-1, i32::from(DeactivationReason::Other(-1)));
        assert_eq!(1, i32::from(DeactivationReason::Deselected));
    }

    #[test]
    fn test_lifecycle() {
        let recorder = Recorder::default();
        let service = HostCardService::with_lifecycle(Dispatcher::default(), &recorder);

        service.start();
        service.on_deactivated(0);
        service.on_deactivated(1);
        service.on_deactivated(7);

        assert_eq!(
            vec!["start", "end: link loss", "end: deselected", "end: unknown (7)"],
            *recorder.events.borrow(),
        );
    }

    #[test]
    fn test_process_command_apdu() {
        let service = HostCardService::new(Dispatcher::default());
        let command = [
            0x00, 0xA4, 0x04, 0x0C, 0x07, 0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01,
        ];

        assert_eq!(vec![0x90, 0x00], service.process_command_apdu(Some(&command), None));
        assert_eq!(vec![0x6F, 0x00], service.process_command_apdu(None, None));

        let mut extras = Extras::new();
        extras.insert("tech".to_owned(), "IsoDep".to_owned());
        assert_eq!(
            vec![0x90, 0x00],
            service.process_command_apdu(Some(&command), Some(&extras)),
        );
    }

    #[test]
    fn test_echo_service() {
        let service = HostCardService::new(Echo);

        assert_eq!(vec![0x00, 0xB0], service.process_command_apdu(Some(&[0x00, 0xB0]), None));
    }
}
