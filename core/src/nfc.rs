//! Answering a reader over NFC

pub use apdu::core::{HandleError, HandlerInCtx, Result};

use std::collections::HashMap;

/// Auxiliary metadata the host hands over with a command.
/// Passed through untouched.
pub type Extras = HashMap<String, String>;

/// An emulated application on the card side of the link
pub trait Applet {
    /// Processes a command APDU received from the reader, then returns the response APDU.
    /// `None` means the host received no command at all.
    fn process_command_apdu(&self, command: Option<&[u8]>, extras: Option<&Extras>) -> Vec<u8>;
}

impl<T> Applet for Box<T>
where
    T: Applet + ?Sized,
{
    fn process_command_apdu(&self, command: Option<&[u8]>, extras: Option<&Extras>) -> Vec<u8> {
        (**self).process_command_apdu(command, extras)
    }
}

/// Implements `HandlerInCtx` for an `Applet`, writing the response into the caller's buffer.
macro_rules! handler {
    ($t: ty) => {
        impl<Ctx> $crate::nfc::HandlerInCtx<Ctx> for $t {
            fn handle_in_ctx(
                &self,
                _: Ctx,
                command: &[u8],
                response: &mut [u8],
            ) -> $crate::nfc::Result {
                let rx = $crate::nfc::Applet::process_command_apdu(self, Some(command), None);
                let len = rx.len();
                if response.len() < len {
                    return Err($crate::nfc::HandleError::NotEnoughBuffer(len));
                }

                response[..len].copy_from_slice(&rx);

                Ok(len)
            }
        }
    };
}

pub(crate) use handler;
