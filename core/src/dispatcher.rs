//! Classifying a command APDU into a status word.
//!
//! Only `SELECT` by the registered AID is accepted. Every command is resolved on its own,
//! nothing is carried over between calls:
//!
//! 1. An absent, empty or short (less than 6 octets) command fails.
//! 2. A class other than `00` is not supported.
//! 3. An instruction other than `SELECT` (`A4`) is not supported.
//! 4. The AID in the command data must match the registered one.
//!
//! ## Usage
//! ```rust
//! use hce::{Config, Dispatcher, StatusWord};
//!
//! let dispatcher = Dispatcher::new(Config::default());
//! let command = [0x00, 0xA4, 0x04, 0x0C, 0x07, 0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01];
//!
//! assert_eq!(StatusWord::SUCCESS, dispatcher.dispatch(Some(&command)));
//! ```

use crate::codec::constant_byte_equals;
use crate::command::{CommandApdu, CLA_DEFAULT, INS_SELECT};
use crate::config::Config;
use crate::nfc::{handler, Applet, Extras};
use crate::status::StatusWord;
use crate::trace::debug;

/// Reasons a command is not answered with success.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("No command was received")]
    NullOrMissingCommand,

    #[error("The command is too short: {0} octets")]
    TooShortCommand(usize),

    #[error("The class is not supported: {0:#04X}")]
    UnsupportedClass(u8),

    #[error("The instruction is not supported: {0:#04X}")]
    UnsupportedInstruction(u8),

    #[error("The AID does not match the registered one")]
    AidMismatch,
}

/// Answers command APDUs on behalf of a single application.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    config: Config,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks the command against the registered application.
    pub fn classify(&self, command: Option<&[u8]>) -> Result<(), Rejection> {
        let bytes = match command {
            None | Some([]) => return Err(Rejection::NullOrMissingCommand),
            Some(bytes) => bytes,
        };

        let command = CommandApdu::new(bytes).ok_or(Rejection::TooShortCommand(bytes.len()))?;

        if command.cla() != CLA_DEFAULT {
            return Err(Rejection::UnsupportedClass(command.cla()));
        }

        if command.ins() != INS_SELECT {
            return Err(Rejection::UnsupportedInstruction(command.ins()));
        }

        let aid = self.config.aid.as_bytes();
        match command.data(aid.len()) {
            Some(data) if constant_byte_equals(data, aid) => Ok(()),
            _ => Err(Rejection::AidMismatch),
        }
    }

    /// Resolves the command into the status word to answer with.
    pub fn dispatch(&self, command: Option<&[u8]>) -> StatusWord {
        let words = &self.config.status_words;

        match self.classify(command) {
            Ok(_) => words.success,
            Err(rejection) => {
                debug!("Rejected: {}", rejection);

                match rejection {
                    Rejection::UnsupportedClass(_) => words.cla_not_supported,
                    Rejection::UnsupportedInstruction(_) => words.ins_not_supported,
                    _ => words.failed,
                }
            }
        }
    }
}

impl Applet for Dispatcher {
    fn process_command_apdu(&self, command: Option<&[u8]>, _: Option<&Extras>) -> Vec<u8> {
        self.dispatch(command).into()
    }
}

handler!(Dispatcher);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::hex_to_bytes;
    use crate::config::Aid;
    use crate::nfc::{HandleError, HandlerInCtx};

    fn dispatch_hex(dispatcher: &Dispatcher, hex: &str) -> Vec<u8> {
        let command = hex_to_bytes(hex).unwrap();

        dispatcher.process_command_apdu(Some(&command), None)
    }

    #[test]
    fn test_select_registered_aid() {
        let dispatcher = Dispatcher::default();

        assert_eq!(
            vec![0x90, 0x00],
            dispatch_hex(&dispatcher, "00A4040C07A0000002471001"),
        );
        assert_eq!(
            Ok(()),
            dispatcher.classify(Some(&hex_to_bytes("00A4040C07A0000002471001").unwrap())),
        );
    }

    #[test]
    fn test_select_with_trailing_le() {
        let dispatcher = Dispatcher::default();

        assert_eq!(
            vec![0x90, 0x00],
            dispatch_hex(&dispatcher, "00A4040007A000000247100100"),
        );
    }

    #[test]
    fn test_select_other_aid() {
        let dispatcher = Dispatcher::default();
        let command = hex_to_bytes("00A4040C07A0000002471099").unwrap();

        assert_eq!(vec![0x6F, 0x00], dispatch_hex(&dispatcher, "00A4040C07A0000002471099"));
        assert_eq!(Err(Rejection::AidMismatch), dispatcher.classify(Some(&command)));
    }

    #[test]
    fn test_missing_command() {
        let dispatcher = Dispatcher::default();

        assert_eq!(vec![0x6F, 0x00], dispatcher.process_command_apdu(None, None));
        assert_eq!(vec![0x6F, 0x00], dispatcher.process_command_apdu(Some(&[]), None));
        assert_eq!(
            Err(Rejection::NullOrMissingCommand),
            dispatcher.classify(None),
        );
        assert_eq!(
            Err(Rejection::NullOrMissingCommand),
            dispatcher.classify(Some(&[])),
        );
    }

    #[test]
    fn test_too_short_command() {
        let dispatcher = Dispatcher::default();

        assert_eq!(vec![0x6F, 0x00], dispatch_hex(&dispatcher, "00A4040C07"));
        assert_eq!(
            Err(Rejection::TooShortCommand(5)),
            dispatcher.classify(Some(&[0x00, 0xA4, 0x04, 0x0C, 0x07])),
        );
    }

    #[test]
    fn test_truncated_aid() {
        let dispatcher = Dispatcher::default();

        for hex in ["00A4040C07A0", "00A4040C07A00000024710"] {
            assert_eq!(vec![0x6F, 0x00], dispatch_hex(&dispatcher, hex));
        }
    }

    #[test]
    fn test_unsupported_class() {
        let dispatcher = Dispatcher::default();
        let command = hex_to_bytes("01A4000C340A000000247100").unwrap();

        assert_eq!(vec![0x6E, 0x00], dispatch_hex(&dispatcher, "01A4000C340A000000247100"));
        assert_eq!(
            Err(Rejection::UnsupportedClass(0x01)),
            dispatcher.classify(Some(&command)),
        );
    }

    #[test]
    fn test_unsupported_class_checked_before_instruction() {
        let dispatcher = Dispatcher::default();

        assert_eq!(vec![0x6E, 0x00], dispatch_hex(&dispatcher, "80B0000000FF"));
    }

    #[test]
    fn test_overridden_cla_not_supported() {
        let config = Config::default().with_cla_not_supported(StatusWord(0x6D00));
        let dispatcher = Dispatcher::new(config);

        assert_eq!(vec![0x6D, 0x00], dispatch_hex(&dispatcher, "01A4040C07A0000002471001"));
    }

    #[test]
    fn test_unsupported_instruction() {
        let dispatcher = Dispatcher::default();

        assert_eq!(vec![0x6D, 0x00], dispatch_hex(&dispatcher, "00B0000000FF"));
        assert_eq!(
            Err(Rejection::UnsupportedInstruction(0xB0)),
            dispatcher.classify(Some(&[0x00, 0xB0, 0x00, 0x00, 0x00, 0xFF])),
        );
    }

    #[test]
    fn test_independent_applications() {
        let default = Dispatcher::default();
        let other = Dispatcher::new(Config::new("F0010203040506".parse::<Aid>().unwrap()));

        let command = "00A4040C07F0010203040506";
        assert_eq!(vec![0x6F, 0x00], dispatch_hex(&default, command));
        assert_eq!(vec![0x90, 0x00], dispatch_hex(&other, command));
    }

    #[test]
    fn test_longer_aid() {
        let aid: Aid = "D2760000850101".parse().unwrap();
        let dispatcher = Dispatcher::new(Config::new(aid));

        assert_eq!(vec![0x6F, 0x00], dispatch_hex(&dispatcher, "00A4040007D27600008501"));
        assert_eq!(vec![0x90, 0x00], dispatch_hex(&dispatcher, "00A4040007D2760000850101"));
    }

    #[test]
    fn test_handle_in_ctx() {
        let dispatcher = Dispatcher::default();
        let command = hex_to_bytes("00A4040C07A0000002471001").unwrap();

        let mut response = [0u8; 4];
        let len = dispatcher.handle_in_ctx((), &command, &mut response);
        assert!(matches!(len, Ok(2)));
        assert_eq!(&[0x90, 0x00], &response[..2]);

        let mut response = [0u8; 1];
        let len = dispatcher.handle_in_ctx((), &command, &mut response);
        assert!(matches!(len, Err(HandleError::NotEnoughBuffer(2))));
    }

    #[test]
    fn test_response_is_the_dispatched_status_word() {
        let dispatcher = Dispatcher::default();

        let commands = [
            "00A4040C07A0000002471001",
            "80A4040C07A0000002471001",
            "00B0000000FF",
            "00A4",
        ];

        for command in commands {
            let command = hex_to_bytes(command).unwrap();

            assert_eq!(
                Vec::from(dispatcher.dispatch(Some(&command))),
                dispatcher.process_command_apdu(Some(&command), None),
            );
        }
    }
}
