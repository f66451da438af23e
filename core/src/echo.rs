use crate::nfc::{handler, Applet, Extras};

/// An applet answering every command with the command itself.
/// Nothing is classified, so this only serves as a stand-in for a real application.
#[derive(Copy, Clone, Debug, Default)]
pub struct Echo;

impl Applet for Echo {
    fn process_command_apdu(&self, command: Option<&[u8]>, _: Option<&Extras>) -> Vec<u8> {
        command.map(Vec::from).unwrap_or_default()
    }
}

handler!(Echo);
