//! Binary command protocol spoken to the in-process agent
//!
//! Every command is a fixed-size record: one opcode byte followed by a
//! payload whose width is implied by the opcode. Integers are little-endian
//! and there is no length prefix or padding.
//!
//! ```text
//! byte 0:     opcode (u8)
//! bytes 1..N: payload, fixed width per opcode
//! ```

use crate::error::{HookpipeError, Result};

/// Well-known address of the agent's command endpoint
#[cfg(windows)]
pub const DEFAULT_PIPE_NAME: &str = r"\\.\pipe\ngu_cmd";

/// Well-known address of the agent's command endpoint
#[cfg(not(windows))]
pub const DEFAULT_PIPE_NAME: &str = "/tmp/ngu_cmd.sock";

/// Acknowledgement byte a conforming agent sends after a sync barrier.
/// The controller treats whatever single byte arrives as the token.
pub const ACK: u8 = Opcode::Sync as u8;

/// Longest record on the wire (SetCursorPos / SetKeyDown)
pub const MAX_RECORD_LEN: usize = 5;

/// One-byte command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    SetCursorPos = 0x0,
    RestoreCursorPos = 0x1,
    SetKeyDown = 0x2,
    RestoreKeyDown = 0x3,
    SetSpecialKey = 0x4,
    RestoreSpecialKey = 0x5,
    UnhookAll = 0x6,
    Eject = 0x7,
    HookFocus = 0x8,
    HookCursorPos = 0x9,
    HookKeyDown = 0xA,
    HookKeyString = 0xB,
    Sync = 0xC,
}

impl Opcode {
    /// Look up an opcode by its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let opcode = match byte {
            0x0 => Opcode::SetCursorPos,
            0x1 => Opcode::RestoreCursorPos,
            0x2 => Opcode::SetKeyDown,
            0x3 => Opcode::RestoreKeyDown,
            0x4 => Opcode::SetSpecialKey,
            0x5 => Opcode::RestoreSpecialKey,
            0x6 => Opcode::UnhookAll,
            0x7 => Opcode::Eject,
            0x8 => Opcode::HookFocus,
            0x9 => Opcode::HookCursorPos,
            0xA => Opcode::HookKeyDown,
            0xB => Opcode::HookKeyString,
            0xC => Opcode::Sync,
            _ => return None,
        };
        Some(opcode)
    }

    /// Payload width in bytes
    pub fn payload_len(&self) -> usize {
        match self {
            Opcode::SetCursorPos => 4,
            Opcode::SetKeyDown => 4,
            Opcode::SetSpecialKey => 1,
            _ => 0,
        }
    }

    /// Total record width including the opcode byte
    pub fn record_len(&self) -> usize {
        1 + self.payload_len()
    }
}

/// Command sent from controller to agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fake the position returned by the cursor-position query
    SetCursorPos { x: i32, y: i32 },
    RestoreCursorPos,

    /// Fake the key code reported as pressed (agent key codes match ASCII)
    SetKeyDown { keycode: i32 },
    RestoreKeyDown,

    /// Fake the held special key (see [`crate::types::SpecialKey`])
    SetSpecialKey { keycode: u32 },
    RestoreSpecialKey,

    UnhookAll,

    /// Stop the agent's server loop. Not followed by a sync.
    Eject,

    HookFocus,
    HookCursorPos,
    HookKeyDown,
    HookKeyString,

    /// Barrier: completes once the previous command has been applied
    Sync,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetCursorPos { .. } => Opcode::SetCursorPos,
            Command::RestoreCursorPos => Opcode::RestoreCursorPos,
            Command::SetKeyDown { .. } => Opcode::SetKeyDown,
            Command::RestoreKeyDown => Opcode::RestoreKeyDown,
            Command::SetSpecialKey { .. } => Opcode::SetSpecialKey,
            Command::RestoreSpecialKey => Opcode::RestoreSpecialKey,
            Command::UnhookAll => Opcode::UnhookAll,
            Command::Eject => Opcode::Eject,
            Command::HookFocus => Opcode::HookFocus,
            Command::HookCursorPos => Opcode::HookCursorPos,
            Command::HookKeyDown => Opcode::HookKeyDown,
            Command::HookKeyString => Opcode::HookKeyString,
            Command::Sync => Opcode::Sync,
        }
    }

    /// Whether the channel follows this command with a sync barrier
    pub fn needs_sync(&self) -> bool {
        !matches!(self, Command::Eject | Command::Sync)
    }

    /// Encode into a fixed-length record.
    ///
    /// Cursor and special-key fields are narrowed to their wire width; a value
    /// that does not fit fails with [`HookpipeError::EncodingError`] instead
    /// of truncating. The key code is already `i32` on the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let opcode = self.opcode();
        let mut buf = Vec::with_capacity(opcode.record_len());
        buf.push(opcode as u8);

        match *self {
            Command::SetCursorPos { x, y } => {
                buf.extend_from_slice(&narrow::<i16, _>("x", x)?.to_le_bytes());
                buf.extend_from_slice(&narrow::<i16, _>("y", y)?.to_le_bytes());
            }
            Command::SetKeyDown { keycode } => buf.extend_from_slice(&keycode.to_le_bytes()),
            Command::SetSpecialKey { keycode } => {
                buf.push(narrow::<u8, _>("special keycode", keycode)?);
            }
            _ => {}
        }

        debug_assert_eq!(buf.len(), opcode.record_len());
        Ok(buf)
    }
}

fn narrow<T, V>(field: &str, value: V) -> Result<T>
where
    V: Copy + std::fmt::Display + TryInto<T>,
{
    value.try_into().map_err(|_| {
        HookpipeError::EncodingError(format!(
            "{} = {} does not fit in {}",
            field,
            value,
            std::any::type_name::<T>()
        ))
    })
}

/// Agent-side behavioral patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Application focus event; needed while the window is not focused.
    /// Takes effect after the window has been focused and unfocused once.
    Focus,
    CursorPos,
    KeyDown,
    KeyString,
}

impl Hook {
    /// Install command for this hook
    pub fn command(&self) -> Command {
        match self {
            Hook::Focus => Command::HookFocus,
            Hook::CursorPos => Command::HookCursorPos,
            Hook::KeyDown => Command::HookKeyDown,
            Hook::KeyString => Command::HookKeyString,
        }
    }
}

/// Hooks needed for automation while the target window lacks focus,
/// in installation order
pub const SESSION_BUNDLE: [Hook; 4] = [Hook::Focus, Hook::CursorPos, Hook::KeyDown, Hook::KeyString];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_pos_golden_bytes() {
        let bytes = Command::SetCursorPos { x: 100, y: 200 }.encode().unwrap();
        assert_eq!(bytes, vec![0x00, 0x64, 0x00, 0xC8, 0x00]);
        assert_eq!(Command::RestoreCursorPos.encode().unwrap(), vec![0x01]);
        assert_eq!(Command::Sync.encode().unwrap(), vec![0x0C]);
    }

    #[test]
    fn negative_coordinates_are_twos_complement() {
        let bytes = Command::SetCursorPos { x: -1, y: -32768 }.encode().unwrap();
        assert_eq!(bytes, vec![0x00, 0xFF, 0xFF, 0x00, 0x80]);
    }

    #[test]
    fn key_down_is_i32_le() {
        let bytes = Command::SetKeyDown { keycode: 276 }.encode().unwrap();
        assert_eq!(bytes, vec![0x02, 0x14, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn negative_key_code_is_sent_as_is() {
        let bytes = Command::SetKeyDown { keycode: -1 }.encode().unwrap();
        assert_eq!(bytes, vec![0x02, 0xFF, 0xFF, 0xFF, 0xFF]);

        let bytes = Command::SetKeyDown { keycode: i32::MIN }.encode().unwrap();
        assert_eq!(bytes, vec![0x02, 0x00, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn special_key_is_single_byte() {
        let bytes = Command::SetSpecialKey { keycode: 2 }.encode().unwrap();
        assert_eq!(bytes, vec![0x04, 0x02]);
    }

    #[test]
    fn record_length_matches_opcode_table() {
        let commands = [
            Command::SetCursorPos { x: 1, y: 2 },
            Command::RestoreCursorPos,
            Command::SetKeyDown { keycode: 97 },
            Command::RestoreKeyDown,
            Command::SetSpecialKey { keycode: 0 },
            Command::RestoreSpecialKey,
            Command::UnhookAll,
            Command::Eject,
            Command::HookFocus,
            Command::HookCursorPos,
            Command::HookKeyDown,
            Command::HookKeyString,
            Command::Sync,
        ];

        for (expected_op, command) in commands.iter().enumerate() {
            let bytes = command.encode().unwrap();
            assert_eq!(bytes[0] as usize, expected_op);
            assert_eq!(bytes.len(), command.opcode().record_len());
            assert!(bytes.len() <= MAX_RECORD_LEN);
            assert_eq!(Opcode::from_byte(bytes[0]), Some(command.opcode()));
        }
    }

    #[test]
    fn out_of_range_payloads_fail() {
        let cases = [
            Command::SetCursorPos { x: 32768, y: 0 },
            Command::SetCursorPos { x: 0, y: -32769 },
            Command::SetSpecialKey { keycode: 256 },
        ];

        for command in cases {
            match command.encode() {
                Err(HookpipeError::EncodingError(_)) => {}
                other => panic!("expected encoding error for {:?}, got {:?}", command, other),
            }
        }
    }

    #[test]
    fn unknown_opcode_byte() {
        assert_eq!(Opcode::from_byte(0x0D), None);
        assert_eq!(Opcode::from_byte(0xFF), None);
    }

    #[test]
    fn only_eject_and_sync_skip_barrier() {
        assert!(!Command::Eject.needs_sync());
        assert!(!Command::Sync.needs_sync());
        assert!(Command::UnhookAll.needs_sync());
        assert!(Command::SetCursorPos { x: 0, y: 0 }.needs_sync());
    }

    #[test]
    fn bundle_order() {
        let commands: Vec<Command> = SESSION_BUNDLE.iter().map(Hook::command).collect();
        assert_eq!(
            commands,
            vec![
                Command::HookFocus,
                Command::HookCursorPos,
                Command::HookKeyDown,
                Command::HookKeyString
            ]
        );
    }
}
