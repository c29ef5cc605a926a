//! Input posting module
//!
//! Input goes straight to the target window's message queue instead of the
//! global input stream, so the window does not need focus. The agent supplies
//! the matching cursor and key state.

use crate::error::Result;
use crate::types::MouseButton;

/// Receiver of simulated OS input for one window
pub trait InputSink {
    fn button_down(&self, button: MouseButton) -> Result<()>;
    fn button_up(&self, button: MouseButton) -> Result<()>;
    /// Mouse move with no buttons held; the position comes from the agent
    fn mouse_move(&self) -> Result<()>;
    /// Key-down for the key that produces `ch`
    fn key_down(&self, ch: char) -> Result<()>;
}

impl<T: InputSink + ?Sized> InputSink for &T {
    fn button_down(&self, button: MouseButton) -> Result<()> {
        (**self).button_down(button)
    }

    fn button_up(&self, button: MouseButton) -> Result<()> {
        (**self).button_up(button)
    }

    fn mouse_move(&self) -> Result<()> {
        (**self).mouse_move()
    }

    fn key_down(&self, ch: char) -> Result<()> {
        (**self).key_down(ch)
    }
}

#[cfg(windows)]
pub use self::windows_poster::WindowPoster;

#[cfg(windows)]
mod windows_poster {
    use super::InputSink;
    use crate::error::{HookpipeError, Result};
    use crate::types::MouseButton;
    use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
    use windows::Win32::UI::Input::KeyboardAndMouse::VkKeyScanW;
    use windows::Win32::UI::WindowsAndMessaging::{
        PostMessageW, SendMessageW, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN,
        WM_MBUTTONUP, WM_MOUSEMOVE, WM_RBUTTONDOWN, WM_RBUTTONUP,
    };

    // wParam key-state flags for mouse messages
    const MK_LBUTTON: usize = 0x0001;
    const MK_RBUTTON: usize = 0x0002;
    const MK_MBUTTON: usize = 0x0010;

    /// (key-state flag, down message, up message)
    fn button_messages(button: MouseButton) -> (usize, u32, u32) {
        match button {
            MouseButton::Left => (MK_LBUTTON, WM_LBUTTONDOWN, WM_LBUTTONUP),
            MouseButton::Right => (MK_RBUTTON, WM_RBUTTONDOWN, WM_RBUTTONUP),
            MouseButton::Middle => (MK_MBUTTON, WM_MBUTTONDOWN, WM_MBUTTONUP),
        }
    }

    /// Posts window messages to a single window
    #[derive(Debug, Clone, Copy)]
    pub struct WindowPoster {
        hwnd: HWND,
    }

    impl WindowPoster {
        pub fn new(hwnd: usize) -> Self {
            Self {
                hwnd: HWND(hwnd as *mut _),
            }
        }

        fn send(&self, msg: u32, wparam: usize) {
            unsafe {
                let _ = SendMessageW(self.hwnd, msg, WPARAM(wparam), LPARAM(0));
            }
        }
    }

    // HWND is an opaque handle; posting to it from any thread is fine
    unsafe impl Send for WindowPoster {}
    unsafe impl Sync for WindowPoster {}

    impl InputSink for WindowPoster {
        fn button_down(&self, button: MouseButton) -> Result<()> {
            let (flag, down, _) = button_messages(button);
            self.send(down, flag);
            Ok(())
        }

        fn button_up(&self, button: MouseButton) -> Result<()> {
            let (flag, _, up) = button_messages(button);
            self.send(up, flag);
            Ok(())
        }

        fn mouse_move(&self) -> Result<()> {
            self.send(WM_MOUSEMOVE, 0);
            Ok(())
        }

        fn key_down(&self, ch: char) -> Result<()> {
            let mut units = [0u16; 2];
            let encoded = ch.encode_utf16(&mut units);
            if encoded.len() != 1 {
                return Err(HookpipeError::InputError(format!(
                    "'{}' is outside the basic multilingual plane",
                    ch
                )));
            }

            let scan = unsafe { VkKeyScanW(units[0]) };
            if scan == -1 {
                return Err(HookpipeError::InputError(format!(
                    "no key produces '{}' on this keyboard layout",
                    ch
                )));
            }

            unsafe {
                PostMessageW(self.hwnd, WM_KEYDOWN, WPARAM(scan as u16 as usize), LPARAM(0))?;
            }
            Ok(())
        }
    }
}
