//! Window locator

use crate::error::{HookpipeError, Result};
use crate::types::{Rect, WindowInfo};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
};

/// Enumerates top-level windows to find the target
pub struct WindowController;

impl WindowController {
    pub fn new() -> Self {
        Self
    }

    /// List all top-level windows that have a title
    pub fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        let mut windows: Vec<WindowInfo> = Vec::new();

        unsafe {
            EnumWindows(
                Some(enum_windows_callback),
                LPARAM(&mut windows as *mut Vec<WindowInfo> as isize),
            )?;
        }

        Ok(windows)
    }

    /// Find the first window whose title equals `title`
    pub fn find_window(&self, title: &str) -> Result<WindowInfo> {
        self.list_windows()?
            .into_iter()
            .find(|w| w.title == title)
            .ok_or_else(|| HookpipeError::WindowNotFound(title.to_string()))
    }
}

impl Default for WindowController {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "system" fn enum_windows_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<WindowInfo>);

    let title = window_title(hwnd);
    if !title.is_empty() {
        let mut rect = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rect);
        windows.push(WindowInfo {
            hwnd: hwnd.0 as usize,
            title,
            rect: Rect::new(rect.left, rect.top, rect.right, rect.bottom),
        });
    }

    BOOL(1) // Continue enumeration
}

fn window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return String::new();
        }
        let mut buffer: Vec<u16> = vec![0; (len + 1) as usize];
        let copied = GetWindowTextW(hwnd, &mut buffer).max(0) as usize;
        OsString::from_wide(&buffer[..copied])
            .to_string_lossy()
            .to_string()
    }
}
