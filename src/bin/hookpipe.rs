//! hookpipe binary - drive the agent from the command line

use clap::{Parser, Subcommand};
use hookpipe::{
    ArrowKey, CommandChannel, Config, HookSession, HookpipeError, MouseButton, SpecialKey,
    SyncMode,
};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookpipe", version, about = "Control the in-process input agent")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Agent endpoint (overrides config)
    #[arg(long, global = true)]
    pipe: Option<String>,

    /// Treat the pipe as write-only and use the zero-buffer rendezvous as
    /// the sync barrier (default on Windows)
    #[arg(long, global = true, conflicts_with = "acknowledge")]
    rendezvous: bool,

    /// Read a one-byte acknowledgement after each sync
    #[arg(long, global = true)]
    acknowledge: bool,

    /// Sync timeout in milliseconds (overrides config)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Install the focus, cursor, key-down and key-string hooks
    Hook,
    /// Remove every hook
    Unhook,
    /// Remove every hook, then stop the agent
    Eject,
    /// Check that the agent is responsive
    Sync,
    /// Fake the cursor position
    Cursor {
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    RestoreCursor,
    /// Fake a pressed key by agent key code
    Key {
        #[arg(allow_negative_numbers = true)]
        keycode: i32,
    },
    RestoreKey,
    /// Fake a held special key
    Special { key: SpecialKey },
    RestoreSpecial,
    /// List windows with a title
    Windows,
    /// Click at window coordinates
    Click {
        x: i32,
        y: i32,
        #[arg(short, long, default_value = "left")]
        button: MouseButton,
        /// Hold a special key during the click
        #[arg(short, long)]
        special: Option<SpecialKey>,
    },
    /// Drag between two window coordinates
    Drag {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        #[arg(short, long, default_value = "left")]
        button: MouseButton,
    },
    /// Type text into the window
    Text { text: String },
    /// Press an arrow key
    Arrow { arrow: ArrowKey },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> hookpipe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run(cli).await
}

fn load_config(cli: &Cli) -> hookpipe::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(pipe) = &cli.pipe {
        config.pipe_name = pipe.clone();
    }
    if cli.rendezvous {
        config.sync_mode = SyncMode::Rendezvous;
    }
    if cli.acknowledge {
        config.sync_mode = SyncMode::Acknowledge;
    }
    if let Some(ms) = cli.timeout_ms {
        config.sync_timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> hookpipe::Result<()> {
    let config = load_config(&cli)?;

    if let Cmd::Windows = cli.command {
        return list_windows();
    }

    let mut channel = CommandChannel::from_config(&config);
    channel.connect().await?;

    match cli.command {
        Cmd::Hook => {
            let mut session = HookSession::new(channel);
            if let Err(e) = session.enable().await {
                error!("Hooking failed, removing partial hooks");
                if let Err(cleanup) = session.recover().await {
                    error!("Cleanup failed: {}", cleanup);
                }
                return Err(e);
            }
            info!("Hooks installed; focus and unfocus the window once for the focus hook");
        }
        Cmd::Unhook => channel.unhook_all().await?,
        Cmd::Eject => {
            // A fresh process cannot know what is installed; always unhook first
            channel.unhook_all().await?;
            channel.eject().await?;
            info!("Agent ejected");
        }
        Cmd::Sync => {
            channel.sync().await?;
            println!("Agent at {} is responsive", channel.address());
        }
        Cmd::Cursor { x, y } => channel.set_cursor_pos(x, y).await?,
        Cmd::RestoreCursor => channel.restore_cursor_pos().await?,
        Cmd::Key { keycode } => channel.set_key_down(keycode).await?,
        Cmd::RestoreKey => channel.restore_key_down().await?,
        Cmd::Special { key } => channel.set_special_key(u32::from(key.code())).await?,
        Cmd::RestoreSpecial => channel.restore_special_key().await?,
        // Listed before connecting
        Cmd::Windows => {}
        window => window_command(window, &config, &mut channel).await?,
    }

    Ok(())
}

#[cfg(windows)]
fn list_windows() -> hookpipe::Result<()> {
    let windows = hookpipe::WindowController::new().list_windows()?;

    println!("{:<20} {:<60} {}", "HWND", "Title", "Size");
    println!("{}", "-".repeat(92));
    for window in windows {
        println!(
            "{:<20} {:<60} {}x{}",
            format!("0x{:X}", window.hwnd),
            truncate_unicode(&window.title, 58),
            window.rect.width(),
            window.rect.height()
        );
    }
    Ok(())
}

#[cfg(windows)]
async fn window_command(
    command: Cmd,
    config: &Config,
    channel: &mut CommandChannel,
) -> hookpipe::Result<()> {
    use hookpipe::{Device, Target, WindowController, WindowPoster};

    let info = WindowController::new().find_window(&config.window_title)?;
    let target = Target::new(info.hwnd, config.offset);
    let device =
        Device::new(WindowPoster::new(info.hwnd), target).with_delay(config.input_delay());

    match command {
        Cmd::Click { x, y, button, special: None } => device.click(channel, x, y, button).await,
        Cmd::Click { x, y, button, special: Some(key) } => {
            device.special_click(channel, x, y, button, key).await
        }
        Cmd::Drag { x1, y1, x2, y2, button } => {
            device.drag(channel, (x1, y1), (x2, y2), button).await
        }
        Cmd::Text { text } => device.send_text(channel, &text).await,
        Cmd::Arrow { arrow } => device.press_arrow(channel, arrow).await,
        _ => Err(HookpipeError::InputError("not a window command".into())),
    }
}

#[cfg(not(windows))]
fn list_windows() -> hookpipe::Result<()> {
    Err(HookpipeError::WindowNotFound(
        "window lookup is only available on Windows".into(),
    ))
}

#[cfg(not(windows))]
async fn window_command(
    _command: Cmd,
    _config: &Config,
    _channel: &mut CommandChannel,
) -> hookpipe::Result<()> {
    Err(HookpipeError::InputError(
        "window input is only available on Windows".into(),
    ))
}

/// Truncate a string to a maximum number of characters (Unicode-safe)
#[cfg(windows)]
fn truncate_unicode(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
