//! Click event dispatcher
//!
//! The host writes one JSON object per line on our stdin whenever a block is
//! clicked. Each record is routed to the first block with the same name and to
//! the handler registered for the clicked button. Handlers are fire-and-forget:
//! their results are logged and never reach the bar.

use crate::config::Config;
use crate::error::{BarError, Result};
use crate::runner;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Mouse buttons as numbered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "u32")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    Other(u32),
}

impl From<u32> for MouseButton {
    fn from(code: u32) -> Self {
        match code {
            1 => MouseButton::Left,
            2 => MouseButton::Middle,
            3 => MouseButton::Right,
            4 => MouseButton::ScrollUp,
            5 => MouseButton::ScrollDown,
            other => MouseButton::Other(other),
        }
    }
}

impl MouseButton {
    /// Value of `BUTTON` in the handler's environment
    pub fn env_value(&self) -> Cow<'static, str> {
        match self {
            MouseButton::Left => "Left".into(),
            MouseButton::Middle => "Middle".into(),
            MouseButton::Right => "Right".into(),
            MouseButton::ScrollUp => "ScrollUp".into(),
            MouseButton::ScrollDown => "ScrollDown".into(),
            MouseButton::Other(code) => code.to_string().into(),
        }
    }

    /// Key under `on_click` in the configuration
    pub fn config_key(&self) -> Cow<'static, str> {
        match self {
            MouseButton::Left => "left".into(),
            MouseButton::Middle => "middle".into(),
            MouseButton::Right => "right".into(),
            MouseButton::ScrollUp => "scroll_up".into(),
            MouseButton::ScrollDown => "scroll_down".into(),
            MouseButton::Other(code) => format!("button{}", code).into(),
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        match key {
            "left" => Some(MouseButton::Left),
            "middle" => Some(MouseButton::Middle),
            "right" => Some(MouseButton::Right),
            "scroll_up" => Some(MouseButton::ScrollUp),
            "scroll_down" => Some(MouseButton::ScrollDown),
            other => other
                .strip_prefix("button")
                .and_then(|code| code.parse::<u32>().ok())
                .map(MouseButton::from),
        }
    }
}

/// One click reported by the host
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClickEvent {
    #[serde(rename = "name", default)]
    pub block_name: String,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub button: MouseButton,
    #[serde(default)]
    pub relative_x: i32,
    #[serde(default)]
    pub relative_y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub scale: f64,
}

impl ClickEvent {
    /// Environment handed to the handler process
    pub fn handler_env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BUTTON", self.button.env_value().into_owned()),
            ("X", self.x.to_string()),
            ("Y", self.y.to_string()),
        ]
    }
}

/// Parse one raw record from the host.
///
/// Leading commas and whitespace are dropped and the record is cut down to
/// its outermost `{...}` span. Records without an object (the opening `[`,
/// a bare `,`, blank lines) yield `Ok(None)`.
pub fn parse_click_event(raw: &[u8]) -> Result<Option<ClickEvent>> {
    let start = raw
        .iter()
        .position(|b| !(*b == b',' || b.is_ascii_whitespace()))
        .unwrap_or(raw.len());
    let raw = &raw[start..];

    let open = match raw.iter().position(|b| *b == b'{') {
        Some(open) => open,
        None => return Ok(None),
    };
    let close = raw.iter().rposition(|b| *b == b'}').unwrap_or(raw.len() - 1);
    // A '{' with no closing '}' still goes to the parser so it gets reported.
    let object = if close > open {
        &raw[open..=close]
    } else {
        &raw[open..]
    };

    Ok(Some(serde_json::from_slice(object)?))
}

/// What happened to one input record
#[derive(Debug)]
pub enum Dispatch {
    /// Framing or blank line
    Skipped,
    Malformed(BarError),
    UnknownBlock(String),
    NoHandler { block: String, button: MouseButton },
    Handled {
        block: String,
        result: Result<String>,
    },
}

/// Routes click records to block handlers
pub struct ClickDispatcher {
    config: Arc<Config>,
    deadline: Duration,
}

impl ClickDispatcher {
    pub fn new(config: Arc<Config>, deadline: Duration) -> Self {
        Self { config, deadline }
    }

    /// Handle one raw record
    pub async fn dispatch(&self, raw: &[u8]) -> Dispatch {
        let event = match parse_click_event(raw) {
            Ok(Some(event)) => event,
            Ok(None) => return Dispatch::Skipped,
            Err(e) => return Dispatch::Malformed(e),
        };

        let block = match self.config.find_block(&event.block_name) {
            Some(block) => block,
            None => return Dispatch::UnknownBlock(event.block_name),
        };

        let handler = match block
            .on_click
            .as_ref()
            .and_then(|on_click| on_click.handler_for(event.button))
        {
            Some(handler) => handler,
            None => {
                return Dispatch::NoHandler {
                    block: block.name.clone(),
                    button: event.button,
                }
            }
        };

        log::debug!(
            "Running {} click handler for block {}",
            event.button.env_value(),
            block.name
        );

        let env = event.handler_env();
        let result = runner::run(self.deadline, handler.invocation(block), &env).await;

        Dispatch::Handled {
            block: block.name.clone(),
            result,
        }
    }

    /// Dispatch records until the input is closed
    pub async fn run<R>(&self, mut reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        log::info!("Click dispatcher started");
        let mut line = Vec::new();

        loop {
            line.clear();
            let bytes_read = reader.read_until(b'\n', &mut line).await?;

            if bytes_read == 0 {
                // Host closed the stream
                break;
            }

            log::debug!("Received click record: {}", String::from_utf8_lossy(&line).trim());

            match self.dispatch(&line).await {
                Dispatch::Skipped => {}
                Dispatch::Malformed(e) => log::warn!("Dropping click record: {}", e),
                Dispatch::UnknownBlock(name) => {
                    log::debug!("No block named '{}', click dropped", name)
                }
                Dispatch::NoHandler { block, button } => log::debug!(
                    "Block '{}' has no handler for {:?}, click dropped",
                    block,
                    button
                ),
                Dispatch::Handled {
                    block,
                    result: Ok(output),
                } => log::debug!("Click handler for block '{}' output: {}", block, output),
                Dispatch::Handled {
                    block,
                    result: Err(e),
                } => log::error!("Click handler for block '{}' failed: {}", block, e),
            }
        }

        log::info!("Click input closed");
        Ok(())
    }
}
