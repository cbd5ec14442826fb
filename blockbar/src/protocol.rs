//! i3bar/swaybar streaming protocol
//!
//! One header object on its own line, then `[` on its own line, then an
//! endless sequence of JSON arrays joined by `,`. The outer array is never
//! closed while the bar runs.

use crate::config::Config;
use serde::Serialize;
use std::io::{self, Write};

pub const PROTOCOL_VERSION: u32 = 1;

/// First line sent to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cont_signal: Option<i32>,
    pub click_events: bool,
}

impl Header {
    pub fn from_config(config: &Config) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            stop_signal: config.stop_signal,
            cont_signal: config.cont_signal,
            click_events: config.click_events,
        }
    }
}

/// One block's contribution to a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedItem {
    pub name: String,
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_right: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_left: Option<u32>,
    /// A pixel count or a sample string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator_block_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

/// Items of one tick, in block declaration order
pub type Snapshot = Vec<RenderedItem>;

/// Writes the protocol to the host
pub struct ProtocolWriter<W: Write> {
    out: W,
    first: bool,
}

impl<W: Write> ProtocolWriter<W> {
    /// Write the header and the opening `[`
    pub fn start(mut out: W, header: &Header) -> io::Result<Self> {
        serde_json::to_writer(&mut out, header)?;
        out.write_all(b"\n[\n")?;
        out.flush()?;
        Ok(Self { out, first: true })
    }

    /// Append one snapshot to the open array
    pub fn write_snapshot(&mut self, snapshot: &[RenderedItem]) -> io::Result<()> {
        if !self.first {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out.flush()?;
        self.first = false;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
