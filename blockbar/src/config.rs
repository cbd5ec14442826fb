//! Bar configuration
//!
//! Loaded once at startup from YAML and shared read-only (behind an `Arc`)
//! by the scheduler and the click dispatcher.

use crate::click::MouseButton;
use crate::error::{BarError, Result};
use crate::runner::Invocation;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const DEFAULT_SEPARATOR: &str = "|";

/// A named glyph ramp usable from templates
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SymbolList {
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Top level configuration document
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stop_signal: Option<i32>,
    #[serde(default)]
    pub cont_signal: Option<i32>,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub symbol_lists: Vec<SymbolList>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// True iff some block declares a click handler
    #[serde(skip)]
    pub click_events: bool,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// One unit of bar content backed by an external program
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub name: String,
    /// Advisory only, every block runs on the global tick
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub interpreter: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    /// Shorthand for `output.full_text`
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub output: OutputTemplate,
    #[serde(default)]
    pub on_click: Option<OnClick>,
}

/// Per-field templates for the rendered item.
///
/// String fields are templates, the rest are passed through unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputTemplate {
    /// Only present so that a templated name can be reported clearly
    #[serde(default)]
    pub name: Option<serde_yaml::Value>,
    pub full_text: Option<String>,
    pub short_text: Option<String>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub border: Option<String>,
    pub min_width: Option<String>,
    pub align: Option<String>,
    pub markup: Option<String>,
    pub instance: Option<String>,
    pub urgent: Option<String>,
    pub border_top: Option<u32>,
    pub border_right: Option<u32>,
    pub border_bottom: Option<u32>,
    pub border_left: Option<u32>,
    pub separator: Option<bool>,
    pub separator_block_width: Option<u32>,
}

/// A command bound to mouse buttons of a block
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Handler {
    /// Falls back to the owning block's interpreter
    #[serde(default)]
    pub interpreter: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

/// Either one handler for every button or a handler per button name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OnClick {
    Any(Handler),
    PerButton(HashMap<String, Handler>),
}

impl OnClick {
    pub fn handler_for(&self, button: MouseButton) -> Option<&Handler> {
        match self {
            OnClick::Any(handler) => Some(handler),
            OnClick::PerButton(handlers) => handlers.get(&*button.config_key()),
        }
    }

    /// Handlers with their button key, `None` for the catch-all form
    fn handlers(&self) -> Vec<(Option<&str>, &Handler)> {
        match self {
            OnClick::Any(handler) => vec![(None, handler)],
            OnClick::PerButton(handlers) => handlers
                .iter()
                .map(|(key, handler)| (Some(key.as_str()), handler))
                .collect(),
        }
    }
}

impl Block {
    pub fn invocation(&self) -> Invocation<'_> {
        match &self.command {
            Some(command) => Invocation::Command(command),
            None => Invocation::Script {
                interpreter: self.interpreter.as_deref().unwrap_or(""),
                script: self.script.as_deref().unwrap_or(""),
            },
        }
    }

    /// The template for `full_text`, from `format` or `output.full_text`
    pub fn full_text_template(&self) -> Option<&str> {
        self.format
            .as_deref()
            .or(self.output.full_text.as_deref())
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BarError::ConfigError("block without a name".to_string()));
        }
        check_payload(
            &format!("block '{}'", self.name),
            self.script.as_deref(),
            self.command.as_deref(),
        )?;
        if self.output.name.is_some() {
            return Err(BarError::ConfigError(format!(
                "block '{}': output field 'name' is assigned by the bar and cannot be set",
                self.name
            )));
        }
        if self.format.is_some() && self.output.full_text.is_some() {
            return Err(BarError::ConfigError(format!(
                "block '{}': 'format' and 'output.full_text' are mutually exclusive",
                self.name
            )));
        }
        if let Some(on_click) = &self.on_click {
            for (key, handler) in on_click.handlers() {
                if let Some(key) = key {
                    if MouseButton::from_config_key(key).is_none() {
                        return Err(BarError::ConfigError(format!(
                            "block '{}': unknown mouse button '{}'",
                            self.name, key
                        )));
                    }
                }
                check_payload(
                    &format!("block '{}' click handler", self.name),
                    handler.script.as_deref(),
                    handler.command.as_deref(),
                )?;
            }
        }
        Ok(())
    }
}

impl Handler {
    pub fn invocation<'a>(&'a self, block: &'a Block) -> Invocation<'a> {
        match &self.command {
            Some(command) => Invocation::Command(command),
            None => Invocation::Script {
                interpreter: self
                    .interpreter
                    .as_deref()
                    .or(block.interpreter.as_deref())
                    .unwrap_or(""),
                script: self.script.as_deref().unwrap_or(""),
            },
        }
    }
}

fn check_payload(what: &str, script: Option<&str>, command: Option<&str>) -> Result<()> {
    match (script, command) {
        (Some(_), Some(_)) => Err(BarError::ConfigError(format!(
            "{}: 'script' and 'command' are mutually exclusive",
            what
        ))),
        (None, None) => Err(BarError::ConfigError(format!(
            "{}: needs either 'script' or 'command'",
            what
        ))),
        _ => Ok(()),
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| BarError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&data)
    }

    /// Parse and validate a configuration document
    pub fn from_yaml(data: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(data)?;
        if config.separator.is_empty() {
            config.separator = default_separator();
        }
        config.validate()?;
        config.click_events = config.blocks.iter().any(|b| b.on_click.is_some());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for block in &self.blocks {
            block.validate()?;
            if !seen.insert(block.name.as_str()) {
                log::warn!(
                    "Duplicate block name '{}': clicks are routed to the first declaration",
                    block.name
                );
            }
        }
        Ok(())
    }

    /// First block with this name
    pub fn find_block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Symbols of the named list, if configured
    pub fn find_symbol_list(&self, name: &str) -> Option<&[String]> {
        self.symbol_lists
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.symbols.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r##"
stop_signal: 10
cont_signal: 12
symbol_lists:
  - name: bars
    symbols: ["▁", "▃", "▅", "█"]
blocks:
  - name: cpu
    interval: 5
    interpreter: "sh -c"
    script: "echo 42"
    format: "{{ symbol(text, 'bars') }}"
  - name: clock
    command: "date +%H:%M"
    output:
      color: "#ffffff"
      separator_block_width: 12
    on_click:
      left:
        command: "echo left"
      scroll_up:
        interpreter: "sh -c"
        script: "echo up"
"##;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.stop_signal, Some(10));
        assert_eq!(config.cont_signal, Some(12));
        assert_eq!(config.separator, "|");
        assert_eq!(config.blocks.len(), 2);
        assert!(config.click_events);
        assert_eq!(
            config.find_symbol_list("bars").map(|s| s.len()),
            Some(4)
        );
        assert!(config.find_symbol_list("missing").is_none());

        let clock = config.find_block("clock").unwrap();
        assert_eq!(clock.output.separator_block_width, Some(12));
        let on_click = clock.on_click.as_ref().unwrap();
        assert!(on_click.handler_for(MouseButton::Left).is_some());
        assert!(on_click.handler_for(MouseButton::ScrollUp).is_some());
        assert!(on_click.handler_for(MouseButton::Right).is_none());
    }

    #[test]
    fn test_single_handler_applies_to_every_button() {
        let config = Config::from_yaml(
            r#"
blocks:
  - name: vol
    interpreter: bash
    script: "echo 1"
    on_click:
      script: "echo clicked"
"#,
        )
        .unwrap();
        let on_click = config.blocks[0].on_click.as_ref().unwrap();
        assert!(on_click.handler_for(MouseButton::Left).is_some());
        assert!(on_click.handler_for(MouseButton::Other(9)).is_some());
    }

    #[test]
    fn test_click_events_disabled_without_handlers() {
        let config = Config::from_yaml(
            r#"
separator: ""
blocks:
  - name: a
    command: "echo a"
"#,
        )
        .unwrap();
        assert!(!config.click_events);
        assert_eq!(config.separator, DEFAULT_SEPARATOR);
    }

    #[test]
    fn test_templated_name_is_rejected() {
        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
    command: "echo a"
    output:
      name: "{{ text }}"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BarError::ConfigError(_)));
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_script_and_command_are_exclusive() {
        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
    command: "echo a"
    script: "echo b"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BarError::ConfigError(_)));

        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BarError::ConfigError(_)));
    }

    #[test]
    fn test_format_and_full_text_are_exclusive() {
        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
    command: "echo a"
    format: "{{ text }}"
    output:
      full_text: "{{ text }}"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BarError::ConfigError(_)));
    }

    #[test]
    fn test_unknown_button_is_rejected() {
        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
    command: "echo a"
    on_click:
      wheel:
        command: "echo w"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("wheel"));
    }

    #[test]
    fn test_unknown_output_field_is_rejected() {
        let err = Config::from_yaml(
            r#"
blocks:
  - name: a
    command: "echo a"
    output:
      colour: red
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BarError::ConfigSyntax(_)));
    }

    #[test]
    fn test_duplicate_names_route_to_first() {
        let config = Config::from_yaml(
            r#"
blocks:
  - name: dup
    command: "echo first"
  - name: dup
    command: "echo second"
"#,
        )
        .unwrap();
        let block = config.find_block("dup").unwrap();
        assert_eq!(block.command.as_deref(), Some("echo first"));
    }

    #[test]
    fn test_handler_inherits_block_interpreter() {
        let config = Config::from_yaml(
            r#"
blocks:
  - name: a
    interpreter: "python3 -c"
    script: "print(1)"
    on_click:
      script: "print(2)"
"#,
        )
        .unwrap();
        let block = &config.blocks[0];
        let handler = block
            .on_click
            .as_ref()
            .unwrap()
            .handler_for(MouseButton::Left)
            .unwrap();
        assert_eq!(
            handler.invocation(block),
            Invocation::Script {
                interpreter: "python3 -c",
                script: "print(2)",
            }
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.blocks[0].name, "cpu");

        let err = Config::load(Path::new("/nonexistent/blockbar.yaml")).unwrap_err();
        assert!(matches!(err, BarError::ConfigIo { .. }));
    }
}
