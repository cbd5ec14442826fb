//! Format engine
//!
//! Renders a block's output fields from its captured text. Every templated
//! field is rendered on its own against the same context; the item name is
//! never templated and always comes from the block.

use crate::config::{Block, Config};
use crate::error::{BarError, Result};
use crate::protocol::RenderedItem;
use crate::symbols;
use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::sync::Arc;

/// Variables visible to every template
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    text: &'a str,
    name: &'a str,
    separator: &'a str,
}

pub struct FormatEngine {
    env: Environment<'static>,
    separator: String,
}

impl FormatEngine {
    pub fn new(config: Arc<Config>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        minijinja_contrib::add_to_environment(&mut env);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);

        env.add_filter("trim_prefix", trim_prefix);
        env.add_filter("trim_suffix", trim_suffix);
        env.add_filter("split", split);
        env.add_test("has_prefix", has_prefix);
        env.add_test("has_suffix", has_suffix);
        env.add_function("has_prefix", has_prefix);
        env.add_function("has_suffix", has_suffix);
        env.add_function("contains", contains);

        let separator = config.separator.clone();
        env.add_function("symbol", move |args: Rest<Value>| symbol(&config, &args));

        Self { env, separator }
    }

    /// Render `block` from the text its program printed
    pub fn render(&self, block: &Block, captured: &str) -> Result<RenderedItem> {
        let ctx = TemplateContext {
            text: captured,
            name: &block.name,
            separator: &self.separator,
        };
        let field = |field: &'static str, template: Option<&str>| -> Result<Option<String>> {
            let Some(template) = template else {
                return Ok(None);
            };
            let rendered = self
                .env
                .render_str(template, &ctx)
                .map_err(|source| BarError::FormatError {
                    block: block.name.clone(),
                    field,
                    source,
                })?;
            Ok(Some(rendered).filter(|s| !s.is_empty()))
        };

        let output = &block.output;
        let full_text = match block.full_text_template() {
            Some(template) => field("full_text", Some(template))?.unwrap_or_default(),
            None => captured.to_string(),
        };
        let short_text = field("short_text", output.short_text.as_deref())?;
        let color = field("color", output.color.as_deref())?;
        let background = field("background", output.background.as_deref())?;
        let border = field("border", output.border.as_deref())?;
        let min_width = field("min_width", output.min_width.as_deref())?.map(min_width_value);
        let align = field("align", output.align.as_deref())?;
        let markup = field("markup", output.markup.as_deref())?;
        let instance = field("instance", output.instance.as_deref())?;
        let urgent = field("urgent", output.urgent.as_deref())?
            .filter(|s| is_truthy(s))
            .map(|_| true);

        Ok(RenderedItem {
            name: block.name.clone(),
            full_text,
            short_text,
            color,
            background,
            border,
            border_top: output.border_top,
            border_right: output.border_right,
            border_bottom: output.border_bottom,
            border_left: output.border_left,
            min_width,
            align,
            urgent,
            instance,
            separator: Some(output.separator.unwrap_or(true)),
            separator_block_width: Some(output.separator_block_width.unwrap_or(9)),
            markup,
        })
    }
}

fn min_width_value(rendered: String) -> serde_json::Value {
    match rendered.trim().parse::<u64>() {
        Ok(pixels) => serde_json::Value::from(pixels),
        Err(_) => serde_json::Value::String(rendered),
    }
}

fn is_truthy(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// `symbol(value, list?, overflow_or_scale?, scale?)`
fn symbol(config: &Config, args: &[Value]) -> Result<String, Error> {
    let (raw, rest) = args.split_first().ok_or_else(|| {
        Error::new(ErrorKind::MissingArgument, "symbol() needs a value")
    })?;
    if rest.len() > 3 {
        return Err(Error::new(
            ErrorKind::TooManyArguments,
            "symbol() takes at most 4 arguments",
        ));
    }

    let mut ramp = None;
    let mut overflow = None;
    let mut scale = None;

    if let Some(arg) = rest.first() {
        ramp = glyphs(config, arg)?;
    }
    if let Some(arg) = rest.get(1) {
        if arg.kind() == ValueKind::Number {
            scale = Some(number(arg)?);
        } else {
            overflow = glyphs(config, arg)?;
        }
    }
    if let Some(arg) = rest.get(2) {
        scale = Some(number(arg)?);
    }

    Ok(symbols::resolve(
        &raw.to_string(),
        ramp.as_deref(),
        overflow.as_deref(),
        scale,
    ))
}

/// A configured list name or a literal list; unknown names fall back to the
/// built-in ramps
fn glyphs(config: &Config, arg: &Value) -> Result<Option<Vec<String>>, Error> {
    match arg.kind() {
        ValueKind::String => {
            let name = arg.as_str().unwrap_or_default();
            Ok(config.find_symbol_list(name).map(<[String]>::to_vec))
        }
        ValueKind::Seq => Ok(Some(arg.try_iter()?.map(|v| v.to_string()).collect())),
        ValueKind::None | ValueKind::Undefined => Ok(None),
        _ => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("symbol() expects a list name or a list, got {:?}", arg.kind()),
        )),
    }
}

fn number(arg: &Value) -> Result<f64, Error> {
    f64::try_from(arg.clone()).map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("symbol() expects a numeric scale, got {:?}", arg.kind()),
        )
    })
}

fn trim_prefix(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}

fn trim_suffix(value: &str, suffix: &str) -> String {
    value.strip_suffix(suffix).unwrap_or(value).to_string()
}

fn split(value: &str, sep: Option<&str>) -> Vec<String> {
    match sep {
        Some(sep) if !sep.is_empty() => value.split(sep).map(str::to_string).collect(),
        _ => value.split_whitespace().map(str::to_string).collect(),
    }
}

fn has_prefix(value: &str, prefix: &str) -> bool {
    value.starts_with(prefix)
}

fn has_suffix(value: &str, suffix: &str) -> bool {
    value.ends_with(suffix)
}

fn contains(value: &str, needle: &str) -> bool {
    value.contains(needle)
}
