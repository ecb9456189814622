//! YAML frontmatter splitting.
//!
//! ```text
//! ---
//! title: "Hola"
//! pubDate: "Jul 08 2022"
//! ---
//! Body in *markdown*.
//! ```

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_yaml::Value;
use std::{collections::BTreeMap, sync::LazyLock};

/// Raw frontmatter: top-level keys mapped to untyped YAML values.
pub type Frontmatter = BTreeMap<String, Value>;

/// Split a document into its frontmatter and body.
///
/// Documents without a leading `---` fence have empty frontmatter and the
/// whole text as body.
pub fn split(text: &str) -> Result<(Frontmatter, &str)> {
    static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A\x{feff}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)").unwrap()
    });

    let Some(caps) = RE_FENCE.captures(text) else {
        return Ok((Frontmatter::new(), text));
    };
    let body = &text[caps.get(0).map_or(0, |m| m.end())..];
    let yaml = caps.get(1).map_or("", |m| m.as_str());

    Ok((parse_yaml(yaml)?, body))
}

fn parse_yaml(yaml: &str) -> Result<Frontmatter> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }

    let value: Value = serde_yaml::from_str(yaml).context("invalid frontmatter yaml")?;
    let Value::Mapping(mapping) = value else {
        bail!("frontmatter must be a mapping of keys to values");
    };

    mapping
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key, value)),
            other => bail!("frontmatter keys must be strings, found `{other:?}`"),
        })
        .collect()
}
