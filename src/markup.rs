//! Turn fetched subtrack configuration markup into control specs.
//!
//! Only `<input>` and `<select>` tags matter; everything else in the
//! fragment (tables, labels, scripts) is ignored. Shadow inputs are skipped
//! since every checkbox gets its own shadow on registration.

use log::{debug, trace};
use regex::Regex;
use std::collections::HashMap;

use crate::entities::{ConfigError, ControlSpec};

struct Patterns {
    tag: Regex,
    attr: Regex,
    option: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, ConfigError> {
        let build = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::Layout(format!("Markup pattern: {}", e)))
        };
        Ok(Self {
            tag: build(r"(?is)<input\b([^>]*)>|<select\b([^>]*)>(.*?)</select\s*>")?,
            attr: build(
                r#"(?i)([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
            )?,
            option: build(r"(?is)<option\b([^>]*)>([^<]*)")?,
        })
    }

    /// Attribute map with lowercase keys. Bare attributes map to "".
    fn attrs(&self, raw: &str) -> HashMap<String, String> {
        self.attr
            .captures_iter(raw)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str().to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                Some((key, value))
            })
            .collect()
    }
}

/// Extract control specs from a markup fragment, in document order.
pub fn parse_controls(raw: &str, shadow_prefix: &str) -> Result<Vec<ControlSpec>, ConfigError> {
    let pats = Patterns::compile()?;
    let mut specs = Vec::new();

    for caps in pats.tag.captures_iter(raw) {
        if let Some(input) = caps.get(1) {
            let attrs = pats.attrs(input.as_str());
            if let Some(spec) = input_spec(&attrs, shadow_prefix) {
                specs.push(spec);
            }
        } else if let Some(select) = caps.get(2) {
            let attrs = pats.attrs(select.as_str());
            let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) else {
                debug!("Skipping unnamed <select>");
                continue;
            };
            let body = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            let value = selected_option(&pats, body);
            specs.push(ControlSpec::select(name.clone(), value));
        }
    }

    trace!("Parsed {} controls from {} bytes of markup", specs.len(), raw.len());
    Ok(specs)
}

fn input_spec(attrs: &HashMap<String, String>, shadow_prefix: &str) -> Option<ControlSpec> {
    let name = attrs.get("name").filter(|n| !n.is_empty())?;
    if name.starts_with(shadow_prefix) {
        return None;
    }
    let value = attrs.get("value").cloned().unwrap_or_default();
    let checked = attrs.contains_key("checked");
    let kind = attrs
        .get("type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());

    let spec = match kind.as_str() {
        "checkbox" => ControlSpec::checkbox(name.clone(), checked),
        "radio" => ControlSpec::radio(name.clone(), value, checked),
        "hidden" => ControlSpec::hidden(name.clone(), value),
        "button" | "submit" | "reset" | "image" | "file" => {
            debug!("Skipping {} input '{}'", kind, name);
            return None;
        }
        _ => ControlSpec::text(name.clone(), value),
    };
    Some(spec)
}

/// Value of the selected option, or the first option when none is marked.
fn selected_option(pats: &Patterns, body: &str) -> String {
    let mut first = None;
    for caps in pats.option.captures_iter(body) {
        let attrs = pats.attrs(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
        let value = match attrs.get("value") {
            Some(v) => v.clone(),
            None => decode_entities(caps.get(2).map(|m| m.as_str()).unwrap_or_default().trim()),
        };
        if attrs.contains_key("selected") {
            return value;
        }
        first.get_or_insert(value);
    }
    first.unwrap_or_default()
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ControlKind;

    const FRAGMENT: &str = r#"
        <table><tr><td>
        <b>Color:</b> <input type="text" name="histSigA.color" value="255,0,0" size=10>
        <input type=checkbox name='histSigA.showLabels' CHECKED>
        <input type="hidden" name="boolshad.histSigA.showLabels" value="0">
        <input type="radio" name="histSigA.mode" value="points">
        <input type="radio" name="histSigA.mode" value="lines" checked>
        <select name="histSigA.smooth">
            <option value="off">off</option>
            <option value="4" SELECTED>4 pixels</option>
        </select>
        <select name="histSigA.window"><option>mean</option><option>max</option></select>
        <input type="button" name="histSigA.reset" value="Reset">
        <input type="hidden" name="histSigA.priority" value="3">
        <input type="text" value="no name">
        </td></tr></table>
    "#;

    #[test]
    fn test_parse_fragment() {
        let specs = parse_controls(FRAGMENT, "boolshad.").unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![
            "histSigA.color",
            "histSigA.showLabels",
            "histSigA.mode",
            "histSigA.mode",
            "histSigA.smooth",
            "histSigA.window",
            "histSigA.priority",
        ]);

        assert_eq!(specs[0].kind, ControlKind::Text);
        assert_eq!(specs[0].value, "255,0,0");
        assert_eq!(specs[1].kind, ControlKind::Checkbox);
        assert!(specs[1].checked);
        assert!(!specs[2].checked);
        assert_eq!(specs[3].value, "lines");
        assert!(specs[3].checked);
        assert_eq!(specs[4].value, "4");
        assert_eq!(specs[5].value, "mean");
        assert_eq!(specs[6].kind, ControlKind::Hidden);
    }

    #[test]
    fn test_entities_decoded() {
        let specs =
            parse_controls(r#"<input name="sub.label" value="a &amp; b &lt;c&gt;">"#, "boolshad.")
                .unwrap();
        assert_eq!(specs[0].value, "a & b <c>");
    }

    #[test]
    fn test_no_controls() {
        assert!(parse_controls("<p>No configuration</p>", "boolshad.").unwrap().is_empty());
    }
}
