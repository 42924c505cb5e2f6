//! Tooltip content built from a documentation record.

use crate::types::{DocRecord, ParamDoc, SymbolKey};
use std::fmt::{self, Write};

/// Everything the panel displays for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
    /// `name(a, b, [c])`, or the bare name for symbols without parameters.
    pub signature: String,
    /// One line per parameter.
    pub params: Vec<String>,
    pub returns: Option<String>,
    pub description: String,
}

impl TooltipContent {
    pub fn from_record(key: &SymbolKey, record: &DocRecord) -> Self {
        Self {
            signature: signature(key.as_str(), &record.params),
            params: record.params.iter().map(param_line).collect(),
            returns: record.returns.as_ref().map(|r| {
                let mut line = String::from("returns");
                if !r.type_label.is_empty() {
                    let _ = write!(line, " {}", r.type_label);
                }
                if !r.description.is_empty() {
                    let _ = write!(line, ": {}", r.description);
                }
                line
            }),
            description: record.description.clone(),
        }
    }
}

impl fmt::Display for TooltipContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.signature)?;
        for line in &self.params {
            writeln!(f, "  {}", line)?;
        }
        if let Some(returns) = &self.returns {
            writeln!(f, "  {}", returns)?;
        }
        if !self.description.is_empty() {
            write!(f, "\n{}", self.description)?;
        }
        Ok(())
    }
}

fn signature(name: &str, params: &[ParamDoc]) -> String {
    if params.is_empty() {
        return name.to_string();
    }
    let args: Vec<String> = params
        .iter()
        .map(|p| {
            if p.optional {
                format!("[{}]", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect();
    format!("{}({})", name, args.join(", "))
}

fn param_line(param: &ParamDoc) -> String {
    let mut line = param.name.clone();
    if !param.type_label.is_empty() {
        let _ = write!(line, ": {}", param.type_label);
    }
    if param.optional {
        line.push_str(" (optional)");
    }
    if !param.description.is_empty() {
        let _ = write!(line, " - {}", param.description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReturnDoc;
    use assert2::check;

    fn param(name: &str, type_label: &str, optional: bool, description: &str) -> ParamDoc {
        ParamDoc {
            name: name.to_string(),
            type_label: type_label.to_string(),
            optional,
            description: description.to_string(),
        }
    }

    #[test]
    fn bare_name_without_params() {
        let key = SymbolKey::new("noLoop").unwrap();
        let content = TooltipContent::from_record(
            &key,
            &DocRecord {
                description: "Stops the draw loop.".to_string(),
                ..DocRecord::default()
            },
        );
        check!(content.signature == "noLoop");
        check!(content.params.is_empty());
        check!(content.to_string() == "noLoop\n\nStops the draw loop.");
    }

    #[test]
    fn optional_params_in_brackets() {
        let key = SymbolKey::new("rect").unwrap();
        let record = DocRecord {
            description: "Draws a rectangle".to_string(),
            params: vec![
                param("x", "Number", false, "x-coordinate"),
                param("y", "Number", false, ""),
                param("tl", "Number", true, "top-left radius"),
            ],
            returns: None,
        };
        let content = TooltipContent::from_record(&key, &record);
        check!(content.signature == "rect(x, y, [tl])");
        check!(content.params[0] == "x: Number - x-coordinate");
        check!(content.params[1] == "y: Number");
        check!(content.params[2] == "tl: Number (optional) - top-left radius");
        check!(content.description == "Draws a rectangle");
    }

    #[test]
    fn returns_line() {
        let key = SymbolKey::new("random").unwrap();
        let record = DocRecord {
            returns: Some(ReturnDoc {
                type_label: "Number".to_string(),
                description: "the random number".to_string(),
            }),
            ..DocRecord::default()
        };
        let content = TooltipContent::from_record(&key, &record);
        check!(content.returns.as_deref() == Some("returns Number: the random number"));
    }
}
