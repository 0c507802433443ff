//! Section headers of configuration files
//!
//! A configuration file is a sequence of YAML documents, each introduced by
//! a header line:
//!
//! ```text
//! --- name:default merge:true chain:base,indoor
//! ```
//!
//! The header of the first section may be omitted; it is then named
//! `default`.

use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use regex::Regex;

static OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+):(.*)$").expect("valid regex"));

/// Name given to a first section without header
pub const DEFAULT_SECTION: &str = "default";

/// Options of one section header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionHeader {
    /// Section name
    pub name: String,
    /// Merge into an existing section of the same name instead of replacing it
    pub merge: bool,
    /// Sections merged with this one, in order
    pub chain: Vec<String>,
}

/// One section of a file: header and raw YAML body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    /// Parsed header
    pub header: SectionHeader,
    /// YAML text between this header and the next
    pub body: String,
}

/// Parse the options of a header line
///
/// `line` is 1-based and only used in error messages. A missing `name`
/// yields an empty name; the caller decides whether that is allowed.
pub fn parse_header(text: &str, origin: &str, line: usize) -> ConfigResult<SectionHeader> {
    let mut header = SectionHeader::default();
    let mut unknown = Vec::new();

    for opt in text.split_whitespace().skip(1) {
        let captures = OPTION.captures(opt).ok_or_else(|| ConfigError::Header {
            origin: origin.to_string(),
            line,
            message: format!(
                "wrong format {opt}, expected option_name:value, where 'value' has no spaces"
            ),
        })?;
        let value = &captures[2];
        match &captures[1] {
            "name" => header.name = value.to_string(),
            "merge" => header.merge = value == "true",
            "chain" => {
                header.chain = value
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => unknown.push(other.to_string()),
        }
    }

    if !unknown.is_empty() {
        unknown.sort();
        tracing::warn!(origin, line, options = %unknown.join(", "), "unrecognized section options");
    }
    Ok(header)
}

/// Split a configuration file into its sections
pub fn split_sections(text: &str, origin: &str) -> ConfigResult<Vec<RawSection>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut headers: Vec<(SectionHeader, Option<usize>)> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.starts_with("---") {
            headers.push((parse_header(line, origin, idx + 1)?, Some(idx)));
        }
    }
    if headers.first().map_or(true, |(_, idx)| *idx != Some(0)) {
        headers.insert(0, (SectionHeader::default(), None));
    }
    if headers[0].0.name.is_empty() {
        headers[0].0.name = DEFAULT_SECTION.to_string();
    }

    let mut sections = Vec::with_capacity(headers.len());
    for (i, (header, start)) in headers.iter().enumerate() {
        if header.name.is_empty() {
            return Err(ConfigError::Header {
                origin: origin.to_string(),
                line: start.map_or(0, |s| s + 1),
                message: "missing a 'name' option".to_string(),
            });
        }
        let first = start.map_or(0, |s| s + 1);
        let end = headers
            .get(i + 1)
            .and_then(|(_, next)| *next)
            .unwrap_or(lines.len());
        sections.push(RawSection {
            header: header.clone(),
            body: lines[first..end].join("\n"),
        });
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_options() {
        let header = parse_header("--- name:fast merge:true chain:default,test", "f.yml", 1).unwrap();
        assert_eq!(
            header,
            SectionHeader {
                name: "fast".to_string(),
                merge: true,
                chain: vec!["default".to_string(), "test".to_string()],
            }
        );
    }

    #[test]
    fn header_with_bad_option() {
        let err = parse_header("--- name:fast oops", "f.yml", 4).unwrap_err();
        let ConfigError::Header { line, message, .. } = err else {
            panic!("expected header error");
        };
        assert_eq!(line, 4);
        assert!(message.contains("wrong format oops"));
    }

    #[test]
    fn unknown_options_are_ignored() {
        let header = parse_header("--- name:a color:blue", "f.yml", 1).unwrap();
        assert_eq!(header.name, "a");
    }

    #[test]
    fn implicit_first_section_is_default() {
        let text = "threshold: 20\n--- name:fast\nspeed: 10\n";
        let sections = split_sections(text, "f.yml").unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header.name, "default");
        assert_eq!(sections[0].body, "threshold: 20");
        assert_eq!(sections[1].header.name, "fast");
        assert_eq!(sections[1].body, "speed: 10");
    }

    #[test]
    fn first_header_without_name_is_default() {
        let sections = split_sections("---\nthreshold: 20\n", "f.yml").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header.name, "default");
    }

    #[test]
    fn later_section_needs_name() {
        let err = split_sections("--- name:a\nx: 1\n--- merge:true\ny: 2\n", "f.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Header { line: 3, .. }));
    }
}
