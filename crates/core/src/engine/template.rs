//! Command template resolution.
//!
//! An option string is split into tokens first and placeholders are replaced
//! afterwards, so a substituted value containing spaces stays one argument.
//! Quoted segments (`"..."` or `'...'`) in the option string itself are kept
//! together and the quotes are dropped. Unknown placeholders are passed
//! through unchanged.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use tracing::warn;

use super::params::ParameterTable;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\{([^}]+)\}").unwrap());

/// Builds the argument vector: binary first, then the resolved option tokens.
pub fn resolve(binary: &str, options: &str, table: &ParameterTable) -> Vec<String> {
    let unresolved = unresolved_keys(options, table);
    if !unresolved.is_empty() {
        warn!("Unresolved template parameters: {}", unresolved.join(", "));
    }

    std::iter::once(binary.to_string())
        .chain(tokenize(options).iter().map(|t| substitute(t, table)))
        .collect()
}

/// Replaces every `#{key}` with its table value.
pub fn substitute(input: &str, table: &ParameterTable) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| match table.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder keys in `input` that the table cannot resolve.
pub fn unresolved_keys(input: &str, table: &ParameterTable) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .filter(|key| !table.contains(key))
        .collect()
}

/// Splits on whitespace, keeping quoted segments atomic.
pub fn tokenize(options: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in options.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ParameterTable {
        let mut table = ParameterTable::new();
        table.insert("in.video.path", "/media/My Lecture.mov");
        table.insert("out.dir", "/media");
        table.insert("out.name", "My Lecture");
        table.insert("out.suffix", ".mp4");
        table
    }

    #[test]
    fn test_tokenize_whitespace() {
        assert_eq!(tokenize("  -y   -i  x "), vec!["-y", "-i", "x"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"-vf "scale=w=1280:h=720, fps=25" -metadata 'title=A B'"#),
            vec!["-vf", "scale=w=1280:h=720, fps=25", "-metadata", "title=A B"]
        );
        assert_eq!(tokenize(r#"-x """#), vec!["-x", ""]);
    }

    #[test]
    fn test_resolve_keeps_spaced_values_together() {
        let argv = resolve(
            "ffmpeg",
            "-y -i #{in.video.path} -c:v libx264 #{out.dir}/#{out.name}#{out.suffix}",
            &table(),
        );
        assert_eq!(
            argv,
            vec![
                "ffmpeg",
                "-y",
                "-i",
                "/media/My Lecture.mov",
                "-c:v",
                "libx264",
                "/media/My Lecture.mp4",
            ]
        );
    }

    #[test]
    fn test_missing_keys_pass_through() {
        let table = table();
        assert_eq!(substitute("-ss #{time}", &table), "-ss #{time}");
        assert_eq!(unresolved_keys("#{time} #{out.dir}", &table), vec!["time"]);
    }

    #[test]
    fn test_multiple_placeholders_in_one_token() {
        let mut table = ParameterTable::new();
        table.insert("w", "640");
        table.insert("h", "360");
        assert_eq!(substitute("scale=#{w}:#{h}", &table), "scale=640:360");
    }
}
