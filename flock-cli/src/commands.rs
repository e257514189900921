use anyhow::{bail, Context, Result};
use flock_shared::Parameter;

/// A control line typed while the simulation runs
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `set <parameter> <text>`: the text is filtered and clamped like a form field
    Set { parameter: Parameter, text: String },
    /// `bounds <width> <height>`
    Bounds { width: f64, height: f64 },
    Show,
    Quit,
}

/// Parses one control line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();

    let command = match verb.as_str() {
        "set" => {
            let name = words.next().context("usage: set <parameter> <value>")?;
            let parameter: Parameter = name.parse()?;
            let text = words.collect::<Vec<_>>().join(" ");
            Command::Set { parameter, text }
        }
        "bounds" => {
            let width = dimension(words.next(), "width")?;
            let height = dimension(words.next(), "height")?;
            Command::Bounds { width, height }
        }
        "show" => Command::Show,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}'", other),
    };

    Ok(Some(command))
}

fn dimension(word: Option<&str>, name: &str) -> Result<f64> {
    let word = word.with_context(|| format!("usage: bounds <width> <height>, missing {}", name))?;
    parse_dimension(word).with_context(|| format!("invalid {}", name))
}

/// A draw-area extent: a finite number above zero.
pub fn parse_dimension(text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .with_context(|| format!("expected a number, got '{}'", text))?;
    if !(value.is_finite() && value > 0.0) {
        bail!("must be positive, got {}", value);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# lower the speed").unwrap(), None);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("640").unwrap(), 640.0);
        assert_eq!(parse_dimension(" 2.5 ").unwrap(), 2.5);
        assert!(parse_dimension("0").is_err());
        assert!(parse_dimension("-10").is_err());
        assert!(parse_dimension("NaN").is_err());
        assert!(parse_dimension("inf").is_err());
        assert!(parse_dimension("wide").is_err());
    }

    #[test]
    fn test_quit_aliases() {
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("EXIT").unwrap(), Some(Command::Quit));
    }
}
