use serde::Deserialize;

/*
Sample header-mode output
{
    "programs": [],
    "streams": [],
    "format": {
        "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
        "duration": "125.300000"
    }
}
*/

/// Lowercase container format tokens, in the order ffprobe reported them.
///
/// A demuxer that handles several related containers reports all of their
/// names, e.g. `mov,mp4,m4a`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSet(Vec<String>);

impl FormatSet {
    /// Splits a comma-separated alias list into normalized tokens. Empty
    /// tokens and repeats are dropped.
    pub fn parse(format_name: &str) -> Self {
        let mut tokens: Vec<String> = Vec::new();
        for token in format_name.split(',') {
            let token = token.trim().to_lowercase();
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Self(tokens)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    /// True when any token of `self` also appears in `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.iter().any(|t| other.contains(t))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for FormatSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let joined: Vec<String> = iter
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        Self::parse(&joined.join(","))
    }
}

impl std::fmt::Display for FormatSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeHeaderResult {
    pub format_names: FormatSet,
    pub duration_seconds: f64,
}

/// ffprobe prints numbers as strings in JSON output, but accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    /// Finite, non-negative seconds or nothing.
    pub(crate) fn to_seconds(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::String(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

#[derive(Debug, Deserialize)]
struct HeaderFormat {
    format_name: Option<String>,
    duration: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
struct HeaderOutput {
    format: Option<HeaderFormat>,
}

/// Reads the container format names and duration from header-mode output.
///
/// Returns `None` if the `format` section, either field, or a parseable
/// duration is missing.
pub fn extract_header(raw_output: &str) -> Option<ProbeHeaderResult> {
    let output: HeaderOutput = match serde_json::from_str(raw_output) {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!("Failed to parse ffprobe header output: {}", err);
            return None;
        }
    };

    let format = output.format?;
    let format_names = FormatSet::parse(format.format_name.as_deref()?);
    if format_names.is_empty() {
        return None;
    }

    let duration_seconds = format.duration?.to_seconds()?;

    Some(ProbeHeaderResult {
        format_names,
        duration_seconds,
    })
}
