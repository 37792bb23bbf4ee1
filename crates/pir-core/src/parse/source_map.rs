/// Line index over the raw text of a YAML or pretty-printed JSON document.
///
/// The object model carries no source positions, so the line of a key path
/// is recovered from the text: each segment is searched for inside the
/// indentation block of the previous one.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    lines: Vec<SourceLine>,
}

#[derive(Debug, Clone)]
struct SourceLine {
    indent: usize,
    key: Option<String>,
    blank: bool,
}

impl SourceMap {
    pub fn new(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|raw| {
                let trimmed = raw.trim_start();
                let blank = trimmed.is_empty() || trimmed.starts_with('#');
                SourceLine {
                    indent: raw.len() - trimmed.len(),
                    key: if blank { None } else { line_key(trimmed) },
                    blank,
                }
            })
            .collect();
        Self { lines }
    }

    /// 1-based line number of the last segment of `path`, if found.
    pub fn locate(&self, path: &[&str]) -> Option<usize> {
        let mut start = 0;
        let mut end = self.lines.len();
        let mut found = None;

        for segment in path {
            let index = (start..end).find(|&i| self.lines[i].key.as_deref() == Some(*segment))?;
            let indent = self.lines[index].indent;
            start = index + 1;
            end = (start..self.lines.len())
                .find(|&i| !self.lines[i].blank && self.lines[i].indent <= indent)
                .unwrap_or(self.lines.len());
            found = Some(index + 1);
        }

        found
    }
}

/// Extract the mapping key a line starts with, quoted or bare.
fn line_key(trimmed: &str) -> Option<String> {
    let trimmed = trimmed.strip_prefix("- ").unwrap_or(trimmed);
    let first = trimmed.chars().next()?;
    if first == '"' || first == '\'' {
        let rest = &trimmed[1..];
        let close = rest.find(first)?;
        let after = rest[close + 1..].trim_start();
        return after.starts_with(':').then(|| rest[..close].to_string());
    }
    let colon = trimmed.find(':')?;
    let after = &trimmed[colon + 1..];
    if after.is_empty() || after.starts_with(' ') || after.starts_with('\t') {
        Some(trimmed[..colon].trim_end().to_string())
    } else {
        None
    }
}
