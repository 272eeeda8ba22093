use ahash::AHashMap;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Language code -> display name.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    names: AHashMap<String, String>,
}

impl LanguageTable {
    /// One entry per line: the display name (may contain spaces) followed by
    /// the code as the last whitespace-separated token. Later lines win.
    pub fn parse(text: &str) -> Result<Self> {
        let mut names = AHashMap::default();
        for (idx, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [] => continue,
                [only] => bail!("line {}: `{only}` has no language code", idx + 1),
                [name @ .., code] => {
                    names.insert(code.to_string(), name.join(" "));
                }
            }
        }
        Ok(Self { names })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("language table {}", path.display()))
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LanguageTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }
}
