use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    Preserve,
    SnakeCase,
    CamelCase,
}

/// Translates top-level field names between the local and remote shapes of an entity.
///
/// Explicit renames win over style conversion. Nested values are passed through untouched.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    local_style: KeyStyle,
    remote_style: KeyStyle,
    renames: Vec<(String, String)>,
}

impl FieldMapper {
    pub fn identity() -> Self {
        Self {
            local_style: KeyStyle::Preserve,
            remote_style: KeyStyle::Preserve,
            renames: Vec::new(),
        }
    }

    pub fn new(local_style: KeyStyle, remote_style: KeyStyle) -> Self {
        Self {
            local_style,
            remote_style,
            renames: Vec::new(),
        }
    }

    pub fn rename(mut self, local: &str, remote: &str) -> Self {
        self.renames.push((local.to_string(), remote.to_string()));
        self
    }

    pub fn remote_field(&self, local: &str) -> String {
        self.renames
            .iter()
            .find(|(l, _)| l == local)
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| restyle(local, self.remote_style))
    }

    pub fn local_field(&self, remote: &str) -> String {
        self.renames
            .iter()
            .find(|(_, r)| r == remote)
            .map(|(l, _)| l.clone())
            .unwrap_or_else(|| restyle(remote, self.local_style))
    }

    pub fn to_remote(&self, local: Value) -> Value {
        self.map_keys(local, |key| self.remote_field(key))
    }

    pub fn to_local(&self, remote: Value) -> Value {
        self.map_keys(remote, |key| self.local_field(key))
    }

    fn map_keys(&self, value: Value, convert: impl Fn(&str) -> String) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (convert(&key), value))
                    .collect::<Map<String, Value>>(),
            ),
            other => other,
        }
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::identity()
    }
}

fn restyle(key: &str, style: KeyStyle) -> String {
    match style {
        KeyStyle::Preserve => key.to_string(),
        KeyStyle::SnakeCase => split_words(key).join("_"),
        KeyStyle::CamelCase => {
            let mut out = String::with_capacity(key.len());
            for (index, word) in split_words(key).into_iter().enumerate() {
                if index == 0 {
                    out.push_str(&word);
                    continue;
                }
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            out
        }
    }
}

fn split_words(key: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
