use std::fmt;

use super::maybe_string::MaybeString;

/// An insertion-ordered map from case-insensitive key to [`MaybeString`].
///
/// `Params` backs every `key[=value]` list in the grammar: SIP header
/// parameters (`;foo=bar`), URI parameters, and URI headers. Insertion
/// order is preserved so diagnostics and round-trip rendering reproduce
/// the source text, but equality is defined as set equality over
/// `(lower-case key, value)` pairs (duplicates counted, order ignored) —
/// see `parse_params` in [`crate::parser::params`] for why duplicate keys
/// can legitimately occur.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<(String, MaybeString)>,
}

impl Params {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends `(key, value)`, preserving insertion order. Does not
    /// overwrite or deduplicate an existing key with the same name.
    pub fn add(&mut self, key: impl Into<String>, value: MaybeString) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&MaybeString> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaybeString)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Renders the params joined by `sep`, with a leading `sep` before the
    /// first entry (so `render(';')` on a SIP-parameter list can be
    /// appended directly after a URI or header-parameter boundary).
    pub fn render(&self, sep: char) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push(sep);
            out.push_str(key);
            if let MaybeString::Some(v) = value {
                out.push('=');
                if needs_quoting(v, sep) {
                    out.push('"');
                    out.push_str(&v.replace('\\', "\\\\").replace('"', "\\\""));
                    out.push('"');
                } else {
                    out.push_str(v);
                }
            }
        }
        out
    }

    fn normalized_multiset(&self) -> Vec<(String, MaybeString)> {
        let mut v: Vec<(String, MaybeString)> = self
            .entries
            .iter()
            .map(|(k, val)| (k.to_ascii_lowercase(), val.clone()))
            .collect();
        v.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| format!("{:?}", a.1).cmp(&format!("{:?}", b.1))));
        v
    }
}

fn needs_quoting(value: &str, sep: char) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == sep || c == '"' || c == '\\' || c.is_whitespace())
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_multiset() == other.normalized_multiset()
    }
}
impl Eq for Params {}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(';'))
    }
}

impl FromIterator<(String, MaybeString)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, MaybeString)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_order_independent_key_set() {
        let mut a = Params::new();
        a.add("foo", MaybeString::some("1"));
        a.add("bar", MaybeString::None);

        let mut b = Params::new();
        b.add("BAR", MaybeString::None);
        b.add("Foo", MaybeString::some("1"));

        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_values() {
        let mut a = Params::new();
        a.add("foo", MaybeString::some("1"));
        let mut b = Params::new();
        b.add("foo", MaybeString::some("2"));
        assert_ne!(a, b);
    }

    #[test]
    fn render_round_trips_through_separator() {
        let mut p = Params::new();
        p.add("transport", MaybeString::some("tcp"));
        p.add("lr", MaybeString::None);
        assert_eq!(p.render(';'), ";transport=tcp;lr");
    }

    #[test]
    fn get_is_case_insensitive_and_preserves_insertion_order() {
        let mut p = Params::new();
        p.add("Transport", MaybeString::some("tcp"));
        p.add("ttl", MaybeString::some("64"));
        assert_eq!(p.get("TRANSPORT").unwrap().as_str(), Some("tcp"));
        let keys: Vec<&str> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Transport", "ttl"]);
    }
}
