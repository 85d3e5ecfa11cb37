//! Token substitution for command templates.
//!
//! A device carries a table of tokens (`{IF}`, `%VLAN%`, anything) and their
//! replacements. Every command template is scanned once, left to right; at
//! each position the longest token that matches is replaced. Replacement text
//! is never re-scanned.

use indexmap::IndexMap;

/// A compiled substitution table.
///
/// Tokens are kept sorted by length (longest first) so the first token that
/// matches at a position is also the longest one.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    /// Tokens and replacements in the order they were defined.
    table: IndexMap<String, String>,

    /// Indices into `table`, longest token first.
    by_length: Vec<usize>,

    /// Whether any token starts with a given byte.
    first_bytes: Vec<bool>,
}

impl Substitutions {
    /// Compile a substitution table. Empty tokens never match.
    pub fn new(table: IndexMap<String, String>) -> Self {
        let mut tokens: Vec<(usize, &str)> = table
            .keys()
            .enumerate()
            .filter(|(_, token)| !token.is_empty())
            .map(|(idx, token)| (idx, token.as_str()))
            .collect();
        // Stable sort keeps definition order between tokens of equal length.
        tokens.sort_by_key(|(_, token)| std::cmp::Reverse(token.len()));

        let mut first_bytes = vec![false; 256];
        for (_, token) in &tokens {
            first_bytes[token.as_bytes()[0] as usize] = true;
        }

        let by_length = tokens.into_iter().map(|(idx, _)| idx).collect();

        Self {
            table,
            by_length,
            first_bytes,
        }
    }

    /// Replace every token occurrence in `template`.
    pub fn apply(&self, template: &str) -> String {
        if self.by_length.is_empty() {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(c) = rest.chars().next() {
            match self.longest_match(rest) {
                Some((token, replacement)) => {
                    out.push_str(replacement);
                    rest = &rest[token.len()..];
                }
                None => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }

        out
    }

    /// Find the longest token that `text` starts with.
    fn longest_match(&self, text: &str) -> Option<(&str, &str)> {
        let first = *text.as_bytes().first()?;
        if !self.first_bytes[first as usize] {
            return None;
        }

        self.by_length
            .iter()
            .filter_map(|&idx| self.table.get_index(idx))
            .find(|(token, _)| text.starts_with(token.as_str()))
            .map(|(token, replacement)| (token.as_str(), replacement.as_str()))
    }

    /// Look up the replacement for a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.table.get(token).map(String::as_str)
    }

    /// Number of tokens in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate tokens and replacements in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Resolve a single template against a table.
///
/// Convenience for one-off substitutions; build a [`Substitutions`] once when
/// resolving many templates against the same table.
pub fn resolve(template: &str, table: &IndexMap<String, String>) -> String {
    Substitutions::new(table.clone()).apply(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_token() {
        let t = table(&[("{IF}", "Gi0/1")]);
        assert_eq!(resolve("interface {IF}", &t), "interface Gi0/1");
    }

    #[test]
    fn test_empty_table_is_identity() {
        let t = IndexMap::new();
        assert_eq!(resolve("show running-config", &t), "show running-config");
    }

    #[test]
    fn test_longest_match_wins() {
        let t = table(&[("{A}", "short"), ("{AB}", "long")]);
        assert_eq!(resolve("{AB} {A} {A}B", &t), "long short shortB");

        // Definition order does not matter.
        let t = table(&[("{AB}", "long"), ("{A}", "short")]);
        assert_eq!(resolve("{AB}{A}", &t), "longshort");
    }

    #[test]
    fn test_prefix_tokens_without_delimiters() {
        let t = table(&[("VLAN", "100"), ("VLAN_NAME", "users")]);
        assert_eq!(
            resolve("vlan VLAN name VLAN_NAME", &t),
            "vlan 100 name users"
        );
    }

    #[test]
    fn test_no_recursive_substitution() {
        let t = table(&[("{X}", "{Y}"), ("{Y}", "done")]);
        assert_eq!(resolve("{X} {Y}", &t), "{Y} done");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let t = table(&[("$P", "eth0")]);
        assert_eq!(resolve("$P $P$P", &t), "eth0 eth0eth0");
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let t = table(&[("{D}", "uplink")]);
        assert_eq!(
            resolve("description «{D}» ü", &t),
            "description «uplink» ü"
        );
    }

    #[test]
    fn test_empty_token_ignored() {
        let t = table(&[("", "boom"), ("{IF}", "Gi0/2")]);
        let subs = Substitutions::new(t);
        assert_eq!(subs.apply("int {IF}"), "int Gi0/2");
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_accessors() {
        let subs = Substitutions::new(table(&[("{A}", "1"), ("{B}", "2")]));
        assert_eq!(subs.get("{B}"), Some("2"));
        assert_eq!(subs.get("{C}"), None);
        let tokens: Vec<_> = subs.iter().map(|(k, _)| k).collect();
        assert_eq!(tokens, vec!["{A}", "{B}"]);
    }
}
