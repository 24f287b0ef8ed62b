use std::mem;

use itertools::Itertools;

use crate::schema::CsvSchema;

/// Packs array elements and nested row fields into one cell.
///
/// Elements are separated by the array element delimiter. Inside an element
/// the escape character protects a literal delimiter, a literal escape, and
/// an element whose text equals the null literal. Without a null literal an
/// empty element reads as null, as it does for top-level cells.
#[derive(Debug, Clone)]
pub(crate) struct ElementCodec {
    delimiter: String,
    escape: char,
    null_token: String,
}

impl ElementCodec {
    pub fn new(schema: &CsvSchema) -> Self {
        Self {
            delimiter: schema.array_element_delimiter().to_string(),
            escape: schema.element_escape(),
            null_token: schema.null_token().to_string(),
        }
    }

    pub fn join<I>(&self, items: I) -> String
    where
        I: IntoIterator<Item = Option<String>>,
    {
        items
            .into_iter()
            .map(|item| match item {
                Some(text) => self.escape_element(&text),
                None => self.null_token.clone(),
            })
            .join(&self.delimiter)
    }

    /// Splits a cell on unescaped delimiters. `None` marks a null element.
    pub fn split(&self, cell: &str) -> Vec<Option<String>> {
        let mut items = Vec::new();
        let mut current = String::new();
        let mut raw_start = 0;
        let mut chars = cell.char_indices();
        while let Some((idx, ch)) = chars.next() {
            if ch == self.escape {
                if let Some((_, literal)) = chars.next() {
                    current.push(literal);
                }
            } else if cell[idx..].starts_with(self.delimiter.as_str()) {
                items.push(self.element(&cell[raw_start..idx], mem::take(&mut current)));
                for _ in 1..self.delimiter.chars().count() {
                    chars.next();
                }
                raw_start = idx + self.delimiter.len();
            } else {
                current.push(ch);
            }
        }
        items.push(self.element(&cell[raw_start..], current));
        items
    }

    fn element(&self, raw: &str, text: String) -> Option<String> {
        (raw != self.null_token).then_some(text)
    }

    fn escape_element(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (idx, ch) in text.char_indices() {
            if ch == self.escape || self.delimiter_starts(&text[idx..]) {
                out.push(self.escape);
            }
            out.push(ch);
        }
        if !self.null_token.is_empty() && out == self.null_token {
            out.insert(0, self.escape);
        }
        out
    }

    /// Whether a delimiter read from the start of `rest` would match, also
    /// counting the delimiter that follows the element when joined.
    fn delimiter_starts(&self, rest: &str) -> bool {
        let delimiter = self.delimiter.as_str();
        if rest.len() >= delimiter.len() {
            rest.starts_with(delimiter)
        } else {
            delimiter.starts_with(rest) && delimiter.starts_with(&delimiter[rest.len()..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::FormatOptions, schema::compile, types::RowType};

    fn codec(pairs: &[(&str, &str)]) -> ElementCodec {
        let options = FormatOptions::from_pairs(pairs.iter().copied()).unwrap();
        ElementCodec::new(&compile(&RowType::default(), &options).unwrap())
    }

    fn owned(items: &[Option<&str>]) -> Vec<Option<String>> {
        items.iter().map(|item| item.map(str::to_string)).collect()
    }

    #[test]
    fn delimiters_inside_elements_are_escaped() {
        let codec = codec(&[]);
        let items = owned(&[Some("a;b"), None, Some("C:\\dir")]);
        let cell = codec.join(items.clone());
        assert_eq!(cell, "a\\;b;;C:\\\\dir");
        assert_eq!(codec.split(&cell), items);
    }

    #[test]
    fn elements_matching_the_null_token_are_protected() {
        let codec = codec(&[("nullLiteral", "NULL")]);
        let items = owned(&[Some("NULL"), None, Some("")]);
        let cell = codec.join(items.clone());
        assert_eq!(cell, "\\NULL;NULL;");
        assert_eq!(codec.split(&cell), items);
    }

    #[test]
    fn empty_elements_read_as_null_without_a_null_literal() {
        let codec = codec(&[]);
        let cell = codec.join(owned(&[Some(""), Some("x")]));
        assert_eq!(cell, ";x");
        assert_eq!(codec.split(&cell), owned(&[None, Some("x")]));
    }

    #[test]
    fn multi_character_delimiters_use_the_configured_escape() {
        let codec = codec(&[("arrayElementDelimiter", "::"), ("escapeCharacter", "^")]);
        let items = owned(&[Some("10:30:00"), Some("x:::y^"), Some("end:"), None]);
        let cell = codec.join(items.clone());
        assert_eq!(cell, "10:30:00::x^:^::y^^::end^:::");
        assert_eq!(codec.split(&cell), items);
    }
}
