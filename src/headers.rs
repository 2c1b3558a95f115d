use std::collections::HashMap;
use std::rc::Rc;

/// Column names for a parser's output records, shared cheaply across every
/// `Record` produced under them.
///
/// Built once when the header row (or caller-supplied/synthetic names) is
/// installed, then cloned (an `Rc` bump, not a copy) into every subsequent
/// `Record`. This is what gives `Record::get(name)` an O(1) lookup without
/// rebuilding a name→index map on every row, unlike the teacher's
/// `create_record` (in `assembler.rs`/`lib.rs`/`parser_optimized.rs`), which
/// rebuilds a fresh JS `Object` per record directly from a `Vec<String>`.
#[derive(Debug, Clone)]
pub struct Headers {
    names: Rc<[String]>,
    index: Rc<HashMap<String, usize>>,
}

impl Headers {
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Headers {
            names: Rc::from(names.into_boxed_slice()),
            index: Rc::new(index),
        }
    }

    /// Append synthetic names `_i` for every index in `self.len()..new_len`.
    pub fn widened(&self, new_len: usize) -> Self {
        if new_len <= self.names.len() {
            return self.clone();
        }
        let mut names: Vec<String> = self.names.to_vec();
        for i in names.len()..new_len {
            names.push(format!("_{i}"));
        }
        Headers::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lookup() {
        let headers = Headers::new(vec!["a".into(), "b".into()]);
        assert_eq!(headers.index_of("a"), Some(0));
        assert_eq!(headers.index_of("b"), Some(1));
        assert_eq!(headers.index_of("c"), None);
    }

    #[test]
    fn widening_adds_synthetic_names_at_the_right_index() {
        let headers = Headers::new(vec!["a".into(), "b".into()]);
        let wide = headers.widened(4);
        assert_eq!(wide.names(), &["a", "b", "_2", "_3"]);
    }

    #[test]
    fn widening_to_a_smaller_length_is_a_no_op() {
        let headers = Headers::new(vec!["a".into(), "b".into(), "c".into()]);
        let same = headers.widened(1);
        assert_eq!(same.names(), headers.names());
    }
}
