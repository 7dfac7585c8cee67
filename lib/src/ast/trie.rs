use std::collections::BTreeMap;

/// A prefix tree that maps string identifiers to values.
///
/// Besides exact lookups, the trie finds every value whose key starts with
/// some prefix, which is what wildcards like `$a*` need. Values are also
/// kept in insertion order, which is the order in which strings appear in
/// a rule. A key can be inserted many times when `allow_duplicates` is used,
/// as it happens with anonymous strings (`$`).
#[derive(Debug, Clone)]
pub struct StringsTrie<T> {
    nodes: Vec<Node>,
    items: Vec<Option<(String, T)>>,
    len: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<char, usize>,
    /// Indexes in `items` of the values whose key ends at this node.
    entries: Vec<usize>,
}

impl<T> Default for StringsTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StringsTrie<T> {
    pub fn new() -> Self {
        Self { nodes: vec![Node::default()], items: Vec::new(), len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value. If the key is already present the value is not
    /// inserted and it's returned back.
    pub fn insert(&mut self, key: &str, value: T) -> Result<(), T> {
        if self.contains(key) {
            return Err(value);
        }
        self.insert_duplicate(key, value);
        Ok(())
    }

    /// Inserts a value even if the key is already present.
    pub fn insert_duplicate(&mut self, key: &str, value: T) {
        let node = self.node_for_insert(key);
        self.items.push(Some((key.to_string(), value)));
        self.nodes[node].entries.push(self.items.len() - 1);
        self.len += 1;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the first value inserted with the given key.
    pub fn get(&self, key: &str) -> Option<&T> {
        let node = self.find_node(key)?;
        self.nodes[node].entries.first().and_then(|&i| self.value_at(i))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let node = self.find_node(key)?;
        let index = *self.nodes[node].entries.first()?;
        self.items[index].as_mut().map(|(_, value)| value)
    }

    /// Returns every value whose key starts with `prefix`, in insertion
    /// order.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&T> {
        let mut indexes = Vec::new();
        if let Some(node) = self.find_node(prefix) {
            self.collect(node, &mut indexes);
        }
        indexes.sort_unstable();
        indexes.into_iter().filter_map(|i| self.value_at(i)).collect()
    }

    /// Removes every value with the given key, returning them.
    pub fn remove(&mut self, key: &str) -> Vec<T> {
        let node = match self.find_node(key) {
            Some(node) => node,
            None => return Vec::new(),
        };
        let entries = std::mem::take(&mut self.nodes[node].entries);
        self.len -= entries.len();
        entries
            .into_iter()
            .filter_map(|i| self.items[i].take().map(|(_, value)| value))
            .collect()
    }

    /// Changes the key of the values stored under `old`. Fails if `new` is
    /// already in use, or if `old` doesn't exist.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if self.contains(new) {
            return false;
        }
        let node = match self.find_node(old) {
            Some(node) if !self.nodes[node].entries.is_empty() => node,
            _ => return false,
        };
        let entries = std::mem::take(&mut self.nodes[node].entries);
        let target = self.node_for_insert(new);
        for &i in &entries {
            if let Some((key, _)) = self.items[i].as_mut() {
                *key = new.to_string();
            }
        }
        self.nodes[target].entries = entries;
        true
    }

    /// Iterates over keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.items
            .iter()
            .filter_map(|item| item.as_ref().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, value)| value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.items.iter_mut().filter_map(|item| item.as_mut().map(|(_, v)| v))
    }

    fn value_at(&self, index: usize) -> Option<&T> {
        self.items[index].as_ref().map(|(_, value)| value)
    }

    fn find_node(&self, key: &str) -> Option<usize> {
        let mut node = 0;
        for c in key.chars() {
            node = *self.nodes[node].children.get(&c)?;
        }
        Some(node)
    }

    fn node_for_insert(&mut self, key: &str) -> usize {
        let mut node = 0;
        for c in key.chars() {
            node = match self.nodes[node].children.get(&c) {
                Some(&child) => child,
                None => {
                    self.nodes.push(Node::default());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children.insert(c, child);
                    child
                }
            };
        }
        node
    }

    fn collect(&self, node: usize, indexes: &mut Vec<usize>) {
        indexes.extend(&self.nodes[node].entries);
        for &child in self.nodes[node].children.values() {
            self.collect(child, indexes);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::StringsTrie;

    #[test]
    fn exact_and_prefix_lookups() {
        let mut trie = StringsTrie::new();
        trie.insert("$bbb", 3).unwrap();
        trie.insert("$aab", 2).unwrap();
        trie.insert("$aaa", 1).unwrap();

        assert_eq!(trie.get("$aab"), Some(&2));
        assert_eq!(trie.get("$aa"), None);
        assert_eq!(trie.find_by_prefix("$aa"), vec![&2, &1]);
        assert_eq!(trie.find_by_prefix("$"), vec![&3, &2, &1]);
        assert!(trie.find_by_prefix("$c").is_empty());
        assert_eq!(trie.insert("$aaa", 4), Err(4));
    }

    #[test]
    fn duplicates_and_removal() {
        let mut trie = StringsTrie::new();
        trie.insert_duplicate("$", 1);
        trie.insert_duplicate("$", 2);
        trie.insert("$a", 3).unwrap();
        assert_eq!(trie.len(), 3);

        assert_eq!(trie.remove("$"), vec![1, 2]);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.iter().collect::<Vec<_>>(), vec![("$a", &3)]);
    }

    #[test]
    fn rename() {
        let mut trie = StringsTrie::new();
        trie.insert("$a", 1).unwrap();
        trie.insert("$b", 2).unwrap();

        assert!(!trie.rename("$a", "$b"));
        assert!(trie.rename("$a", "$c"));
        assert_eq!(trie.get("$a"), None);
        assert_eq!(trie.get("$c"), Some(&1));
        assert_eq!(
            trie.iter().collect::<Vec<_>>(),
            vec![("$c", &1), ("$b", &2)]
        );
    }
}
