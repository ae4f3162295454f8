use rand::Rng;

/// Unplaced records, kept as the literal lines they were loaded from.
#[derive(Clone, Debug, Default)]
pub struct Bank {
    entries: Vec<String>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn replace(&mut self, entries: Vec<String>) {
        self.entries = entries;
    }

    /// Returns an evicted record to the pool.
    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    /// Draws one entry uniformly at random, without replacement.
    pub fn take_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.entries.len());
        Some(self.entries.remove(idx))
    }
}

/// Splits a bank line into exactly `columns` fields; extra fields are ignored.
pub fn split_fields(entry: &str, columns: usize) -> Option<Vec<&str>> {
    let fields: Vec<&str> = entry.split('\t').take(columns).collect();
    (fields.len() == columns).then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_take_random_drains_without_replacement() {
        let mut bank = Bank::new();
        bank.replace(vec!["a\t1".into(), "b\t2".into(), "c\t3".into()]);
        let mut rng = SmallRng::seed_from_u64(9);
        let mut drawn: Vec<String> = std::iter::from_fn(|| bank.take_random(&mut rng)).collect();
        drawn.sort();
        assert_eq!(drawn, vec!["a\t1", "b\t2", "c\t3"]);
        assert!(bank.is_empty());
        assert_eq!(bank.take_random(&mut rng), None);
    }

    #[test]
    fn test_split_fields_ignores_extra_fields() {
        assert_eq!(split_fields("dog\tchien\tnoun", 2), Some(vec!["dog", "chien"]));
        assert_eq!(split_fields("dog\t", 2), Some(vec!["dog", ""]));
        assert_eq!(split_fields("dog", 2), None);
    }
}
