use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

const ADJECTIVES: [&str; 16] = [
    "amber", "brisk", "calm", "dapper", "eager", "fuzzy", "gentle", "hasty",
    "idle", "jolly", "keen", "lucky", "mellow", "nimble", "quiet", "rustic",
];

const ANIMALS: [&str; 16] = [
    "otter", "badger", "heron", "lynx", "marten", "newt", "ocelot", "puffin",
    "quokka", "raven", "stoat", "tapir", "urchin", "vole", "walrus", "yak",
];

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Next `adjective-animal` label. Cosmetic only; names may repeat.
fn generate_name() -> String {
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let adjective = ADJECTIVES[n % ADJECTIVES.len()];
    let animal = ANIMALS[(n / ADJECTIVES.len()) % ANIMALS.len()];
    format!("{adjective}-{animal}")
}

/// A filter over an explicit, precomputed set of row indices.
///
/// Membership ignores the table entirely; rows outside any table simply are
/// not members.
#[derive(Debug, Clone)]
pub struct SetFilter {
    rows: HashSet<usize>,
    name: String,
}

impl SetFilter {
    /// Build from any sequence of row indices; duplicates collapse.
    pub fn new(rows: impl IntoIterator<Item = usize>) -> Self {
        SetFilter {
            rows: rows.into_iter().collect(),
            name: generate_name(),
        }
    }

    /// Rows whose mask bit is `true`. The mask is not retained.
    pub fn from_mask(mask: &[bool]) -> Self {
        Self::new(
            mask.iter()
                .enumerate()
                .filter_map(|(row, &selected)| selected.then_some(row)),
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Member rows in ascending order.
    pub fn sorted_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.rows.iter().copied().collect();
        rows.sort_unstable();
        rows
    }

    pub(crate) fn row_set(&self) -> &HashSet<usize> {
        &self.rows
    }
}

impl FromIterator<usize> for SetFilter {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::new(iter)
    }
}
