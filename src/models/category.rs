use serde::{Deserialize, Serialize};

use super::{BillKind, Id};

/// A spending/income category. Unique per (owner, name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub owner_id: Id,
    pub name: String,
    pub kind: BillKind,
}

impl Category {
    /// The id is derived from the natural key, so upserting the same
    /// (owner, name) always lands on the same category.
    pub fn new(owner: &Id, name: impl Into<String>, kind: BillKind) -> Self {
        let name = name.into();
        Self {
            id: Id::from_external(&format!("{owner}/{name}")),
            owner_id: owner.clone(),
            name,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_natural_key_yields_the_same_id() {
        let owner = Id::from_string("user-1");
        let first = Category::new(&owner, "餐饮美食", BillKind::Expense);
        let second = Category::new(&owner, "餐饮美食", BillKind::Expense);
        assert_eq!(first.id, second.id);

        let other = Category::new(&Id::from_string("user-2"), "餐饮美食", BillKind::Expense);
        assert_ne!(first.id, other.id);
    }
}
