use serde::{Deserialize, Serialize};

/// State of one checklist line as captured on the inspection form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ChecklistValue {
    Checked,
    Unchecked,
    NotApplicable,
    Unset,
}

impl ChecklistValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistValue::Checked => "checked",
            ChecklistValue::Unchecked => "unchecked",
            ChecklistValue::NotApplicable => "not-applicable",
            ChecklistValue::Unset => "unset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChecklistItem {
    pub id: String,
    pub category: String,
    pub name: String,
    pub value: ChecklistValue,
}

impl ChecklistItem {
    pub fn new(id: &str, category: &str, name: &str, value: ChecklistValue) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            value,
        }
    }
}

/// Id-keyed view over a checklist. Lookups never depend on item position.
#[derive(Debug, Clone, Copy)]
pub struct Checklist<'a> {
    items: &'a [ChecklistItem],
}

impl<'a> Checklist<'a> {
    pub fn new(items: &'a [ChecklistItem]) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &'a [ChecklistItem] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a ChecklistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn value_of(&self, id: &str) -> Option<ChecklistValue> {
        self.get(id).map(|item| item.value)
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.value_of(id) == Some(ChecklistValue::Checked)
    }

    pub fn is_unchecked(&self, id: &str) -> bool {
        self.value_of(id) == Some(ChecklistValue::Unchecked)
    }

    pub fn is_not_applicable(&self, id: &str) -> bool {
        self.value_of(id) == Some(ChecklistValue::NotApplicable)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn count(&self, value: ChecklistValue) -> usize {
        self.items.iter().filter(|item| item.value == value).count()
    }

    pub fn all(&self, value: ChecklistValue) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.value == value)
    }
}
