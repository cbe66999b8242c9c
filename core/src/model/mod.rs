pub mod briefing;
pub mod checklist;
pub mod document;
pub mod history;
pub mod issue;
