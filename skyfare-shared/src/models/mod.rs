pub mod events;
pub mod history;
pub mod insight;
pub mod quote;
pub mod search;
