mod schema;
mod store;

pub use store::{SqliteStore, HISTORY_KEY, THEME_KEY};
