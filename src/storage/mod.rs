pub mod sqlite;

pub use sqlite::{ScreenRun, SqliteStorage};
