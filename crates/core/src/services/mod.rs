mod board;
mod lists;
mod tasks;

pub use board::{BoardEntry, BoardSnapshot};
pub use tasks::TasksService;
