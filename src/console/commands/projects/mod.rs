mod add;
mod delete;
mod list;

pub use add::AddCommand;
pub use delete::DeleteCommand;
pub use list::ListCommand;
