mod add;
mod default;
mod delete;
mod list;

pub use add::AddCommand;
pub use default::SetDefaultCommand;
pub use delete::DeleteCommand;
pub use list::ListCommand;
