mod delete;
mod list;
mod register;
mod rename;
mod ssl;

pub use delete::DeleteCommand;
pub use list::ListCommand;
pub use register::RegisterCommand;
pub use rename::RenameCommand;
pub use ssl::DisableSslCommand;
