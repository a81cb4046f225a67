pub mod error;
pub mod events;
pub mod types;
pub mod value;

pub use error::DialogueError;
pub use events::*;
pub use types::*;
pub use value::*;
