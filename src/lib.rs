pub mod chains;
pub mod dates;
pub mod error;
pub mod event;
pub mod store;
pub mod todo;

pub use chains::{ChainDocument, ChainStore};
pub use error::{Result, StoreError};
pub use event::{Subscription, UpdateEvent};
pub use store::{DataFile, default_data_dir};
pub use todo::{DeletePolicy, Flatten, TodoItem, TodoStore};
