pub mod repository_view;

pub use repository_view::{RepositoryView, RepositoryViewMessage};
