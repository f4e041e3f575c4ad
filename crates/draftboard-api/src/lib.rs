pub mod comments;
pub mod documents;
pub mod drafts;
pub mod error;
pub mod reactions;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
