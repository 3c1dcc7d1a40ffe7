pub mod session;
pub mod state;
pub mod store;
pub mod view;

pub use session::{Session, SessionError};
pub use state::{reducer, Action, AppState};
pub use store::{Store, Subscription};
pub use view::{select_view_model, ViewModel};
