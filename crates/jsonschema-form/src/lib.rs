#![doc = include_str!("../README.md")]

mod form_state;
mod ids;
pub mod meta;
pub mod path;
pub mod projection;
pub mod refs;
mod session;
pub mod transform;

pub use form_state::FormState;
pub use ids::IdGenerator;
pub use session::{
    EditorSession, OnChange, PendingText, RootType, SessionError, SessionOptions, SettingsFocus,
};
pub use transform::{to_form, to_schema};
