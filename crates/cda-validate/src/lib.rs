pub mod validator;

pub use validator::{Checkpoint, validate, validate_kind, validate_with_checkpoint};
