pub mod error;
pub mod jwt;
pub mod model;
pub mod session;

pub use error::AuthError;
pub use jwt::decode_expiry;
pub use model::{LoginCredentials, RegisterCredentials, UserIdentity};
pub use session::{AuthSession, Session, SessionPhase};
