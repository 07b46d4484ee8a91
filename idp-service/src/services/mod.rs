pub mod codes;
pub mod jwt;

pub use codes::{CodeBroker, IssuedCode};
pub use jwt::TokenIssuer;
