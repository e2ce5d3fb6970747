//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - Production validator for panel-signed HS256 tokens
//! - `mock` - Test implementation that doesn't require signed tokens

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator};
pub use mock::MockSessionValidator;
