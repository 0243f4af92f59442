//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `supabase` - Supabase access tokens (HS256 JWT)
//! - `postgres_session` - Opaque application session tokens
//! - `composite` - Picks one of the above by token shape
//! - `mock` - Test implementation

mod composite;
mod mock;
mod postgres_session;
mod supabase;

pub use composite::CompositeSessionValidator;
pub use mock::MockSessionValidator;
pub use postgres_session::{hash_session_token, PostgresSessionValidator};
pub use supabase::{SupabaseJwtConfig, SupabaseJwtValidator};
