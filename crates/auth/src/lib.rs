//! `warden-auth` — token verification and role checks (transport-agnostic).
//!
//! Nothing in this crate knows about HTTP. The API crate extracts header
//! values and maps the outcomes here onto responses.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod identity;
pub mod roles;
pub mod token;
pub mod verifier;

pub use authenticate::{AuthFailure, AuthenticationError, authenticate, bearer_token};
pub use authorize::{AccessError, AuthorizationError, authorize};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use identity::Identity;
pub use roles::{AllowedRoles, ConfigurationError, Role};
pub use token::BearerToken;
pub use verifier::{
    Hs256TokenVerifier, RejectionReason, TokenVerifier, VerificationFailure,
    VerificationInfrastructureError,
};
