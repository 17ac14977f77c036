//! CORDON Ingress — Defenses for the public, unauthenticated
//! surfaces: webhook signature verification, redirect target
//! validation, and per-key rate limiting.

pub mod error;
pub mod ratelimit;
pub mod redirect;
pub mod webhook;

pub use error::{RedirectViolation, WebhookError};
pub use ratelimit::{RateDecision, RateGate, RateLimitConfig, SlidingWindowLimiter};
pub use redirect::validate_redirect_target;
pub use webhook::{Environment, EventDeduper, WebhookConfig, WebhookVerifier};
