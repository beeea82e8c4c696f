pub mod resolve_identity;
pub mod toggle_bypass;

pub use resolve_identity::ResolveClientIdentityUseCase;
pub use toggle_bypass::ToggleClientBypassUseCase;
