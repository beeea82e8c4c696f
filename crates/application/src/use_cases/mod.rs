pub mod clients;

pub use clients::{ResolveClientIdentityUseCase, ToggleClientBypassUseCase};
