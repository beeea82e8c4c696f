pub mod builders;
pub mod dns_server_mock;
pub mod mock_exchanger;
pub mod mock_repositories;

pub use builders::*;
pub use dns_server_mock::{MockDnsServer, FORGED_IP};
pub use mock_exchanger::ScriptedExchanger;
pub use mock_repositories::*;
