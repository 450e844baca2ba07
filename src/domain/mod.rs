mod aging;
mod document;
mod integrity;
mod invoice;
mod ledger;
mod money;
mod party;

pub use aging::*;
pub use document::*;
pub use integrity::*;
pub use invoice::*;
pub use ledger::*;
pub use money::*;
pub use party::*;
