pub mod deploy;
pub mod health;
pub mod id;
pub mod init;
pub mod keygen;
pub mod remove;
pub mod serve;
pub mod version;

pub use deploy::Deploy;
pub use health::Health;
pub use id::Id;
pub use init::Init;
pub use keygen::Keygen;
pub use remove::Remove;
pub use serve::Serve;
pub use version::Version;

use common::policy::Vendor;

/// Every vendor when none were named on the command line
pub(crate) fn vendors_or_all(vendors: &[Vendor]) -> Vec<Vendor> {
    if vendors.is_empty() {
        Vendor::ALL.to_vec()
    } else {
        vendors.to_vec()
    }
}
