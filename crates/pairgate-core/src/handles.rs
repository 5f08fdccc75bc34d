use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigurationValue;

macro_rules! handle {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a provisioner-assigned index.
            pub const fn new(index: u64) -> Self {
                Self(index)
            }

            /// Provisioner-assigned index.
            pub const fn index(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

handle!(CurveHandle, "curve", "Opaque reference to a constructed pricing-curve resource.");
handle!(TokenHandle, "token", "Opaque reference to a constructed token resource.");

/// A curve and token created together from one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedPair {
    /// The pricing curve, constructed first.
    pub curve: CurveHandle,
    /// The token, which references `curve`.
    pub token: TokenHandle,
    /// The configuration that drove both constructions.
    pub config: ConfigurationValue,
}
