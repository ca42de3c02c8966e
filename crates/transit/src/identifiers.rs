//! Type-safe identifiers for OneBusAway entities.
//!
//! All identifiers use Arc<str> for cheap cloning, since stops are copied
//! into every cache difference handed to map delegates.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

impl_identifier!(StopIdentifier);
impl_identifier!(RouteIdentifier);
impl_identifier!(AgencyIdentifier);

impl StopIdentifier {
    /// The agency prefix of an OBA stop ID (`"1_75403"` -> `"1"`).
    pub fn agency(&self) -> Option<AgencyIdentifier> {
        self.0
            .split_once('_')
            .map(|(agency, _)| AgencyIdentifier::new(agency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality() {
        let id1 = StopIdentifier::new("1_75403");
        let id2 = StopIdentifier::new("1_75403");
        let id3 = id1.clone();

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&id1.0, &id3.0)); // Clone shares Arc
    }

    #[test]
    fn test_identifier_hash() {
        use std::collections::HashSet;

        let routes: HashSet<_> = ["1_100447", "1_100447", "40_100479"]
            .into_iter()
            .map(RouteIdentifier::new)
            .collect();

        assert_eq!(routes.len(), 2);
        assert!(routes.contains(&RouteIdentifier::new("40_100479")));
    }

    #[test]
    fn test_stop_agency() {
        assert_eq!(
            StopIdentifier::new("1_75403").agency(),
            Some(AgencyIdentifier::new("1"))
        );
        assert_eq!(StopIdentifier::new("plain").agency(), None);
        assert_eq!(format!("{}", AgencyIdentifier::new("40")), "40");
    }
}
