//! Static service catalog.
//!
//! Services are fixed at startup and immutable for the lifetime of the
//! process; there is no admin CRUD for them.

use serde::Serialize;

/// A bookable service. Prices are stored in cents to keep money integral.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub key: &'static str,
    pub label: &'static str,
    pub duration_min: i64,
    pub price_cents: i64,
}

/// The barbershop's offering. Resolved by key on every slot query and
/// booking request.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self {
            services: vec![
                Service {
                    key: "corte_sobrancelha",
                    label: "Corte + Sobrancelha",
                    duration_min: 40,
                    price_cents: 4000,
                },
                Service {
                    key: "corte",
                    label: "Corte",
                    duration_min: 40,
                    price_cents: 3500,
                },
                Service {
                    key: "corte_barba",
                    label: "Corte + Barba",
                    duration_min: 50,
                    price_cents: 5000,
                },
                Service {
                    key: "corte_pigmentacao",
                    label: "Corte + Pigmentação",
                    duration_min: 60,
                    price_cents: 5000,
                },
                Service {
                    key: "barba",
                    label: "Barba",
                    duration_min: 20,
                    price_cents: 2000,
                },
                Service {
                    key: "corte_barba_pigmentacao",
                    label: "Corte + Barba + Pigmentação",
                    duration_min: 60,
                    price_cents: 6000,
                },
            ],
        }
    }
}

impl ServiceCatalog {
    /// Look up a service by its key.
    pub fn get(&self, key: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.key == key)
    }

    pub fn all(&self) -> &[Service] {
        &self.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_key() {
        let catalog = ServiceCatalog::default();
        let svc = catalog.get("corte_barba").unwrap();
        assert_eq!(svc.duration_min, 50);
        assert_eq!(svc.price_cents, 5000);
    }

    #[test]
    fn test_lookup_unknown_key() {
        let catalog = ServiceCatalog::default();
        assert!(catalog.get("manicure").is_none());
    }

    #[test]
    fn test_all_durations_positive() {
        for svc in ServiceCatalog::default().all() {
            assert!(svc.duration_min > 0);
            assert!(svc.price_cents > 0);
        }
    }
}
