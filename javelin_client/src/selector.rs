use rand::prelude::*;
use tracing::debug;

use javelin_protocol::ServiceAddress;

/// picks one reachable address for a logical service out of its known
/// address list. Selectors are stateless; the list is supplied per call by
/// whatever tracks the registry.
pub trait EndpointSelector {
    fn select<'a>(&self, services: &'a [ServiceAddress]) -> Option<&'a ServiceAddress>;
}

/// weighted-random policy: each address is drawn with probability
/// proportional to its weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRandomSelector;

impl WeightedRandomSelector {
    pub fn new() -> Self {
        WeightedRandomSelector
    }
}

impl EndpointSelector for WeightedRandomSelector {
    fn select<'a>(&self, services: &'a [ServiceAddress]) -> Option<&'a ServiceAddress> {
        if services.is_empty() {
            return None;
        }
        if services.len() == 1 {
            return services.first();
        }

        // thread_rng is a per-thread CSPRNG, so concurrent selections never
        // share generator state.
        let mut rng = thread_rng();
        let total: f64 = services.iter().map(|s| s.weight).sum();
        let r = rng.gen::<f64>() * total;
        let mut running = 0f64;
        for service in services {
            running += service.weight;
            if r <= running {
                return Some(service);
            }
        }

        // r can land past the accumulated total under floating-point
        // rounding; fall back to a uniform permutation's head.
        debug!(total, r, "weighted scan fell through, shuffling");
        let mut order: Vec<usize> = (0..services.len()).collect();
        order.shuffle(&mut rng);
        services.get(order[0])
    }
}

/// the selection entry point consulted while building an outbound call.
pub fn select_endpoint(services: &[ServiceAddress]) -> Option<&ServiceAddress> {
    WeightedRandomSelector::new().select(services)
}
