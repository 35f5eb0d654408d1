use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub route_plans_total: IntCounterVec,
    pub route_planning_seconds: Histogram,
    pub routes_total: IntCounterVec,
    pub routes_active: IntGauge,
    pub deliveries_completed_total: IntCounter,
    pub driver_utilization: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let route_plans_total = IntCounterVec::new(
            Opts::new("route_plans_total", "Route proposals by outcome"),
            &["outcome"],
        )
        .expect("valid route_plans_total metric");

        let route_planning_seconds = Histogram::with_opts(HistogramOpts::new(
            "route_planning_seconds",
            "Time spent ordering stops for a proposal",
        ))
        .expect("valid route_planning_seconds metric");

        let routes_total = IntCounterVec::new(
            Opts::new("routes_total", "Route confirmations by outcome"),
            &["outcome"],
        )
        .expect("valid routes_total metric");

        let routes_active = IntGauge::new("routes_active", "Routes currently being driven")
            .expect("valid routes_active metric");

        let deliveries_completed_total = IntCounter::new(
            "deliveries_completed_total",
            "Deliveries marked as delivered",
        )
        .expect("valid deliveries_completed_total metric");

        let driver_utilization = GaugeVec::new(
            Opts::new("driver_utilization", "Driver utilization ratio [0..1]"),
            &["driver_id"],
        )
        .expect("valid driver_utilization metric");

        registry
            .register(Box::new(route_plans_total.clone()))
            .expect("register route_plans_total");
        registry
            .register(Box::new(route_planning_seconds.clone()))
            .expect("register route_planning_seconds");
        registry
            .register(Box::new(routes_total.clone()))
            .expect("register routes_total");
        registry
            .register(Box::new(routes_active.clone()))
            .expect("register routes_active");
        registry
            .register(Box::new(deliveries_completed_total.clone()))
            .expect("register deliveries_completed_total");
        registry
            .register(Box::new(driver_utilization.clone()))
            .expect("register driver_utilization");

        Self {
            registry,
            route_plans_total,
            route_planning_seconds,
            routes_total,
            routes_active,
            deliveries_completed_total,
            driver_utilization,
        }
    }

    pub fn set_driver_utilization(&self, driver_id: &str, current: u32, max: u32) {
        let utilization = if max == 0 {
            0.0
        } else {
            current as f64 / max as f64
        };
        self.driver_utilization
            .with_label_values(&[driver_id])
            .set(utilization);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
