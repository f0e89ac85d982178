use prometheus::{
    Counter, Encoder, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub delivery_transitions_total: IntCounterVec,
    pub accept_attempts_total: IntCounterVec,
    pub jobs_searching: IntGauge,
    pub settled_earnings_total: Counter,
    pub courier_wallet_balance: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let delivery_transitions_total = IntCounterVec::new(
            Opts::new(
                "delivery_transitions_total",
                "Delivery status transitions by target status",
            ),
            &["status"],
        )
        .expect("valid delivery_transitions_total metric");

        let accept_attempts_total = IntCounterVec::new(
            Opts::new("accept_attempts_total", "Job claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid accept_attempts_total metric");

        let jobs_searching = IntGauge::new(
            "jobs_searching",
            "Current number of unclaimed delivery jobs",
        )
        .expect("valid jobs_searching metric");

        let settled_earnings_total = Counter::new(
            "settled_earnings_total",
            "Total courier earnings credited on delivery completion",
        )
        .expect("valid settled_earnings_total metric");

        let courier_wallet_balance = GaugeVec::new(
            Opts::new("courier_wallet_balance", "Current wallet balance per courier"),
            &["courier_id"],
        )
        .expect("valid courier_wallet_balance metric");

        registry
            .register(Box::new(delivery_transitions_total.clone()))
            .expect("register delivery_transitions_total");
        registry
            .register(Box::new(accept_attempts_total.clone()))
            .expect("register accept_attempts_total");
        registry
            .register(Box::new(jobs_searching.clone()))
            .expect("register jobs_searching");
        registry
            .register(Box::new(settled_earnings_total.clone()))
            .expect("register settled_earnings_total");
        registry
            .register(Box::new(courier_wallet_balance.clone()))
            .expect("register courier_wallet_balance");

        Self {
            registry,
            delivery_transitions_total,
            accept_attempts_total,
            jobs_searching,
            settled_earnings_total,
            courier_wallet_balance,
        }
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
