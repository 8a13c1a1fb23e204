use lazy_static::lazy_static;
use prometheus::{
    gather, register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref QUOTES_REQUESTED: IntCounter = register_int_counter!(
        "quickytrade_quotes_requested_total", "Quotes requested from the aggregator"
    ).expect("register quickytrade_quotes_requested_total");

    pub static ref SWAP_SUCCESS: IntCounter = register_int_counter!(
        "quickytrade_swap_success_total", "Swaps confirmed on-chain"
    ).expect("register quickytrade_swap_success_total");

    pub static ref SWAP_FAILURE: IntCounterVec = register_int_counter_vec!(
        "quickytrade_swap_failure_total", "Swaps that did not complete, by stage", &["stage"]
    ).expect("register quickytrade_swap_failure_total");
}

pub fn encode_metrics() -> anyhow::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&gather(), &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_counters() {
        QUOTES_REQUESTED.inc();
        SWAP_FAILURE.with_label_values(&["api"]).inc();

        let text = String::from_utf8(encode_metrics().unwrap()).unwrap();
        assert!(text.contains("quickytrade_quotes_requested_total"));
        assert!(text.contains("quickytrade_swap_failure_total{stage=\"api\"}"));
    }
}
