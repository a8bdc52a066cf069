use heat_stencil::config::{DEFAULT_MAX_STEPS, StencilConfig};

#[test]
fn partial_json_fills_defaults() {
    let cfg: StencilConfig = serde_json::from_str(r#"{ "size": 64, "threads": 3 }"#).unwrap();
    assert_eq!(cfg.size, 64);
    assert_eq!(cfg.threads, 3);
    assert_eq!(cfg.alpha, 0.02);
    assert_eq!(cfg.epsilon, 0.0001);
    assert_eq!(cfg.max_steps, DEFAULT_MAX_STEPS);
}

#[test]
fn json_round_trip() {
    let cfg = StencilConfig::default().with_size(32).with_max_steps(10);
    let text = serde_json::to_string(&cfg).unwrap();
    let back: StencilConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn builder_clamps() {
    let cfg = StencilConfig::default().with_size(0).with_threads(0);
    assert_eq!(cfg.size, 10);
    assert_eq!(cfg.threads, 1);
    assert!(cfg.params::<f32>().is_ok());
}
