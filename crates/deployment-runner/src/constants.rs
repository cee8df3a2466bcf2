use std::env;

// The contract deployed when no contract name is configured.
pub const DEFAULT_CONTRACT: &str = "GoldRush";

lazy_static! {
    // The GoldRush constructor arguments: the owner, the token name and the
    // token symbol.
    pub static ref DEFAULT_CONSTRUCTOR_ARGS: Vec<String> = vec![
        "0xfD85b99A39A9f155B73b35d2b9AB224c3bEd8ee8".to_string(),
        "GoldRush".to_string(),
        "GR".to_string(),
    ];

    // The amount of fuzz runs that randomized tests will use.
    pub static ref FUZZ_RUNS: u64 = env::var("DEPLOY_FUZZ_RUNS").ok().and_then(|s| s.parse().ok()).unwrap_or(100);
}
