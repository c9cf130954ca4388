//! Fuzz target: `ControllerConfig::from_bytes`
//!
//! Arbitrary bytes must either be rejected or decode into a config that
//! passes validation and survives a re-encode.
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use motorctl::config::ControllerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = ControllerConfig::from_bytes(data) {
        assert!(config.validate().is_ok());
        let bytes = config.to_bytes().expect("valid config encodes");
        let again = ControllerConfig::from_bytes(&bytes).expect("re-decode");
        assert_eq!(again, config);
    }
});
