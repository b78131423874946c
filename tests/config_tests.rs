use smart_learning::Config;
use smart_learning::intent_matcher::{MIN_COMMON_WORDS, SIMILARITY_THRESHOLD};
use std::env;

const VARS: [&str; 5] = [
    "DATABASE_URL",
    "PORT",
    "HOST",
    "TUTOR_SIMILARITY_THRESHOLD",
    "TUTOR_MIN_COMMON_WORDS",
];

fn clear_vars() {
    for var in VARS {
        unsafe { env::remove_var(var); }
    }
}

// Environment variables are process-wide, so every case runs in one test.
#[test]
fn test_config_from_environment() {
    clear_vars();

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.url, "sqlite:smart_learning.db?mode=rwc");
    assert_eq!(config.server.port, 5001);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.tutor.similarity_threshold, SIMILARITY_THRESHOLD);
    assert_eq!(config.tutor.min_common_words, MIN_COMMON_WORDS);
    assert!(config.validate().is_ok());

    unsafe {
        env::set_var("PORT", "8080");
        env::set_var("TUTOR_SIMILARITY_THRESHOLD", "0.45");
        env::set_var("TUTOR_MIN_COMMON_WORDS", "3");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.server.port, 8080);
    let settings = config.tutor.matcher_settings();
    assert_eq!(settings.similarity_threshold, 0.45);
    assert_eq!(settings.min_common_words, 3);

    unsafe { env::set_var("PORT", "not-a-number"); }
    assert!(Config::from_env().is_err());
    unsafe { env::remove_var("PORT"); }

    unsafe { env::set_var("TUTOR_SIMILARITY_THRESHOLD", "high"); }
    assert!(Config::from_env().is_err());

    unsafe { env::set_var("TUTOR_SIMILARITY_THRESHOLD", "1.2"); }
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_vars();
}
