#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use crate::record;
    use crate::value::{FlatMap, Value};

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct TestConfig {
            pub host: String [default = "localhost"],
            pub port: u16 [default = "8080"],
            pub debug: bool,
            pub hosts: Vec<String>,
            pub timeout: Duration,
            pub database: TestDbConfig [nested],
        }
    }

    record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct TestDbConfig {
            pub url: String,
            pub pool_size: u32 [default = "5"],
        }
    }

    /// Build a flat map of string values from literal pairs.
    pub fn flat(pairs: &[(&str, &str)]) -> FlatMap {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), Value::Str(value.to_string())))
            .collect()
    }

    #[test]
    fn fixture_defaults_are_zero_values() {
        let config = TestConfig::default();
        assert_eq!(config.port, 0); // annotation defaults flow through providers, not Default
        assert_eq!(config.host, "");
        assert!(config.hosts.is_empty());
    }
}
