//! Shared test utilities

#![allow(dead_code)]

pub mod prober;

use relfetch::config::{Config, MirrorsConfig};

pub const PRODUCT: &str = "pigsty";

/// Config pointing both mirrors and the reachability target at test servers
pub fn config_for(primary: &str, secondary: &str, reachability: &str) -> Config {
    Config {
        mirrors: MirrorsConfig {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        },
        reachability_url: reachability.to_string(),
        ..Config::default()
    }
}

/// Lowercase hex MD5 of `data`
pub fn md5_hex(data: &[u8]) -> String {
    use md5::{Digest, Md5};
    hex::encode(Md5::digest(data))
}
