use crate::{PolyPolicy, Target};
use log::info;

pub fn parse_target(s: &str) -> Target {
    match s.to_lowercase().as_str() {
        "f" | "flat" | "svp" => Target::Flat,
        "s" | "sectioned" | "vpr" => Target::Sectioned,
        "b" | "both" | "all" => Target::Both,
        other => {
            info!("Unknown target '{}', defaulting to `both`..!", other);
            Target::Both
        }
    }
}

pub fn parse_policy(s: &str) -> PolyPolicy {
    match s.to_lowercase().as_str() {
        "h" | "highest" => PolyPolicy::Highest,
        "lw" | "lowest" => PolyPolicy::Lowest,
        "lu" | "loudest" => PolyPolicy::Loudest,
        other => {
            info!("Unknown policy '{}', defaulting to `highest`..!", other);
            PolyPolicy::Highest
        }
    }
}
