use clap::{Args, Parser};

use crate::backend::register_allocation::AllocSettings;

#[derive(Clone, Debug, Parser)]
#[clap(author, version, about)]
pub struct Options {
    /// Program descriptions (JSON) to allocate
    #[clap(required = true)]
    pub input: Vec<String>,

    /// Listing output file. Defaults to stdout
    #[clap(short, long)]
    pub output: Option<String>,

    /// Machine description (JSON). Takes precedence over --target
    #[clap(long)]
    pub machine: Option<String>,

    /// Built-in target to allocate for
    #[clap(long, default_value_t = String::from("avr"), possible_values(&["avr"]))]
    pub target: String,

    #[clap(flatten)]
    pub allocation_settings: AllocationSettings,

    /// Print the diagnostics of every allocation attempt
    #[clap(long)]
    pub stats: bool,

    /// Re-check every allocation before printing it
    #[clap(long)]
    pub verify: bool,

    /// Log more. Repeat for more detail
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AllocationSettings {
    /// Give up after this many attempts. Defaults to linkages + uses + 1
    #[clap(long = "max-attempts")]
    pub max_attempts: Option<u32>,

    /// Move values that cannot fit their class to memory instead of failing
    #[clap(long = "spill-unallocatable")]
    pub spill_unallocatable: bool,
}

impl From<&AllocationSettings> for AllocSettings {
    fn from(settings: &AllocationSettings) -> AllocSettings {
        AllocSettings {
            max_attempts: settings.max_attempts,
            spill_unallocatable: settings.spill_unallocatable,
        }
    }
}

/// Gets command line options and input using clap.
/// Returns an Options struct representing the fully parsed options
pub fn get() -> Options {
    Options::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let options = Options::try_parse_from(&[
            "gcra",
            "a.json",
            "b.json",
            "--max-attempts",
            "4",
            "--spill-unallocatable",
            "-vv",
        ])
        .unwrap();
        assert_eq!(options.input, vec!["a.json", "b.json"]);
        assert_eq!(options.target, "avr");
        assert_eq!(options.verbose, 2);
        let settings = AllocSettings::from(&options.allocation_settings);
        assert_eq!(settings.max_attempts, Some(4));
        assert!(settings.spill_unallocatable);
    }

    #[test]
    fn requires_input() {
        assert!(Options::try_parse_from(&["gcra"]).is_err());
    }
}
