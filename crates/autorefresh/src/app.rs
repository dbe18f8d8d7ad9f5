use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("autorefresh")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a host UI refresh control firing once its tab is mounted")
        .long_about("autorefresh waits for a target region of an asynchronously built UI to appear, then activates a refresh control on a fixed cadence. The simulate command runs the watchdog against an in-memory host so timings and edge cases can be inspected.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the watchdog against a simulated host and report what it did")
                .arg(
                    Arg::new("duration-ms")
                        .long("duration-ms")
                        .short('d')
                        .help("How long to run the simulation")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("16000")
                )
                .arg(
                    Arg::new("region-after-ms")
                        .long("region-after-ms")
                        .help("When the host finishes building its UI (root, region and control appear)")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2500")
                )
                .arg(
                    Arg::new("ui-loaded-at-ms")
                        .long("ui-loaded-at-ms")
                        .help("When the host fires its UI-loaded signal")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0")
                )
                .arg(
                    Arg::new("signals")
                        .long("signals")
                        .help("Which entry signals the host delivers")
                        .value_parser(["dom", "ui", "both"])
                        .default_value("both")
                )
                .arg(
                    Arg::new("control-gap")
                        .long("control-gap")
                        .help("Remove the refresh control between START and END ms (repeatable)")
                        .value_name("START:END")
                        .value_parser(parse_gap)
                        .action(ArgAction::Append)
                )
                .arg(
                    Arg::new("cadence-ms")
                        .long("cadence-ms")
                        .help("Interval between activations (overrides config)")
                        .value_parser(clap::value_parser!(u64))
                )
                .arg(
                    Arg::new("retry-delay-ms")
                        .long("retry-delay-ms")
                        .help("Delay between readiness checks (overrides config)")
                        .value_parser(clap::value_parser!(u64))
                )
                .arg(
                    Arg::new("document-delay-ms")
                        .long("document-delay-ms")
                        .help("Delay after document load before polling (overrides config)")
                        .value_parser(clap::value_parser!(u64))
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("config")
                .about("Show the effective configuration after merging all config files")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
}

/// Parse a `START:END` millisecond window.
fn parse_gap(raw: &str) -> Result<(u64, u64), String> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", raw))?;
    let start: u64 = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid gap start '{}': {}", start, e))?;
    let end: u64 = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid gap end '{}': {}", end, e))?;
    if end <= start {
        return Err(format!("gap end {} must be after start {}", end, start));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        let result = build_cli().try_get_matches_from(vec!["autorefresh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_simulate_defaults() {
        let matches = build_cli()
            .try_get_matches_from(vec!["autorefresh", "simulate"])
            .unwrap();
        let sub = matches.subcommand_matches("simulate").unwrap();
        assert_eq!(*sub.get_one::<u64>("duration-ms").unwrap(), 16000);
        assert_eq!(*sub.get_one::<u64>("region-after-ms").unwrap(), 2500);
        assert_eq!(sub.get_one::<String>("signals").unwrap(), "both");
        assert!(sub.get_one::<u64>("cadence-ms").is_none());
        assert!(!sub.get_flag("json"));
    }

    #[test]
    fn test_simulate_gaps_append() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "autorefresh",
                "simulate",
                "--control-gap",
                "100:200",
                "--control-gap",
                "500:900",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("simulate").unwrap();
        let gaps: Vec<(u64, u64)> = sub
            .get_many::<(u64, u64)>("control-gap")
            .unwrap()
            .copied()
            .collect();
        assert_eq!(gaps, vec![(100, 200), (500, 900)]);
    }

    #[test]
    fn test_simulate_rejects_unknown_signal() {
        let result =
            build_cli().try_get_matches_from(vec!["autorefresh", "simulate", "--signals", "load"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let matches = build_cli()
            .try_get_matches_from(vec!["autorefresh", "config", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_parse_gap() {
        assert_eq!(parse_gap("10:20"), Ok((10, 20)));
        assert_eq!(parse_gap(" 10 : 20 "), Ok((10, 20)));
        assert!(parse_gap("20:10").is_err());
        assert!(parse_gap("10").is_err());
        assert!(parse_gap("a:20").is_err());
    }
}
