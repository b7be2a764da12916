//! Command-line parsing for the default binary

use anyhow::{anyhow, Result};

/// What the binary should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Fixed-timestep loop driven by the control socket
    Serve,
    /// Headless rounds played by the engine
    Autoplay(AutoplayArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoplayArgs {
    pub seed: Option<u32>,
    pub rounds: u32,
}

impl Default for AutoplayArgs {
    fn default() -> Self {
        Self {
            seed: None,
            rounds: 1,
        }
    }
}

/// Parse arguments (without the program name)
pub fn parse_args(args: &[String]) -> Result<RunMode> {
    match args.first().map(String::as_str) {
        None | Some("serve") => {
            if let Some(extra) = args.get(1) {
                return Err(anyhow!("serve: unknown argument: {}", extra));
            }
            Ok(RunMode::Serve)
        }
        Some("autoplay") => parse_autoplay_args(&args[1..]).map(RunMode::Autoplay),
        Some(other) => Err(anyhow!(
            "unknown command: {} (expected `serve` or `autoplay`)",
            other
        )),
    }
}

fn parse_autoplay_args(args: &[String]) -> Result<AutoplayArgs> {
    let mut out = AutoplayArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("autoplay: missing value for --seed"))?;
                out.seed = Some(
                    v.parse::<u32>()
                        .map_err(|_| anyhow!("autoplay: invalid --seed value: {}", v))?,
                );
            }
            "--rounds" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("autoplay: missing value for --rounds"))?;
                out.rounds = v
                    .parse::<u32>()
                    .map_err(|_| anyhow!("autoplay: invalid --rounds value: {}", v))?;
            }
            other => return Err(anyhow!("autoplay: unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_is_serve() {
        assert_eq!(parse_args(&[]).unwrap(), RunMode::Serve);
        assert_eq!(parse_args(&args(&["serve"])).unwrap(), RunMode::Serve);
    }

    #[test]
    fn test_autoplay_flags() {
        let mode = parse_args(&args(&["autoplay", "--rounds", "5", "--seed", "42"])).unwrap();
        assert_eq!(
            mode,
            RunMode::Autoplay(AutoplayArgs {
                seed: Some(42),
                rounds: 5
            })
        );
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse_args(&args(&["autoplay", "--rounds"])).is_err());
        assert!(parse_args(&args(&["autoplay", "--seed", "x"])).is_err());
        assert!(parse_args(&args(&["observe"])).is_err());
    }
}
