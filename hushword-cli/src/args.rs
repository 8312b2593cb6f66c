//! Command-line parsing.

use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  hushword redact  --audio <wav> --transcript <json> [--lexicon <csv>] [--config <json>] [--output-dir <dir>]
  hushword batch   --pair <transcript>=<audio>... [--lexicon <csv>] [--config <json>] [--output-dir <dir>] [--combine]
  hushword combine [--config <json>] [--no-validate] <wav>...
  hushword flatten --transcript <json>

Environment:
  RUST_LOG                log filter (default hushword=info)
  HUSHWORD_MAX_JOBS       override max_concurrent_jobs
  HUSHWORD_SHRINK_RATIO   override mute_shrink_ratio";

/// Denylist used when `--lexicon` is not given.
pub const DEFAULT_LEXICON: &str = "curse_words.csv";

/// Options shared by `redact` and `batch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonArgs {
    pub lexicon: PathBuf,
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Default for CommonArgs {
    fn default() -> Self {
        Self {
            lexicon: PathBuf::from(DEFAULT_LEXICON),
            config: None,
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Redact {
        audio: PathBuf,
        transcript: PathBuf,
        common: CommonArgs,
    },
    Batch {
        /// (transcript, audio) pairs in admission order.
        pairs: Vec<(PathBuf, PathBuf)>,
        common: CommonArgs,
        combine: bool,
    },
    Combine {
        segments: Vec<PathBuf>,
        config: Option<PathBuf>,
        validate: Option<bool>,
    },
    Flatten {
        transcript: PathBuf,
    },
    Help,
}

/// Parse everything after the program name.
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut it = args.into_iter();
    let Some(sub) = it.next() else {
        return Err("missing subcommand".into());
    };

    match sub.as_str() {
        "redact" => parse_redact(it),
        "batch" => parse_batch(it),
        "combine" => parse_combine(it),
        "flatten" => parse_flatten(it),
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => Err(format!("unknown subcommand: {other}")),
    }
}

fn value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    it.next().ok_or_else(|| format!("missing value for {flag}"))
}

/// Consume `arg` if it is one of the shared flags.
fn common_flag(
    arg: &str,
    it: &mut impl Iterator<Item = String>,
    common: &mut CommonArgs,
) -> Result<bool, String> {
    match arg {
        "--lexicon" => common.lexicon = PathBuf::from(value(it, arg)?),
        "--config" => common.config = Some(PathBuf::from(value(it, arg)?)),
        "--output-dir" => common.output_dir = Some(PathBuf::from(value(it, arg)?)),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_redact(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut audio = None;
    let mut transcript = None;
    let mut common = CommonArgs::default();

    while let Some(arg) = it.next() {
        if common_flag(&arg, &mut it, &mut common)? {
            continue;
        }
        match arg.as_str() {
            "--audio" => audio = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--transcript" => transcript = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Command::Redact {
        audio: audio.ok_or("redact requires --audio")?,
        transcript: transcript.ok_or("redact requires --transcript")?,
        common,
    })
}

fn parse_batch(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut pairs = Vec::new();
    let mut common = CommonArgs::default();
    let mut combine = false;

    while let Some(arg) = it.next() {
        if common_flag(&arg, &mut it, &mut common)? {
            continue;
        }
        match arg.as_str() {
            "--pair" => {
                let raw = value(&mut it, &arg)?;
                let Some((transcript, audio)) = raw.split_once('=') else {
                    return Err(format!("--pair expects <transcript>=<audio>, got {raw}"));
                };
                if transcript.is_empty() || audio.is_empty() {
                    return Err(format!("--pair has an empty side: {raw}"));
                }
                pairs.push((PathBuf::from(transcript), PathBuf::from(audio)));
            }
            "--combine" => combine = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if pairs.is_empty() {
        return Err("batch requires at least one --pair".into());
    }
    Ok(Command::Batch {
        pairs,
        common,
        combine,
    })
}

fn parse_combine(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut segments = Vec::new();
    let mut config = None;
    let mut validate = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--no-validate" => validate = Some(false),
            "--help" | "-h" => return Ok(Command::Help),
            flag if flag.starts_with("--") => return Err(format!("unknown argument: {flag}")),
            _ => segments.push(PathBuf::from(&arg)),
        }
    }

    if segments.is_empty() {
        return Err("combine requires at least one segment".into());
    }
    Ok(Command::Combine {
        segments,
        config,
        validate,
    })
}

fn parse_flatten(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut transcript = None;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--transcript" => transcript = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Command::Flatten {
        transcript: transcript.ok_or("flatten requires --transcript")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, String> {
        parse_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn redact_with_defaults() {
        let cmd = parse("redact --audio a.wav --transcript t.json").unwrap();
        assert_eq!(
            cmd,
            Command::Redact {
                audio: "a.wav".into(),
                transcript: "t.json".into(),
                common: CommonArgs::default(),
            }
        );
    }

    #[test]
    fn redact_requires_audio() {
        let err = parse("redact --transcript t.json").unwrap_err();
        assert!(err.contains("--audio"));
    }

    #[test]
    fn batch_collects_pairs_in_order() {
        let cmd = parse("batch --pair a.json=a.wav --lexicon words.csv --pair b.json=b.wav --combine")
            .unwrap();
        let Command::Batch {
            pairs,
            common,
            combine,
        } = cmd
        else {
            panic!("expected batch");
        };
        assert_eq!(
            pairs,
            vec![
                ("a.json".into(), "a.wav".into()),
                ("b.json".into(), "b.wav".into())
            ]
        );
        assert_eq!(common.lexicon, PathBuf::from("words.csv"));
        assert!(combine);
    }

    #[test]
    fn batch_rejects_bad_pairs() {
        assert!(parse("batch").is_err());
        assert!(parse("batch --pair a.json").is_err());
        assert!(parse("batch --pair =a.wav").is_err());
    }

    #[test]
    fn combine_takes_positional_segments() {
        let cmd = parse("combine --no-validate one.wav two.wav").unwrap();
        assert_eq!(
            cmd,
            Command::Combine {
                segments: vec!["one.wav".into(), "two.wav".into()],
                config: None,
                validate: Some(false),
            }
        );
        assert!(parse("combine").is_err());
        assert!(parse("combine --bogus x.wav").is_err());
    }

    #[test]
    fn flatten_and_unknowns() {
        assert_eq!(
            parse("flatten --transcript t.json").unwrap(),
            Command::Flatten {
                transcript: "t.json".into()
            }
        );
        assert!(parse("").is_err());
        assert!(parse("shout").is_err());
        assert!(parse("redact --audio").unwrap_err().contains("missing value"));
        assert_eq!(parse("--help").unwrap(), Command::Help);
    }
}
