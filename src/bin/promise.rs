//! promise CLI: run a combinator over synthetic sleep-then-settle workloads.

use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use promise_rs::config::Config;
use promise_rs::engine::Engine;
use promise_rs::error::Failure;
use promise_rs::model::{Completion, Outcome, Workload};
use promise_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "promise", about = "Promise-style combinators over concurrent workloads")]
struct Cli {
    /// Per-workload timeout for race-all, in milliseconds (overrides PROMISE_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Print completions as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for every workload
    AllSettled(Batch),
    /// Wait for every success, stop at the first failure
    All(Batch),
    /// First workload to finish wins
    Race(Batch),
    /// Race each workload against the timeout, then apply `all`
    RaceAll(Batch),
    /// First success wins
    Any(Batch),
    /// First COUNT successes
    Some {
        /// Number of successes to wait for
        #[arg(long)]
        count: usize,
        #[command(flatten)]
        batch: Batch,
    },
}

#[derive(Args)]
struct Batch {
    /// Workloads as DELAY_MS:VALUE, DELAY_MS:err:MESSAGE, optionally suffixed
    /// with :fallback=VALUE
    #[arg(required = true)]
    workloads: Vec<WorkloadSpec>,
}

impl Batch {
    fn build(self) -> Vec<Workload<i64>> {
        self.workloads
            .into_iter()
            .map(WorkloadSpec::into_workload)
            .collect()
    }
}

/// A synthetic workload: sleep, then succeed or fail.
#[derive(Debug, Clone, PartialEq)]
struct WorkloadSpec {
    delay_ms: u64,
    result: Result<i64, String>,
    fallback: Option<i64>,
}

impl FromStr for WorkloadSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split(':').collect();

        let fallback = match parts.last().copied().and_then(|p| p.strip_prefix("fallback=")) {
            Some(raw) => {
                parts.pop();
                Some(
                    raw.parse::<i64>()
                        .map_err(|e| format!("bad fallback in {s:?}: {e}"))?,
                )
            }
            None => None,
        };

        let delay_ms = parts
            .first()
            .ok_or_else(|| format!("empty workload {s:?}"))?
            .parse::<u64>()
            .map_err(|e| format!("bad delay in {s:?}: {e}"))?;

        let result = match &parts[1..] {
            [value] => Ok(value
                .parse::<i64>()
                .map_err(|e| format!("bad value in {s:?}: {e}"))?),
            ["err", message @ ..] if !message.is_empty() => Err(message.join(":")),
            _ => {
                return Err(format!(
                    "expected DELAY_MS:VALUE or DELAY_MS:err:MESSAGE, got {s:?}"
                ));
            }
        };

        Ok(Self {
            delay_ms,
            result,
            fallback,
        })
    }
}

impl WorkloadSpec {
    fn into_workload(self) -> Workload<i64> {
        let delay = Duration::from_millis(self.delay_ms);
        let result = self.result;
        let workload = Workload::new(move || {
            let outcome = match &result {
                Ok(value) => Outcome::Success(*value),
                Err(message) => Outcome::Failure(Failure::rejected(message)),
            };
            async move {
                tokio::time::sleep(delay).await;
                outcome
            }
        });
        match self.fallback {
            Some(value) => workload.with_fallback(value),
            None => workload,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "promise".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let mut options = config.options;
    if let Some(ms) = cli.timeout_ms {
        options.timeout = Duration::from_millis(ms);
    }
    let engine = Engine::new(options);

    let completions = match cli.command {
        Command::AllSettled(batch) => engine.all_settled(batch.build()).await,
        Command::All(batch) => engine.all(batch.build()).await,
        Command::Race(batch) => engine.race(batch.build()).await.into_iter().collect(),
        Command::RaceAll(batch) => engine.race_all(batch.build()).await,
        Command::Any(batch) => engine.any(batch.build()).await,
        Command::Some { count, batch } => engine.some(batch.build(), count).await,
    };

    print_completions(&completions, cli.json)
}

fn print_completions(completions: &[Completion<i64>], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(completions)?);
        return Ok(());
    }

    if completions.is_empty() {
        println!("No completions.");
        return Ok(());
    }
    for completion in completions {
        match &completion.outcome {
            Outcome::Success(value) => println!("[{}] ok   {value}", completion.idx),
            Outcome::Failure(failure) => println!("[{}] err  {failure}", completion.idx),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_workload() {
        let parsed: WorkloadSpec = "150:7".parse().unwrap();
        assert_eq!(
            parsed,
            WorkloadSpec {
                delay_ms: 150,
                result: Ok(7),
                fallback: None
            }
        );
    }

    #[test]
    fn parses_failure_workload_with_colons_in_message() {
        let parsed: WorkloadSpec = "80:err:db:down".parse().unwrap();
        assert_eq!(parsed.result, Err("db:down".to_string()));
    }

    #[test]
    fn parses_fallback_suffix() {
        let parsed: WorkloadSpec = "3000:1:fallback=-1".parse().unwrap();
        assert_eq!(parsed.result, Ok(1));
        assert_eq!(parsed.fallback, Some(-1));
    }

    #[test]
    fn rejects_malformed_workloads() {
        assert!("fast:1".parse::<WorkloadSpec>().is_err());
        assert!("10".parse::<WorkloadSpec>().is_err());
        assert!("10:err".parse::<WorkloadSpec>().is_err());
        assert!("10:1:2".parse::<WorkloadSpec>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn parsed_workload_sleeps_then_settles() {
        let engine = Engine::default();
        let got = engine
            .all_settled(vec!["20:4".parse::<WorkloadSpec>().unwrap().into_workload()])
            .await;
        assert_eq!(got, vec![Completion::success(0, 4)]);
    }

    #[test]
    fn cli_parses_some_with_count() {
        let cli = Cli::try_parse_from(["promise", "some", "--count", "2", "10:1", "20:2"]).unwrap();
        match cli.command {
            Command::Some { count, batch } => {
                assert_eq!(count, 2);
                assert_eq!(batch.workloads.len(), 2);
            }
            _ => panic!("expected some"),
        }
    }
}
